//! Memory subsystem constants.

// =============================================================================
// Context assembly
// =============================================================================

/// Trailing messages always kept when budgeting the augmented context.
pub const AUGMENT_KEEP_LAST_N: usize = 6;

/// Per-message token ceiling when budgeting the augmented context.
pub const AUGMENT_MAX_SINGLE_MESSAGE_TOKENS: usize = 900;

/// Tokens reserved for fixed prompt overhead before sizing retrieval.
pub const RETRIEVAL_OVERHEAD_TOKENS: usize = 200;

/// Assumed token cost of one retrieved memory item.
pub const TOKENS_PER_RETRIEVED_ITEM: usize = 160;

/// Lower bound on the similarity pool used to confirm entity hits.
pub const MIN_ENTITY_CANDIDATE_POOL: usize = 12;

// =============================================================================
// Segmentation
// =============================================================================

/// Substrings that mark a definitional statement worth keeping whole.
pub const DEFINITION_MARKERS: &[&str] = &[
    "定义",
    "代表",
    "记为",
    "is defined as",
    "represents",
    "denoted as",
];

/// Merged length (chars) a definitional segment needs before it flushes.
pub const DEFINITION_MIN_CHARS: usize = 12;

/// Characters that end a sentence.
pub const SENTENCE_TERMINALS: &[char] = &['。', '！', '？', '!', '?', '.'];

/// Floor on the merged length that lets the turn-count trigger fire.
pub const TURN_FLUSH_MIN_CHARS: usize = 40;
