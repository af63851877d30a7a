//! Deterministic feature-hashing embedder.
//!
//! Text is lowercased and split into ASCII word runs plus individual
//! non-ASCII letters and digits (one token per CJK character). Each token is
//! hashed with SHA-256: the first four digest bytes, read little-endian,
//! pick a bucket and the parity of the fifth byte picks the sign. The summed
//! vector is L2-normalized, so text with no tokens embeds to all zeros.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::errors::{EmbeddingError, Result};
use crate::normalize::l2_normalize;

/// Default embedding width.
pub const DEFAULT_DIMENSIONS: usize = 256;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9_]+|[\p{Alphabetic}\p{Nd}&&[^\x00-\x7F]]").unwrap());

/// Split `text` into embedding tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// Bag-of-tokens embedder with a fixed output width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dim`-wide vectors.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(EmbeddingError::Config("dim must be positive".into()));
        }
        Ok(Self { dim })
    }

    /// Output width.
    pub fn dimensions(&self) -> usize {
        self.dim
    }

    /// Embed `text` into a unit vector, or the zero vector when it has no tokens.
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; self.dim];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let bucket = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
            let sign = if digest[4] & 1 == 1 { -1.0 } else { 1.0 };
            v[bucket as usize % self.dim] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIMENSIONS,
        }
    }
}
