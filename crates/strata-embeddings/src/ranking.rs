//! Candidate ranking and Maximal Marginal Relevance selection.
//!
//! Shared by every [`MemoryStore`](crate::store::MemoryStore) backend so the
//! ephemeral and durable stores rank identically.

use crate::normalize::cosine_similarity;
use crate::store::{MemoryChunk, SearchOptions};

/// A borrowed chunk paired with its similarity to the query.
pub type Scored<'a> = (f32, &'a MemoryChunk);

/// Candidate pool size used when the caller does not pick one.
pub fn default_candidate_pool(k: usize) -> usize {
    (k * 4).max(12)
}

/// Score, filter, and select chunks for `query_vec`.
///
/// `chunks` are scanned in store order; that order breaks similarity ties.
/// Only the returned chunks are cloned.
pub fn rank<'a>(
    query_vec: &[f32],
    chunks: impl IntoIterator<Item = &'a MemoryChunk>,
    opts: &SearchOptions,
) -> Vec<MemoryChunk> {
    if opts.k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Scored<'a>> = chunks
        .into_iter()
        .filter(|c| opts.filter.matches(&c.meta))
        .map(|c| (cosine_similarity(query_vec, &c.embedding), c))
        .collect();

    // sort_by is stable: equal scores keep scan order
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let pool = opts
        .candidate_pool
        .filter(|p| *p > 0)
        .unwrap_or_else(|| default_candidate_pool(opts.k));
    scored.truncate(pool);
    scored.retain(|(sim, _)| *sim > 0.0);

    if opts.mmr_lambda > 0.0 {
        mmr_select(scored, opts.k, opts.mmr_lambda)
    } else {
        scored
            .into_iter()
            .take(opts.k)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

/// Greedy MMR over pre-scored candidates.
///
/// Each step picks the candidate maximizing
/// `λ·sim(query) − (1−λ)·max(sim to selected)`, with the redundancy term
/// floored at zero. The first pick is the most query-similar candidate.
/// Lambda is clamped to `[0, 1]`; earlier candidates win ties.
pub fn mmr_select(mut candidates: Vec<Scored<'_>>, k: usize, lambda: f32) -> Vec<MemoryChunk> {
    if k == 0 || candidates.is_empty() {
        return Vec::new();
    }
    let lambda = lambda.clamp(0.0, 1.0);
    let mut selected: Vec<&MemoryChunk> = Vec::with_capacity(k.min(candidates.len()));

    while selected.len() < k && !candidates.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (i, (sim_q, chunk)) in candidates.iter().enumerate() {
            let score = if selected.is_empty() {
                *sim_q
            } else {
                let redundancy = selected
                    .iter()
                    .map(|s| cosine_similarity(&s.embedding, &chunk.embedding))
                    .fold(0.0_f32, f32::max);
                lambda * sim_q - (1.0 - lambda) * redundancy
            };
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }

        let (_, picked) = candidates.remove(best_idx);
        selected.push(picked);
    }

    selected.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::l2_normalize;
    use strata_core::{ChunkFilter, ChunkMeta, Role};

    fn chunk(id: &str, mut embedding: Vec<f32>) -> MemoryChunk {
        l2_normalize(&mut embedding);
        MemoryChunk {
            id: id.into(),
            text: id.into(),
            embedding,
            meta: ChunkMeta::default(),
        }
    }

    fn ids(chunks: &[MemoryChunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn zero_k_is_empty() {
        let out = rank(&[1.0, 0.0], &[chunk("a", vec![1.0, 0.0])], &SearchOptions::top_k(0));
        assert!(out.is_empty());
    }

    #[test]
    fn orders_by_similarity() {
        let chunks = vec![
            chunk("far", vec![0.2, 1.0]),
            chunk("near", vec![1.0, 0.1]),
            chunk("mid", vec![1.0, 1.0]),
        ];
        let out = rank(&[1.0, 0.0], &chunks, &SearchOptions::top_k(3));
        assert_eq!(ids(&out), vec!["near", "mid", "far"]);
    }

    #[test]
    fn drops_non_positive_similarity() {
        let chunks = vec![
            chunk("pos", vec![1.0, 0.0]),
            chunk("orth", vec![0.0, 1.0]),
            chunk("neg", vec![-1.0, 0.0]),
        ];
        let out = rank(&[1.0, 0.0], &chunks, &SearchOptions::top_k(3));
        assert_eq!(ids(&out), vec!["pos"]);
    }

    #[test]
    fn ties_keep_scan_order() {
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![1.0, 0.0]),
        ];
        let out = rank(&[1.0, 0.0], &chunks, &SearchOptions::top_k(1));
        assert_eq!(ids(&out), vec!["first"]);
    }

    #[test]
    fn filter_applied_before_scoring() {
        let mut tagged = chunk("tagged", vec![0.5, 1.0]);
        tagged.meta = ChunkMeta::conversation(Role::User);
        let chunks = vec![chunk("untagged", vec![1.0, 0.0]), tagged];
        let opts = SearchOptions::top_k(2).with_filter(ChunkFilter {
            role: Some(Role::User),
            ..ChunkFilter::default()
        });
        let out = rank(&[1.0, 0.0], &chunks, &opts);
        assert_eq!(ids(&out), vec!["tagged"]);
    }

    #[test]
    fn candidate_pool_limits_mmr_inputs() {
        let chunks = vec![
            chunk("a", vec![1.0, 0.0, 0.0]),
            chunk("b", vec![0.9, 0.1, 0.0]),
            chunk("c", vec![0.3, 0.0, 1.0]),
        ];
        let opts = SearchOptions::top_k(3).with_mmr(0.5).with_candidate_pool(2);
        let out = rank(&[1.0, 0.0, 0.0], &chunks, &opts);
        assert_eq!(out.len(), 2);
        assert!(!ids(&out).contains(&"c"));
    }

    #[test]
    fn mmr_prefers_distinct_over_near_duplicate() {
        let q = [1.0, 0.0, 0.0];
        let chunks = [
            chunk("dup1", vec![0.8, 0.6, 0.0]),
            chunk("dup2", vec![0.8, 0.6, 0.05]),
            chunk("distinct", vec![0.6, -0.8, 0.0]),
        ];
        let plain = rank(&q, &chunks, &SearchOptions::top_k(2));
        assert_eq!(ids(&plain), vec!["dup1", "dup2"]);
        let out = rank(&q, &chunks, &SearchOptions::top_k(2).with_mmr(0.7));
        assert_eq!(ids(&out), vec!["dup1", "distinct"]);
    }

    #[test]
    fn lambda_one_matches_top_k() {
        let q = [1.0, 0.2, 0.0];
        let chunks = [
            chunk("a", vec![1.0, 0.0, 0.0]),
            chunk("b", vec![1.0, 0.3, 0.1]),
            chunk("c", vec![0.5, 0.5, 0.5]),
            chunk("d", vec![0.1, 1.0, 0.0]),
        ];
        let plain = rank(&q, &chunks, &SearchOptions::top_k(3));
        let mmr = rank(&q, &chunks, &SearchOptions::top_k(3).with_mmr(1.0));
        assert_eq!(ids(&plain), ids(&mmr));
    }

    #[test]
    fn lambda_above_one_is_clamped() {
        let q = [1.0, 0.0];
        let chunks = [chunk("a", vec![1.0, 0.1]), chunk("b", vec![1.0, 0.2])];
        let clamped = rank(&q, &chunks, &SearchOptions::top_k(2).with_mmr(5.0));
        let plain = rank(&q, &chunks, &SearchOptions::top_k(2));
        assert_eq!(ids(&clamped), ids(&plain));
    }

    #[test]
    fn lambda_zero_picks_least_redundant_after_first() {
        let top = chunk("top", vec![1.0, 0.0, 0.0]);
        let twin = chunk("twin", vec![1.0, 0.01, 0.0]);
        let other = chunk("other", vec![0.0, 0.0, 1.0]);
        let out = mmr_select(vec![(0.99, &top), (0.98, &twin), (0.10, &other)], 2, 0.0);
        assert_eq!(ids(&out), vec!["top", "other"]);
    }

    #[test]
    fn input_chunks_are_left_in_place() {
        let chunks = vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.9, 0.1])];
        let out = rank(&[1.0, 0.0], &chunks, &SearchOptions::top_k(1).with_mmr(0.7));
        assert_eq!(ids(&out), vec!["a"]);
        assert_eq!(out[0], chunks[0]);
        assert_eq!(ids(&chunks), vec!["a", "b"]);
    }

    #[test]
    fn mmr_stops_at_pool_exhaustion() {
        let only = chunk("only", vec![1.0]);
        assert_eq!(mmr_select(vec![(0.5, &only)], 5, 0.7).len(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_chunks() -> impl Strategy<Value = Vec<MemoryChunk>> {
            proptest::collection::vec(proptest::collection::vec(-1.0f32..1.0, 4), 0..16).prop_map(
                |vs| {
                    vs.into_iter()
                        .enumerate()
                        .map(|(i, v)| chunk(&format!("c{i}"), v))
                        .collect()
                },
            )
        }

        proptest! {
            #[test]
            fn lambda_one_is_top_k(
                chunks in arb_chunks(),
                q in proptest::collection::vec(-1.0f32..1.0, 4),
                k in 1usize..6,
            ) {
                let plain = rank(&q, &chunks, &SearchOptions::top_k(k));
                let mmr = rank(&q, &chunks, &SearchOptions::top_k(k).with_mmr(1.0));
                prop_assert_eq!(ids(&plain), ids(&mmr));
            }

            #[test]
            fn never_more_than_k(
                chunks in arb_chunks(),
                q in proptest::collection::vec(-1.0f32..1.0, 4),
                k in 0usize..6,
                lambda in 0.0f32..1.0,
            ) {
                let out = rank(&q, &chunks, &SearchOptions::top_k(k).with_mmr(lambda));
                prop_assert!(out.len() <= k);
            }
        }
    }
}
