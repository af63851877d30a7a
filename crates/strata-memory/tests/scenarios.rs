//! End-to-end conversation scenarios across the memory tiers.

use std::sync::Arc;

use strata_core::{ChunkMeta, Message, Role};
use strata_embeddings::{HashingEmbedder, MemoryStore, SearchOptions, SqliteMemoryStore};
use strata_memory::{
    ContextManager, ContextManagerConfig, LongTermMemory, Summarizer, SummarizerError,
};
use tempfile::TempDir;

fn window(l1_max_turns: usize, sink_turns: usize) -> ContextManagerConfig {
    ContextManagerConfig {
        l1_max_turns,
        sink_turns,
        ..ContextManagerConfig::default()
    }
}

fn recent_texts(cm: &ContextManager) -> Vec<&str> {
    cm.recent().iter().map(|m| m.content.as_str()).collect()
}

#[test]
fn sentence_turns_evict_into_single_chunks() {
    let mut cm = ContextManager::new(window(2, 0)).unwrap();
    cm.add_user_input("A。").unwrap();
    cm.add_assistant_output("B。").unwrap();
    cm.add_user_input("C。").unwrap();

    assert_eq!(recent_texts(&cm), vec!["B。", "C。"]);
    let chunks: Vec<_> = cm.long_term().store().iter_chunks().unwrap().collect();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "A。");
}

#[test]
fn long_conversation_keeps_window_and_recalls() {
    let mut cm = ContextManager::new(window(4, 2)).unwrap();
    cm.add_user_input("I am analysing NVDA this quarter.").unwrap();
    cm.add_assistant_output("Understood.").unwrap();

    let turns = [
        "The TSLA delivery numbers came in light.",
        "Noted, deliveries were below consensus.",
        "MSFT cloud revenue grew again.",
        "Azure growth held above expectations.",
        "Back to TSLA, what about margins?",
        "Automotive gross margin compressed.",
    ];
    for (i, text) in turns.iter().enumerate() {
        if i % 2 == 0 {
            cm.add_user_input(text).unwrap();
        } else {
            cm.add_assistant_output(text).unwrap();
        }
    }

    assert_eq!(cm.sink().len(), 2);
    assert_eq!(cm.recent().len(), 4);
    assert_eq!(cm.long_term().store().len().unwrap(), 2);

    let ctx = cm.get_augmented_context("TSLA delivery", None).unwrap();
    assert_eq!(ctx[0].content, "I am analysing NVDA this quarter.");
    assert!(
        ctx.iter()
            .any(|m| m.role == Role::System && m.content.contains("TSLA delivery numbers"))
    );
    assert_eq!(ctx.last().unwrap().content, "Automotive gross margin compressed.");
}

#[test]
fn durable_store_upserts_by_id() {
    let dir = TempDir::new().unwrap();
    let store = SqliteMemoryStore::open_in_dir(dir.path(), HashingEmbedder::default()).unwrap();
    let meta = ChunkMeta::file("report.md", None);

    store.add("c1", "first draft", &meta).unwrap();
    store.add("c1", "final revenue figures", &meta).unwrap();
    assert_eq!(store.len().unwrap(), 1);

    let hits = store
        .search("revenue figures", &SearchOptions::top_k(3))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].text, "final revenue figures");
}

#[test]
fn mmr_prefers_distinct_chunk_over_near_duplicate() {
    let dir = TempDir::new().unwrap();
    let store = SqliteMemoryStore::open_in_dir(dir.path(), HashingEmbedder::default()).unwrap();
    let meta = ChunkMeta::default();
    store
        .add("d1", "rust borrow checker error messages explained clearly", &meta)
        .unwrap();
    store
        .add("d2", "rust borrow checker error messages explained clearly today", &meta)
        .unwrap();
    store.add("c3", "rust borrow lifetimes for closures", &meta).unwrap();

    let plain: Vec<_> = store
        .search("rust borrow checker", &SearchOptions::top_k(2))
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(plain, vec!["d1", "d2"]);

    let diverse: Vec<_> = store
        .search("rust borrow checker", &SearchOptions::top_k(2).with_mmr(0.7))
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(diverse, vec!["d1", "c3"]);
}

#[test]
fn durable_memory_shared_across_managers_and_restarts() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.sqlite");

    {
        let shared = LongTermMemory::durable(&path, 256).unwrap();
        let mut writer = ContextManager::with_long_term(window(1, 0), shared.clone()).unwrap();
        let reader = ContextManager::with_long_term(window(1, 0), shared).unwrap();

        writer.add_user_input("AAPL services revenue hit a record.").unwrap();
        writer.add_user_input("Thanks.").unwrap();

        let hits = reader.retrieve("AAPL", 2).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "AAPL services revenue hit a record.");

        writer.clear(true).unwrap();
        assert_eq!(reader.long_term().store().len().unwrap(), 1);
    }

    let reopened = LongTermMemory::durable(&path, 256).unwrap();
    assert_eq!(reopened.index().lock().lookup("AAPL", 5).len(), 1);
    let cm = ContextManager::with_long_term(window(4, 0), reopened).unwrap();
    let hits = cm.retrieve("AAPL", 1).unwrap();
    assert_eq!(hits[0].meta.role, Some(Role::User));
}

#[test]
fn documents_and_conversation_share_recall() {
    let mut cm = ContextManager::new(window(1, 0)).unwrap();
    let report = cm
        .index_document(
            "Gross margin is defined as revenue minus cost of goods sold.\n\n\
             It is reported quarterly.",
            &ChunkMeta::file("glossary.md", Some("f-1".into())),
        )
        .unwrap();
    assert_eq!(report.count, 2);

    cm.add_user_input("What was the gross margin last quarter?").unwrap();
    cm.add_user_input("ok").unwrap();

    let hits = cm.retrieve("gross margin definition", 3).unwrap();
    assert!(
        hits.iter()
            .any(|c| c.meta.filename.as_deref() == Some("glossary.md"))
    );
}

struct FirstSentence;

impl Summarizer for FirstSentence {
    fn summarize(&self, messages: &[Message]) -> Result<String, SummarizerError> {
        let prompt = &messages.last().ok_or(SummarizerError::EmptyResponse)?.content;
        let material = prompt
            .split_once("Material:\n")
            .map(|(_, m)| m)
            .ok_or(SummarizerError::EmptyResponse)?;
        Ok(material.split('.').next().unwrap_or_default().to_owned())
    }
}

#[test]
fn system_context_goes_through_summarizer() {
    let mut cm = ContextManager::new(ContextManagerConfig {
        system_context_chars: 40,
        ..window(4, 0)
    })
    .unwrap()
    .with_summarizer(Arc::new(FirstSentence));

    cm.add_system_context(
        "Fiscal year ends in September. Figures are in USD millions unless noted otherwise.",
    );
    cm.add_user_input("hi").unwrap();

    let ctx = cm.get_augmented_context("hi", None).unwrap();
    assert_eq!(ctx[0].content, "Fiscal year ends in September");
    assert_eq!(ctx[0].role, Role::System);
}

#[test]
fn budgeted_context_fits_ceiling_when_tail_fits() {
    let mut cm = ContextManager::new(window(6, 1)).unwrap();
    cm.add_user_input(&"background ".repeat(100)).unwrap();
    for i in 0..6 {
        cm.add_user_input(&format!("short turn {i}")).unwrap();
    }

    let ctx = cm.get_augmented_context("short", Some(120)).unwrap();
    let total: usize = ctx.iter().map(strata_tokens::estimate_message_tokens).sum();
    assert!(total <= 120);
    assert_eq!(ctx.len(), 6);
}
