use super::support::{lifecycle, ScriptedEmbedder, TestFactory};
use crate::chunk::{ChunkConfig, ChunkPipeline};
use crate::document::Document;
use crate::lifecycle::{Lifecycle, PipelineSettings, PipelineStatus};
use crate::rag::{QueryStatus, NO_CONTEXT_ANSWER};
use inquiry_core::config::{AppConfig, ProviderConfig};
use inquiry_llm::MockLlmClient;
use std::fs;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const CUSTOMS_KB: &str =
    "Duty-free allowance is $500. Agricultural imports require a permit.";

fn corpus(dir: &TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("customs_knowledge_base.txt");
    fs::write(&path, text).unwrap();
    path
}

#[tokio::test]
async fn answers_from_the_matching_chunk() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    let response = lifecycle.query("What is the duty-free allowance?").await;

    assert_eq!(response.status, QueryStatus::Answered);
    assert!(response.answer.contains("$500"), "{}", response.answer);
    assert_eq!(response.citations.len(), 1);
    assert_eq!(response.citations[0].source_text_preview, CUSTOMS_KB);
    assert_eq!(response.citations[0].position, 0);
    assert_eq!(factory.llm.calls(), 1);
    assert_eq!(lifecycle.status(), PipelineStatus::Ready { chunks: 1 });
}

#[tokio::test]
async fn empty_corpus_skips_generation() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&corpus(&dir, ""), factory.clone());

    let response = lifecycle.query("What is the duty-free allowance?").await;

    assert_eq!(response.status, QueryStatus::NoContext);
    assert_eq!(response.answer, NO_CONTEXT_ANSWER);
    assert!(response.citations.is_empty());
    assert_eq!(factory.llm.calls(), 0);
    assert!(lifecycle.status().is_ready());
}

#[tokio::test]
async fn missing_corpus_is_not_initialized() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&dir.path().join("absent.txt"), factory.clone());

    let response = lifecycle.query("Anything?").await;

    assert_eq!(response.status, QueryStatus::NotInitialized);
    assert!(response.answer.starts_with("System not initialized."));
    assert!(response.citations.is_empty());
    match lifecycle.status() {
        PipelineStatus::Failed { reason } => {
            assert!(reason.starts_with("Configuration error"), "{reason}");
            assert!(reason.contains("Knowledge base not found"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn recovers_once_credentials_are_supplied() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    factory.credentials.store(false, Ordering::SeqCst);
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    let first = lifecycle.query("What is the duty-free allowance?").await;
    assert_eq!(first.status, QueryStatus::NotInitialized);
    assert!(matches!(lifecycle.status(), PipelineStatus::Failed { .. }));

    factory.credentials.store(true, Ordering::SeqCst);
    let second = lifecycle.query("What is the duty-free allowance?").await;

    assert_eq!(second.status, QueryStatus::Answered);
    assert!(second.answer.contains("$500"));
    assert_eq!(lifecycle.attempts(), 2);
}

#[tokio::test]
async fn configured_embedding_key_is_checked_on_every_attempt() {
    const KEY_VAR: &str = "INQUIRY_TEST_LIFECYCLE_EMBEDDING_KEY";
    std::env::remove_var(KEY_VAR);

    let dir = TempDir::new().unwrap();
    let mut config = AppConfig {
        corpus: corpus(&dir, ""),
        provider: "mock".to_string(),
        embedding_provider: "openai".to_string(),
        ..AppConfig::default()
    };
    config.llm.providers.insert(
        "openai".to_string(),
        ProviderConfig::OpenAI {
            api_key_env: KEY_VAR.to_string(),
            model: "gpt-4o-mini".to_string(),
            embedding_model: None,
            endpoint: Some("http://127.0.0.1:9".to_string()),
            timeout: Some(1),
        },
    );
    let lifecycle = Lifecycle::from_config(&config).unwrap();

    let first = lifecycle.query("What is the duty-free allowance?").await;
    assert_eq!(first.status, QueryStatus::NotInitialized);
    match lifecycle.status() {
        PipelineStatus::Failed { reason } => {
            assert!(reason.starts_with("Configuration error"), "{reason}");
            assert!(reason.contains(KEY_VAR), "{reason}");
        }
        other => panic!("unexpected status: {other:?}"),
    }

    std::env::set_var(KEY_VAR, "sk-lifecycle-test");
    let second = lifecycle.query("What is the duty-free allowance?").await;
    std::env::remove_var(KEY_VAR);

    assert_eq!(second.status, QueryStatus::NoContext);
    assert_eq!(lifecycle.status(), PipelineStatus::Ready { chunks: 0 });
    assert_eq!(lifecycle.attempts(), 2);
}

#[tokio::test]
async fn stats_report_the_effective_top_k() {
    let dir = TempDir::new().unwrap();
    let mut settings = PipelineSettings::new(corpus(&dir, CUSTOMS_KB));
    settings.top_k = 0;
    let lifecycle = Lifecycle::new(settings, TestFactory::echo());

    assert!(lifecycle.initialize().await.is_ready());

    assert_eq!(lifecycle.stats().unwrap().top_k, 1);
    let response = lifecycle.query("What is the duty-free allowance?").await;
    assert_eq!(response.citations.len(), 1);
}

#[tokio::test]
async fn concurrent_first_queries_build_once() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::new(
        ScriptedEmbedder::new().with_delay(Duration::from_millis(50)),
        MockLlmClient::echo(),
    );
    let lifecycle = Arc::new(lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone()));

    let queries = (0..8).map(|_| {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move { lifecycle.query("What is the duty-free allowance?").await })
    });
    let responses = futures::future::join_all(queries).await;

    for response in responses {
        assert_eq!(response.unwrap().status, QueryStatus::Answered);
    }
    assert_eq!(lifecycle.attempts(), 1);
    assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    assert_eq!(factory.llm.calls(), 8);
}

#[tokio::test]
async fn concurrent_callers_share_a_failed_attempt() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::new(
        ScriptedEmbedder::new()
            .with_delay(Duration::from_millis(50))
            .failing(),
        MockLlmClient::echo(),
    );
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    let (a, b, c) = tokio::join!(
        lifecycle.query("one?"),
        lifecycle.query("two?"),
        lifecycle.query("three?"),
    );

    for response in [a, b, c] {
        assert_eq!(response.status, QueryStatus::NotInitialized);
    }
    assert_eq!(lifecycle.attempts(), 1);
    match lifecycle.status() {
        PipelineStatus::Failed { reason } => {
            assert!(reason.starts_with("Initialization error"), "{reason}");
            assert!(reason.contains("embedding service unavailable"));
        }
        other => panic!("unexpected status: {other:?}"),
    }
}

#[tokio::test]
async fn failed_attempt_is_retried_on_next_query() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let path = dir.path().join("later.txt");
    let lifecycle = lifecycle(&path, factory.clone());

    assert_eq!(
        lifecycle.query("q?").await.status,
        QueryStatus::NotInitialized
    );

    fs::write(&path, CUSTOMS_KB).unwrap();
    assert_eq!(lifecycle.query("q?").await.status, QueryStatus::Answered);
    assert_eq!(lifecycle.attempts(), 2);
}

#[tokio::test]
async fn ready_pipeline_is_not_rebuilt() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    assert!(lifecycle.initialize().await.is_ready());
    assert!(lifecycle.initialize().await.is_ready());
    lifecycle.query("What is the duty-free allowance?").await;

    assert_eq!(lifecycle.attempts(), 1);
    assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    let stats = lifecycle.stats().unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.index.chunks, 1);
    assert_eq!(stats.llm_provider, "mock");
}

#[tokio::test]
async fn generation_failure_is_absorbed_and_redacted() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::new(
        ScriptedEmbedder::new(),
        MockLlmClient::failing("Incorrect API key provided: sk-live1234567890"),
    );
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    let response = lifecycle.query("What is the duty-free allowance?").await;

    assert_eq!(response.status, QueryStatus::Error);
    assert!(response.citations.is_empty());
    assert!(response.answer.contains("Details: Generation error"));
    assert!(response.answer.contains("[REDACTED]"));
    assert!(!response.answer.contains("sk-live1234567890"));
    assert!(lifecycle.status().is_ready());
}

#[tokio::test]
async fn blank_question_is_a_retrieval_error() {
    let dir = TempDir::new().unwrap();
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&corpus(&dir, CUSTOMS_KB), factory.clone());

    let response = lifecycle.query("   ").await;

    assert_eq!(response.status, QueryStatus::Error);
    assert!(response.answer.contains("Retrieval error"));
    assert_eq!(factory.llm.calls(), 0);
}

#[tokio::test]
async fn large_corpus_cites_top_three_in_order() {
    let dir = TempDir::new().unwrap();
    let sections: Vec<String> = (1..=40)
        .map(|i| {
            format!(
                "Section {i}: Tariff heading {i} covers goods of class {i}. \
                 Importers must file form C{i} before clearance and retain receipts."
            )
        })
        .collect();
    let text = format!(
        "{}\n\nSection 41: Duty-free allowance is $500 for returning residents.",
        sections.join("\n\n")
    );
    let factory = TestFactory::echo();
    let lifecycle = lifecycle(&corpus(&dir, &text), factory.clone());

    let response = lifecycle.query("What is the duty-free allowance?").await;

    let duty_chunk = ChunkPipeline::new(ChunkConfig::default())
        .unwrap()
        .split(&Document::new("kb", text.clone()))
        .into_iter()
        .find(|chunk| chunk.text.contains("Duty-free allowance"))
        .unwrap();

    assert_eq!(response.status, QueryStatus::Answered);
    assert_eq!(response.citations.len(), 3);
    assert_eq!(response.citations[0].position, duty_chunk.position);

    let corpus_words: Vec<&str> = text.split_whitespace().collect();
    for citation in &response.citations {
        let first_word = citation.source_text_preview.split_whitespace().next().unwrap();
        assert!(
            corpus_words.contains(&first_word),
            "preview starts mid-word: {:?}",
            citation.source_text_preview
        );
    }
    let stats = lifecycle.stats().unwrap();
    assert!(stats.index.chunks > 3);
}
