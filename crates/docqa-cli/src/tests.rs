//! Session tests against in-process collaborators

#[cfg(test)]
mod session_tests {
    use async_trait::async_trait;
    use insta::assert_yaml_snapshot;
    use std::io::Write;
    use std::sync::Arc;

    use crate::{Flow, ReplCommand, Session, parse_command};
    use docqa_core::{
        EmbeddingProvider, Error, Generator, RagConfig, RagConfigUpdate, Result, StoreStats,
    };
    use docqa_rag::RetrievalPipeline;

    /// Two-dimensional embedding: how often "fox" occurs, plus a constant.
    struct FoxCounter;

    #[async_trait]
    impl EmbeddingProvider for FoxCounter {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| vec![1.0, t.to_lowercase().matches("fox").count() as f32])
                .collect())
        }

        fn model_id(&self) -> &str {
            "fox-counter"
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        async fn generate(&self, _prompt: &str, model: &str, _temperature: f32) -> Result<String> {
            Ok(format!(
                "Answered by {}.\n---FOLLOW_UP_QUESTIONS---\n1. Where is the fox?",
                model
            ))
        }
    }

    fn session() -> Session<FoxCounter, EchoGenerator> {
        let config = RagConfig {
            chunk_size: 100,
            chunk_overlap: 10,
            ..RagConfig::default()
        };
        let pipeline =
            RetrievalPipeline::new(Arc::new(FoxCounter), Arc::new(EchoGenerator), config).unwrap();
        Session::new(Arc::new(pipeline))
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn long_text() -> String {
        (0..3)
            .map(|i| format!("Section {} describes the red fox and its habits in a few short sentences.", i))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[tokio::test]
    async fn test_add_ask_delete() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "fox.md", "# Foxes\n\nThe quick brown fox jumps over the lazy dog.");
        let mut session = session();

        let record = session.add_file(&path).await.unwrap();
        assert_eq!(record.filename, "fox.md");

        let answer = session.ask("Where is the fox?", None).await.unwrap();
        assert_eq!(answer.answer_text, "Answered by qwen-plus.");
        assert_eq!(answer.suggested_questions, vec!["Where is the fox?"]);
        assert_eq!(answer.retrieved_chunks.len(), 1);

        assert!(session.delete(&record.id).await.unwrap());
        assert!(!session.delete(&record.id).await.unwrap());
        assert_eq!(session.pipeline().stats().unwrap(), StoreStats::default());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();

        let err = session.add_file(&dir.path().join("absent.txt")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_reindex_after_chunk_size_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "habits.txt", &long_text());
        let mut session = session();

        let before = session.add_file(&path).await.unwrap();
        assert_eq!(before.chunk_count, 3);

        let update = RagConfigUpdate {
            chunk_size: Some(500),
            ..Default::default()
        };
        session.execute(ReplCommand::SetConfig(update)).await.unwrap();
        let report = session.reindex().await.unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(report.ingested[0].previous_id.as_deref(), Some(before.id.as_str()));
        assert_eq!(report.ingested[0].record.chunk_count, 1);
        assert_ne!(report.ingested[0].record.id, before.id);
        assert_eq!(session.pipeline().stats().unwrap().document_count, 1);

        // The source moved to the new id, so a second pass still replaces it.
        let again = session.reindex().await.unwrap();
        assert_eq!(again.ingested.len(), 1);
        assert_eq!(again.ingested[0].previous_id, Some(report.ingested[0].record.id.clone()));
        assert_eq!(session.pipeline().stats().unwrap().document_count, 1);
        assert!(session.delete(&again.ingested[0].record.id).await.unwrap());
        assert_eq!(session.pipeline().stats().unwrap().document_count, 0);
    }

    #[tokio::test]
    async fn test_handle_line_reports_errors_and_exits() {
        let mut session = session();

        assert_eq!(session.handle_line("").await, Flow::Continue);
        assert_eq!(session.handle_line("config topK=99").await, Flow::Continue);
        assert_eq!(session.pipeline().config().unwrap().top_k, 5);
        assert_eq!(session.handle_line("config topK=7").await, Flow::Continue);
        assert_eq!(session.pipeline().config().unwrap().top_k, 7);
        assert_eq!(session.handle_line("exit").await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_listing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session();
        for (name, content) in [
            ("a.txt", "The first fox lives in the forest."),
            ("b.md", "## Second\n\nAnother fox, this one in a field."),
        ] {
            let path = write_file(&dir, name, content);
            session.add_file(&path).await.unwrap();
        }

        let documents = session.pipeline().list_documents().unwrap();
        assert_yaml_snapshot!(documents, {
            "[].id" => "[id]",
            "[].upload_time" => "[time]",
        }, @r###"
        ---
        - id: "[id]"
          filename: a.txt
          file_type: txt
          chunk_count: 1
          upload_time: "[time]"
        - id: "[id]"
          filename: b.md
          file_type: markdown
          chunk_count: 1
          upload_time: "[time]"
        "###);
    }

    #[test]
    fn test_parsed_config_command_snapshot() {
        let Some(ReplCommand::SetConfig(update)) =
            parse_command("config chunkSize=800 chunkOverlap=80").unwrap()
        else {
            panic!("expected a config update");
        };

        assert_yaml_snapshot!(update, @r###"
        ---
        topK: ~
        chunkSize: 800
        chunkOverlap: 80
        model: ~
        temperature: ~
        "###);
    }
}
