//! Pipeline scenario tests

#[cfg(test)]
mod pipeline_tests {
    use crate::fakes::{FakeLanguageService, GradeReply, StaticStore};
    use crate::{
        AnswerGenerator, Document, Error, GradeFailurePolicy, GradingConfig, Pipeline,
        PipelineStatus, RelevanceGrader, NO_RELEVANT_DOCUMENTS, format_context,
    };
    use insta::assert_yaml_snapshot;
    use serde_json::json;
    use std::sync::Arc;

    const DOC_1: &str = "Bananas are rich in potassium.";
    const DOC_2: &str = "A supervisor agent routes tasks to worker agents.";
    const DOC_3: &str = "The Eiffel Tower is in Paris.";

    fn three_documents() -> Vec<Document> {
        vec![
            Document::new(DOC_1).with_id("1"),
            Document::new(DOC_2).with_id("2"),
            Document::new(DOC_3).with_id("3"),
        ]
    }

    fn ids(documents: &[Document]) -> Vec<&str> {
        documents.iter().map(|d| d.id.as_str()).collect()
    }

    fn pipeline(store: &Arc<StaticStore>, llm: &Arc<FakeLanguageService>) -> Pipeline {
        Pipeline::new(store.clone(), llm.clone())
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_rejected_without_llm_calls() {
        let store = Arc::new(StaticStore::new(vec![]));
        let llm = Arc::new(FakeLanguageService::new().answer("4"));

        let result = pipeline(&store, &llm).run("What is 2+2?").await.unwrap();

        assert_eq!(result.answer, "No relevant documents found. Try a different query.");
        assert_eq!(result.status, PipelineStatus::NoRelevantDocuments);
        assert_eq!(store.searches(), 1);
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generation_receives_only_relevant_document() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("no"))
                .grade(DOC_2, GradeReply::Label("yes"))
                .grade(DOC_3, GradeReply::Label("no"))
                .answer("A supervisor routes tasks to workers."),
        );

        let result = pipeline(&store, &llm)
            .run("What is a supervisor architecture?")
            .await
            .unwrap();

        assert_yaml_snapshot!(result, @r###"
        ---
        answer: A supervisor routes tasks to workers.
        status: answered
        retrieved: 3
        relevant: 1
        "###);
        assert_ne!(result.answer, NO_RELEVANT_DOCUMENTS);

        assert_eq!(llm.structured_calls().len(), 3);
        let completions = llm.completion_calls();
        assert_eq!(completions.len(), 1);

        let system = &completions[0].messages[0].content;
        assert!(system.contains(&format!("Context: {}\n", DOC_2)));
        assert!(!system.contains(DOC_1));
        assert!(!system.contains(DOC_3));
    }

    #[tokio::test]
    async fn test_all_documents_rejected() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("no"))
                .grade(DOC_2, GradeReply::Label("no"))
                .grade(DOC_3, GradeReply::Label("no"))
                .answer("should not be used"),
        );

        let result = pipeline(&store, &llm).run("Who wrote Hamlet?").await.unwrap();

        assert_eq!(result.answer, NO_RELEVANT_DOCUMENTS);
        assert_eq!(result.retrieved, 3);
        assert_eq!(result.relevant, 0);
        assert_eq!(llm.structured_calls().len(), 3);
        assert!(llm.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn test_schema_violation_excludes_only_that_document() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::SchemaError)
                .grade(DOC_3, GradeReply::Label("yes"))
                .answer("Answer."),
        );

        let result = pipeline(&store, &llm).run("Tell me facts").await.unwrap();

        assert!(result.is_answered());
        assert_eq!(result.relevant, 2);
        assert_eq!(llm.structured_calls().len(), 3);

        let system = &llm.completion_calls()[0].messages[0].content;
        assert!(system.contains(&format!("{}\n\n{}", DOC_1, DOC_3)));
        assert!(!system.contains(DOC_2));
    }

    #[tokio::test]
    async fn test_schema_violation_aborts_under_abort_policy() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::SchemaError)
                .grade(DOC_3, GradeReply::Label("yes"))
                .answer("Answer."),
        );

        let result = pipeline(&store, &llm)
            .with_grading(GradingConfig {
                policy: GradeFailurePolicy::Abort,
                concurrency: 1,
            })
            .run("Tell me facts")
            .await;

        assert!(matches!(result, Err(Error::SchemaViolation(_))));
        // grading stops at the offending document
        assert_eq!(llm.structured_calls().len(), 2);
        assert!(llm.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_structured_value_is_schema_violation() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Raw(json!({"score": "yes"})))
                .grade(DOC_2, GradeReply::Label("yes"))
                .answer("Answer."),
        );

        let excluded = pipeline(&store, &llm).run("q").await.unwrap();
        assert_eq!(excluded.relevant, 1);

        let aborted = pipeline(&store, &llm)
            .with_grading(GradingConfig {
                policy: GradeFailurePolicy::Abort,
                concurrency: 1,
            })
            .run("q")
            .await;
        assert!(matches!(aborted, Err(Error::SchemaViolation(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_during_grading_aborts() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::TransportError)
                .answer("Answer."),
        );

        let result = pipeline(&store, &llm).run("q").await;

        assert!(matches!(result, Err(Error::Grading(_))));
        assert!(llm.completion_calls().is_empty());
    }

    #[tokio::test]
    async fn test_retrieval_failure_aborts_before_grading() {
        let store = Arc::new(StaticStore::failing());
        let llm = Arc::new(FakeLanguageService::new().answer("Answer."));

        let result = pipeline(&store, &llm).run("q").await;

        assert!(matches!(result, Err(Error::Retrieval(_))));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces() {
        let store = Arc::new(StaticStore::new(three_documents()));
        let llm = Arc::new(FakeLanguageService::new().grade(DOC_2, GradeReply::Label("yes")));

        let result = pipeline(&store, &llm).run("q").await;

        assert!(matches!(result, Err(Error::Generation(_))));
    }

    #[tokio::test]
    async fn test_grading_keeps_exact_yes_in_order() {
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::Label("Yes"))
                .grade(DOC_3, GradeReply::Label("yes")),
        );
        let grader = RelevanceGrader::new(llm.clone());

        let filtered = grader.grade("q", &three_documents()).await.unwrap();
        assert_eq!(ids(&filtered), vec!["1", "3"]);

        let again = grader.grade("q", &three_documents()).await.unwrap();
        assert_eq!(filtered, again);
    }

    #[tokio::test]
    async fn test_grading_empty_input_makes_no_calls() {
        let llm = Arc::new(FakeLanguageService::new());
        let grader = RelevanceGrader::new(llm.clone());

        assert!(grader.grade("q", &[]).await.unwrap().is_empty());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_grading_prompt_carries_document_and_question() {
        let llm = Arc::new(FakeLanguageService::new());
        let grader = RelevanceGrader::new(llm.clone());

        grader.grade("Where is it?", &three_documents()[2..]).await.unwrap();

        let call = &llm.structured_calls()[0];
        assert_eq!(call.messages.len(), 2);
        assert!(call.messages[0].content.starts_with("You are a grader"));
        assert_eq!(
            call.messages[1].content,
            format!(
                "Here is the retrieved document: \n\n {} \n\n Here is the user question: \n\n Where is it?",
                DOC_3
            )
        );
    }

    #[tokio::test]
    async fn test_concurrent_grading_preserves_order() {
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::Label("no"))
                .grade(DOC_3, GradeReply::Label("yes"))
                .delay(DOC_1, 60)
                .delay(DOC_2, 30),
        );
        let grader = RelevanceGrader::new(llm.clone()).with_config(GradingConfig {
            policy: GradeFailurePolicy::Exclude,
            concurrency: 3,
        });

        let filtered = grader.grade("q", &three_documents()).await.unwrap();

        assert_eq!(ids(&filtered), vec!["1", "3"]);
        assert_eq!(llm.structured_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_grading_reports_first_failure_in_order() {
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade(DOC_1, GradeReply::Label("yes"))
                .grade(DOC_2, GradeReply::TransportError)
                .grade(DOC_3, GradeReply::TransportError)
                .delay(DOC_2, 40),
        );
        let grader = RelevanceGrader::new(llm.clone()).with_config(GradingConfig {
            policy: GradeFailurePolicy::Exclude,
            concurrency: 3,
        });

        let err = grader.grade("q", &three_documents()).await.unwrap_err();
        assert!(err.to_string().contains("document 1"));
    }

    #[tokio::test]
    async fn test_concurrent_grading_stops_after_transport_failure() {
        let contents = [
            "Alpha passage.",
            "Bravo passage.",
            "Charlie passage.",
            "Delta passage.",
            "Echo passage.",
        ];
        let documents: Vec<Document> = contents.iter().map(|c| Document::new(*c)).collect();
        let llm = Arc::new(
            FakeLanguageService::new()
                .grade("Alpha passage.", GradeReply::Label("yes"))
                .grade("Bravo passage.", GradeReply::TransportError),
        );
        let grader = RelevanceGrader::new(llm.clone()).with_config(GradingConfig {
            policy: GradeFailurePolicy::Exclude,
            concurrency: 2,
        });

        let result = grader.grade("q", &documents).await;

        assert!(matches!(result, Err(Error::Grading(_))));
        assert!(llm.structured_calls().len() <= 3);
    }

    #[tokio::test]
    async fn test_generate_without_documents_is_precondition_violation() {
        let llm = Arc::new(FakeLanguageService::new().answer("Answer."));
        let generator = AnswerGenerator::new(llm.clone());

        let result = generator.generate("q", &[]).await;

        assert!(matches!(result, Err(Error::PreconditionViolation(_))));
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_generate_returns_text_verbatim() {
        let llm = Arc::new(FakeLanguageService::new().answer("  Four.\nThat's all.  "));
        let generator = AnswerGenerator::new(llm.clone());

        let answer = generator.generate("What is 2+2?", &[Document::new("2+2=4")]).await.unwrap();

        assert_eq!(answer, "  Four.\nThat's all.  ");
        let call = &llm.completion_calls()[0];
        assert_eq!(call.messages.len(), 2);
        assert_eq!(call.messages[1].content, "What is 2+2?");
    }

    #[test]
    fn test_answer_prompt() {
        let messages = AnswerGenerator::answer_messages(
            "What is 2+2?",
            &[Document::new("2+2=4"), Document::new("Arithmetic is fun.")],
        );

        assert_eq!(
            messages[0].content,
            "You are an assistant for question-answering tasks. Use the following pieces of retrieved context to answer the question.\n\
            If you don't know the answer, just say that you don't know. Use three sentences maximum and keep the answer concise.\n\
            \n\
            Question: What is 2+2?\n\
            \n\
            Context: 2+2=4\n\nArithmetic is fun.\n\
            \n\
            Answer:"
        );
    }

    #[test]
    fn test_context_follows_document_order() {
        let a = Document::new("alpha");
        let b = Document::new("beta");

        assert_eq!(format_context(&[a.clone(), b.clone()]), "alpha\n\nbeta");
        assert_eq!(format_context(&[b, a]), "beta\n\nalpha");
        assert_eq!(format_context(&[]), "");
    }
}
