//! Integration tests against the live model service.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bricktutor::chat::{ChatController, SessionStore, SubmitOutcome};
    use bricktutor::{Gemini, GenerationConfig, KnownModel, Model, ModelHistoryEntry, ModelClient};

    fn live_client() -> Option<Gemini> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let client = Gemini::new(Some(api_key))
            .expect("Failed to create client")
            .with_model(Model::Known(KnownModel::Gemini20Flash))
            .with_generation_config(GenerationConfig::default().with_max_output_tokens(Some(64)));
        Some(client)
    }

    #[tokio::test]
    async fn test_simple_completion() {
        let Some(client) = live_client() else {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return;
        };

        let history = vec![ModelHistoryEntry::user("Say 'test passed'")];
        let reply = client.complete(&history, "Say 'test passed'").await;
        assert!(reply.is_ok(), "Request should succeed with valid API key");
        assert!(!reply.unwrap().trim().is_empty());
    }

    #[tokio::test]
    async fn test_two_turn_conversation() {
        let Some(client) = live_client() else {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return;
        };
        let client = client.with_system_instruction(Some(
            "You help students program LEGO robots. Answer in one sentence.".to_string(),
        ));

        let chat = ChatController::new(Arc::new(SessionStore::new("live")), Arc::new(client));
        let first = chat.submit("What is a DC motor?").await;
        assert!(first.is_replied(), "first turn failed: {first:?}");
        let second = chat.submit("And a servo?").await;
        assert!(
            matches!(second, SubmitOutcome::Replied { .. }),
            "second turn failed: {second:?}"
        );
        assert_eq!(chat.store().get_history().len(), 4);
        assert_eq!(chat.store().get_display().len(), 4);
    }

    #[tokio::test]
    async fn test_invalid_api_key() {
        if std::env::var("GEMINI_API_KEY").is_err() {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return;
        }

        let client = Gemini::new(Some("invalid-key".to_string())).expect("Failed to create client");
        let result = client
            .complete(&[ModelHistoryEntry::user("Hello")], "Hello")
            .await;
        let err = result.expect_err("invalid key should fail");
        assert!(err.is_authentication() || err.status_code() == Some(400));
    }
}
