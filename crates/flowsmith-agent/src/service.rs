//! Background generation service.
//!
//! [`GenerationService`] is the broker handler for `GENERATE_WORKFLOW`.  It
//! runs the generator, counts the attempt in the usage statistics, and turns
//! every failure into `{success: false, error}` so the foreground always gets
//! a structured answer.

use async_trait::async_trait;
use flowsmith_kernel::{BrokerClient, RequestHandler, ServeHandle, broker};
use flowsmith_store::UsageStore;
use flowsmith_workflow::{GenerationRequest, GenerationResponse};
use tracing::{error, warn};

use crate::error::AgentError;
use crate::generator::WorkflowGenerator;

/// Foreground handle for sending generation requests.
pub type GenerationClient = BrokerClient<GenerationRequest, GenerationResponse>;

/// Handler answering generation requests.
pub struct GenerationService {
    generator: WorkflowGenerator,
    usage: Option<UsageStore>,
}

impl GenerationService {
    /// A service that does not record usage.
    pub fn new(generator: WorkflowGenerator) -> Self {
        Self {
            generator,
            usage: None,
        }
    }

    /// Record every attempt in `usage`.
    pub fn with_usage(mut self, usage: UsageStore) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Answer one request.
    pub async fn respond(&self, request: GenerationRequest) -> GenerationResponse {
        let result = self.generator.generate(request.prompt()).await;

        // A blank prompt never reaches the model and is not an attempt.
        let attempted = !matches!(result, Err(AgentError::EmptyPrompt));
        if let Some(usage) = self.usage.as_ref().filter(|_| attempted) {
            // A bookkeeping failure must not hide the generated workflow.
            if let Err(e) = usage.record(result.is_ok()).await {
                warn!(error = %e, "failed to record usage statistics");
            }
        }

        match result {
            Ok(workflow) => GenerationResponse::success(workflow),
            Err(e) => {
                warn!(error = %e, "workflow generation failed");
                GenerationResponse::failure(e.to_string())
            }
        }
    }
}

#[async_trait]
impl RequestHandler<GenerationRequest, GenerationResponse> for GenerationService {
    async fn handle(&self, request: GenerationRequest) -> GenerationResponse {
        self.respond(request).await
    }

    fn fault(&self, reason: String) -> GenerationResponse {
        error!(reason = %reason, "generation handler panicked");
        GenerationResponse::failure(format!("internal error: {reason}"))
    }
}

/// Start `service` in the background and return the foreground client.
pub fn spawn_service(
    service: GenerationService,
    capacity: usize,
) -> (GenerationClient, ServeHandle) {
    let (client, server) = broker::channel(capacity);
    let handle = server.serve(service);
    (client, handle)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use flowsmith_store::Database;

    use super::*;
    use crate::error::{AgentError, Result};
    use crate::llm::{CompletionEndpoint, GenerationConfig};

    /// Answers every call with the same text, or fails when `None`.
    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl CompletionEndpoint for Fixed {
        async fn complete(&self, _: &str, _: &GenerationConfig) -> Result<String> {
            match self.0 {
                Some(text) => Ok(text.to_owned()),
                None => Err(AgentError::Upstream {
                    status: 500,
                    status_text: "Internal Server Error".into(),
                }),
            }
        }
    }

    fn service(reply: Option<&'static str>) -> GenerationService {
        GenerationService::new(WorkflowGenerator::new(
            Arc::new(Fixed(reply)),
            GenerationConfig::default(),
        ))
    }

    async fn usage() -> UsageStore {
        let db = Database::in_memory().unwrap();
        UsageStore::new(db)
    }

    #[tokio::test]
    async fn success_and_failure_are_recorded() {
        let usage = usage().await;

        let ok = service(Some(r#"{"name":"Ok"}"#)).with_usage(usage.clone());
        assert!(ok.respond(GenerationRequest::generate("a")).await.is_success());

        let failing = service(None).with_usage(usage.clone());
        let response = failing.respond(GenerationRequest::generate("b")).await;
        let message = response.into_result().unwrap_err();
        assert!(message.contains("500"), "{message}");

        let stats = usage.load().await.unwrap();
        assert_eq!((stats.generated, stats.successful, stats.success_rate), (2, 1, 50));
    }

    #[tokio::test]
    async fn empty_prompt_is_a_structured_failure() {
        let response = service(Some("{}"))
            .respond(GenerationRequest::generate("   "))
            .await;
        assert_eq!(
            response.into_result().unwrap_err(),
            "please enter a workflow description"
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_not_counted_as_attempt() {
        let usage = usage().await;
        let service = service(Some(r#"{"name":"Ok"}"#)).with_usage(usage.clone());

        assert!(service.respond(GenerationRequest::generate("a")).await.is_success());
        let blank = service.respond(GenerationRequest::generate("  \n ")).await;
        assert!(!blank.is_success());

        let stats = usage.load().await.unwrap();
        assert_eq!((stats.generated, stats.successful, stats.success_rate), (1, 1, 100));
    }

    #[test]
    fn fault_becomes_failure() {
        let response = service(None).fault("boom".into());
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn spawned_service_answers_over_broker() {
        let (client, handle) = spawn_service(service(Some(r#"{"name":"Via broker"}"#)), 4);
        let doc = client
            .send(GenerationRequest::generate("x"))
            .await
            .unwrap()
            .into_result()
            .unwrap();
        assert_eq!(doc.name, "Via broker");
        handle.shutdown().await;
    }
}
