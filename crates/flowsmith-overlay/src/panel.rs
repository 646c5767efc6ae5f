//! The generator panel.
//!
//! [`PANEL_MARKUP`] is the static markup mounted into the page.
//! [`PanelController`] owns the panel's state and reacts to user events:
//! it validates the prompt, sends it through the broker, copies the result
//! to the clipboard and keeps the status line current.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flowsmith_kernel::BrokerClient;
use flowsmith_workflow::{GenerationRequest, GenerationResponse};
use tracing::{debug, info, warn};

use crate::error::{OverlayError, Result};
use crate::host::Clipboard;

/// Foreground handle to the background generation service.
pub type BackgroundClient = BrokerClient<GenerationRequest, GenerationResponse>;

/// Id of the panel's container element.
pub const PANEL_CONTAINER_ID: &str = "n8n-ai-generator";

/// How long a success message stays visible.
pub const SUCCESS_STATUS_TTL: Duration = Duration::from_secs(8);

pub const EMPTY_PROMPT_MESSAGE: &str = "Please enter a workflow description";
pub const GENERATING_MESSAGE: &str = "Generating workflow with AI...";
pub const SUCCESS_MESSAGE: &str = "Workflow generated! JSON copied to clipboard.";

/// Import steps shown after a successful generation.
pub const IMPORT_INSTRUCTIONS: &[&str] = &[
    "JSON copied to clipboard",
    "In n8n: click \"+\" then \"From clipboard\"",
    "Paste and import your workflow",
];

/// Markup mounted inside the container.
pub const PANEL_MARKUP: &str = r#"<div class="ai-header">
  <span>AI Workflow Generator</span>
  <button id="ai-toggle" class="ai-toggle">&minus;</button>
</div>
<div class="ai-content" id="ai-content">
  <div class="ai-examples"><small>Try: "Send Slack message when Gmail email arrives"</small></div>
  <textarea id="ai-prompt" placeholder="Describe your workflow..." rows="4"></textarea>
  <div class="ai-actions">
    <button id="ai-generate" class="ai-generate-btn">Generate Workflow</button>
  </div>
  <div id="ai-status" class="ai-status"></div>
  <div class="ai-instructions" hidden>
    <strong>How to import:</strong>
    <ol>
      <li>JSON copied to clipboard</li>
      <li>In n8n: click "+" then "From clipboard"</li>
      <li>Paste and import your workflow</li>
    </ol>
  </div>
</div>"#;

// ---------------------------------------------------------------------------
// Events and state
// ---------------------------------------------------------------------------

/// User interactions the panel reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// The prompt text changed.
    PromptChanged(String),
    /// A key was pressed inside the prompt.
    PromptKeyDown { key: String, ctrl: bool },
    /// The generate button was clicked.
    GenerateClicked,
    /// The collapse/expand button was clicked.
    ToggleClicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// The status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

/// Everything the page needs to render the panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub prompt: String,
    pub status: Option<Status>,
    pub busy: bool,
    pub collapsed: bool,
    pub instructions_visible: bool,
}

/// What handling an event led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelOutcome {
    /// The event only changed local state, or was not a submit.
    Updated,
    /// A submit was refused because the prompt was empty.
    EmptyPrompt,
    /// A submit was dropped because a request is already in flight.
    Busy,
    /// A workflow was generated and copied.
    Generated,
    /// The submit failed; the message is shown in the status line.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Shared {
    state: PanelState,
    /// Bumped on every status change so stale auto-clears do nothing.
    status_seq: u64,
}

/// Event handler for one mounted panel.
#[derive(Clone)]
pub struct PanelController {
    client: BackgroundClient,
    clipboard: Arc<dyn Clipboard>,
    shared: Arc<Mutex<Shared>>,
    success_ttl: Duration,
}

impl PanelController {
    pub fn new(client: BackgroundClient, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            client,
            clipboard,
            shared: Arc::default(),
            success_ttl: SUCCESS_STATUS_TTL,
        }
    }

    /// Override how long success messages stay visible.
    pub fn with_success_ttl(mut self, ttl: Duration) -> Self {
        self.success_ttl = ttl;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PanelState {
        self.lock().state.clone()
    }

    /// React to one user event.
    pub async fn handle(&self, event: PanelEvent) -> PanelOutcome {
        match event {
            PanelEvent::PromptChanged(text) => {
                self.lock().state.prompt = text;
                PanelOutcome::Updated
            }
            PanelEvent::PromptKeyDown { key, ctrl } if ctrl && key == "Enter" => {
                self.submit().await
            }
            PanelEvent::PromptKeyDown { .. } => PanelOutcome::Updated,
            PanelEvent::GenerateClicked => self.submit().await,
            PanelEvent::ToggleClicked => {
                let mut shared = self.lock();
                shared.state.collapsed = !shared.state.collapsed;
                PanelOutcome::Updated
            }
        }
    }

    async fn submit(&self) -> PanelOutcome {
        let prompt = {
            let mut shared = self.lock();
            if shared.state.busy {
                debug!("generation already in flight, ignoring submit");
                return PanelOutcome::Busy;
            }
            let prompt = shared.state.prompt.trim().to_owned();
            if prompt.is_empty() {
                set_status(&mut shared, StatusKind::Error, EMPTY_PROMPT_MESSAGE);
                return PanelOutcome::EmptyPrompt;
            }
            shared.state.busy = true;
            set_status(&mut shared, StatusKind::Loading, GENERATING_MESSAGE);
            prompt
        };

        info!(prompt_len = prompt.len(), "submitting workflow request");
        let result = self.generate(prompt).await;

        let mut shared = self.lock();
        shared.state.busy = false;
        match result {
            Ok(()) => {
                let seq = set_status(&mut shared, StatusKind::Success, SUCCESS_MESSAGE);
                shared.state.instructions_visible = true;
                shared.state.prompt.clear();
                drop(shared);
                self.schedule_clear(seq);
                PanelOutcome::Generated
            }
            Err(message) => {
                warn!(error = %message, "workflow generation failed");
                set_status(&mut shared, StatusKind::Error, &format!("Error: {message}"));
                PanelOutcome::Failed(message)
            }
        }
    }

    /// Round trip to the background and clipboard write.
    async fn generate(&self, prompt: String) -> std::result::Result<(), String> {
        let response = self
            .client
            .send(GenerationRequest::generate(prompt))
            .await
            .map_err(|e| OverlayError::from(e).to_string())?;
        let workflow = response.into_result()?;
        let json = workflow
            .to_pretty_json()
            .map_err(|e| OverlayError::from(e).to_string())?;
        self.copy(&json).await.map_err(|e| e.to_string())
    }

    async fn copy(&self, json: &str) -> Result<()> {
        self.clipboard.write_text(json).await?;
        debug!(bytes = json.len(), "workflow copied to clipboard");
        Ok(())
    }

    fn schedule_clear(&self, seq: u64) {
        let shared = Arc::clone(&self.shared);
        let ttl = self.success_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut shared = shared.lock().unwrap_or_else(|p| p.into_inner());
            if shared.status_seq == seq {
                shared.state.status = None;
            }
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|p| p.into_inner())
    }
}

fn set_status(shared: &mut Shared, kind: StatusKind, text: &str) -> u64 {
    shared.status_seq += 1;
    shared.state.status = Some(Status {
        kind,
        text: text.to_owned(),
    });
    shared.status_seq
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use flowsmith_kernel::{RequestHandler, broker};
    use flowsmith_workflow::normalize;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Mutex<Option<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Clipboard for MemoryClipboard {
        async fn write_text(&self, text: &str) -> Result<()> {
            if self.fail {
                return Err(OverlayError::Clipboard {
                    reason: "permission denied".into(),
                });
            }
            *self.text.lock().unwrap() = Some(text.to_owned());
            Ok(())
        }
    }

    /// Echoes the prompt back as the workflow name, or fails on "fail".
    struct Echo {
        delay: Duration,
    }

    #[async_trait]
    impl RequestHandler<GenerationRequest, GenerationResponse> for Echo {
        async fn handle(&self, request: GenerationRequest) -> GenerationResponse {
            tokio::time::sleep(self.delay).await;
            if request.prompt() == "fail" {
                return GenerationResponse::failure("model refused");
            }
            let candidate = json!({"name": request.prompt()});
            GenerationResponse::success(normalize(candidate.as_object().unwrap().clone()))
        }

        fn fault(&self, reason: String) -> GenerationResponse {
            GenerationResponse::failure(reason)
        }
    }

    fn panel(delay: Duration, clipboard: Arc<MemoryClipboard>) -> PanelController {
        let (client, server) = broker::channel(4);
        let _handle = server.serve(Echo { delay });
        PanelController::new(client, clipboard)
    }

    async fn type_prompt(panel: &PanelController, text: &str) {
        panel
            .handle(PanelEvent::PromptChanged(text.into()))
            .await;
    }

    #[tokio::test]
    async fn empty_prompt_shows_error_without_sending() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel = panel(Duration::ZERO, clipboard.clone());
        type_prompt(&panel, "   ").await;

        assert_eq!(panel.handle(PanelEvent::GenerateClicked).await, PanelOutcome::EmptyPrompt);
        let state = panel.state();
        assert_eq!(state.status.unwrap().text, EMPTY_PROMPT_MESSAGE);
        assert!(!state.busy);
        assert!(clipboard.text.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn success_copies_pretty_json_and_clears_prompt() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel = panel(Duration::ZERO, clipboard.clone());
        type_prompt(&panel, "Daily digest").await;

        assert_eq!(panel.handle(PanelEvent::GenerateClicked).await, PanelOutcome::Generated);

        let copied = clipboard.text.lock().unwrap().clone().unwrap();
        assert!(copied.starts_with("{\n  \"name\": \"Daily digest\""));
        let state = panel.state();
        assert!(state.prompt.is_empty());
        assert!(state.instructions_visible);
        assert_eq!(state.status.unwrap().kind, StatusKind::Success);
    }

    #[tokio::test]
    async fn ctrl_enter_submits_plain_enter_does_not() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel = panel(Duration::ZERO, clipboard);
        type_prompt(&panel, "x").await;

        let plain = PanelEvent::PromptKeyDown {
            key: "Enter".into(),
            ctrl: false,
        };
        assert_eq!(panel.handle(plain).await, PanelOutcome::Updated);
        assert!(panel.state().status.is_none());

        let submit = PanelEvent::PromptKeyDown {
            key: "Enter".into(),
            ctrl: true,
        };
        assert_eq!(panel.handle(submit).await, PanelOutcome::Generated);
    }

    #[tokio::test]
    async fn failure_is_shown_with_prefix() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel = panel(Duration::ZERO, clipboard);
        type_prompt(&panel, "fail").await;

        let outcome = panel.handle(PanelEvent::GenerateClicked).await;
        assert_eq!(outcome, PanelOutcome::Failed("model refused".into()));
        let status = panel.state().status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "Error: model refused");
        assert_eq!(panel.state().prompt, "fail");
    }

    #[tokio::test]
    async fn clipboard_failure_is_reported() {
        let clipboard = Arc::new(MemoryClipboard {
            fail: true,
            ..MemoryClipboard::default()
        });
        let panel = panel(Duration::ZERO, clipboard);
        type_prompt(&panel, "x").await;

        let PanelOutcome::Failed(message) = panel.handle(PanelEvent::GenerateClicked).await else {
            panic!("expected failure");
        };
        assert!(message.contains("permission denied"));
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let (client, server) = broker::channel::<GenerationRequest, GenerationResponse>(1);
        drop(server);
        let panel = PanelController::new(client, Arc::new(MemoryClipboard::default()));
        type_prompt(&panel, "x").await;

        let outcome = panel.handle(PanelEvent::GenerateClicked).await;
        assert!(matches!(outcome, PanelOutcome::Failed(_)));
        assert!(panel.state().status.unwrap().text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn second_submit_while_busy_is_ignored() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel = panel(Duration::from_millis(150), clipboard);
        type_prompt(&panel, "slow").await;

        let first = tokio::spawn({
            let panel = panel.clone();
            async move { panel.handle(PanelEvent::GenerateClicked).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(panel.state().busy);
        assert_eq!(panel.handle(PanelEvent::GenerateClicked).await, PanelOutcome::Busy);

        assert_eq!(first.await.unwrap(), PanelOutcome::Generated);
        assert!(!panel.state().busy);
    }

    #[tokio::test]
    async fn success_status_clears_unless_replaced() {
        let clipboard = Arc::new(MemoryClipboard::default());
        let panel =
            panel(Duration::ZERO, clipboard).with_success_ttl(Duration::from_millis(40));
        type_prompt(&panel, "one").await;
        panel.handle(PanelEvent::GenerateClicked).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(panel.state().status.is_none());

        type_prompt(&panel, "two").await;
        panel.handle(PanelEvent::GenerateClicked).await;
        // Replace the success message before it expires.
        panel.handle(PanelEvent::GenerateClicked).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(panel.state().status.unwrap().text, EMPTY_PROMPT_MESSAGE);
    }

    #[tokio::test]
    async fn toggle_flips_collapsed() {
        let panel = panel(Duration::ZERO, Arc::new(MemoryClipboard::default()));
        panel.handle(PanelEvent::ToggleClicked).await;
        assert!(panel.state().collapsed);
        panel.handle(PanelEvent::ToggleClicked).await;
        assert!(!panel.state().collapsed);
    }
}
