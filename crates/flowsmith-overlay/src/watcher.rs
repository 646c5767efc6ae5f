//! Presence watcher.
//!
//! Keeps exactly one generator panel mounted while the editor is open.  The
//! watcher cycles through three states:
//!
//! ```text
//!   Absent ──detected + settle──> Installing ──mounted──> Installed
//!     ^                                                      │
//!     └──────────────── location changed + settle ───────────┘
//! ```
//!
//! Leaving a location unmounts the panel, and installing removes any leftover
//! container first, so single-page navigations never stack panels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::host::{Clipboard, HostPage};
use crate::panel::{BackgroundClient, PANEL_CONTAINER_ID, PANEL_MARKUP, PanelController};
use crate::probe::DetectionProbe;

/// Timing and naming for the watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Delay between detection attempts and between navigation checks.
    pub probe_interval: Duration,
    /// Pause between detection (or navigation) and installing.
    pub settle_delay: Duration,
    /// Id of the panel container.
    pub container_id: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(1),
            settle_delay: Duration::from_secs(1),
            container_id: PANEL_CONTAINER_ID.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Absent,
    Installing,
    Installed,
}

/// Detects the editor and (re)installs the panel.
pub struct PresenceWatcher {
    page: Arc<dyn HostPage>,
    clipboard: Arc<dyn Clipboard>,
    client: BackgroundClient,
    probe: DetectionProbe,
    config: WatcherConfig,
    state: WatcherState,
    /// Location recorded when the current panel was installed.
    last_location: Option<String>,
    panel: Option<PanelController>,
}

impl PresenceWatcher {
    pub fn new(
        page: Arc<dyn HostPage>,
        clipboard: Arc<dyn Clipboard>,
        client: BackgroundClient,
    ) -> Self {
        Self {
            page,
            clipboard,
            client,
            probe: DetectionProbe::default(),
            config: WatcherConfig::default(),
            state: WatcherState::Absent,
            last_location: None,
            panel: None,
        }
    }

    /// Replace the default editor detection checks.
    pub fn with_probe(mut self, probe: DetectionProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_config(mut self, config: WatcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn last_location(&self) -> Option<&str> {
        self.last_location.as_deref()
    }

    /// The controller of the currently mounted panel, if any.
    pub fn panel(&self) -> Option<&PanelController> {
        self.panel.as_ref()
    }

    /// Perform one transition and return the resulting state.
    ///
    /// Waits `settle_delay` when detection or navigation fires; otherwise
    /// returns immediately.
    pub async fn step(&mut self) -> WatcherState {
        match self.state {
            WatcherState::Absent => {
                if let Some(signal) = self.probe.detect(self.page.as_ref()) {
                    debug!(?signal, "editor detected");
                    tokio::time::sleep(self.config.settle_delay).await;
                    self.state = WatcherState::Installing;
                }
            }
            WatcherState::Installing => self.install(),
            WatcherState::Installed => self.check_navigation().await,
        }
        self.state
    }

    fn install(&mut self) {
        let id = self.config.container_id.as_str();
        if self.page.remove_element(id) {
            debug!(id, "removed previous panel");
        }

        match self.page.mount(id, PANEL_MARKUP) {
            Ok(()) => {
                self.panel = Some(PanelController::new(
                    self.client.clone(),
                    Arc::clone(&self.clipboard),
                ));
                let location = self.page.location();
                info!(location = %location, "generator panel installed");
                self.last_location = Some(location);
                self.state = WatcherState::Installed;
            }
            Err(e) => {
                warn!(error = %e, "failed to mount panel, will retry");
                self.panel = None;
                self.state = WatcherState::Absent;
            }
        }
    }

    async fn check_navigation(&mut self) {
        let current = self.page.location();
        if self.last_location.as_deref() == Some(current.as_str()) {
            return;
        }

        debug!(from = ?self.last_location, to = %current, "navigation detected");
        tokio::time::sleep(self.config.settle_delay).await;
        // Absent means nothing is mounted; the next route may not be an editor.
        self.page.remove_element(&self.config.container_id);
        self.panel = None;
        self.last_location = Some(current);
        self.state = WatcherState::Absent;
    }

    /// Drive the watcher until `shutdown` flips to `true` or its sender is
    /// dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("presence watcher started");
        loop {
            if *shutdown.borrow() {
                break;
            }

            let state = self.step().await;
            if state == WatcherState::Installing {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.probe_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!("presence watcher stopped");
    }
}
