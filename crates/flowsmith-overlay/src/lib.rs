//! Editor overlay for Flowsmith.
//!
//! The foreground half of the system.  It runs next to the workflow editor,
//! holds no credentials, and reaches the background generation service only
//! through a [`BackgroundClient`].
//!
//! - [`host`] -- The [`HostPage`] and [`Clipboard`] seams.
//! - [`probe`] -- Decides whether the page is the editor.
//! - [`panel`] -- Panel markup and its event controller.
//! - [`watcher`] -- Keeps one panel mounted across in-page navigation.
//! - [`error`] -- Overlay error types.

pub mod error;
pub mod host;
pub mod panel;
pub mod probe;
pub mod watcher;

pub use error::{OverlayError, Result};
pub use host::{Clipboard, HostPage, ReadyState};
pub use panel::{
    BackgroundClient, PANEL_CONTAINER_ID, PanelController, PanelEvent, PanelOutcome, PanelState,
    Status, StatusKind,
};
pub use probe::{DetectionProbe, Signal};
pub use watcher::{PresenceWatcher, WatcherConfig, WatcherState};
