//! The page the overlay lives in.
//!
//! The watcher and panel never touch a real document directly; they go
//! through [`HostPage`] and [`Clipboard`], which a browser bridge (or a test
//! fake) implements.

use async_trait::async_trait;

use crate::error::Result;

/// Document loading progress, as reported by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// Read and mutate access to the editor page.
pub trait HostPage: Send + Sync {
    /// Current full location (URL) of the page.
    fn location(&self) -> String;

    /// Whether at least one element matches the CSS `selector`.
    fn has_element(&self, selector: &str) -> bool;

    /// Current document title.
    fn title(&self) -> String;

    /// Current loading state.
    fn ready_state(&self) -> ReadyState;

    /// Remove every element with the given `id`; returns whether any existed.
    fn remove_element(&self, id: &str) -> bool;

    /// Append `markup` to the document body inside a container with `id`.
    fn mount(&self, id: &str, markup: &str) -> Result<()>;
}

/// System clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`.
    async fn write_text(&self, text: &str) -> Result<()>;
}
