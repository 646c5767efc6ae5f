//! Editor detection.
//!
//! [`DetectionProbe::detect`] decides whether the page looks like the
//! workflow editor.  Signals are checked in a fixed order and the first one
//! that fires is reported.

use regex::Regex;
use tracing::trace;
use url::Url;

use crate::error::Result;
use crate::host::{HostPage, ReadyState};

/// Container selectors the editor is known to render.
pub const DEFAULT_SELECTORS: &[&str] = &[
    r#"[data-test-id="canvas"]"#,
    ".node-view",
    "#app",
    ".workflow-canvas",
];

/// Pattern matched against the location path.
pub const DEFAULT_URL_PATTERN: &str = "workflow";

/// Substring looked for in the document title.
pub const DEFAULT_TITLE_MARKER: &str = "n8n";

/// The reason a probe decided the editor is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// An element matched this selector.
    Selector(String),
    /// The location path matched the URL pattern.
    UrlPattern,
    /// The title contained the marker.
    TitleMarker,
    /// The document finished loading.
    DocumentReady,
}

/// Ordered set of editor detection checks.
#[derive(Debug, Clone)]
pub struct DetectionProbe {
    selectors: Vec<String>,
    url_pattern: Option<Regex>,
    title_marker: String,
    accept_ready_document: bool,
}

impl Default for DetectionProbe {
    fn default() -> Self {
        Self {
            selectors: DEFAULT_SELECTORS.iter().map(|s| (*s).to_owned()).collect(),
            url_pattern: Regex::new(DEFAULT_URL_PATTERN).ok(),
            title_marker: DEFAULT_TITLE_MARKER.to_owned(),
            accept_ready_document: true,
        }
    }
}

impl DetectionProbe {
    /// Build a probe from custom signals.
    pub fn new(
        selectors: impl IntoIterator<Item = impl Into<String>>,
        url_pattern: &str,
        title_marker: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            selectors: selectors.into_iter().map(Into::into).collect(),
            url_pattern: Some(Regex::new(url_pattern)?),
            title_marker: title_marker.into(),
            accept_ready_document: true,
        })
    }

    /// Whether a fully loaded document counts as detection on its own.
    pub fn with_ready_document(mut self, accept: bool) -> Self {
        self.accept_ready_document = accept;
        self
    }

    /// Run the checks against `page`.
    pub fn detect(&self, page: &dyn HostPage) -> Option<Signal> {
        if let Some(selector) = self.selectors.iter().find(|s| page.has_element(s)) {
            return Some(Signal::Selector(selector.clone()));
        }

        if let Some(pattern) = &self.url_pattern {
            if pattern.is_match(&location_path(&page.location())) {
                return Some(Signal::UrlPattern);
            }
        }

        if !self.title_marker.is_empty() && page.title().contains(&self.title_marker) {
            return Some(Signal::TitleMarker);
        }

        if self.accept_ready_document && page.ready_state() == ReadyState::Complete {
            return Some(Signal::DocumentReady);
        }

        trace!("editor not detected yet");
        None
    }
}

/// The path component of `location`, or the whole string if it is not a URL.
fn location_path(location: &str) -> String {
    Url::parse(location)
        .map(|url| url.path().to_owned())
        .unwrap_or_else(|_| location.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticPage {
        location: String,
        elements: Vec<&'static str>,
        title: String,
        ready: ReadyState,
    }

    impl StaticPage {
        fn blank() -> Self {
            Self {
                location: "https://example.com/".into(),
                elements: Vec::new(),
                title: String::new(),
                ready: ReadyState::Loading,
            }
        }
    }

    impl HostPage for StaticPage {
        fn location(&self) -> String {
            self.location.clone()
        }
        fn has_element(&self, selector: &str) -> bool {
            self.elements.contains(&selector)
        }
        fn title(&self) -> String {
            self.title.clone()
        }
        fn ready_state(&self) -> ReadyState {
            self.ready
        }
        fn remove_element(&self, _id: &str) -> bool {
            false
        }
        fn mount(&self, _id: &str, _markup: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn nothing_detected_on_loading_blank_page() {
        assert_eq!(DetectionProbe::default().detect(&StaticPage::blank()), None);
    }

    #[test]
    fn selectors_take_precedence() {
        let page = StaticPage {
            elements: vec![".node-view", "#app"],
            title: "n8n".into(),
            ..StaticPage::blank()
        };
        assert_eq!(
            DetectionProbe::default().detect(&page),
            Some(Signal::Selector(".node-view".into()))
        );
    }

    #[test]
    fn url_pattern_checks_path_only() {
        let page = StaticPage {
            location: "https://editor.local/workflow/42".into(),
            ..StaticPage::blank()
        };
        assert_eq!(DetectionProbe::default().detect(&page), Some(Signal::UrlPattern));

        let host_only = StaticPage {
            location: "https://workflow.example.com/home".into(),
            ..StaticPage::blank()
        };
        assert_eq!(DetectionProbe::default().detect(&host_only), None);
    }

    #[test]
    fn title_then_readiness() {
        let titled = StaticPage {
            title: "My flow - n8n".into(),
            ready: ReadyState::Complete,
            ..StaticPage::blank()
        };
        assert_eq!(DetectionProbe::default().detect(&titled), Some(Signal::TitleMarker));

        let ready = StaticPage {
            ready: ReadyState::Complete,
            ..StaticPage::blank()
        };
        assert_eq!(DetectionProbe::default().detect(&ready), Some(Signal::DocumentReady));
        assert_eq!(
            DetectionProbe::default()
                .with_ready_document(false)
                .detect(&ready),
            None
        );
    }

    #[test]
    fn custom_probe_rejects_bad_pattern() {
        assert!(DetectionProbe::new(["#x"], "(unclosed", "n8n").is_err());
        let probe = DetectionProbe::new(["#x"], r"^/editor/\d+$", "").unwrap();
        let page = StaticPage {
            location: "http://localhost:5678/editor/7".into(),
            ..StaticPage::blank()
        };
        assert_eq!(probe.detect(&page), Some(Signal::UrlPattern));
    }
}
