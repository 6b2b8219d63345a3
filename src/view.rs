//! The element contract between the widget and its host page.
//!
//! A [`Container`] mirrors the designated widget element: two text attributes the
//! controller reads, and the optional children it writes into. Children that are
//! missing are simply not drawn.

use crate::format::format_count;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tracing::warn;

pub const VOTE_TEXT_ATTR: &str = "data-vote-text";
pub const VOTED_TEXT_ATTR: &str = "data-voted-text";
pub const DEFAULT_VOTE_TEXT: &str = "Vote for this project";
pub const DEFAULT_VOTED_TEXT: &str = "Thanks for voting!";
pub const UNAVAILABLE_TEXT: &str = "Widget unavailable";
pub const VOTE_FAILED_TEXT: &str = "Failed to submit vote. Please try again.";
pub const VOTED_CLASS: &str = "voted";

const LOADING_LABEL: &str = "\u{23f3}";
const VOTED_LABEL: &str = "\u{2713}";
const VOTE_LABEL: &str = "\u{1f44d}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetState {
    Loading,
    Ready,
    Error,
}

/// Everything a render needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderState {
    pub state: WidgetState,
    pub voted: bool,
    pub vote_count: u64,
    pub visitor_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteButton {
    pub disabled: bool,
    pub label: String,
    pub classes: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Container {
    pub attributes: BTreeMap<String, String>,
    pub vote_button: Option<VoteButton>,
    pub vote_count: Option<String>,
    pub visitor_count: Option<String>,
    pub vote_text: Option<String>,
    /// Replaces all children once set.
    pub content: Option<String>,
}

impl Container {
    /// The standard widget markup, before the first render.
    pub fn widget(track_visitors: bool) -> Self {
        Self {
            attributes: BTreeMap::new(),
            vote_button: Some(VoteButton::default()),
            vote_count: Some("0".to_string()),
            visitor_count: track_visitors.then(|| "0".to_string()),
            vote_text: Some(String::new()),
            content: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<div id=\"vote-widget\"");
        for (name, value) in &self.attributes {
            html.push_str(&format!(" {name}=\"{}\"", escape(value)));
        }
        html.push('>');

        if let Some(content) = &self.content {
            html.push_str(&format!(
                "<p style=\"color: #888; font-size: 0.9rem;\">{}</p></div>",
                escape(content)
            ));
            return html;
        }

        if let Some(button) = &self.vote_button {
            let classes: Vec<&str> = std::iter::once("vote-btn")
                .chain(button.classes.iter().map(String::as_str))
                .collect();
            html.push_str(&format!(
                "<button class=\"{}\"{}>{}</button>",
                classes.join(" "),
                if button.disabled { " disabled" } else { "" },
                escape(&button.label)
            ));
        }
        if let Some(count) = &self.vote_count {
            html.push_str(&format!("<span class=\"vote-count\">{}</span>", escape(count)));
        }
        if let Some(count) = &self.visitor_count {
            html.push_str(&format!("<span class=\"visitor-count\">{}</span>", escape(count)));
        }
        if let Some(text) = &self.vote_text {
            html.push_str(&format!("<span class=\"vote-text\">{}</span>", escape(text)));
        }
        html.push_str("</div>");
        html
    }
}

/// Draws `state` onto `container`. Calling it again with the same state changes nothing.
pub fn render(state: &RenderState, container: &mut Container) {
    if let Some(count) = container.vote_count.as_mut() {
        *count = format_count(state.vote_count);
    }
    if let Some(count) = container.visitor_count.as_mut() {
        *count = format_count(state.visitor_count);
    }

    if let Some(button) = container.vote_button.as_mut() {
        if state.state == WidgetState::Loading {
            button.disabled = true;
            button.label = LOADING_LABEL.to_string();
        } else if state.voted {
            button.disabled = true;
            button.label = VOTED_LABEL.to_string();
            button.classes.insert(VOTED_CLASS.to_string());
        } else {
            button.disabled = false;
            button.label = VOTE_LABEL.to_string();
        }
    }

    let message = if state.voted {
        container
            .attribute(VOTED_TEXT_ATTR)
            .unwrap_or(DEFAULT_VOTED_TEXT)
            .to_string()
    } else {
        container
            .attribute(VOTE_TEXT_ATTR)
            .unwrap_or(DEFAULT_VOTE_TEXT)
            .to_string()
    };
    if let Some(text) = container.vote_text.as_mut() {
        *text = message;
    }
}

/// Drops every child and leaves only the unavailable message.
pub fn show_unavailable(container: &mut Container) {
    container.vote_button = None;
    container.vote_count = None;
    container.visitor_count = None;
    container.vote_text = None;
    container.content = Some(UNAVAILABLE_TEXT.to_string());
}

/// The host page: holds the widget container, if the page has one.
#[derive(Clone, Default)]
pub struct Page {
    container: Arc<Mutex<Option<Container>>>,
}

impl Page {
    pub fn new(container: Container) -> Self {
        Self {
            container: Arc::new(Mutex::new(Some(container))),
        }
    }

    /// A page without a widget container.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<Container> {
        self.container.lock().clone()
    }

    /// Runs `draw` on the container; does nothing when there is none.
    pub fn update(&self, draw: impl FnOnce(&mut Container)) {
        if let Some(container) = self.container.lock().as_mut() {
            draw(container);
        }
    }
}

/// Shows a blocking message to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Reports notifications through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "user notification");
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
