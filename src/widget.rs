//! Conversation state for a single chat panel.
//!
//! The widget performs no I/O. [`Widget::submit`] hands back the request to
//! send, [`Widget::receive`] consumes the decoded reply, and
//! [`Widget::reveal`] publishes a successful reply once the display delay has
//! elapsed. The caller owns the network call and the timer.

use crate::input::InputBuffer;
use crate::protocol::{ChatOutcome, ChatRequest, UNAVAILABLE_SENTINEL};

pub const SUGGESTIONS: [&str; 4] = [
    "What is Physical AI?",
    "How many chapters are there?",
    "Explain robot locomotion",
    "Summarize chapter 5",
];

pub const CONFIGURATION_HINT: &str = "The chatbot is not configured correctly. Please make sure you have added your Gemini API key to the .env file in the backend.";

pub const GENERIC_FAILURE: &str = "Something went wrong!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    sender: Sender,
}

impl Message {
    fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::User,
        }
    }

    fn agent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender: Sender::Agent,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }
}

/// Server-side conversation handle. Opaque to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    id: Option<String>,
}

impl Session {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Takes the id from a reply. Replies without one, or with an empty one,
    /// leave the current id alone.
    pub fn adopt(&mut self, id: Option<String>) {
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            self.id = Some(id);
        }
    }

    pub fn request_for(&self, message: String) -> ChatRequest {
        ChatRequest {
            message,
            session_id: self.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Submitting,
    AwaitingDisplay { reply: String },
}

/// What the caller has to do after handing a reply to [`Widget::receive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// Start the display timer, then call [`Widget::reveal`].
    Deferred,
    /// The reply was a failure and is already in the history.
    Shown,
    /// No request was in flight.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct Widget {
    messages: Vec<Message>,
    input: InputBuffer,
    session: Session,
    phase: Phase,
    highlighted: usize,
}

impl Default for Widget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            input: InputBuffer::new(),
            session: Session::default(),
            phase: Phase::Idle,
            highlighted: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    /// The input is read-only while a request is pending.
    pub fn input_mut(&mut self) -> Option<&mut InputBuffer> {
        if self.is_pending() {
            None
        } else {
            Some(&mut self.input)
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn is_typing(&self) -> bool {
        matches!(
            self.phase,
            Phase::Submitting | Phase::AwaitingDisplay { .. }
        )
    }

    pub fn can_submit(&self) -> bool {
        !self.is_pending() && !self.input.is_blank()
    }

    /// Submits whatever the input buffer holds.
    pub fn submit_input(&mut self) -> Option<ChatRequest> {
        if !self.can_submit() {
            return None;
        }
        let text = self.input.take();
        self.submit(text)
    }

    /// Records the user message and returns the one request to send for it.
    ///
    /// Blank text, or a call while a request is pending, changes nothing.
    pub fn submit(&mut self, text: String) -> Option<ChatRequest> {
        if text.trim().is_empty() || self.is_pending() {
            return None;
        }

        self.messages.push(Message::user(text.clone()));
        self.input.clear();
        self.phase = Phase::Submitting;
        tracing::debug!(history = self.messages.len(), "submitting message");

        Some(self.session.request_for(text))
    }

    pub fn receive(&mut self, outcome: ChatOutcome) -> Received {
        if self.phase != Phase::Submitting {
            tracing::debug!("dropping reply with no request in flight");
            return Received::Ignored;
        }

        match outcome {
            ChatOutcome::Success {
                response,
                session_id,
            } => {
                self.session.adopt(session_id);
                let reply = if response == UNAVAILABLE_SENTINEL {
                    CONFIGURATION_HINT.to_string()
                } else {
                    response
                };
                self.phase = Phase::AwaitingDisplay { reply };
                Received::Deferred
            }
            ChatOutcome::Failure { detail } => {
                let detail = detail.unwrap_or_else(|| GENERIC_FAILURE.to_string());
                self.messages.push(Message::agent(format!("Error: {detail}")));
                self.phase = Phase::Idle;
                Received::Shown
            }
        }
    }

    /// Appends the reply held back by the display delay. Returns false if
    /// nothing was waiting.
    pub fn reveal(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::AwaitingDisplay { reply } => {
                self.messages.push(Message::agent(reply));
                true
            }
            other => {
                self.phase = other;
                false
            }
        }
    }

    pub fn shows_suggestions(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn highlighted_suggestion(&self) -> usize {
        self.highlighted
    }

    pub fn highlight_next(&mut self) {
        self.highlighted = (self.highlighted + 1) % SUGGESTIONS.len();
    }

    pub fn highlight_prev(&mut self) {
        self.highlighted = (self.highlighted + SUGGESTIONS.len() - 1) % SUGGESTIONS.len();
    }

    /// Copies a suggestion into the input buffer. Never submits.
    pub fn choose_suggestion(&mut self, idx: usize) -> bool {
        if !self.shows_suggestions() || self.is_pending() {
            return false;
        }
        let Some(text) = SUGGESTIONS.get(idx) else {
            return false;
        };
        self.highlighted = idx;
        self.input.set(text);
        true
    }

    pub fn choose_highlighted(&mut self) -> bool {
        self.choose_suggestion(self.highlighted)
    }
}
