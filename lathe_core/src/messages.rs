//! Operator advisories queued for the UI to display and dismiss.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserMessage {
    CannotFeedWithSpindleOff,
    JoystickResetRequired,
}

impl UserMessage {
    pub fn text(self) -> &'static str {
        match self {
            Self::CannotFeedWithSpindleOff => "Cannot feed with spindle off",
            Self::JoystickResetRequired => "Return joystick to neutral before continuing",
        }
    }
}

impl std::fmt::Display for UserMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Most recent advisory on top. A message already on the stack is not pushed twice.
#[derive(Debug, Default, Clone)]
pub struct MessageStack {
    items: VecDeque<UserMessage>,
}

impl MessageStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the message was already showing.
    pub fn push(&mut self, msg: UserMessage) -> bool {
        if self.items.contains(&msg) {
            return false;
        }
        tracing::info!(message = %msg, "advisory");
        self.items.push_back(msg);
        true
    }

    pub fn pop(&mut self) -> Option<UserMessage> {
        self.items.pop_back()
    }

    pub fn top(&self) -> Option<UserMessage> {
        self.items.back().copied()
    }

    pub fn remove(&mut self, msg: UserMessage) {
        self.items.retain(|m| *m != msg);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &UserMessage> {
        self.items.iter()
    }
}
