use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fileset::ProjectBundle;
use crate::message::ChatMessage;

/// A conversation identity: message log plus, after generation, the
/// generated project bundle.
///
/// The message log is append-only and always opens with the system persona
/// message, so any slice of it is directly usable as a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    pub bundle: Option<ProjectBundle>,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// Create a session seeded with the backend persona as its first turn.
    pub fn new(id: impl Into<String>, persona: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages: vec![ChatMessage::system(persona)],
            bundle: None,
            created_at: now,
            last_active: now,
        }
    }

    /// Append a turn and refresh the activity timestamp.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    #[test]
    fn new_session_opens_with_system_persona() {
        let session = Session::new("s-1", "you are a developer");
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::System);
        assert!(session.bundle.is_none());
    }

    #[test]
    fn push_appends_in_order() {
        let mut session = Session::new("s-1", "persona");
        session.push(ChatMessage::user("hello"));
        session.push(ChatMessage::assistant("hi"));
        let roles: Vec<_> = session.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant]);
    }
}
