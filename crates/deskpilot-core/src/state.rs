//! The persisted application document.

use crate::records::{AgentRecord, ResearchJobRecord};
use deskpilot_config::Settings;
use deskpilot_protocol::ChatSession;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything the application persists, as one JSON document.
///
/// Unknown ids and missing fields heal on load through serde defaults;
/// the active-chat invariant heals on every read via
/// [`ensure_active_chat`].
///
/// [`ensure_active_chat`]: AppState::ensure_active_chat
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub settings: Settings,
    pub chats: Vec<ChatSession>,
    pub active_chat_id: Option<Uuid>,
    pub agents: Vec<AgentRecord>,
    pub research_jobs: Vec<ResearchJobRecord>,
}

impl AppState {
    /// Restore the invariant that exactly one chat is active: create a
    /// chat if none exist, and repoint a dangling active id at the
    /// first chat.
    pub fn ensure_active_chat(&mut self) {
        if self.chats.is_empty() {
            let chat = ChatSession::default();
            self.active_chat_id = Some(chat.id);
            self.chats.insert(0, chat);
        }
        let active_exists = self
            .active_chat_id
            .is_some_and(|id| self.chats.iter().any(|chat| chat.id == id));
        if !active_exists {
            self.active_chat_id = Some(self.chats[0].id);
        }
    }

    /// The active chat, creating or repointing as needed first.
    pub fn active_chat_mut(&mut self) -> &mut ChatSession {
        self.ensure_active_chat();
        let id = self.active_chat_id.expect("active chat id set");
        self.chats
            .iter_mut()
            .find(|chat| chat.id == id)
            .expect("active chat present")
    }

    pub fn chat_mut(&mut self, id: Uuid) -> Option<&mut ChatSession> {
        self.chats.iter_mut().find(|chat| chat.id == id)
    }

    pub fn agent_mut(&mut self, id: Uuid) -> Option<&mut AgentRecord> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }

    pub fn research_job_mut(&mut self, id: Uuid) -> Option<&mut ResearchJobRecord> {
        self.research_jobs.iter_mut().find(|job| job.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use deskpilot_protocol::ChatSession;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    #[test]
    fn ensure_active_chat_creates_one_when_empty() {
        let mut state = AppState::default();
        state.ensure_active_chat();
        assert_eq!(state.chats.len(), 1);
        assert_eq!(state.active_chat_id, Some(state.chats[0].id));
    }

    #[test]
    fn dangling_active_id_repoints_to_first_chat() {
        let mut state = AppState::default();
        state.chats.push(ChatSession::new("kept"));
        state.active_chat_id = Some(Uuid::new_v4());
        state.ensure_active_chat();
        assert_eq!(state.chats.len(), 1);
        assert_eq!(state.active_chat_id, Some(state.chats[0].id));
    }

    #[test]
    fn valid_active_id_is_left_alone() {
        let mut state = AppState::default();
        state.chats.push(ChatSession::new("first"));
        state.chats.push(ChatSession::new("second"));
        let second = state.chats[1].id;
        state.active_chat_id = Some(second);
        state.ensure_active_chat();
        assert_eq!(state.active_chat_id, Some(second));
    }

    #[test]
    fn state_deserializes_from_empty_document() {
        let state: AppState = serde_json::from_str("{}").expect("state");
        assert_eq!(state.chats.is_empty(), true);
        assert_eq!(state.active_chat_id, None);
        assert_eq!(state.settings.temperature, 0.2);
    }
}
