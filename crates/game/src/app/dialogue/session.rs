use tracing::info;

use super::ChatMessage;

const MIN_MESSAGE_DURATION_MS: u64 = 2000;
const MS_PER_CHARACTER: u64 = 50;

pub(crate) fn default_message_duration_ms(text: &str) -> u64 {
    let by_length = (text.chars().count() as u64).saturating_mul(MS_PER_CHARACTER);
    by_length.max(MIN_MESSAGE_DURATION_MS)
}

/// One conversation with one NPC, owned by the scene that opened it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChatSession {
    npc_name: String,
    messages: Vec<ChatMessage>,
    index: usize,
    shown_ms: f32,
}

impl ChatSession {
    /// `None` when there is nothing to say.
    pub(crate) fn start(npc_name: &str, messages: Vec<ChatMessage>) -> Option<Self> {
        if messages.is_empty() {
            return None;
        }
        let session = Self {
            npc_name: npc_name.to_string(),
            messages,
            index: 0,
            shown_ms: 0.0,
        };
        session.log_current();
        Some(session)
    }

    pub(crate) fn npc_name(&self) -> &str {
        &self.npc_name
    }

    pub(crate) fn current(&self) -> Option<&ChatMessage> {
        self.messages.get(self.index)
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.index >= self.messages.len()
    }

    /// Skips to the next line. Returns whether the session is still open.
    pub(crate) fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.index += 1;
        self.shown_ms = 0.0;
        self.log_current();
        !self.is_finished()
    }

    /// Moves on once the current line has been shown for its duration.
    pub(crate) fn tick(&mut self, fixed_dt_seconds: f32) -> bool {
        let Some(message) = self.current() else {
            return false;
        };
        let duration_ms = message
            .duration
            .unwrap_or_else(|| default_message_duration_ms(&message.text));
        self.shown_ms += fixed_dt_seconds * 1000.0;
        if self.shown_ms >= duration_ms as f32 {
            return self.advance();
        }
        true
    }

    fn log_current(&self) {
        if let Some(message) = self.current() {
            info!(
                npc = self.npc_name.as_str(),
                speaker = message.speaker.as_str(),
                text = message.text.as_str(),
                "dialogue_line"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<ChatMessage> {
        vec![
            ChatMessage::new("Sally", "Hi!", Some(1000)),
            ChatMessage::new("Sally", "Short.", None),
        ]
    }

    #[test]
    fn default_duration_has_floor_and_scales_with_length() {
        assert_eq!(default_message_duration_ms("Hi"), 2000);
        assert_eq!(default_message_duration_ms(&"a".repeat(40)), 2000);
        assert_eq!(default_message_duration_ms(&"a".repeat(100)), 5000);
    }

    #[test]
    fn empty_conversation_never_opens() {
        assert!(ChatSession::start("Sally", Vec::new()).is_none());
    }

    #[test]
    fn lines_advance_on_their_own_durations() {
        let mut session = ChatSession::start("Sally", lines()).expect("session");
        assert_eq!(session.npc_name(), "Sally");

        for _ in 0..59 {
            assert!(session.tick(1.0 / 60.0));
        }
        assert_eq!(session.current().map(|m| m.text.as_str()), Some("Hi!"));
        assert!(session.tick(2.0 / 60.0));
        assert_eq!(session.current().map(|m| m.text.as_str()), Some("Short."));

        assert!(session.tick(1.9));
        assert!(!session.tick(0.2));
        assert!(session.is_finished());
        assert!(session.current().is_none());
    }

    #[test]
    fn talk_key_skips_ahead() {
        let mut session = ChatSession::start("Sally", lines()).expect("session");
        assert!(session.advance());
        assert!(!session.advance());
        assert!(!session.advance());
        assert!(!session.tick(0.1));
    }
}
