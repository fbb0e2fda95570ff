//! Conversation-related types.

use std::ops::Deref;

use chatkit_model::Message;

/// The ordered message history of one session.
///
/// The history only grows: messages are appended by the agent and never
/// edited or removed. It is sent back to the model as-is on every round
/// trip.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Creates a conversation, seeded with the developer instructions if
    /// there are any.
    pub fn new(developer_prompt: Option<&str>) -> Self {
        let messages = developer_prompt
            .map(|prompt| vec![Message::Developer(prompt.to_owned())])
            .unwrap_or_default();
        Self { messages }
    }

    /// Returns all messages in order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: Message) {
        self.messages.push(msg);
    }
}

impl Deref for Conversation {
    type Target = [Message];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.messages
    }
}
