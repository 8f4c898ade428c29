use crate::domain::{ChatId, Member, UserId};

/// Kind of chat an update originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group_like(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Service message announcing that a chat was just created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatCreated {
    Group,
    Supergroup,
    Channel,
}

/// Cross-platform inbound event.
///
/// Telegram-specific fields stay in the Telegram adapter. Absent payload
/// fields are represented as `None` or empty, never as errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub sender: Option<UserId>,
    pub text: Option<String>,
    pub chat_created: Option<ChatCreated>,
    pub new_members: Vec<Member>,
    pub left_member: Option<Member>,
}

impl InboundEvent {
    /// An event with only the chat set; builders fill in the payload.
    pub fn new(chat_id: ChatId, chat_kind: ChatKind) -> Self {
        Self {
            chat_id,
            chat_kind,
            sender: None,
            text: None,
            chat_created: None,
            new_members: Vec::new(),
            left_member: None,
        }
    }

    pub fn with_sender(mut self, sender: UserId) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_chat_created(mut self, created: ChatCreated) -> Self {
        self.chat_created = Some(created);
        self
    }

    pub fn with_new_members(mut self, members: Vec<Member>) -> Self {
        self.new_members = members;
        self
    }

    pub fn with_left_member(mut self, member: Member) -> Self {
        self.left_member = Some(member);
        self
    }
}
