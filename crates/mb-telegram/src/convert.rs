//! Telegram update -> relay event conversion.

use teloxide::types::{Message, Update, UpdateKind, User};

use mb_core::{
    domain::{ChatId, Member, UserId},
    messaging::types::{ChatCreated, ChatKind, InboundEvent},
};

/// Convert an update into an event, if it carries a message the relay cares about.
///
/// Channel posts arrive as their own update kind and are mapped too, so the
/// relay can answer them with the unsupported-chat notice.
pub fn event_from_update(update: &Update) -> Option<InboundEvent> {
    match &update.kind {
        UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => Some(event_from_message(msg)),
        _ => None,
    }
}

pub fn event_from_message(msg: &Message) -> InboundEvent {
    let mut event = InboundEvent::new(ChatId(msg.chat.id.0), chat_kind(msg));

    if let Some(user) = msg.from() {
        event = event.with_sender(UserId(user.id.0 as i64));
    }
    if let Some(text) = msg.text() {
        event = event.with_text(text);
    }
    if let Some(created) = chat_created(msg) {
        event = event.with_chat_created(created);
    }
    if let Some(users) = msg.new_chat_members() {
        event = event.with_new_members(users.iter().map(member).collect());
    }
    if let Some(user) = msg.left_chat_member() {
        event = event.with_left_member(member(user));
    }
    event
}

fn chat_kind(msg: &Message) -> ChatKind {
    let chat = &msg.chat;
    if chat.is_private() {
        ChatKind::Private
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Channel
    }
}

fn chat_created(msg: &Message) -> Option<ChatCreated> {
    if msg.group_chat_created().is_some() {
        Some(ChatCreated::Group)
    } else if msg.super_group_chat_created().is_some() {
        Some(ChatCreated::Supergroup)
    } else if msg.channel_chat_created().is_some() {
        Some(ChatCreated::Channel)
    } else {
        None
    }
}

fn member(user: &User) -> Member {
    Member {
        id: UserId(user.id.0 as i64),
        display_name: user.first_name.clone(),
        is_bot: user.is_bot,
    }
}
