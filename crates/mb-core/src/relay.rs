//! Event classification: decide what each inbound event means for the
//! registry and who receives a broadcast.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    domain::{BotIdentity, ChatId},
    messaging::{
        port::PlatformClient,
        types::{ChatKind, InboundEvent},
    },
    ports::ChatRegistry,
    security::may_broadcast,
    Result,
};

/// Sent back to chats of a kind the relay does not serve.
pub const UNSUPPORTED_CHAT_NOTICE: &str = "Unknown chat type. Pls contact with developer.";

/// Sent back to private senders missing from the admin allow-list.
pub const NOT_AUTHORIZED_NOTICE: &str =
    "You are not allowed to broadcast. Contact the bot owner for access.";

/// Outcome of one broadcast.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: Vec<ChatId>,
}

/// What the relay did with an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Registered(ChatId),
    Unregistered(ChatId),
    Broadcast(BroadcastReport),
    UnsupportedNotice(ChatId),
    Rejected(ChatId),
    Ignored,
}

/// Handles shared by the classifier and the reconciler.
///
/// Built once at startup and read-only afterwards.
pub struct Relay {
    registry: Arc<dyn ChatRegistry>,
    platform: Arc<dyn PlatformClient>,
    identity: BotIdentity,
    admin_user_ids: Vec<i64>,
}

impl Relay {
    pub fn new(
        registry: Arc<dyn ChatRegistry>,
        platform: Arc<dyn PlatformClient>,
        identity: BotIdentity,
    ) -> Self {
        Self {
            registry,
            platform,
            identity,
            admin_user_ids: Vec::new(),
        }
    }

    /// Restrict broadcasting to these Telegram user ids. Empty = anyone.
    pub fn with_admins(mut self, admin_user_ids: Vec<i64>) -> Self {
        self.admin_user_ids = admin_user_ids;
        self
    }

    /// Classify one event and apply it.
    ///
    /// Storage failures are returned; platform failures are logged and
    /// reflected in the returned actions.
    pub async fn handle(&self, event: &InboundEvent) -> Result<Vec<Action>> {
        match event.chat_kind {
            ChatKind::Group | ChatKind::Supergroup => self.handle_membership(event).await,
            ChatKind::Private => Ok(vec![self.handle_private(event).await?]),
            ChatKind::Channel => Ok(vec![self.notify_unsupported(event.chat_id).await]),
        }
    }

    async fn handle_membership(&self, event: &InboundEvent) -> Result<Vec<Action>> {
        let chat_id = event.chat_id;
        let mut actions = Vec::new();

        if let Some(created) = event.chat_created {
            self.registry.register(chat_id).await?;
            info!(chat_id = chat_id.0, ?created, "registered newly created chat");
            actions.push(Action::Registered(chat_id));
        }

        if event.new_members.iter().any(|m| self.identity.is_self(m)) {
            self.registry.register(chat_id).await?;
            info!(chat_id = chat_id.0, "registered chat after bot was added");
            actions.push(Action::Registered(chat_id));
        }

        if event
            .left_member
            .as_ref()
            .is_some_and(|m| self.identity.is_self(m))
        {
            self.registry.unregister(chat_id).await?;
            info!(chat_id = chat_id.0, "unregistered chat after bot left");
            actions.push(Action::Unregistered(chat_id));
        }

        if actions.is_empty() {
            debug!(chat_id = chat_id.0, "group event without membership change");
            actions.push(Action::Ignored);
        }
        Ok(actions)
    }

    async fn handle_private(&self, event: &InboundEvent) -> Result<Action> {
        if !may_broadcast(event.sender, &self.admin_user_ids) {
            warn!(
                chat_id = event.chat_id.0,
                sender = ?event.sender,
                "private message from non-admin, not broadcasting"
            );
            if let Err(e) = self
                .platform
                .send_text(event.chat_id, NOT_AUTHORIZED_NOTICE)
                .await
            {
                warn!(chat_id = event.chat_id.0, error = %e, "failed to send rejection notice");
            }
            return Ok(Action::Rejected(event.chat_id));
        }

        let Some(text) = event.text.as_deref() else {
            debug!(chat_id = event.chat_id.0, "private message without text, skipping");
            return Ok(Action::Ignored);
        };

        Ok(Action::Broadcast(self.broadcast(text).await?))
    }

    /// Send `text` to every registered chat. Each send is independent.
    pub async fn broadcast(&self, text: &str) -> Result<BroadcastReport> {
        let targets = self.registry.list_all().await?;
        let mut report = BroadcastReport {
            attempted: targets.len(),
            ..Default::default()
        };

        for chat_id in targets {
            match self.platform.send_text(chat_id, text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(chat_id = chat_id.0, error = %e, "broadcast send failed");
                    report.failed.push(chat_id);
                }
            }
        }

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast finished"
        );
        Ok(report)
    }

    async fn notify_unsupported(&self, chat_id: ChatId) -> Action {
        if let Err(e) = self
            .platform
            .send_text(chat_id, UNSUPPORTED_CHAT_NOTICE)
            .await
        {
            warn!(chat_id = chat_id.0, error = %e, "failed to send unsupported-chat notice");
        }
        Action::UnsupportedNotice(chat_id)
    }
}

/// Counters reported when the event loop ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventLoopStats {
    pub handled: usize,
    pub dropped: usize,
}

/// Drain `events` one at a time, in delivery order, until every sender is gone.
///
/// A failing event is logged and dropped; it never stops the loop.
pub async fn run_event_loop(
    relay: &Relay,
    mut events: mpsc::UnboundedReceiver<InboundEvent>,
) -> EventLoopStats {
    let mut stats = EventLoopStats::default();

    while let Some(event) = events.recv().await {
        match relay.handle(&event).await {
            Ok(actions) => {
                stats.handled += 1;
                debug!(chat_id = event.chat_id.0, ?actions, "event handled");
            }
            Err(e) => {
                stats.dropped += 1;
                error!(chat_id = event.chat_id.0, error = %e, "dropping event");
            }
        }
    }

    info!(
        handled = stats.handled,
        dropped = stats.dropped,
        "event loop stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{
        domain::{Member, UserId},
        messaging::types::ChatCreated,
        registry::MemoryChatRegistry,
        testing::{BrokenRegistry, FakePlatform},
    };

    fn relay(registry: Arc<dyn ChatRegistry>, platform: Arc<FakePlatform>) -> Relay {
        Relay::new(registry, platform, BotIdentity::default())
    }

    fn bot_member() -> Member {
        Member {
            id: UserId(9000),
            display_name: "MessageBroadcaster".to_string(),
            is_bot: true,
        }
    }

    fn human(name: &str) -> Member {
        Member {
            id: UserId(1),
            display_name: name.to_string(),
            is_bot: false,
        }
    }

    async fn sorted_ids(registry: &dyn ChatRegistry) -> Vec<i64> {
        let mut ids: Vec<i64> = registry
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.0)
            .collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn private_text_is_sent_to_every_registered_chat() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([
            ChatId(100),
            ChatId(200),
            ChatId(300),
        ]));
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry, platform.clone());

        let event = InboundEvent::new(ChatId(7), ChatKind::Private).with_text("hello");
        let actions = relay.handle(&event).await.unwrap();

        let mut sent = platform.sent();
        sent.sort();
        assert_eq!(
            sent,
            vec![
                (ChatId(100), "hello".to_string()),
                (ChatId(200), "hello".to_string()),
                (ChatId(300), "hello".to_string()),
            ]
        );
        assert_eq!(
            actions,
            vec![Action::Broadcast(BroadcastReport {
                attempted: 3,
                delivered: 3,
                failed: vec![],
            })]
        );
    }

    #[tokio::test]
    async fn failed_send_does_not_stop_the_broadcast() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([
            ChatId(1),
            ChatId(2),
            ChatId(3),
        ]));
        let platform = Arc::new(FakePlatform::new().failing_sends_to([2]));
        let relay = relay(registry, platform.clone());

        let report = relay.broadcast("hi").await.unwrap();

        assert_eq!(platform.sent().len(), 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, vec![ChatId(2)]);
    }

    #[tokio::test]
    async fn supergroup_creation_registers_once_without_sending() {
        let registry = Arc::new(MemoryChatRegistry::new());
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry.clone(), platform.clone());

        let event = InboundEvent::new(ChatId(555), ChatKind::Supergroup)
            .with_chat_created(ChatCreated::Supergroup);
        let actions = relay.handle(&event).await.unwrap();

        assert_eq!(actions, vec![Action::Registered(ChatId(555))]);
        assert_eq!(sorted_ids(registry.as_ref()).await, vec![555]);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn bot_leaving_unregisters_chat() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([ChatId(777), ChatId(1)]));
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry.clone(), platform.clone());

        let event =
            InboundEvent::new(ChatId(777), ChatKind::Group).with_left_member(bot_member());
        relay.handle(&event).await.unwrap();

        assert_eq!(sorted_ids(registry.as_ref()).await, vec![1]);
        assert!(platform.sent().is_empty());
    }

    #[rstest]
    #[case::bot_added(vec![human("Alice"), bot_member()], true)]
    #[case::only_humans(vec![human("Alice"), human("Bob")], false)]
    #[case::near_miss_name(vec![human("MessageBroadcaster2")], false)]
    #[case::no_members(vec![], false)]
    #[tokio::test]
    async fn new_members_register_only_when_bot_joins(
        #[case] members: Vec<Member>,
        #[case] registered: bool,
    ) {
        let registry = Arc::new(MemoryChatRegistry::new());
        let relay = relay(registry.clone(), Arc::new(FakePlatform::new()));

        let event = InboundEvent::new(ChatId(-42), ChatKind::Group).with_new_members(members);
        relay.handle(&event).await.unwrap();

        let expected = if registered { vec![-42] } else { vec![] };
        assert_eq!(sorted_ids(registry.as_ref()).await, expected);
    }

    #[tokio::test]
    async fn human_leaving_keeps_chat_registered() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([ChatId(-5)]));
        let relay = relay(registry.clone(), Arc::new(FakePlatform::new()));

        let event = InboundEvent::new(ChatId(-5), ChatKind::Supergroup)
            .with_left_member(human("Alice"))
            .with_text("bye");
        let actions = relay.handle(&event).await.unwrap();

        assert_eq!(actions, vec![Action::Ignored]);
        assert_eq!(sorted_ids(registry.as_ref()).await, vec![-5]);
    }

    #[tokio::test]
    async fn checks_are_independent_within_one_event() {
        let registry = Arc::new(MemoryChatRegistry::new());
        let relay = relay(registry.clone(), Arc::new(FakePlatform::new()));

        let event = InboundEvent::new(ChatId(-9), ChatKind::Group)
            .with_chat_created(ChatCreated::Group)
            .with_new_members(vec![bot_member()])
            .with_left_member(bot_member());
        let actions = relay.handle(&event).await.unwrap();

        assert_eq!(
            actions,
            vec![
                Action::Registered(ChatId(-9)),
                Action::Registered(ChatId(-9)),
                Action::Unregistered(ChatId(-9)),
            ]
        );
        assert!(sorted_ids(registry.as_ref()).await.is_empty());
    }

    #[tokio::test]
    async fn stable_bot_id_matches_renamed_bot() {
        let registry = Arc::new(MemoryChatRegistry::new());
        let relay = Relay::new(
            registry.clone(),
            Arc::new(FakePlatform::new()),
            BotIdentity::default().with_id(UserId(9000)),
        );

        let mut renamed = bot_member();
        renamed.display_name = "Broadcaster v2".to_string();
        let event = InboundEvent::new(ChatId(-3), ChatKind::Group).with_new_members(vec![renamed]);
        relay.handle(&event).await.unwrap();

        assert_eq!(sorted_ids(registry.as_ref()).await, vec![-3]);
    }

    #[tokio::test]
    async fn channel_gets_one_notice_and_no_registry_change() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([ChatId(1)]));
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry.clone(), platform.clone());

        let event = InboundEvent::new(ChatId(-1001), ChatKind::Channel)
            .with_chat_created(ChatCreated::Channel)
            .with_text("post");
        let actions = relay.handle(&event).await.unwrap();

        assert_eq!(actions, vec![Action::UnsupportedNotice(ChatId(-1001))]);
        assert_eq!(
            platform.sent(),
            vec![(ChatId(-1001), UNSUPPORTED_CHAT_NOTICE.to_string())]
        );
        assert_eq!(sorted_ids(registry.as_ref()).await, vec![1]);
    }

    #[tokio::test]
    async fn non_admin_private_message_is_rejected() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([ChatId(1)]));
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry, platform.clone()).with_admins(vec![10]);

        let event = InboundEvent::new(ChatId(11), ChatKind::Private)
            .with_sender(UserId(11))
            .with_text("spam");
        let actions = relay.handle(&event).await.unwrap();

        assert_eq!(actions, vec![Action::Rejected(ChatId(11))]);
        assert_eq!(
            platform.sent(),
            vec![(ChatId(11), NOT_AUTHORIZED_NOTICE.to_string())]
        );
    }

    #[tokio::test]
    async fn private_message_without_text_is_ignored() {
        let registry = Arc::new(MemoryChatRegistry::with_chats([ChatId(1)]));
        let platform = Arc::new(FakePlatform::new());
        let relay = relay(registry, platform.clone());

        let event = InboundEvent::new(ChatId(7), ChatKind::Private);
        assert_eq!(relay.handle(&event).await.unwrap(), vec![Action::Ignored]);
        assert!(platform.sent().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_is_returned_to_caller() {
        let relay = relay(Arc::new(BrokenRegistry), Arc::new(FakePlatform::new()));

        let event = InboundEvent::new(ChatId(7), ChatKind::Private).with_text("hello");
        let err = relay.handle(&event).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn event_loop_drops_failed_events_and_keeps_going() {
        let relay = relay(Arc::new(BrokenRegistry), Arc::new(FakePlatform::new()));
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(InboundEvent::new(ChatId(1), ChatKind::Private).with_text("a"))
            .unwrap();
        tx.send(InboundEvent::new(ChatId(-2), ChatKind::Channel))
            .unwrap();
        drop(tx);

        let stats = run_event_loop(&relay, rx).await;
        assert_eq!(
            stats,
            EventLoopStats {
                handled: 1,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn event_loop_applies_events_in_delivery_order() {
        let registry = Arc::new(MemoryChatRegistry::new());
        let relay = relay(registry.clone(), Arc::new(FakePlatform::new()));
        let (tx, rx) = mpsc::unbounded_channel();

        tx.send(InboundEvent::new(ChatId(-8), ChatKind::Group).with_new_members(vec![bot_member()]))
            .unwrap();
        tx.send(InboundEvent::new(ChatId(-8), ChatKind::Group).with_left_member(bot_member()))
            .unwrap();
        drop(tx);

        let stats = run_event_loop(&relay, rx).await;
        assert_eq!(stats.handled, 2);
        assert!(sorted_ids(registry.as_ref()).await.is_empty());
    }
}
