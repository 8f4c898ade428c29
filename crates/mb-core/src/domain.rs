/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Group ids are negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChatId(pub i64);

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name the bot is expected to carry in member lists.
pub const DEFAULT_BOT_DISPLAY_NAME: &str = "MessageBroadcaster";

/// A chat member as seen in join/leave service messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub id: UserId,
    /// Telegram `first_name`.
    pub display_name: String,
    pub is_bot: bool,
}

/// How the relay recognizes itself in member lists.
///
/// Matching on `display_name` is exact string equality. Display names are
/// neither unique nor stable, so when the platform reports our user id at
/// startup it is matched as well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: Option<UserId>,
    pub display_name: String,
}

impl BotIdentity {
    pub fn by_name(display_name: impl Into<String>) -> Self {
        Self {
            id: None,
            display_name: display_name.into(),
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn is_self(&self, member: &Member) -> bool {
        if member.display_name == self.display_name {
            return true;
        }
        self.id.is_some_and(|id| id == member.id)
    }
}

impl Default for BotIdentity {
    fn default() -> Self {
        Self::by_name(DEFAULT_BOT_DISPLAY_NAME)
    }
}

/// Chat metadata returned by the platform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub title: Option<String>,
}
