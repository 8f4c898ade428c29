use crate::domain::UserId;

// ============== Broadcast authorization ==============

/// Whether `sender` may broadcast from a private chat.
///
/// An empty allow-list means every private sender may broadcast, which is how
/// the relay behaves when `ADMIN_USER_IDS` is unset.
pub fn may_broadcast(sender: Option<UserId>, admin_user_ids: &[i64]) -> bool {
    if admin_user_ids.is_empty() {
        return true;
    }
    let Some(sender) = sender else {
        return false;
    };
    admin_user_ids.contains(&sender.0)
}
