use tracing::{info, warn};

use crate::{messaging::port::PlatformClient, ports::ChatRegistry, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub checked: usize,
    pub removed: usize,
}

/// Startup pass: make sure the table exists, then drop every registered chat
/// the platform can no longer resolve.
///
/// Any storage error aborts the pass. A failed lookup only removes that entry.
pub async fn reconcile(
    registry: &dyn ChatRegistry,
    platform: &dyn PlatformClient,
) -> Result<ReconcileReport> {
    registry.ensure_schema().await?;

    let chats = registry.list_all().await?;
    let mut report = ReconcileReport {
        checked: chats.len(),
        removed: 0,
    };

    for chat_id in chats {
        if let Err(e) = platform.get_chat(chat_id).await {
            warn!(chat_id = chat_id.0, error = %e, "chat unreachable, unregistering");
            registry.unregister(chat_id).await?;
            report.removed += 1;
        }
    }

    info!(
        checked = report.checked,
        removed = report.removed,
        "registry reconciled"
    );
    Ok(report)
}
