//! Audit sink: every committed workflow event is logged under the `audit`
//! tracing target.

use approval_types::ApprovalEventEnvelope;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Spawn the audit sink task; it ends when the event channel closes
pub fn spawn_audit_sink(mut rx: broadcast::Receiver<ApprovalEventEnvelope>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => record(&envelope),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(target: "audit", skipped, "Audit sink lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        tracing::debug!(target: "audit", "Audit sink stopped");
    })
}

fn record(envelope: &ApprovalEventEnvelope) {
    let payload = serde_json::to_string(&envelope.event).unwrap_or_default();
    tracing::info!(
        target: "audit",
        event_id = %envelope.id,
        event = envelope.event.name(),
        article_id = ?envelope.event.article_id().map(|id| id.to_string()),
        actor_id = ?envelope.actor.map(|id| id.to_string()),
        timestamp = %envelope.timestamp,
        payload = %payload,
        "Workflow event"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use approval_types::{ApprovalEvent, ArticleId, UserId};

    #[tokio::test]
    async fn test_sink_drains_and_stops_on_close() {
        let (tx, rx) = broadcast::channel(8);
        let handle = spawn_audit_sink(rx);

        tx.send(ApprovalEventEnvelope::new(
            ApprovalEvent::Submitted {
                article_id: ArticleId::generate(),
            },
            Some(UserId::generate()),
        ))
        .unwrap();
        drop(tx);

        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
