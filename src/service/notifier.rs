use async_trait::async_trait;
use tracing::{info, warn};

use crate::model::role::Role;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// A request waits for someone holding `role`.
    ApprovalNeeded {
        request_id: u64,
        role: Role,
        department_id: u64,
    },
    /// The owner's request passed one step and moved on to `next_role`.
    Progressed {
        request_id: u64,
        employee_id: u64,
        next_role: Role,
    },
    FinalDecision {
        request_id: u64,
        employee_id: u64,
        approved: bool,
    },
}

/// Delivery of workflow notifications (mail, SMS, ...). Called after the
/// state change committed.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        match notification {
            Notification::ApprovalNeeded {
                request_id,
                role,
                department_id,
            } => info!(leave_id = request_id, %role, department_id, "Approval needed"),
            Notification::Progressed {
                request_id,
                employee_id,
                next_role,
            } => info!(leave_id = request_id, employee_id, %next_role, "Leave request advanced"),
            Notification::FinalDecision {
                request_id,
                employee_id,
                approved,
            } => info!(leave_id = request_id, employee_id, approved, "Leave request decided"),
        }
        Ok(())
    }
}

/// Sends every notification, logging failures. Never fails itself.
pub async fn dispatch(notifier: &dyn Notifier, notifications: Vec<Notification>) {
    for notification in notifications {
        if let Err(e) = notifier.notify(&notification).await {
            warn!(error = %e, ?notification, "Notification delivery failed");
        }
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingNotifier;
