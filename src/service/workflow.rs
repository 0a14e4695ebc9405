//! Approval state machine. Pure decisions over a request and its leave type's
//! chain; persisting them is the caller's job.

use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    actor::Actor,
    leave_request::{LeaveRequest, LeaveStatus, NextApprover},
    leave_type::WorkflowChain,
    role::Role,
};

/// State a request moves to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Outcome {
    pub status: LeaveStatus,
    pub next_approver: NextApprover,
}

impl Outcome {
    pub fn is_final(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Where a new request starts.
pub fn start(chain: &WorkflowChain) -> Outcome {
    Outcome {
        status: LeaveStatus::PendingApproval,
        next_approver: NextApprover::Role(chain.first()),
    }
}

/// Checks shared by approve and reject. Returns the role whose turn it is.
fn authorize(request: &LeaveRequest, actor: &Actor) -> LeaveResult<Role> {
    let expected = match (request.status, request.next_approver) {
        (LeaveStatus::PendingApproval, NextApprover::Role(role)) => role,
        (status, _) => {
            return Err(LeaveError::AlreadyDecided {
                id: request.id,
                status: status.to_string(),
            });
        }
    };
    if actor.employee_id == request.employee_id {
        return Err(LeaveError::SelfApproval);
    }
    if actor.role != expected {
        return Err(LeaveError::NotYourTurn {
            expected: expected.to_string(),
        });
    }
    Ok(expected)
}

/// Advances the request one step, or approves it when the acting step is
/// the last one. The first occurrence of the current role anchors the step.
pub fn approve(request: &LeaveRequest, chain: &WorkflowChain, actor: &Actor) -> LeaveResult<Outcome> {
    let current = authorize(request, actor)?;
    if !chain.contains(current) {
        return Err(LeaveError::rule(format!(
            "approval workflow no longer contains role {current}"
        )));
    }
    Ok(match chain.next_after(current) {
        Some(next) => Outcome {
            status: LeaveStatus::PendingApproval,
            next_approver: NextApprover::Role(next),
        },
        None => Outcome {
            status: LeaveStatus::Approved,
            next_approver: NextApprover::None,
        },
    })
}

/// Rejects the request at its current step.
pub fn reject(request: &LeaveRequest, actor: &Actor) -> LeaveResult<Outcome> {
    authorize(request, actor)?;
    Ok(Outcome {
        status: LeaveStatus::Rejected,
        next_approver: NextApprover::None,
    })
}

/// Withdrawal by the owner. Pending and approved requests can be cancelled.
pub fn cancel(request: &LeaveRequest, actor: &Actor) -> LeaveResult<Outcome> {
    if actor.employee_id != request.employee_id {
        return Err(LeaveError::NotPermitted(
            "only the owner can cancel a leave request".into(),
        ));
    }
    if LeaveStatus::INACTIVE.contains(&request.status) {
        return Err(LeaveError::AlreadyDecided {
            id: request.id,
            status: request.status.to_string(),
        });
    }
    Ok(Outcome {
        status: LeaveStatus::Cancelled,
        next_approver: NextApprover::None,
    })
}
