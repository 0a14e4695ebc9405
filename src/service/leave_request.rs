use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::clock::Clock;
use super::duration::DurationCalculator;
use super::entitlement::{EntitlementLedger, month_window};
use super::notifier::{Notification, Notifier, dispatch};
use super::overlap::OverlapValidator;
use super::workflow::{self, Outcome};
use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    actor::Actor,
    employee::Employee,
    leave_request::{ApprovalHistory, LeaveRequest, LeaveStatus, NewApprovalHistory, NewLeaveRequest},
    leave_type::{LeaveType, RequestUnit},
    transition::{LedgerAdjustment, LedgerChange, Transition},
};
use crate::store::LeaveStore;
use crate::utils::{keyed_lock::KeyedLocks, leave_type_cache::LeaveTypeCache};

/// Statuses that count against monthly request policies.
const COUNTED: [LeaveStatus; 2] = [LeaveStatus::Approved, LeaveStatus::PendingApproval];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = 1)]
    pub leave_type_id: u64,
    #[schema(value_type = Option<String>, format = "date-time", example = "2026-03-02T09:00:00")]
    pub start: Option<NaiveDateTime>,
    #[schema(value_type = Option<String>, format = "date-time", example = "2026-03-04T18:00:00")]
    pub end: Option<NaiveDateTime>,
    #[schema(example = "Family visit")]
    pub reason: Option<String>,
    /// Reference of an uploaded supporting document.
    pub document_ref: Option<String>,
}

/// Create, decide and withdraw leave requests.
pub struct LeaveRequestService {
    store: Arc<dyn LeaveStore>,
    types: Arc<LeaveTypeCache>,
    ledger: EntitlementLedger,
    durations: DurationCalculator,
    overlap: OverlapValidator,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    locks: KeyedLocks,
}

impl LeaveRequestService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        types: Arc<LeaveTypeCache>,
        ledger: EntitlementLedger,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            durations: DurationCalculator::new(store.clone()),
            overlap: OverlapValidator::new(store.clone()),
            store,
            types,
            ledger,
            notifier,
            clock,
            locks: KeyedLocks::new(),
        }
    }

    async fn employee(&self, employee_id: u64) -> LeaveResult<Employee> {
        self.store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("employee {employee_id}")))
    }

    async fn request(&self, request_id: u64) -> LeaveResult<LeaveRequest> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("leave request {request_id}")))
    }

    async fn duration_of(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> LeaveResult<Decimal> {
        match leave_type.request_unit {
            RequestUnit::Hour => self.durations.request_hours(start, end).await,
            RequestUnit::Day => {
                let Some(daily) = employee.working_hours_per_day() else {
                    return Err(LeaveError::rule(format!(
                        "employee {} has no daily working hours set, so day leave cannot be measured",
                        employee.id
                    )));
                };
                self.durations
                    .working_hours(start.date(), end.date(), daily)
                    .await
            }
        }
    }

    /// Per-type policies, then the annual balance for deducting types.
    async fn check_limits(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
        hours: Decimal,
        start: NaiveDate,
    ) -> LeaveResult<()> {
        let policy = &leave_type.policy;
        if let Some(fixed) = policy.fixed_request_hours {
            if hours != fixed {
                return Err(LeaveError::rule(format!(
                    "{} can only be requested for exactly {fixed} hours, requested {hours}",
                    leave_type.name
                )));
            }
        }

        if policy.monthly_request_limit.is_some() || policy.monthly_hour_cap.is_some() {
            let (from, until) = month_window(start);
            let usage = self
                .store
                .usage_for_type(employee.id, leave_type.id, from, until, &COUNTED)
                .await?;
            if let Some(limit) = policy.monthly_request_limit {
                if usage.requests >= limit {
                    return Err(LeaveError::rule(format!(
                        "monthly limit reached: {} of {limit} {} requests already taken",
                        usage.requests, leave_type.name
                    )));
                }
            }
            if let Some(cap) = policy.monthly_hour_cap {
                let left = (cap - usage.hours).max(Decimal::ZERO);
                if hours > left {
                    return Err(LeaveError::rule(format!(
                        "monthly cap exceeded: requested {hours} hours, {left} of {cap} hours left this month"
                    )));
                }
            }
        }

        if leave_type.deducts_from_annual {
            let entitlement = self.ledger.entitlement_for(employee, start.year()).await?;
            let remaining = entitlement.remaining_hours();
            if hours > remaining {
                return Err(LeaveError::InsufficientBalance {
                    requested: hours,
                    remaining,
                });
            }
        }
        Ok(())
    }

    #[instrument(skip(self, application), fields(employee_id = actor.employee_id, leave_type_id = application.leave_type_id))]
    pub async fn create(&self, actor: Actor, application: LeaveApplication) -> LeaveResult<LeaveRequest> {
        let (Some(start), Some(end)) = (application.start, application.end) else {
            return Err(LeaveError::validation("start and end are required"));
        };
        if end <= start {
            return Err(LeaveError::validation("end must be after start"));
        }
        if start.date() < self.clock.today() {
            return Err(LeaveError::validation("leave cannot start in the past"));
        }

        let employee = self.employee(actor.employee_id).await?;
        let leave_type = self.types.get(application.leave_type_id).await?;
        let document_ref = application
            .document_ref
            .filter(|d| !d.trim().is_empty());
        if leave_type.document_required && document_ref.is_none() {
            return Err(LeaveError::rule(format!(
                "{} requires a supporting document",
                leave_type.name
            )));
        }

        let hours = self.duration_of(&employee, &leave_type, start, end).await?;
        if hours <= Decimal::ZERO {
            return Err(LeaveError::rule(
                "the selected range contains no working time (weekend or holiday)",
            ));
        }

        let first = workflow::start(&leave_type.workflow);
        let guard = self.locks.lock(employee.id).await;
        self.overlap.ensure_free(employee.id, start, end).await?;
        self.check_limits(&employee, &leave_type, hours, start.date())
            .await?;
        let request = self
            .store
            .insert_request(
                NewLeaveRequest {
                    employee_id: employee.id,
                    leave_type_id: leave_type.id,
                    first_approver: leave_type.workflow.first(),
                    start,
                    end,
                    duration_hours: hours,
                    reason: application.reason.unwrap_or_default(),
                    document_ref,
                    created_at: self.clock.now(),
                },
                &LeaveStatus::INACTIVE,
            )
            .await?;
        drop(guard);

        info!(leave_id = request.id, %hours, next = %first.next_approver, "Leave request created");
        dispatch(
            self.notifier.as_ref(),
            vec![Notification::ApprovalNeeded {
                request_id: request.id,
                role: leave_type.workflow.first(),
                department_id: employee.department_id,
            }],
        )
        .await;
        Ok(request)
    }

    fn transition(
        &self,
        request: &LeaveRequest,
        outcome: Outcome,
        ledger: Option<LedgerChange>,
        actor: &Actor,
        action: LeaveStatus,
        comments: Option<String>,
    ) -> Transition {
        let now = self.clock.now();
        Transition {
            request_id: request.id,
            expected_status: request.status,
            expected_next: request.next_approver,
            status: outcome.status,
            next_approver: outcome.next_approver,
            ledger,
            history: Some(NewApprovalHistory {
                approver_id: actor.employee_id,
                action,
                comments: comments.unwrap_or_default(),
                created_at: now,
            }),
            at: now,
        }
    }

    /// Approves the current step. The final step debits annual-deducting
    /// types in the same unit of work.
    #[instrument(skip(self, comments), fields(employee_id = actor.employee_id, role = %actor.role))]
    pub async fn approve(
        &self,
        actor: Actor,
        request_id: u64,
        comments: Option<String>,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.request(request_id).await?;
        let leave_type = self.types.get_any(request.leave_type_id).await?;
        let owner = self.employee(request.employee_id).await?;

        let guard = self.locks.lock(owner.id).await;
        let outcome = workflow::approve(&request, &leave_type.workflow, &actor)?;
        let ledger = if outcome.is_final() && leave_type.deducts_from_annual {
            let year = request.start.year();
            self.ledger.entitlement_for(&owner, year).await?;
            Some(LedgerChange {
                employee_id: owner.id,
                year,
                adjustment: LedgerAdjustment::Debit(request.duration_hours),
            })
        } else {
            None
        };
        let transition = self.transition(
            &request,
            outcome,
            ledger,
            &actor,
            LeaveStatus::Approved,
            comments,
        );
        let updated = self.store.apply_transition(transition).await?;
        drop(guard);

        info!(leave_id = request_id, status = %updated.status, next = %updated.next_approver, "Leave request approved");
        let notifications = match outcome.next_approver.role() {
            Some(next_role) => vec![
                Notification::Progressed {
                    request_id,
                    employee_id: owner.id,
                    next_role,
                },
                Notification::ApprovalNeeded {
                    request_id,
                    role: next_role,
                    department_id: owner.department_id,
                },
            ],
            None => vec![Notification::FinalDecision {
                request_id,
                employee_id: owner.id,
                approved: true,
            }],
        };
        dispatch(self.notifier.as_ref(), notifications).await;
        Ok(updated)
    }

    #[instrument(skip(self, comments), fields(employee_id = actor.employee_id, role = %actor.role))]
    pub async fn reject(
        &self,
        actor: Actor,
        request_id: u64,
        comments: Option<String>,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.request(request_id).await?;
        let guard = self.locks.lock(request.employee_id).await;
        let outcome = workflow::reject(&request, &actor)?;
        let transition = self.transition(
            &request,
            outcome,
            None,
            &actor,
            LeaveStatus::Rejected,
            comments,
        );
        let updated = self.store.apply_transition(transition).await?;
        drop(guard);

        info!(leave_id = request_id, "Leave request rejected");
        dispatch(
            self.notifier.as_ref(),
            vec![Notification::FinalDecision {
                request_id,
                employee_id: request.employee_id,
                approved: false,
            }],
        )
        .await;
        Ok(updated)
    }

    /// Withdrawal by the owner. Hours of an approved annual request go back to
    /// the balance.
    #[instrument(skip(self, reason), fields(employee_id = actor.employee_id))]
    pub async fn cancel(
        &self,
        actor: Actor,
        request_id: u64,
        reason: Option<String>,
    ) -> LeaveResult<LeaveRequest> {
        let request = self.request(request_id).await?;
        let leave_type = self.types.get_any(request.leave_type_id).await?;

        let guard = self.locks.lock(request.employee_id).await;
        let outcome = workflow::cancel(&request, &actor)?;
        let ledger = (request.status == LeaveStatus::Approved && leave_type.deducts_from_annual)
            .then(|| LedgerChange {
                employee_id: request.employee_id,
                year: request.start.year(),
                adjustment: LedgerAdjustment::Credit(request.duration_hours),
            });
        let transition = self.transition(
            &request,
            outcome,
            ledger,
            &actor,
            LeaveStatus::Cancelled,
            reason,
        );
        let updated = self.store.apply_transition(transition).await?;
        drop(guard);

        info!(leave_id = request_id, was = %request.status, "Leave request cancelled");
        Ok(updated)
    }

    /// Audit trail, visible to the owner and to approver roles.
    pub async fn history(&self, actor: Actor, request_id: u64) -> LeaveResult<Vec<ApprovalHistory>> {
        let request = self.request(request_id).await?;
        if request.employee_id != actor.employee_id && !actor.role.is_privileged() {
            return Err(LeaveError::NotPermitted(
                "you cannot view the history of this leave request".into(),
            ));
        }
        self.store.history_for_request(request_id).await
    }

    /// The actor's own requests, latest start first.
    pub async fn my_requests(&self, actor: Actor) -> LeaveResult<Vec<LeaveRequest>> {
        let mut requests = self.store.requests_for_employee(actor.employee_id).await?;
        requests.sort_by(|a, b| b.start.cmp(&a.start));
        Ok(requests)
    }

    /// Requests waiting for the actor's role. Department-bound roles only see
    /// their own department.
    pub async fn pending_for(&self, actor: Actor) -> LeaveResult<Vec<LeaveRequest>> {
        let department = if actor.role.sees_all_departments() {
            None
        } else {
            Some(self.employee(actor.employee_id).await?.department_id)
        };
        self.store.requests_awaiting(actor.role, department).await
    }
}
