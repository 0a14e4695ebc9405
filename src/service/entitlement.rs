use std::sync::Arc;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

use super::clock::Clock;
use crate::error::{LeaveError, LeaveResult};
use crate::model::{
    employee::Employee,
    entitlement::{LeaveEntitlement, NewLeaveEntitlement},
    leave_request::LeaveStatus,
    leave_type::LeaveType,
    transition::{LedgerAdjustment, LedgerChange},
};
use crate::store::LeaveStore;
use crate::utils::leave_type_cache::LeaveTypeCache;

/// Days granted for a completed tenure at January 1st.
pub fn granted_days(years_of_service: i32) -> u32 {
    match years_of_service {
        y if y < 1 => 0,
        y if y < 5 => 14,
        _ => 20,
    }
}

/// Annual grant in hours for `year`. Zero without positive daily hours.
pub fn annual_grant_hours(employee: &Employee, year: i32) -> Decimal {
    let Some(daily_hours) = employee.working_hours_per_day() else {
        return Decimal::ZERO;
    };
    let Some(jan_first) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Decimal::ZERO;
    };
    daily_hours * Decimal::from(granted_days(employee.years_of_service_on(jan_first)))
}

/// Unused part of the previous year's own grant. Hours used that year are
/// charged to its carried-forward hours first, and carried-forward hours are
/// never carried again.
pub fn carry_forward_hours(previous: Option<&LeaveEntitlement>) -> Decimal {
    let Some(previous) = previous else {
        return Decimal::ZERO;
    };
    let used_from_carried = previous.hours_used.min(previous.carried_forward_hours);
    let used_from_grant = previous.hours_used - used_from_carried;
    (previous.annual_grant_hours() - used_from_grant).max(Decimal::ZERO)
}

/// `[first day of month, first day of next month)` around `date`.
pub fn month_window(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    (first, first + Months::new(1))
}

/// `[January 1st, next January 1st)` of `year`.
pub fn year_window(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?,
    ))
}

fn whole_days(hours: Decimal, daily_hours: Option<Decimal>) -> Option<i64> {
    daily_hours.and_then(|d| (hours / d).floor().to_i64())
}

/// Balance of one leave type as shown to the employee.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveBalance {
    pub leave_type_id: Option<u64>,
    pub leave_type_name: Option<String>,
    pub year: i32,
    /// `None` when the type has no limit.
    #[schema(value_type = Option<String>)]
    pub total_hours: Option<Decimal>,
    #[schema(value_type = String)]
    pub hours_used: Decimal,
    #[schema(value_type = Option<String>)]
    pub remaining_hours: Option<Decimal>,
    pub total_days: Option<i64>,
    pub days_used: Option<i64>,
    pub remaining_days: Option<i64>,
}

impl LeaveBalance {
    fn from_entitlement(entitlement: &LeaveEntitlement, employee: &Employee) -> Self {
        let daily = employee.working_hours_per_day();
        Self {
            leave_type_id: None,
            leave_type_name: None,
            year: entitlement.year,
            total_hours: Some(entitlement.total_hours_entitled),
            hours_used: entitlement.hours_used,
            remaining_hours: Some(entitlement.remaining_hours()),
            total_days: whole_days(entitlement.total_hours_entitled, daily),
            days_used: whole_days(entitlement.hours_used, daily),
            remaining_days: whole_days(entitlement.remaining_hours(), daily),
        }
    }

    fn for_type(mut self, leave_type: &LeaveType) -> Self {
        self.leave_type_id = Some(leave_type.id);
        self.leave_type_name = Some(leave_type.name.clone());
        self
    }
}

/// Outcome of opening a year for every active employee.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct YearOpening {
    pub year: i32,
    pub opened: usize,
    pub failed_employees: Vec<u64>,
}

#[derive(Clone)]
pub struct EntitlementLedger {
    store: Arc<dyn LeaveStore>,
    types: Arc<LeaveTypeCache>,
    clock: Arc<dyn Clock>,
}

impl EntitlementLedger {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        types: Arc<LeaveTypeCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { store, types, clock }
    }

    async fn employee(&self, employee_id: u64) -> LeaveResult<Employee> {
        self.store
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| LeaveError::not_found(format!("employee {employee_id}")))
    }

    /// Entitlement of `employee` for `year`, created from the grant and
    /// carry-forward rules when it does not exist yet.
    pub async fn entitlement_for(
        &self,
        employee: &Employee,
        year: i32,
    ) -> LeaveResult<LeaveEntitlement> {
        if let Some(existing) = self.store.find_entitlement(employee.id, year).await? {
            return Ok(existing);
        }

        let grant = annual_grant_hours(employee, year);
        let previous = self.store.find_entitlement(employee.id, year - 1).await?;
        let carried = carry_forward_hours(previous.as_ref());

        let entitlement = self
            .store
            .insert_entitlement_if_absent(NewLeaveEntitlement {
                employee_id: employee.id,
                year,
                total_hours_entitled: grant + carried,
                carried_forward_hours: carried,
            })
            .await?;
        info!(
            employee_id = employee.id,
            year,
            %grant,
            %carried,
            "Leave entitlement created"
        );
        Ok(entitlement)
    }

    #[instrument(skip(self))]
    pub async fn get_balance(&self, employee_id: u64, year: i32) -> LeaveResult<LeaveEntitlement> {
        let employee = self.employee(employee_id).await?;
        self.entitlement_for(&employee, year).await
    }

    /// Adds `hours` to the year's usage. Fails with `BalanceExceeded`, leaving
    /// the record untouched, when the usage would pass the entitlement.
    #[instrument(skip(self))]
    pub async fn debit(
        &self,
        employee_id: u64,
        year: i32,
        hours: Decimal,
    ) -> LeaveResult<LeaveEntitlement> {
        if hours < Decimal::ZERO {
            return Err(LeaveError::validation("debited hours cannot be negative"));
        }
        self.get_balance(employee_id, year).await?;
        self.store
            .adjust_entitlement(LedgerChange {
                employee_id,
                year,
                adjustment: LedgerAdjustment::Debit(hours),
            })
            .await
    }

    /// Annual balance of the current year with day figures.
    pub async fn annual_balance(&self, employee_id: u64) -> LeaveResult<LeaveBalance> {
        let employee = self.employee(employee_id).await?;
        let entitlement = self
            .entitlement_for(&employee, self.clock.today().year())
            .await?;
        Ok(LeaveBalance::from_entitlement(&entitlement, &employee))
    }

    pub async fn balance_for_type(
        &self,
        employee_id: u64,
        leave_type_id: u64,
    ) -> LeaveResult<LeaveBalance> {
        let employee = self.employee(employee_id).await?;
        let leave_type = self.types.get(leave_type_id).await?;
        self.type_balance(&employee, &leave_type).await
    }

    pub async fn all_balances(&self, employee_id: u64) -> LeaveResult<Vec<LeaveBalance>> {
        let employee = self.employee(employee_id).await?;
        let mut balances = Vec::new();
        for leave_type in self.types.active().await? {
            balances.push(self.type_balance(&employee, &leave_type).await?);
        }
        Ok(balances)
    }

    async fn type_balance(
        &self,
        employee: &Employee,
        leave_type: &LeaveType,
    ) -> LeaveResult<LeaveBalance> {
        let today = self.clock.today();

        if leave_type.deducts_from_annual {
            let entitlement = self.entitlement_for(employee, today.year()).await?;
            return Ok(LeaveBalance::from_entitlement(&entitlement, employee).for_type(leave_type));
        }

        let approved = [LeaveStatus::Approved];
        if let Some(cap) = leave_type.policy.monthly_hour_cap {
            let (from, until) = month_window(today);
            let used = self
                .store
                .usage_for_type(employee.id, leave_type.id, from, until, &approved)
                .await?
                .hours;
            let remaining = (cap - used).max(Decimal::ZERO);
            return Ok(LeaveBalance {
                leave_type_id: None,
                leave_type_name: None,
                year: today.year(),
                total_hours: Some(cap),
                hours_used: used,
                remaining_hours: Some(remaining),
                total_days: None,
                days_used: None,
                remaining_days: whole_days(remaining, employee.working_hours_per_day()),
            }
            .for_type(leave_type));
        }

        let (from, until) = year_window(today.year())
            .ok_or_else(|| LeaveError::validation(format!("year {} is out of range", today.year())))?;
        let used = self
            .store
            .usage_for_type(employee.id, leave_type.id, from, until, &approved)
            .await?
            .hours;
        Ok(LeaveBalance {
            leave_type_id: None,
            leave_type_name: None,
            year: today.year(),
            total_hours: None,
            hours_used: used,
            remaining_hours: None,
            total_days: None,
            days_used: None,
            remaining_days: None,
        }
        .for_type(leave_type))
    }

    /// Creates `year`'s entitlement for every active employee. One employee
    /// failing does not stop the others.
    #[instrument(skip(self))]
    pub async fn open_year(&self, year: i32) -> LeaveResult<YearOpening> {
        let mut opening = YearOpening {
            year,
            ..YearOpening::default()
        };
        for employee in self.store.active_employees().await? {
            match self.entitlement_for(&employee, year).await {
                Ok(_) => opening.opened += 1,
                Err(e) => {
                    error!(error = %e, employee_id = employee.id, year, "Could not open leave year");
                    opening.failed_employees.push(employee.id);
                }
            }
        }
        info!(
            year,
            opened = opening.opened,
            failed = opening.failed_employees.len(),
            "Leave year opened"
        );
        Ok(opening)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::fixtures::employee;
    use crate::model::leave_request::{LeaveRequest, NextApprover};
    use crate::model::leave_type::fixtures::{annual, excuse, unpaid};
    use crate::model::record_status::RecordStatus;
    use crate::service::clock::FixedClock;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn ledger(store: Arc<MemoryStore>, today: FixedClock) -> EntitlementLedger {
        let types = Arc::new(LeaveTypeCache::new(store.clone(), Duration::from_secs(60)));
        EntitlementLedger::new(store, types, Arc::new(today))
    }

    fn approved(employee_id: u64, leave_type_id: u64, start: NaiveDateTime, hours: Decimal) -> LeaveRequest {
        LeaveRequest {
            id: 0,
            employee_id,
            leave_type_id,
            status: LeaveStatus::Approved,
            next_approver: NextApprover::None,
            start,
            end: start + chrono::Duration::hours(2),
            duration_hours: hours,
            reason: String::new(),
            document_ref: None,
            record_status: RecordStatus::Active,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn grants_by_tenure() {
        assert_eq!(granted_days(0), 0);
        assert_eq!(granted_days(-1), 0);
        assert_eq!(granted_days(1), 14);
        assert_eq!(granted_days(4), 14);
        assert_eq!(granted_days(5), 20);
        assert_eq!(granted_days(30), 20);
    }

    #[test]
    fn new_hires_get_nothing() {
        // hired in June, so less than a year of service on January 1st
        let e = employee(1, date(2023, 6, 1));
        assert_eq!(annual_grant_hours(&e, 2024), Decimal::ZERO);
    }

    #[test]
    fn grant_needs_daily_hours() {
        let mut e = employee(1, date(2010, 1, 1));
        e.daily_work_hours = None;
        assert_eq!(annual_grant_hours(&e, 2024), Decimal::ZERO);
    }

    #[test]
    fn carries_only_the_unused_own_grant() {
        let previous = LeaveEntitlement {
            id: 1,
            employee_id: 1,
            year: 2023,
            total_hours_entitled: dec!(152),
            hours_used: dec!(40),
            carried_forward_hours: dec!(40),
        };
        // all usage charged to the 40 carried hours: the 112h grant is intact
        assert_eq!(carry_forward_hours(Some(&previous)), dec!(112));

        let heavy = LeaveEntitlement {
            hours_used: dec!(100),
            ..previous.clone()
        };
        assert_eq!(carry_forward_hours(Some(&heavy)), dec!(52));

        let exhausted = LeaveEntitlement {
            hours_used: dec!(152),
            ..previous
        };
        assert_eq!(carry_forward_hours(Some(&exhausted)), Decimal::ZERO);
        assert_eq!(carry_forward_hours(None), Decimal::ZERO);
    }

    #[actix_web::test]
    async fn six_years_of_service_grants_twenty_days() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 1));

        let balance = ledger.get_balance(1, 2024).await.unwrap();
        assert_eq!(balance.total_hours_entitled, dec!(160));
        assert_eq!(balance.hours_used, Decimal::ZERO);
        assert_eq!(balance.remaining_hours(), dec!(160));
        assert_eq!(balance.carried_forward_hours, Decimal::ZERO);
    }

    #[actix_web::test]
    async fn balance_creation_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_entitlement(1, 2024, dec!(100), dec!(30), Decimal::ZERO);
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 1));

        let balance = ledger.get_balance(1, 2024).await.unwrap();
        assert_eq!(balance.total_hours_entitled, dec!(100));
        assert_eq!(balance.hours_used, dec!(30));
        let again = ledger.get_balance(1, 2024).await.unwrap();
        assert_eq!(again, balance);
    }

    #[actix_web::test]
    async fn new_year_includes_carry_forward() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2020, 1, 1)));
        store.add_entitlement(1, 2023, dec!(112), dec!(72), Decimal::ZERO);
        let ledger = ledger(store.clone(), FixedClock::on(2024, 1, 2));

        let balance = ledger.get_balance(1, 2024).await.unwrap();
        // 4 years of service: 14 days x 8h, plus 40h unused
        assert_eq!(balance.carried_forward_hours, dec!(40));
        assert_eq!(balance.total_hours_entitled, dec!(152));
    }

    #[actix_web::test]
    async fn gap_year_carries_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2015, 1, 1)));
        store.add_entitlement(1, 2022, dec!(160), Decimal::ZERO, Decimal::ZERO);
        let ledger = ledger(store.clone(), FixedClock::on(2024, 1, 2));

        let balance = ledger.get_balance(1, 2024).await.unwrap();
        assert_eq!(balance.carried_forward_hours, Decimal::ZERO);
        assert_eq!(balance.total_hours_entitled, dec!(160));
    }

    #[actix_web::test]
    async fn unknown_employee_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store, FixedClock::on(2024, 3, 1));
        let err = ledger.get_balance(42, 2024).await.unwrap_err();
        assert!(matches!(err, LeaveError::NotFound(_)));
    }

    #[actix_web::test]
    async fn debit_within_balance_is_recorded() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 1));

        let after = ledger.debit(1, 2024, dec!(24)).await.unwrap();
        assert_eq!(after.hours_used, dec!(24));
        assert_eq!(after.remaining_hours(), dec!(136));
    }

    #[actix_web::test]
    async fn overdraft_fails_and_leaves_the_record_unchanged() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_entitlement(1, 2024, dec!(160), dec!(150), Decimal::ZERO);
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 1));

        let err = ledger.debit(1, 2024, dec!(16)).await.unwrap_err();
        assert!(matches!(err, LeaveError::BalanceExceeded { .. }));
        assert_eq!(store.entitlement(1, 2024).unwrap().hours_used, dec!(150));
    }

    #[actix_web::test]
    async fn monthly_capped_type_reports_what_is_left() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_leave_type(excuse(3));
        store.add_request(approved(1, 3, at(2024, 3, 5, 9), dec!(2)));
        store.add_request(approved(1, 3, at(2024, 3, 12, 9), dec!(3)));
        // previous month does not count
        store.add_request(approved(1, 3, at(2024, 2, 20, 9), dec!(2)));
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 20));

        let balance = ledger.balance_for_type(1, 3).await.unwrap();
        assert_eq!(balance.total_hours, Some(dec!(8)));
        assert_eq!(balance.hours_used, dec!(5));
        assert_eq!(balance.remaining_hours, Some(dec!(3)));
        assert_eq!(balance.remaining_days, Some(0));
        assert_eq!(balance.leave_type_name.as_deref(), Some("Mazeret İzni (Saatlik)"));
    }

    #[actix_web::test]
    async fn unrestricted_type_reports_usage_only() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_leave_type(unpaid(4));
        store.add_request(approved(1, 4, at(2024, 1, 10, 9), dec!(16)));
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 20));

        let balance = ledger.balance_for_type(1, 4).await.unwrap();
        assert_eq!(balance.total_hours, None);
        assert_eq!(balance.remaining_hours, None);
        assert_eq!(balance.hours_used, dec!(16));
    }

    #[actix_web::test]
    async fn all_balances_cover_every_active_type() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_leave_type(annual(1, "MANAGER,HR"));
        store.add_leave_type(excuse(3));
        store.add_leave_type(unpaid(4));
        let ledger = ledger(store.clone(), FixedClock::on(2024, 3, 20));

        let balances = ledger.all_balances(1).await.unwrap();
        assert_eq!(balances.len(), 3);
        let annual = &balances[0];
        assert_eq!(annual.leave_type_id, Some(1));
        assert_eq!(annual.total_hours, Some(dec!(160)));
        assert_eq!(annual.total_days, Some(20));
        assert_eq!(annual.remaining_days, Some(20));
    }

    #[actix_web::test]
    async fn opening_a_year_isolates_failures() {
        let store = Arc::new(MemoryStore::new());
        store.add_employee(employee(1, date(2018, 1, 1)));
        store.add_employee(employee(2, date(2018, 1, 1)));
        store.add_employee(employee(3, date(2022, 5, 1)));
        store.fail_entitlement_writes_for(2);
        let ledger = ledger(store.clone(), FixedClock::on(2024, 1, 1));

        let opening = ledger.open_year(2024).await.unwrap();
        assert_eq!(opening.opened, 2);
        assert_eq!(opening.failed_employees, vec![2]);
        assert!(store.entitlement(1, 2024).is_some());
        assert!(store.entitlement(2, 2024).is_none());
        assert_eq!(store.entitlement(3, 2024).unwrap().total_hours_entitled, dec!(112));
    }
}
