//! Rehire eligibility for terminated workers.
//!
//! - `policy_violation` blocks rehire permanently.
//! - `performance_issue` requires a six calendar month cooldown; the worker is
//!   eligible once `today` is strictly after the cooldown end.
//! - Any other reason, or none, is immediately eligible.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::system::PERFORMANCE_REHIRE_COOLDOWN_MONTHS;

const POLICY_VIOLATION: &str = "policy_violation";
const PERFORMANCE_ISSUE: &str = "performance_issue";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RehireReasonCode {
    PolicyBlock,
    CooldownActive,
    CooldownComplete,
    MissingTerminationDate,
    InvalidTerminationDate,
    Eligible,
}

impl RehireReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RehireReasonCode::PolicyBlock => "policy_block",
            RehireReasonCode::CooldownActive => "cooldown_active",
            RehireReasonCode::CooldownComplete => "cooldown_complete",
            RehireReasonCode::MissingTerminationDate => "missing_termination_date",
            RehireReasonCode::InvalidTerminationDate => "invalid_termination_date",
            RehireReasonCode::Eligible => "eligible",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehireEligibilityInput {
    pub termination_reason: Option<String>,
    /// ISO `YYYY-MM-DD` or an RFC 3339 timestamp
    pub termination_date: Option<String>,
    /// Evaluation date; the current UTC date when unset
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RehireEligibilityResult {
    pub eligible: bool,
    pub reason_code: RehireReasonCode,
    /// Last day of the cooldown, serialized as `YYYY-MM-DD`
    pub eligible_after: Option<NaiveDate>,
}

impl RehireEligibilityResult {
    fn new(eligible: bool, reason_code: RehireReasonCode, eligible_after: Option<NaiveDate>) -> Self {
        Self {
            eligible,
            reason_code,
            eligible_after,
        }
    }
}

pub fn evaluate_rehire_eligibility(input: &RehireEligibilityInput) -> RehireEligibilityResult {
    let reason = input
        .termination_reason
        .as_deref()
        .map(|reason| reason.trim().to_ascii_lowercase())
        .unwrap_or_default();

    match reason.as_str() {
        POLICY_VIOLATION => RehireEligibilityResult::new(false, RehireReasonCode::PolicyBlock, None),
        PERFORMANCE_ISSUE => {
            let Some(terminated_on) = input.termination_date.as_deref().and_then(parse_date) else {
                return RehireEligibilityResult::new(
                    false,
                    RehireReasonCode::MissingTerminationDate,
                    None,
                );
            };
            let Some(cooldown_end) =
                add_calendar_months(terminated_on, PERFORMANCE_REHIRE_COOLDOWN_MONTHS)
            else {
                return RehireEligibilityResult::new(
                    false,
                    RehireReasonCode::InvalidTerminationDate,
                    None,
                );
            };
            let today = input.today.unwrap_or_else(|| Utc::now().date_naive());

            if today > cooldown_end {
                RehireEligibilityResult::new(true, RehireReasonCode::CooldownComplete, Some(cooldown_end))
            } else {
                RehireEligibilityResult::new(false, RehireReasonCode::CooldownActive, Some(cooldown_end))
            }
        }
        _ => RehireEligibilityResult::new(true, RehireReasonCode::Eligible, None),
    }
}

/// Calendar-month addition where an out-of-range day rolls over into the
/// following month (Aug 31 + 6 months = Mar 2 in a leap year).
///
/// Returns `None` when the result falls outside the representable date range.
pub fn add_calendar_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + i32::try_from(months).ok()?;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_signed(Duration::days(i64::from(date.day()) - 1))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(trimmed)
            .ok()
            .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
    })
}

/// Administrative offboarding paths and the termination reason each records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffboardingTrigger {
    Voluntary,
    Performance,
    Policy,
    ContractEnd,
}

impl OffboardingTrigger {
    pub fn termination_reason(&self) -> &'static str {
        match self {
            OffboardingTrigger::Voluntary => "voluntary_departure",
            OffboardingTrigger::Performance => PERFORMANCE_ISSUE,
            OffboardingTrigger::Policy => POLICY_VIOLATION,
            OffboardingTrigger::ContractEnd => "contract_end",
        }
    }

    /// Whether the worker may be rehired immediately after this trigger
    pub fn rehire_eligible_at_termination(&self) -> bool {
        matches!(self, OffboardingTrigger::Voluntary | OffboardingTrigger::ContractEnd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn input(reason: Option<&str>, terminated: Option<&str>, today: &str) -> RehireEligibilityInput {
        RehireEligibilityInput {
            termination_reason: reason.map(str::to_string),
            termination_date: terminated.map(str::to_string),
            today: Some(date(today)),
        }
    }

    #[test]
    fn test_policy_violation_is_permanent() {
        let result = evaluate_rehire_eligibility(&input(Some("Policy_Violation"), Some("2001-01-01"), "2030-01-01"));
        assert!(!result.eligible);
        assert_eq!(result.reason_code, RehireReasonCode::PolicyBlock);
        assert_eq!(result.eligible_after, None);
    }

    #[test]
    fn test_performance_cooldown_boundary() {
        let on_boundary =
            evaluate_rehire_eligibility(&input(Some("performance_issue"), Some("2024-01-15"), "2024-07-15"));
        assert!(!on_boundary.eligible);
        assert_eq!(on_boundary.reason_code, RehireReasonCode::CooldownActive);
        assert_eq!(on_boundary.eligible_after, Some(date("2024-07-15")));

        let day_after =
            evaluate_rehire_eligibility(&input(Some("performance_issue"), Some("2024-01-15"), "2024-07-16"));
        assert!(day_after.eligible);
        assert_eq!(day_after.reason_code, RehireReasonCode::CooldownComplete);
        assert_eq!(day_after.eligible_after, Some(date("2024-07-15")));
    }

    #[test]
    fn test_performance_without_date_is_ineligible() {
        let result = evaluate_rehire_eligibility(&input(Some("performance_issue"), None, "2024-07-16"));
        assert!(!result.eligible);
        assert_eq!(result.reason_code, RehireReasonCode::MissingTerminationDate);
        assert_eq!(result.eligible_after, None);

        let garbage = evaluate_rehire_eligibility(&input(Some("performance_issue"), Some("last spring"), "2024-07-16"));
        assert!(!garbage.eligible);
        assert_eq!(garbage.eligible_after, None);
    }

    #[test]
    fn test_rfc3339_termination_date() {
        let result = evaluate_rehire_eligibility(&input(
            Some("performance_issue"),
            Some("2024-01-15T18:30:00Z"),
            "2024-07-16",
        ));
        assert!(result.eligible);
        assert_eq!(result.eligible_after, Some(date("2024-07-15")));
    }

    #[test]
    fn test_other_reasons_are_immediately_eligible() {
        for reason in [Some("voluntary_departure"), Some("contract_end"), None] {
            let result = evaluate_rehire_eligibility(&input(reason, None, "2024-01-01"));
            assert!(result.eligible);
            assert_eq!(result.reason_code, RehireReasonCode::Eligible);
        }
    }

    #[test]
    fn test_month_addition_rolls_over() {
        assert_eq!(add_calendar_months(date("2023-08-31"), 6), Some(date("2024-03-02")));
        assert_eq!(add_calendar_months(date("2023-03-31"), 6), Some(date("2023-10-01")));
        assert_eq!(add_calendar_months(date("2024-09-15"), 6), Some(date("2025-03-15")));
        assert_eq!(add_calendar_months(date("2024-12-31"), 2), Some(date("2025-03-03")));
    }

    #[test]
    fn test_month_addition_past_the_last_representable_date() {
        assert_eq!(add_calendar_months(NaiveDate::MAX, 6), None);
        assert_eq!(add_calendar_months(NaiveDate::MAX, 0), Some(NaiveDate::MAX));
    }

    #[test]
    fn test_termination_date_near_calendar_limit_is_invalid() {
        let result = evaluate_rehire_eligibility(&input(
            Some("performance_issue"),
            Some("+262142-12-31"),
            "2024-01-01",
        ));
        assert!(!result.eligible);
        assert_eq!(result.reason_code, RehireReasonCode::InvalidTerminationDate);
        assert_eq!(result.eligible_after, None);
    }

    #[test]
    fn test_eligible_after_serializes_as_iso_date() {
        let result = evaluate_rehire_eligibility(&input(Some("performance_issue"), Some("2024-01-15"), "2024-02-01"));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["eligible_after"], serde_json::json!("2024-07-15"));
        assert_eq!(json["reason_code"], serde_json::json!("cooldown_active"));
    }

    #[test]
    fn test_offboarding_triggers() {
        assert_eq!(OffboardingTrigger::Policy.termination_reason(), "policy_violation");
        assert!(!OffboardingTrigger::Performance.rehire_eligible_at_termination());
        assert!(OffboardingTrigger::ContractEnd.rehire_eligible_at_termination());
    }
}
