//! Pure guideline evaluation.
//!
//! `GuidelineEngine::evaluate` is a deterministic function of
//! `(facts, guidelines, evaluation date)`. Checks run in a fixed order
//! (sex, then age, then interval) and evaluation stops at the first check
//! that fails or cannot be completed.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::model::Guidelines;
use crate::domain::foundation::Decision;
use crate::domain::subject::{Facts, Sex};

/// Confidence reported when a check could not be completed.
const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Outcome classification of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// The fact the check needs was not recorded.
    Missing,
    /// The fact was recorded but could not be parsed.
    Invalid,
    /// No event history; the configured no-history policy applied.
    NoHistory,
}

/// One executed check with optional structured detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl CheckResult {
    fn passed() -> Self {
        Self {
            status: CheckStatus::Passed,
            detail: None,
        }
    }

    fn with_detail(status: CheckStatus, detail: serde_json::Value) -> Self {
        Self {
            status,
            detail: Some(detail),
        }
    }
}

/// Per-check results; a check left unexecuted by short-circuiting is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidelineChecks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex_check: Option<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_check: Option<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_check: Option<CheckResult>,
}

/// Result of evaluating facts against a guideline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub decision: Decision,
    pub rationale: String,
    pub confidence: f64,
    pub checks: GuidelineChecks,
    pub guidelines_version: String,
}

/// Deterministic rule evaluator for guideline configurations.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidelineEngine;

impl GuidelineEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluates `facts` against `guidelines` as of today.
    pub fn evaluate_today(&self, facts: &Facts, guidelines: &Guidelines) -> EvaluationResult {
        self.evaluate(facts, guidelines, chrono::Utc::now().date_naive())
    }

    /// Evaluates `facts` against `guidelines` as of `evaluation_date`.
    ///
    /// Pure and deterministic: identical inputs always produce an identical
    /// result, with no observable side effects.
    pub fn evaluate(
        &self,
        facts: &Facts,
        guidelines: &Guidelines,
        evaluation_date: NaiveDate,
    ) -> EvaluationResult {
        let mut checks = GuidelineChecks::default();

        // Check 1: sex.
        if facts.sex == Sex::Unknown {
            checks.sex_check = Some(CheckResult {
                status: CheckStatus::Missing,
                detail: None,
            });
            return self.incomplete(
                guidelines,
                checks,
                DEFAULT_CONFIDENCE,
                "Subject sex is not recorded.",
            );
        }
        if facts.sex != guidelines.sex_required {
            checks.sex_check = Some(CheckResult::with_detail(
                CheckStatus::Failed,
                json!({ "subjectSex": facts.sex, "requiredSex": guidelines.sex_required }),
            ));
            return EvaluationResult {
                decision: Decision::Ineligible,
                rationale: format!(
                    "Screening applies to {} subjects; recorded sex is {}.",
                    guidelines.sex_required, facts.sex
                ),
                confidence: 0.9,
                checks,
                guidelines_version: guidelines.version.clone(),
            };
        }
        checks.sex_check = Some(CheckResult::passed());

        // Check 2: age.
        let birth_date = match facts.birth_date.as_deref() {
            None => {
                checks.age_check = Some(CheckResult {
                    status: CheckStatus::Missing,
                    detail: None,
                });
                return self.incomplete(
                    guidelines,
                    checks,
                    DEFAULT_CONFIDENCE,
                    "Subject birth date is not recorded.",
                );
            }
            Some(raw) => match parse_date(raw) {
                Some(date) => date,
                None => {
                    checks.age_check = Some(CheckResult::with_detail(
                        CheckStatus::Invalid,
                        json!({ "birthDate": raw }),
                    ));
                    return self.incomplete(
                        guidelines,
                        checks,
                        DEFAULT_CONFIDENCE,
                        "Subject birth date could not be parsed.",
                    );
                }
            },
        };
        let age = age_in_years(birth_date, evaluation_date);
        if !guidelines.age_range.contains(age) {
            checks.age_check = Some(CheckResult::with_detail(
                CheckStatus::Failed,
                json!({
                    "subjectAge": age,
                    "requiredRange": [guidelines.age_range.min, guidelines.age_range.max],
                }),
            ));
            return EvaluationResult {
                decision: Decision::Ineligible,
                rationale: format!(
                    "Subject age {} is outside the eligible range {}-{}.",
                    age, guidelines.age_range.min, guidelines.age_range.max
                ),
                confidence: 0.9,
                checks,
                guidelines_version: guidelines.version.clone(),
            };
        }
        checks.age_check = Some(CheckResult::passed());

        // Check 3: interval since the last event.
        let last_event = match facts.last_event_date.as_deref() {
            None => {
                checks.interval_check = Some(CheckResult {
                    status: CheckStatus::NoHistory,
                    detail: None,
                });
                let decision = guidelines.no_history_policy;
                return EvaluationResult {
                    decision,
                    rationale: guidelines.rationale_for(decision),
                    confidence: 0.7,
                    checks,
                    guidelines_version: guidelines.version.clone(),
                };
            }
            Some(raw) => match parse_date(raw) {
                Some(date) => date,
                None => {
                    checks.interval_check = Some(CheckResult::with_detail(
                        CheckStatus::Invalid,
                        json!({ "lastEventDate": raw }),
                    ));
                    return self.incomplete(
                        guidelines,
                        checks,
                        DEFAULT_CONFIDENCE,
                        "Last event date could not be parsed.",
                    );
                }
            },
        };
        // Calendar month subtraction; chrono clamps the day to the target
        // month's length (e.g. Mar 31 minus one month is Feb 28/29).
        let cutoff = match evaluation_date.checked_sub_months(Months::new(guidelines.interval_months))
        {
            Some(date) => date,
            None => {
                checks.interval_check = Some(CheckResult::with_detail(
                    CheckStatus::Invalid,
                    json!({ "intervalMonths": guidelines.interval_months }),
                ));
                return self.incomplete(
                    guidelines,
                    checks,
                    DEFAULT_CONFIDENCE,
                    "Screening interval could not be applied to the evaluation date.",
                );
            }
        };
        if last_event > cutoff {
            // Too recent: the last event falls inside the interval window.
            checks.interval_check = Some(CheckResult::with_detail(
                CheckStatus::Failed,
                json!({
                    "lastEventDate": last_event.to_string(),
                    "cutoffDate": cutoff.to_string(),
                    "intervalMonths": guidelines.interval_months,
                }),
            ));
            return EvaluationResult {
                decision: Decision::Ineligible,
                rationale: format!(
                    "Last event on {} is within the {}-month screening interval.",
                    last_event, guidelines.interval_months
                ),
                confidence: 0.8,
                checks,
                guidelines_version: guidelines.version.clone(),
            };
        }
        checks.interval_check = Some(CheckResult::passed());

        EvaluationResult {
            decision: Decision::Eligible,
            rationale: guidelines.rationale_for(Decision::Eligible),
            confidence: 0.95,
            checks,
            guidelines_version: guidelines.version.clone(),
        }
    }

    fn incomplete(
        &self,
        guidelines: &Guidelines,
        checks: GuidelineChecks,
        confidence: f64,
        rationale: &str,
    ) -> EvaluationResult {
        EvaluationResult {
            decision: Decision::NeedsMoreInfo,
            rationale: rationale.to_string(),
            confidence,
            checks,
            guidelines_version: guidelines.version.clone(),
        }
    }
}

/// Parses a `YYYY-MM-DD` date string.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Whole years between `birth` and `on`, not counting the current year until
/// the birthday has occurred.
fn age_in_years(birth: NaiveDate, on: NaiveDate) -> i32 {
    let mut age = on.year() - birth.year();
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn guidelines() -> Guidelines {
        Guidelines::default_screening()
    }

    fn evaluate(facts: &Facts, on: &str) -> EvaluationResult {
        GuidelineEngine::new().evaluate(facts, &guidelines(), date(on))
    }

    mod sex_check {
        use super::*;

        #[test]
        fn unknown_sex_needs_more_info() {
            let result = evaluate(&Facts::empty(), "2025-01-01");

            assert_eq!(result.decision, Decision::NeedsMoreInfo);
            assert_eq!(result.confidence, 0.5);
            assert_eq!(
                result.checks.sex_check.unwrap().status,
                CheckStatus::Missing
            );
            assert!(result.checks.age_check.is_none());
        }

        #[test]
        fn mismatched_sex_is_ineligible() {
            let facts = Facts::empty()
                .with_sex(Sex::Male)
                .with_birth_date("1960-01-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::Ineligible);
            assert_eq!(result.confidence, 0.9);
            assert_eq!(result.checks.sex_check.unwrap().status, CheckStatus::Failed);
            // Short-circuits before the age check.
            assert!(result.checks.age_check.is_none());
        }
    }

    mod age_check {
        use super::*;

        #[test]
        fn missing_birth_date_needs_more_info() {
            let facts = Facts::empty().with_sex(Sex::Female);
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::NeedsMoreInfo);
            assert_eq!(result.checks.age_check.unwrap().status, CheckStatus::Missing);
        }

        #[test]
        fn malformed_birth_date_is_invalid() {
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("not-a-date");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::NeedsMoreInfo);
            assert_eq!(result.confidence, 0.5);
            assert_eq!(result.checks.age_check.unwrap().status, CheckStatus::Invalid);
        }

        #[test]
        fn too_young_is_ineligible() {
            // Scenario 3: age 25 at evaluation, outside 50-74.
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1999-02-01")
                .with_last_event_date("2023-06-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::Ineligible);
            assert_eq!(result.confidence, 0.9);
            let age_check = result.checks.age_check.unwrap();
            assert_eq!(age_check.status, CheckStatus::Failed);
            assert_eq!(age_check.detail.unwrap()["subjectAge"], 25);
        }

        #[test]
        fn age_does_not_increment_before_birthday() {
            // Born 1969-08-10; on 2025-01-01 the birthday has not occurred,
            // so age is 55 rather than 56.
            assert_eq!(age_in_years(date("1969-08-10"), date("2025-01-01")), 55);
            assert_eq!(age_in_years(date("1969-08-10"), date("2025-08-09")), 55);
            assert_eq!(age_in_years(date("1969-08-10"), date("2025-08-10")), 56);
        }
    }

    mod interval_check {
        use super::*;

        #[test]
        fn no_history_applies_configured_policy() {
            // Scenario 2: no last event date, policy needs-more-info.
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1978-09-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::NeedsMoreInfo);
            assert_eq!(result.confidence, 0.7);
            assert_eq!(
                result.checks.interval_check.unwrap().status,
                CheckStatus::NoHistory
            );
        }

        #[test]
        fn no_history_policy_can_grant_eligibility() {
            let mut custom = guidelines();
            custom.no_history_policy = Decision::Eligible;
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10");
            let result = GuidelineEngine::new().evaluate(&facts, &custom, date("2025-01-01"));

            assert_eq!(result.decision, Decision::Eligible);
            assert_eq!(result.confidence, 0.7);
        }

        #[test]
        fn recent_event_is_too_soon_to_rescreen() {
            // Scenario 1: cutoff = 2025-01-01 minus 24 months = 2023-01-01;
            // last event 2024-05-01 is after the cutoff, so screening is
            // rejected as too recent.
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10")
                .with_last_event_date("2024-05-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::Ineligible);
            assert_eq!(result.confidence, 0.8);
            let check = result.checks.interval_check.unwrap();
            assert_eq!(check.status, CheckStatus::Failed);
            assert_eq!(check.detail.unwrap()["cutoffDate"], "2023-01-01");
        }

        #[test]
        fn old_event_passes_and_subject_is_eligible() {
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10")
                .with_last_event_date("2022-05-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::Eligible);
            assert_eq!(result.confidence, 0.95);
            assert_eq!(
                result.checks.interval_check.unwrap().status,
                CheckStatus::Passed
            );
        }

        #[test]
        fn event_on_cutoff_day_is_not_too_recent() {
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10")
                .with_last_event_date("2023-01-01");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::Eligible);
        }

        #[test]
        fn month_subtraction_clamps_day_of_month() {
            // 2025-03-31 minus 24 months clamps to 2023-03-31; minus one month
            // would clamp to Feb 28. Use a 1-month interval to exercise it.
            let mut custom = guidelines();
            custom.interval_months = 1;
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10")
                .with_last_event_date("2025-02-28");
            let result = GuidelineEngine::new().evaluate(&facts, &custom, date("2025-03-31"));

            // Cutoff clamps to 2025-02-28; the event is not after it.
            assert_eq!(result.decision, Decision::Eligible);
        }

        #[test]
        fn malformed_last_event_date_is_invalid() {
            let facts = Facts::empty()
                .with_sex(Sex::Female)
                .with_birth_date("1969-08-10")
                .with_last_event_date("05/01/2024");
            let result = evaluate(&facts, "2025-01-01");

            assert_eq!(result.decision, Decision::NeedsMoreInfo);
            assert_eq!(
                result.checks.interval_check.unwrap().status,
                CheckStatus::Invalid
            );
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn optional_date_string() -> impl Strategy<Value = Option<String>> {
            prop_oneof![
                Just(None),
                (1920i32..2025, 1u32..13, 1u32..29)
                    .prop_map(|(y, m, d)| Some(format!("{:04}-{:02}-{:02}", y, m, d))),
                "[a-z]{1,12}".prop_map(Some),
            ]
        }

        proptest! {
            #[test]
            fn evaluation_is_pure(
                birth in optional_date_string(),
                last in optional_date_string(),
            ) {
                let mut facts = Facts::empty().with_sex(Sex::Female);
                facts.birth_date = birth;
                facts.last_event_date = last;
                let config = guidelines();
                let on = date("2025-01-01");

                let first = GuidelineEngine::new().evaluate(&facts, &config, on);
                let second = GuidelineEngine::new().evaluate(&facts, &config, on);
                prop_assert_eq!(first, second);
            }

            #[test]
            fn mismatched_sex_is_ineligible_regardless_of_history(
                birth in optional_date_string(),
                last in optional_date_string(),
            ) {
                let mut facts = Facts::empty().with_sex(Sex::Male);
                facts.birth_date = birth;
                facts.last_event_date = last;

                let result =
                    GuidelineEngine::new().evaluate(&facts, &guidelines(), date("2025-01-01"));
                prop_assert_eq!(result.decision, Decision::Ineligible);
                prop_assert!(result.confidence >= 0.9);
            }
        }
    }
}
