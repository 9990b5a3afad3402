//! Mapping FHIR-style bundles to facts.
//!
//! Reads the shapes we need from an R4-style bundle: `Patient.gender` and
//! `Patient.birthDate` for demographics, and the most recent
//! `Procedure.performedDateTime` for screening history. Anything else in
//! the bundle is ignored.

use serde_json::Value;
use tracing::debug;

use crate::domain::subject::{Facts, Sex};
use crate::ports::FactsError;

/// Translates FHIR bundles into [`Facts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FhirFactsMapper;

impl FhirFactsMapper {
    pub fn new() -> Self {
        Self
    }

    /// Maps a bundle to facts.
    ///
    /// A bundle without a `Patient` resource is malformed; missing fields
    /// within the patient map to absent facts rather than errors, since the
    /// guideline engine classifies incomplete facts itself.
    pub fn facts_from_bundle(&self, bundle: &Value) -> Result<Facts, FactsError> {
        let resources: Vec<&Value> = bundle
            .get("entry")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("resource"))
                    .collect()
            })
            .unwrap_or_default();

        let patient = resources
            .iter()
            .find(|r| resource_type(r) == Some("Patient"))
            .ok_or_else(|| FactsError::Malformed("bundle has no Patient resource".to_string()))?;

        let sex = match patient.get("gender").and_then(Value::as_str) {
            Some("female") => Sex::Female,
            Some("male") => Sex::Male,
            _ => Sex::Unknown,
        };
        let birth_date = patient
            .get("birthDate")
            .and_then(Value::as_str)
            .map(str::to_string);

        // Most recent procedure date, comparing ISO strings lexically after
        // truncating any time component.
        let last_event_date = resources
            .iter()
            .filter(|r| resource_type(r) == Some("Procedure"))
            .filter_map(|r| r.get("performedDateTime").and_then(Value::as_str))
            .map(date_portion)
            .max()
            .map(str::to_string);

        debug!(?sex, ?birth_date, ?last_event_date, "mapped FHIR bundle");

        let mut facts = Facts::empty().with_sex(sex);
        facts.birth_date = birth_date;
        facts.last_event_date = last_event_date;
        Ok(facts)
    }
}

fn resource_type(resource: &Value) -> Option<&str> {
    resource.get("resourceType").and_then(Value::as_str)
}

/// `2024-05-01T10:30:00Z` → `2024-05-01`.
fn date_portion(datetime: &str) -> &str {
    datetime.split('T').next().unwrap_or(datetime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bundle(resources: Vec<Value>) -> Value {
        json!({
            "resourceType": "Bundle",
            "entry": resources
                .into_iter()
                .map(|r| json!({ "resource": r }))
                .collect::<Vec<_>>(),
        })
    }

    #[test]
    fn maps_patient_demographics() {
        let bundle = bundle(vec![json!({
            "resourceType": "Patient",
            "gender": "female",
            "birthDate": "1969-08-10",
        })]);

        let facts = FhirFactsMapper::new().facts_from_bundle(&bundle).unwrap();
        assert_eq!(facts.sex, Sex::Female);
        assert_eq!(facts.birth_date.as_deref(), Some("1969-08-10"));
        assert!(facts.last_event_date.is_none());
    }

    #[test]
    fn takes_the_most_recent_procedure() {
        let bundle = bundle(vec![
            json!({ "resourceType": "Patient", "gender": "female", "birthDate": "1969-08-10" }),
            json!({ "resourceType": "Procedure", "performedDateTime": "2022-03-15" }),
            json!({ "resourceType": "Procedure", "performedDateTime": "2024-05-01T10:30:00Z" }),
            json!({ "resourceType": "Procedure", "performedDateTime": "2020-01-02" }),
        ]);

        let facts = FhirFactsMapper::new().facts_from_bundle(&bundle).unwrap();
        assert_eq!(facts.last_event_date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn unknown_gender_maps_to_unknown() {
        let bundle = bundle(vec![json!({
            "resourceType": "Patient",
            "gender": "other",
        })]);

        let facts = FhirFactsMapper::new().facts_from_bundle(&bundle).unwrap();
        assert_eq!(facts.sex, Sex::Unknown);
    }

    #[test]
    fn patient_with_no_fields_yields_empty_facts() {
        let bundle = bundle(vec![json!({ "resourceType": "Patient" })]);
        let facts = FhirFactsMapper::new().facts_from_bundle(&bundle).unwrap();
        assert_eq!(facts, Facts::empty());
    }

    #[test]
    fn bundle_without_patient_is_malformed() {
        let bundle = bundle(vec![json!({ "resourceType": "Procedure" })]);
        let result = FhirFactsMapper::new().facts_from_bundle(&bundle);
        assert!(matches!(result, Err(FactsError::Malformed(_))));
    }

    #[test]
    fn empty_bundle_is_malformed() {
        let result = FhirFactsMapper::new().facts_from_bundle(&json!({}));
        assert!(matches!(result, Err(FactsError::Malformed(_))));
    }
}
