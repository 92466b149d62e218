//! Treatment semaphore enrichment of the scoring payload.
//!
//! Cross-references the scoring service's per-drug resistance levels
//! against the patient's currently active treatments. Every level row is
//! annotated in place with its semaphore classification and, when the drug
//! matches an active prescription, the matching brand names. Rows are only
//! annotated, never added or removed.

use crate::semaphore::SemaphoreConfig;
use hivres_types::TreatmentRecord;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};

/// Booster suffixes stripped from a drug abbreviation before matching.
///
/// Exactly ritonavir (`/R`) and cobicistat (`/C`); no general pattern.
const BOOSTER_SUFFIXES: [&str; 2] = ["/R", "/C"];

/// Annotates every drug-resistance level in `payload` with its semaphore
/// classification and active-treatment evidence.
///
/// Pass-through guards (the input is returned unchanged, not promoted to an
/// error): a `Null` payload, absent treatments, or a payload whose `error`
/// field is truthy. Blocks or level rows that are absent or malformed are
/// skipped silently; every well-formed row always receives a classification,
/// so unexpected payload shapes degrade to no-op annotation rather than
/// failing the report.
pub fn enrich(
    payload: Value,
    treatments: Option<&[TreatmentRecord]>,
    cfg: &SemaphoreConfig,
) -> Value {
    let Some(treatments) = treatments else {
        return payload;
    };
    if payload.is_null() || payload.get("error").map(is_truthy).unwrap_or(false) {
        return payload;
    }

    let active_index = active_drug_index(treatments);

    let mut payload = payload;
    if let Some(blocks) = payload
        .pointer_mut("/data/mutationsAnalysis/drugResistance")
        .and_then(Value::as_array_mut)
    {
        for block in blocks {
            let Some(levels) = block.get_mut("levels").and_then(Value::as_array_mut) else {
                tracing::debug!("drug resistance block carries no levels, skipping");
                continue;
            };

            for level in levels {
                let Some(row) = level.as_object_mut() else {
                    continue;
                };

                let semaphore = cfg.classify(row.get("text").and_then(Value::as_str));
                row.insert("semaphore_name".into(), json!(semaphore.name()));
                row.insert("semaphore_color".into(), json!(semaphore.color()));

                let abbr = row
                    .get("drug")
                    .and_then(|drug| drug.get("displayAbbr"))
                    .and_then(Value::as_str)
                    .unwrap_or("");

                match match_active_drug(abbr, &active_index) {
                    Some(brands) => {
                        row.insert("is_active_treatment".into(), json!(true));
                        row.insert("display_status".into(), json!("PRESCRIBED"));
                        row.insert("matched_brands".into(), json!(brands));
                    }
                    None => {
                        row.insert("is_active_treatment".into(), json!(false));
                        row.insert("display_status".into(), json!("INACTIVE"));
                        row.insert("matched_brands".into(), json!([]));
                    }
                }
            }
        }
    } else {
        tracing::debug!("scoring payload carries no drug resistance blocks, skipping enrichment");
    }

    payload
}

/// JavaScript-style truthiness for the `error` field of a scoring payload.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Builds the active-drug index: uppercased drug token → brand names
/// accumulated across all active treatments carrying that token.
///
/// Combination labels (`DRV+COBI`) contribute one entry per component.
/// `info.brand` is preferred as the brand name, falling back to
/// `info.text`; a token with no usable brand still enters the index so the
/// drug is marked prescribed with an empty brand set.
fn active_drug_index(treatments: &[TreatmentRecord]) -> HashMap<String, BTreeSet<String>> {
    let mut index: HashMap<String, BTreeSet<String>> = HashMap::new();

    for treatment in treatments.iter().filter(|t| t.is_active()) {
        let brand = if treatment.info.brand.is_empty() {
            treatment.info.text.as_str()
        } else {
            treatment.info.brand.as_str()
        };

        for token in treatment.info.targa_short.split('+') {
            let token = token.trim().to_uppercase();
            if token.is_empty() {
                continue;
            }

            let brands = index.entry(token).or_default();
            if !brand.is_empty() {
                brands.insert(brand.to_string());
            }
        }
    }

    index
}

/// Matches a level's drug abbreviation against the active-drug index:
/// exact uppercased match first, then with a trailing booster suffix
/// stripped. First rule to succeed wins.
fn match_active_drug<'a>(
    abbr: &str,
    index: &'a HashMap<String, BTreeSet<String>>,
) -> Option<&'a BTreeSet<String>> {
    let upper = abbr.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    if let Some(brands) = index.get(&upper) {
        return Some(brands);
    }

    for suffix in BOOSTER_SUFFIXES {
        if let Some(stripped) = upper.strip_suffix(suffix) {
            if let Some(brands) = index.get(stripped) {
                return Some(brands);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use hivres_types::TreatmentInfo;

    fn active_treatment(targa_short: &str, brand: &str, text: &str) -> TreatmentRecord {
        TreatmentRecord {
            start_date: None,
            end_date: None,
            info: TreatmentInfo {
                targa_short: targa_short.into(),
                brand: brand.into(),
                text: text.into(),
            },
        }
    }

    fn payload_with_levels(levels: Value) -> Value {
        json!({
            "data": {
                "mutationsAnalysis": {
                    "drugResistance": [
                        {
                            "gene": { "name": "PR" },
                            "levels": levels
                        }
                    ]
                }
            }
        })
    }

    fn first_level(payload: &Value) -> &Value {
        &payload["data"]["mutationsAnalysis"]["drugResistance"][0]["levels"][0]
    }

    #[test]
    fn marks_boosted_drug_as_prescribed_with_matched_brand() {
        let payload = payload_with_levels(json!([
            {
                "drug": { "name": "DRV", "displayAbbr": "DRV/r", "fullName": "darunavir/r" },
                "text": "Susceptible"
            }
        ]));
        let treatments = vec![active_treatment("DRV+COBI", "REZOLSTA", "")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let level = first_level(&enriched);
        assert_eq!(level["semaphore_name"], "GREEN");
        assert_eq!(level["semaphore_color"], "#28a745");
        assert_eq!(level["is_active_treatment"], true);
        assert_eq!(level["display_status"], "PRESCRIBED");
        assert_eq!(level["matched_brands"], json!(["REZOLSTA"]));
    }

    #[test]
    fn marks_unmatched_resistant_drug_as_inactive() {
        let payload = payload_with_levels(json!([
            {
                "drug": { "name": "ATV", "displayAbbr": "ATV/r", "fullName": "atazanavir/r" },
                "text": "High-Level Resistance"
            }
        ]));
        let treatments = vec![active_treatment("DRV+COBI", "REZOLSTA", "")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let level = first_level(&enriched);
        assert_eq!(level["semaphore_name"], "RED");
        assert_eq!(level["is_active_treatment"], false);
        assert_eq!(level["display_status"], "INACTIVE");
        assert_eq!(level["matched_brands"], json!([]));
    }

    #[test]
    fn error_payload_passes_through_unchanged() {
        let payload = json!({ "error": true, "message": "scoring service unreachable" });
        let treatments: Vec<TreatmentRecord> = vec![];

        let enriched = enrich(payload.clone(), Some(&treatments), &SemaphoreConfig::default());

        assert_eq!(enriched, payload);
    }

    #[test]
    fn absent_treatments_pass_payload_through_unchanged() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "DTG" }, "text": "Susceptible" }
        ]));

        let enriched = enrich(payload.clone(), None, &SemaphoreConfig::default());

        assert_eq!(enriched, payload);
    }

    #[test]
    fn null_payload_passes_through_unchanged() {
        let treatments = vec![active_treatment("DTG", "TIVICAY", "")];

        let enriched = enrich(Value::Null, Some(&treatments), &SemaphoreConfig::default());

        assert_eq!(enriched, Value::Null);
    }

    #[test]
    fn cobicistat_suffix_is_stripped_for_matching() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "EVG/c" }, "text": "Susceptible" }
        ]));
        let treatments = vec![active_treatment("EVG+COBI+FTC+TAF", "GENVOYA", "")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let level = first_level(&enriched);
        assert_eq!(level["is_active_treatment"], true);
        assert_eq!(level["matched_brands"], json!(["GENVOYA"]));
    }

    #[test]
    fn inactive_treatments_do_not_enter_the_index() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "DRV/r" }, "text": "Susceptible" }
        ]));
        let treatments = vec![TreatmentRecord {
            end_date: "2020-03-01".parse().ok(),
            ..active_treatment("DRV+COBI", "REZOLSTA", "")
        }];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        assert_eq!(first_level(&enriched)["is_active_treatment"], false);
    }

    #[test]
    fn brand_falls_back_to_info_text() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "DTG" }, "text": "Susceptible" }
        ]));
        let treatments = vec![active_treatment("DTG", "", "DOLUTEGRAVIR")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        assert_eq!(
            first_level(&enriched)["matched_brands"],
            json!(["DOLUTEGRAVIR"])
        );
    }

    #[test]
    fn duplicate_brands_across_treatments_collapse() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "FTC" }, "text": "Low-Level Resistance" }
        ]));
        let treatments = vec![
            active_treatment("FTC+TAF", "DESCOVY", ""),
            active_treatment("FTC+TDF", "DESCOVY", ""),
        ];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let level = first_level(&enriched);
        assert_eq!(level["semaphore_name"], "BLUE");
        assert_eq!(level["matched_brands"], json!(["DESCOVY"]));
    }

    #[test]
    fn unknown_category_defaults_to_gray() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "XYZ" } }
        ]));
        let treatments: Vec<TreatmentRecord> = vec![];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let level = first_level(&enriched);
        assert_eq!(level["semaphore_name"], "GRAY");
        assert_eq!(level["semaphore_color"], "#6c757d");
    }

    #[test]
    fn malformed_blocks_and_rows_are_skipped_silently() {
        let payload = json!({
            "data": {
                "mutationsAnalysis": {
                    "drugResistance": [
                        { "gene": { "name": "RT" } },
                        { "levels": "not-an-array" },
                        {
                            "levels": [
                                "not-an-object",
                                { "drug": { "displayAbbr": "DTG" }, "text": "Susceptible" }
                            ]
                        }
                    ]
                }
            }
        });
        let treatments = vec![active_treatment("DTG", "TIVICAY", "")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let blocks = &enriched["data"]["mutationsAnalysis"]["drugResistance"];
        assert_eq!(blocks[0], json!({ "gene": { "name": "RT" } }));
        assert_eq!(blocks[1], json!({ "levels": "not-an-array" }));
        assert_eq!(blocks[2]["levels"][0], "not-an-object");
        assert_eq!(blocks[2]["levels"][1]["is_active_treatment"], true);
    }

    #[test]
    fn rows_are_annotated_but_never_added_or_removed() {
        let payload = payload_with_levels(json!([
            { "drug": { "displayAbbr": "ATV/r" }, "text": "High-Level Resistance" },
            { "drug": { "displayAbbr": "DRV/r" }, "text": "Susceptible" }
        ]));
        let treatments = vec![active_treatment("DRV+COBI", "REZOLSTA", "")];

        let enriched = enrich(payload, Some(&treatments), &SemaphoreConfig::default());

        let levels = enriched["data"]["mutationsAnalysis"]["drugResistance"][0]["levels"]
            .as_array()
            .expect("levels array");
        assert_eq!(levels.len(), 2);
        // Original fields survive alongside the annotations.
        assert_eq!(levels[0]["text"], "High-Level Resistance");
        assert_eq!(levels[1]["drug"]["displayAbbr"], "DRV/r");
    }
}
