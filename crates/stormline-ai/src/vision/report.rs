//! Damage prompt, report parsing, and summaries

use super::types::{
    CostRange, DamageAnalysisResult, DamageItem, DamageSeverity, Recommendation, RoofCondition,
};
use crate::structured::extract_json_object;
use serde_json::Value;
use std::fmt::Write as _;
use tracing::warn;

/// Model name carried by the placeholder report
pub const MOCK_MODEL: &str = "mock";

/// An object must carry at least one of these to count as a report
const REPORT_KEYS: &[&str] = &["has_damage", "hasDamage", "severity", "damage_items", "damageItems"];

const DAMAGE_PROMPT: &str = r#"You are a roofing and exterior damage inspector reviewing a photo of a residential property after a storm.

Respond with exactly one JSON object and nothing else, using this shape:
{
  "has_damage": true | false,
  "severity": "none" | "minor" | "moderate" | "severe",
  "confidence_score": number between 0 and 1,
  "damage_types": ["hail", "wind", ...],
  "damage_items": [
    {
      "type": "short damage kind",
      "location": "where on the structure",
      "description": "what is visible",
      "severity": "minor" | "moderate" | "severe",
      "estimated_cost": {"min": number, "max": number}
    }
  ],
  "roof_condition": {
    "condition": "good" | "fair" | "poor",
    "estimated_age_years": number,
    "remaining_life_years": number,
    "score": integer 0-100
  },
  "recommendation": "none" | "monitor" | "repair" | "replace",
  "observations": ["one sentence per observation"]
}

Costs are US dollars for the itemized repair. If the photo does not show a roof or exterior, set has_damage to false and say why in observations."#;

/// Build the analysis prompt, appending caller context when given
#[must_use]
pub fn damage_prompt(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("{DAMAGE_PROMPT}\n\nAdditional context:\n{context}"),
        None => DAMAGE_PROMPT.to_string(),
    }
}

/// Read a provider's damage report.
///
/// Code fences and surrounding prose are tolerated. Output that holds no
/// readable report becomes [`DamageAnalysisResult::degraded`]; this never
/// fails.
#[must_use]
pub fn parse_damage_report(text: &str, model: &str) -> DamageAnalysisResult {
    let parsed = extract_json_object(text)
        .filter(|map| REPORT_KEYS.iter().any(|key| map.contains_key(*key)))
        .and_then(|map| serde_json::from_value::<DamageAnalysisResult>(Value::Object(map)).ok());

    let Some(mut report) = parsed else {
        warn!(model = %model, "No readable damage report in output, degrading");
        return DamageAnalysisResult::degraded(model, text);
    };

    report.model = model.to_string();
    report.raw_response = None;
    report.confidence_score = report.confidence_score.clamp(0.0, 1.0);
    if !report.has_damage && !report.damage_items.is_empty() {
        report.has_damage = true;
    }
    if report.severity == DamageSeverity::None {
        report.severity = report
            .damage_items
            .iter()
            .map(|item| item.severity)
            .max()
            .unwrap_or_default();
    }
    report
}

/// Illustrative report returned when no vision backend is configured
#[must_use]
pub fn mock_result() -> DamageAnalysisResult {
    DamageAnalysisResult {
        has_damage: true,
        severity: DamageSeverity::Moderate,
        confidence_score: 0.85,
        damage_types: vec!["hail".to_string(), "wind".to_string()],
        damage_items: vec![
            DamageItem {
                kind: "hail".to_string(),
                location: "north-facing slope".to_string(),
                description: "Granule loss and soft spots consistent with 1-1.5 inch hail"
                    .to_string(),
                severity: DamageSeverity::Moderate,
                estimated_cost: CostRange {
                    min: 4500.0,
                    max: 7500.0,
                },
            },
            DamageItem {
                kind: "wind".to_string(),
                location: "ridge cap".to_string(),
                description: "Lifted and creased shingles along the ridge".to_string(),
                severity: DamageSeverity::Minor,
                estimated_cost: CostRange {
                    min: 600.0,
                    max: 1200.0,
                },
            },
        ],
        roof_condition: Some(RoofCondition {
            condition: "fair".to_string(),
            estimated_age_years: Some(12),
            remaining_life_years: Some(6),
            score: Some(58),
        }),
        recommendation: Recommendation::Replace,
        observations: vec![
            "Placeholder report: no vision provider is configured.".to_string(),
        ],
        model: MOCK_MODEL.to_string(),
        raw_response: None,
    }
}

/// Short human-readable summary of a report
#[must_use]
pub fn summarize_damage(result: &DamageAnalysisResult) -> String {
    if result.is_degraded() {
        return format!("Analysis by {} could not be read.", result.model);
    }
    if !result.has_damage {
        return format!(
            "No damage found ({:.0}% confidence).",
            result.confidence_score * 100.0
        );
    }

    let mut summary = format!(
        "{} damage ({:.0}% confidence)",
        capitalize(result.severity.as_str()),
        result.confidence_score * 100.0
    );
    if !result.damage_types.is_empty() {
        let _ = write!(summary, ": {}", result.damage_types.join(", "));
    }
    summary.push('.');

    let (min, max) = result
        .damage_items
        .iter()
        .fold((0.0, 0.0), |(min, max), item| {
            (min + item.estimated_cost.min, max + item.estimated_cost.max)
        });
    if max > 0.0 {
        let _ = write!(summary, " Estimated repair ${min:.0}-${max:.0}.");
    }
    if result.recommendation != Recommendation::None {
        let _ = write!(summary, " Recommend {}.", result.recommendation.as_str());
    }
    summary
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
