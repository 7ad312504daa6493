//! Damage report types
//!
//! Deserialization is lenient: unknown enum strings fall back to defaults,
//! numbers may arrive as strings, and `observations` may be one string.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Image to analyze
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageInput {
    /// Remote image, fetched and base64-encoded before analysis
    Url(String),
    /// Inline base64 image
    Base64 {
        /// Base64 payload without a `data:` prefix
        data: String,
        /// MIME type, e.g. `image/jpeg`
        media_type: String,
    },
}

impl ImageInput {
    /// Remote image
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url(url.into())
    }

    /// Inline base64 image
    #[must_use]
    pub fn base64(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self::Base64 {
            data: data.into(),
            media_type: media_type.into(),
        }
    }
}

/// Base64 image ready to send to a vision backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Base64 payload
    pub data: String,
    /// MIME type
    pub media_type: String,
}

impl EncodedImage {
    /// `data:` URL form used by OpenAI-style image parts
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Damage severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageSeverity {
    /// No damage found
    #[default]
    None,
    /// Cosmetic or isolated damage
    Minor,
    /// Damage warranting repair
    Moderate,
    /// Structural or widespread damage
    Severe,
}

impl DamageSeverity {
    /// Map a free-form label, defaulting to `None`
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "minor" | "low" | "light" | "cosmetic" => Self::Minor,
            "moderate" | "medium" => Self::Moderate,
            "severe" | "major" | "high" | "critical" | "extensive" => Self::Severe,
            _ => Self::None,
        }
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl<'de> Deserialize<'de> for DamageSeverity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(Self::from_label).unwrap_or_default())
    }
}

/// What the rep should propose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    /// Nothing to do
    #[default]
    None,
    /// Re-inspect after the next storm
    Monitor,
    /// Spot repair
    Repair,
    /// Full replacement
    Replace,
}

impl Recommendation {
    /// Map a free-form label, defaulting to `None`
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_ascii_lowercase();
        if label.contains("replace") {
            Self::Replace
        } else if label.contains("repair") {
            Self::Repair
        } else if label.contains("monitor") || label.contains("inspect") {
            Self::Monitor
        } else {
            Self::None
        }
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Monitor => "monitor",
            Self::Repair => "repair",
            Self::Replace => "replace",
        }
    }
}

impl<'de> Deserialize<'de> for Recommendation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw.as_str().map(Self::from_label).unwrap_or_default())
    }
}

/// Estimated repair cost in dollars
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostRange {
    /// Low estimate
    #[serde(deserialize_with = "lenient_f64")]
    pub min: f64,
    /// High estimate
    #[serde(deserialize_with = "lenient_f64")]
    pub max: f64,
}

/// One itemized finding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageItem {
    /// Damage kind (hail, wind, missing shingles, ...)
    #[serde(alias = "type", alias = "damage_type")]
    pub kind: String,
    /// Where on the structure
    pub location: String,
    /// What was observed
    pub description: String,
    /// Item severity
    pub severity: DamageSeverity,
    /// Repair cost estimate
    #[serde(alias = "estimatedCost")]
    pub estimated_cost: CostRange,
}

/// Overall roof condition estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoofCondition {
    /// Condition label (good, fair, poor)
    pub condition: String,
    /// Estimated roof age
    #[serde(alias = "estimatedAgeYears", deserialize_with = "lenient_opt_u32")]
    pub estimated_age_years: Option<u32>,
    /// Estimated remaining service life
    #[serde(alias = "remainingLifeYears", deserialize_with = "lenient_opt_u32")]
    pub remaining_life_years: Option<u32>,
    /// Condition score, 0-100
    #[serde(deserialize_with = "lenient_opt_u32")]
    pub score: Option<u32>,
}

/// Structured damage report for one image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageAnalysisResult {
    /// Whether any damage was found
    #[serde(alias = "hasDamage")]
    pub has_damage: bool,
    /// Overall severity
    pub severity: DamageSeverity,
    /// Model confidence in [0, 1]
    #[serde(alias = "confidenceScore", deserialize_with = "lenient_f32")]
    pub confidence_score: f32,
    /// Damage kinds present
    #[serde(alias = "damageTypes", deserialize_with = "string_or_list")]
    pub damage_types: Vec<String>,
    /// Itemized findings
    #[serde(alias = "damageItems")]
    pub damage_items: Vec<DamageItem>,
    /// Roof condition estimate
    #[serde(alias = "roofCondition")]
    pub roof_condition: Option<RoofCondition>,
    /// Proposed next step
    pub recommendation: Recommendation,
    /// Narrative observations
    #[serde(deserialize_with = "string_or_list")]
    pub observations: Vec<String>,
    /// Model that produced the report (`mock` for the placeholder report)
    pub model: String,
    /// Unparsed provider output, set only on degraded reports
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl DamageAnalysisResult {
    /// Report for output that could not be read: no damage, zero confidence,
    /// raw text kept for diagnostics
    #[must_use]
    pub fn degraded(model: impl Into<String>, raw_response: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            raw_response: Some(raw_response.into()),
            ..Default::default()
        }
    }

    /// Whether this report came from unreadable output
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.raw_response.is_some()
    }
}

// ============================================================================
// Lenient field readers
// ============================================================================

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .parse()
            .ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).filter(|n| n.is_finite()).unwrap_or(0.0))
}

fn lenient_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    lenient_f64(deserializer).map(|n| n as f32)
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32))
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if s.trim().is_empty() => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    })
}
