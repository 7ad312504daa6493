//! Customer context rendering
//!
//! [`CustomerContext`] is the precomputed "customer situation" handed to the
//! router by upstream code. This module only renders it into system-prompt
//! text; it never fetches or mutates it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Interactions kept in a rendered prompt
pub const MAX_INTERACTIONS: usize = 10;

/// Weather events kept in a rendered prompt
pub const MAX_WEATHER_EVENTS: usize = 5;

const PREAMBLE: &str = "You are assisting a storm-restoration sales rep with the customer \
below. Rely on these facts and say so when something is not known.";

// ============================================================================
// Context types
// ============================================================================

/// Everything known about one customer, read-only
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerContext {
    /// Identity and contact details
    pub customer: Option<CustomerInfo>,
    /// The property under discussion
    pub property: Option<PropertyInfo>,
    /// Insurance policy and claim state
    pub insurance: Option<InsuranceInfo>,
    /// Sales pipeline state
    pub pipeline: Option<PipelineState>,
    /// Storm events near the property
    pub weather_events: Vec<WeatherEvent>,
    /// Contact history
    pub interactions: Vec<Interaction>,
    /// Free-form notes gathered by the team
    pub intel: Vec<IntelItem>,
}

/// Customer identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInfo {
    /// Full name
    pub name: String,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Preferred contact channel (call, text, email)
    pub preferred_contact: Option<String>,
}

/// Property details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyInfo {
    /// Street address
    pub address: String,
    /// Roofing material
    pub roof_type: Option<String>,
    /// Roof age in years
    pub roof_age_years: Option<u32>,
    /// Roof area in square feet
    pub square_feet: Option<u32>,
}

/// Insurance policy and claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuranceInfo {
    /// Insurance carrier
    pub carrier: Option<String>,
    /// Policy number
    pub policy_number: Option<String>,
    /// Claim number, once filed
    pub claim_number: Option<String>,
    /// Claim status as reported by the carrier
    pub claim_status: Option<String>,
    /// Deductible in dollars
    pub deductible: Option<f64>,
}

/// Pipeline position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineState {
    /// Current stage name
    pub stage: String,
    /// Days spent in the current stage
    pub days_in_stage: Option<u32>,
    /// Estimated job value in dollars
    pub estimated_value: Option<f64>,
    /// Rep who owns the deal
    pub assigned_rep: Option<String>,
}

/// A storm event near the property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherEvent {
    /// Date of the event
    pub date: NaiveDate,
    /// Event kind (hail, wind, tornado)
    pub kind: String,
    /// Reported severity
    #[serde(default)]
    pub severity: Option<String>,
    /// Maximum hail diameter in inches
    #[serde(default)]
    pub hail_size_inches: Option<f32>,
    /// Peak wind speed in mph
    #[serde(default)]
    pub wind_speed_mph: Option<u32>,
}

/// One contact with the customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// When it happened
    pub date: DateTime<Utc>,
    /// Channel (call, text, email, visit)
    pub channel: String,
    /// What was said or done
    pub summary: String,
    /// Customer sentiment, if recorded
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// A team note about the customer or property
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntelItem {
    /// Where the note came from
    pub source: String,
    /// The note
    pub note: String,
}

// ============================================================================
// Rendering
// ============================================================================

/// Render a context into system-prompt text.
///
/// Output is deterministic for a given input. Sections with nothing to say
/// are omitted; weather and interactions are listed most recent first and
/// capped at [`MAX_WEATHER_EVENTS`] and [`MAX_INTERACTIONS`].
#[must_use]
pub fn render_system_prompt(context: &CustomerContext) -> String {
    let mut out = String::from(PREAMBLE);

    if let Some(customer) = &context.customer {
        section(&mut out, "Customer", customer_lines(customer));
    }
    if let Some(property) = &context.property {
        section(&mut out, "Property", property_lines(property));
    }
    if let Some(insurance) = &context.insurance {
        section(&mut out, "Insurance", insurance_lines(insurance));
    }
    if let Some(pipeline) = &context.pipeline {
        section(&mut out, "Pipeline", pipeline_lines(pipeline));
    }
    section(
        &mut out,
        "Recent weather (most recent first)",
        weather_lines(&context.weather_events),
    );
    section(
        &mut out,
        "Recent interactions (most recent first)",
        interaction_lines(&context.interactions),
    );

    let intel = context
        .intel
        .iter()
        .filter(|item| !item.note.trim().is_empty())
        .map(|item| match item.source.trim() {
            "" => format!("- {}", item.note.trim()),
            source => format!("- [{source}] {}", item.note.trim()),
        })
        .collect();
    section(&mut out, "Intel", intel);

    out
}

fn section(out: &mut String, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let _ = write!(out, "\n\n## {title}");
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
}

/// Push `label: value` when the value is present and non-blank
fn field(lines: &mut Vec<String>, label: &str, value: Option<impl AsRef<str>>) {
    if let Some(value) = value {
        let value = value.as_ref().trim();
        if !value.is_empty() {
            lines.push(format!("{label}: {value}"));
        }
    }
}

fn customer_lines(customer: &CustomerInfo) -> Vec<String> {
    let mut lines = Vec::new();
    field(&mut lines, "Name", Some(&customer.name));
    field(&mut lines, "Phone", customer.phone.as_ref());
    field(&mut lines, "Email", customer.email.as_ref());
    field(&mut lines, "Preferred contact", customer.preferred_contact.as_ref());
    lines
}

fn property_lines(property: &PropertyInfo) -> Vec<String> {
    let mut lines = Vec::new();
    field(&mut lines, "Address", Some(&property.address));
    field(&mut lines, "Roof type", property.roof_type.as_ref());
    field(
        &mut lines,
        "Roof age",
        property.roof_age_years.map(|years| format!("{years} years")),
    );
    field(
        &mut lines,
        "Roof area",
        property.square_feet.map(|sqft| format!("{sqft} sq ft")),
    );
    lines
}

fn insurance_lines(insurance: &InsuranceInfo) -> Vec<String> {
    let mut lines = Vec::new();
    field(&mut lines, "Carrier", insurance.carrier.as_ref());
    field(&mut lines, "Policy", insurance.policy_number.as_ref());
    field(&mut lines, "Claim", insurance.claim_number.as_ref());
    field(&mut lines, "Claim status", insurance.claim_status.as_ref());
    field(&mut lines, "Deductible", insurance.deductible.map(format_usd));
    lines
}

fn pipeline_lines(pipeline: &PipelineState) -> Vec<String> {
    let mut lines = Vec::new();
    let stage = match pipeline.days_in_stage {
        Some(days) if !pipeline.stage.trim().is_empty() => {
            format!("{} ({days} days)", pipeline.stage.trim())
        }
        _ => pipeline.stage.clone(),
    };
    field(&mut lines, "Stage", Some(stage));
    field(&mut lines, "Estimated value", pipeline.estimated_value.map(format_usd));
    field(&mut lines, "Assigned rep", pipeline.assigned_rep.as_ref());
    lines
}

fn weather_lines(events: &[WeatherEvent]) -> Vec<String> {
    let mut recent: Vec<&WeatherEvent> = events.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    recent
        .into_iter()
        .take(MAX_WEATHER_EVENTS)
        .map(|event| {
            let mut details = vec![event.kind.trim().to_string()];
            details.extend(event.severity.as_deref().map(str::trim).map(str::to_string));
            details.extend(event.hail_size_inches.map(|size| format!("{size}\" hail")));
            details.extend(event.wind_speed_mph.map(|mph| format!("{mph} mph wind")));
            details.retain(|d| !d.is_empty());
            format!("- {}: {}", event.date.format("%Y-%m-%d"), details.join(", "))
        })
        .collect()
}

fn interaction_lines(interactions: &[Interaction]) -> Vec<String> {
    let mut recent: Vec<&Interaction> = interactions.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    recent
        .into_iter()
        .take(MAX_INTERACTIONS)
        .map(|interaction| {
            let mut line = format!(
                "- {} [{}] {}",
                interaction.date.format("%Y-%m-%d %H:%M UTC"),
                interaction.channel.trim(),
                interaction.summary.trim()
            );
            if let Some(sentiment) = interaction.sentiment.as_deref().map(str::trim) {
                if !sentiment.is_empty() {
                    let _ = write!(line, " ({sentiment})");
                }
            }
            line
        })
        .collect()
}

/// Whole-dollar amount with thousands separators
fn format_usd(amount: f64) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

// ============================================================================
// Tests
// ============================================================================
