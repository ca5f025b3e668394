//! Dose-ramp schedules: the dates on which a therapy's dose changes.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{PosologyPeriod, TherapyForm, TherapyPlanItem, TherapyVariation};

/// Safety cap on generated steps.
pub const MAX_VARIATION_STEPS: u32 = 1000;

/// Tolerance when deciding whether the final quantity was reached.
const QTY_EPSILON: f64 = 1e-9;

/// A dose change taking effect on `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseStep {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Date of step `index` (1-based), computed from `start` so month-end
/// clamping does not accumulate.
fn step_date(start: NaiveDate, period: PosologyPeriod, every: u32, index: u32) -> Option<NaiveDate> {
    let n = every.checked_mul(index)?;
    match period {
        PosologyPeriod::Day => start.checked_add_days(Days::new(u64::from(n))),
        PosologyPeriod::Month => start.checked_add_months(Months::new(n)),
        PosologyPeriod::Year => start.checked_add_months(Months::new(n.checked_mul(12)?)),
    }
}

/// Dose-change dates from `start` until `final_qty` is reached.
///
/// Steps move toward `final_qty` by `|increase_by|` and the last step
/// is clamped to it. Empty when the ramp can never move.
pub fn variation_schedule(start: NaiveDate, variation: &TherapyVariation) -> Vec<DoseStep> {
    let TherapyVariation {
        initial_qty,
        increase_by,
        every_value,
        every_period,
        final_qty,
    } = *variation;

    if every_value == 0
        || !increase_by.is_finite()
        || !initial_qty.is_finite()
        || !final_qty.is_finite()
        || increase_by.abs() < QTY_EPSILON
        || (final_qty - initial_qty).abs() < QTY_EPSILON
    {
        return Vec::new();
    }

    let step = increase_by.abs() * (final_qty - initial_qty).signum();
    let mut steps = Vec::new();
    for index in 1..=MAX_VARIATION_STEPS {
        let Some(date) = step_date(start, every_period, every_value, index) else {
            break;
        };
        let raw = initial_qty + step * f64::from(index);
        let reached = if step > 0.0 {
            raw >= final_qty - QTY_EPSILON
        } else {
            raw <= final_qty + QTY_EPSILON
        };
        steps.push(DoseStep {
            date,
            quantity: if reached { final_qty } else { raw },
        });
        if reached {
            break;
        }
    }
    steps
}

/// Quantity in effect on `date`.
pub fn dose_on(start: NaiveDate, variation: &TherapyVariation, date: NaiveDate) -> f64 {
    variation_schedule(start, variation)
        .iter()
        .take_while(|s| s.date <= date)
        .last()
        .map_or(variation.initial_qty, |s| s.quantity)
}

/// The item's ramp, folding in the older drops ramp. That ramp only
/// counts while the item is still in drops.
pub fn effective_variation(item: &TherapyPlanItem) -> Option<TherapyVariation> {
    if let Some(v) = &item.therapy_variation {
        return Some(v.clone());
    }
    if item.form != TherapyForm::Drops {
        return None;
    }
    item.gocce_ramp.as_ref().map(|r| TherapyVariation {
        initial_qty: f64::from(r.start_drops),
        increase_by: f64::from(r.increase_by),
        every_value: r.increase_every_days,
        every_period: PosologyPeriod::Day,
        final_qty: f64::from(r.max_drops),
    })
}

/// Every dose change for the item: its ramp, or the single legacy
/// `quantity_change_date` step when the new quantity is numeric.
pub fn dose_changes(item: &TherapyPlanItem) -> Vec<DoseStep> {
    let Some(start) = item.start() else {
        return Vec::new();
    };
    if let Some(v) = effective_variation(item) {
        return variation_schedule(start, &v);
    }
    let date = item
        .quantity_change_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
    let quantity = item.quantity_after_change.as_deref().and_then(leading_number);
    match (date, quantity) {
        (Some(date), Some(quantity)) => vec![DoseStep { date, quantity }],
        _ => Vec::new(),
    }
}

/// Dose text in effect on `date`: the ramp quantity carrying the unit
/// of `quantity`, the legacy changed quantity once its date is reached,
/// or the plain quantity.
pub fn dose_label_on(item: &TherapyPlanItem, date: NaiveDate) -> String {
    if let (Some(start), Some(v)) = (item.start(), effective_variation(item)) {
        let unit = quantity_unit(&item.quantity);
        let qty = format_quantity(dose_on(start, &v, date));
        return format!("{qty}{unit}");
    }
    let changed = item
        .quantity_change_date
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .is_some_and(|d| d <= date);
    match item.quantity_after_change.as_deref() {
        Some(after) if changed && !after.trim().is_empty() => after.trim().to_string(),
        _ => item.quantity.clone(),
    }
}

/// Text after the numeric prefix, e.g. "mg" in "2.5mg", " gocce" in "10 gocce".
fn quantity_unit(quantity: &str) -> &str {
    let trimmed = quantity.trim();
    let idx = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(trimmed.len());
    if idx == 0 {
        return "";
    }
    &trimmed[idx..]
}

/// Parse the numeric prefix of a dose such as "2,5 mg" or "12 gocce".
pub fn leading_number(text: &str) -> Option<f64> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    digits.parse().ok()
}

/// Render a quantity without a trailing ".0".
pub fn format_quantity(qty: f64) -> String {
    if qty.fract().abs() < QTY_EPSILON {
        format!("{}", qty.round() as i64)
    } else {
        let s = format!("{qty:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
