//! Labels and dose/time strings for therapy cards.

use crate::models::{Posology, PosologyPeriod, TherapyForm, TherapyPlanItem, TimeOfDay};

use super::variation::format_quantity;

/// Forms considered oral (cards show quantity and time).
pub const ORAL_FORMS: &[TherapyForm] = &[
    TherapyForm::Tablet,
    TherapyForm::Sachet,
    TherapyForm::Drops,
    TherapyForm::Supplement,
];

pub fn is_oral_form(form: TherapyForm) -> bool {
    ORAL_FORMS.contains(&form)
}

/// Map a stored form onto the six choices offered when editing.
pub fn form_to_tipologia(form: TherapyForm) -> TherapyForm {
    match form {
        TherapyForm::Suppository => TherapyForm::Pessary,
        TherapyForm::Supplement => TherapyForm::Other,
        other => other,
    }
}

/// Dose units offered for a form.
pub fn posology_units(form: TherapyForm) -> &'static [&'static str] {
    match form {
        TherapyForm::Tablet | TherapyForm::Pessary | TherapyForm::Suppository => &["mg", "ml", "unità"],
        TherapyForm::Sachet => &["bustina/e", "mg"],
        TherapyForm::Drops => &["gocce", "mg"],
        TherapyForm::Cream => &["applicazioni", "pomate", "g"],
        TherapyForm::Supplement | TherapyForm::Other => {
            &["mg", "ml", "gocce", "bustina/e", "applicazioni", "unità"]
        }
    }
}

fn dose_period_label(period: PosologyPeriod, plural: bool) -> &'static str {
    match (period, plural) {
        (PosologyPeriod::Day, false) => "volta al giorno",
        (PosologyPeriod::Day, true) => "volte al giorno",
        (PosologyPeriod::Month, false) => "volta al mese",
        (PosologyPeriod::Month, true) => "volte al mese",
        (PosologyPeriod::Year, false) => "volta all'anno",
        (PosologyPeriod::Year, true) => "volte all'anno",
    }
}

fn freq_period_plural(period: PosologyPeriod) -> &'static str {
    match period {
        PosologyPeriod::Day => "giorni",
        PosologyPeriod::Month => "mesi",
        PosologyPeriod::Year => "anni",
    }
}

/// "1 volta al giorno x 4 mesi", "2 volte al giorno x 1 Giorno".
pub fn format_posology(p: &Posology) -> String {
    let dose_label = dose_period_label(p.dose_period, p.dose_value != 1);
    let freq_label = if p.freq_value == 1 {
        p.freq_period.label()
    } else {
        freq_period_plural(p.freq_period)
    };
    format!("{} {} x {} {}", p.dose_value, dose_label, p.freq_value, freq_label)
}

/// Time column: Giorno/Notte when set, otherwise the clock time.
pub fn therapy_time_display(item: &TherapyPlanItem) -> String {
    match item.cream_time_of_day {
        Some(TimeOfDay::Day) => "Giorno".to_string(),
        Some(TimeOfDay::Night) => "Notte".to_string(),
        None => item.time.trim().to_string(),
    }
}

/// Dose column: posology (with ramp suffix), legacy drops ramp,
/// free-text quantity, or a dash.
pub fn therapy_dose_display(item: &TherapyPlanItem) -> String {
    if let Some(posology) = &item.posology {
        let main = format_posology(posology);
        return match &item.therapy_variation {
            Some(v) => format!(
                "{main} (da {} a {}, +{} ogni {} {})",
                format_quantity(v.initial_qty),
                format_quantity(v.final_qty),
                format_quantity(v.increase_by),
                v.every_value,
                v.every_period.label()
            ),
            None => main,
        };
    }
    if item.form == TherapyForm::Drops {
        if let Some(r) = &item.gocce_ramp {
            return format!(
                "{} goccia/e → +{} ogni {} gg fino a {}",
                r.start_drops, r.increase_by, r.increase_every_days, r.max_drops
            );
        }
    }
    if item.quantity.trim().is_empty() {
        "—".to_string()
    } else {
        item.quantity.clone()
    }
}
