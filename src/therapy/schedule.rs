//! Which therapies apply on a given calendar date.

use chrono::{Datelike, Months, NaiveDate};

use crate::models::{AlternateFrequency, DurationType, TherapyPlanItem};

/// The item's alternation partner: the item it names, or else the
/// first item naming it.
pub fn find_partner<'a>(
    item: &TherapyPlanItem,
    plan: &'a [TherapyPlanItem],
) -> Option<&'a TherapyPlanItem> {
    match item.alternate_with_id {
        Some(id) => plan.iter().find(|t| t.id == id),
        None => plan.iter().find(|t| t.alternate_with_id == Some(item.id)),
    }
}

/// Whether `item` is the active member of its alternating pair on
/// `date`. Items without a partner or frequency are always shown.
///
/// The lower id takes the even slots, counted from the earlier of the
/// two start dates.
pub fn should_show_therapy_today(
    item: &TherapyPlanItem,
    plan: &[TherapyPlanItem],
    date: NaiveDate,
) -> bool {
    let Some(other) = find_partner(item, plan) else {
        return true;
    };
    let Some(freq) = item.alternate_frequency.or(other.alternate_frequency) else {
        return true;
    };
    let (Some(a), Some(b)) = (item.start(), other.start()) else {
        return true;
    };

    let start = a.min(b);
    let first_id = item.id.min(other.id);
    let days = (date - start).num_days();

    let show_first = match freq {
        AlternateFrequency::DayByDay => days.rem_euclid(2) == 0,
        AlternateFrequency::WeekByWeek => days.div_euclid(7).rem_euclid(2) == 0,
        AlternateFrequency::MonthsByMonths => {
            let block_len = item
                .alternate_months_value
                .or(other.alternate_months_value)
                .unwrap_or(1)
                .max(1) as i64;
            months_between(start, date)
                .div_euclid(block_len)
                .rem_euclid(2)
                == 0
        }
    };

    if item.id == first_id {
        show_first
    } else {
        !show_first
    }
}

/// Whole months from `start` to `date`; a month only counts once the
/// day of month has been reached.
pub(crate) fn months_between(start: NaiveDate, date: NaiveDate) -> i64 {
    let years = i64::from(date.year() - start.year());
    let months = i64::from(date.month()) - i64::from(start.month());
    let partial = if date.day() >= start.day() { 0 } else { 1 };
    years * 12 + months - partial
}

/// Whether `date` falls inside the item's course (start date and
/// duration). A duration value of 0 means open-ended.
pub fn is_within_course(item: &TherapyPlanItem, date: NaiveDate) -> bool {
    let Some(start) = item.start() else {
        return true;
    };
    if date < start {
        return false;
    }
    let value = item.duration.value;
    if value == 0 {
        return true;
    }
    match item.duration.duration_type {
        DurationType::Days => (date - start).num_days() < i64::from(value),
        DurationType::Months => match start.checked_add_months(Months::new(value)) {
            Some(end) => date < end,
            None => true,
        },
        DurationType::DaysPerMonth => {
            let elapsed = u32::try_from(months_between(start, date)).unwrap_or(0);
            let anniversary = start
                .checked_add_months(Months::new(elapsed))
                .unwrap_or(start);
            (date - anniversary).num_days() < i64::from(value)
        }
    }
}

/// Minutes since midnight for "HH:MM"; None when unparsable.
pub fn time_to_minutes(time: &str) -> Option<u32> {
    let (h, m) = time.trim().split_once(':')?;
    let h: u32 = h.trim().parse().ok()?;
    let m: u32 = m.trim().parse().ok()?;
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Therapies to take on `date`: not paused, inside their course and
/// active in their alternation. Ordered by time of day, then id.
pub fn therapies_for_day(plan: &[TherapyPlanItem], date: NaiveDate) -> Vec<&TherapyPlanItem> {
    let mut items: Vec<&TherapyPlanItem> = plan
        .iter()
        .filter(|t| !t.paused)
        .filter(|t| is_within_course(t, date))
        .filter(|t| should_show_therapy_today(t, plan, date))
        .collect();
    items.sort_by_key(|t| (time_to_minutes(&t.time).unwrap_or(u32::MAX), t.id));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TherapyDuration, TherapyForm};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn item(id: u32, start: &str) -> TherapyPlanItem {
        TherapyPlanItem {
            id,
            name: format!("T{id}"),
            form: TherapyForm::Cream,
            form_other: None,
            quantity: String::new(),
            posology: None,
            start_date: start.into(),
            duration: TherapyDuration::default(),
            quantity_change_date: None,
            quantity_after_change: None,
            gocce_ramp: None,
            therapy_variation: None,
            alternate_with_id: None,
            alternate_frequency: None,
            alternate_months_value: None,
            time: "22:30".into(),
            cream_time_of_day: None,
            paused: false,
            notes: String::new(),
        }
    }

    fn pair(freq: AlternateFrequency) -> Vec<TherapyPlanItem> {
        let mut a = item(3, "2024-01-01");
        a.alternate_with_id = Some(5);
        a.alternate_frequency = Some(freq);
        let b = item(5, "2024-01-10");
        vec![a, b]
    }

    #[test]
    fn unpaired_item_always_shown() {
        let plan = vec![item(1, "2024-01-01")];
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-03-07")));
    }

    #[test]
    fn partner_without_frequency_always_shown() {
        let mut plan = vec![item(1, "2024-01-01"), item(2, "2024-01-01")];
        plan[0].alternate_with_id = Some(2);
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-02")));
        assert!(should_show_therapy_today(&plan[1], &plan, d("2024-01-02")));
    }

    #[test]
    fn day_by_day_alternates_from_earlier_start() {
        let plan = pair(AlternateFrequency::DayByDay);
        // Start is 2024-01-01 (item 3, the lower id).
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-01")));
        assert!(!should_show_therapy_today(&plan[1], &plan, d("2024-01-01")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-01-02")));
        assert!(should_show_therapy_today(&plan[1], &plan, d("2024-01-02")));
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-03-01")));
    }

    #[test]
    fn exactly_one_of_pair_each_day() {
        for freq in AlternateFrequency::ALL {
            let plan = pair(*freq);
            let mut date = d("2023-11-01");
            while date < d("2024-12-31") {
                let a = should_show_therapy_today(&plan[0], &plan, date);
                let b = should_show_therapy_today(&plan[1], &plan, date);
                assert!(a ^ b, "{freq} on {date}");
                date = date.succ_opt().unwrap();
            }
        }
    }

    #[test]
    fn partner_found_by_reverse_link() {
        let plan = pair(AlternateFrequency::DayByDay);
        // Item 5 has no link of its own; it inherits the frequency too.
        assert_eq!(find_partner(&plan[1], &plan).map(|t| t.id), Some(3));
    }

    #[test]
    fn week_by_week_switches_every_seven_days() {
        let plan = pair(AlternateFrequency::WeekByWeek);
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-07")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-01-08")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-01-14")));
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-15")));
    }

    #[test]
    fn months_blocks_use_month_value() {
        let mut plan = pair(AlternateFrequency::MonthsByMonths);
        plan[1].alternate_months_value = Some(2);
        // Months 0-1 → first, 2-3 → second.
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-02-29")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-03-01")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-04-30")));
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-05-01")));
    }

    #[test]
    fn month_not_counted_before_day_of_month() {
        assert_eq!(months_between(d("2024-01-15"), d("2024-02-14")), 0);
        assert_eq!(months_between(d("2024-01-15"), d("2024-02-15")), 1);
        assert_eq!(months_between(d("2023-12-31"), d("2024-01-30")), 0);
    }

    #[test]
    fn zero_month_value_treated_as_one() {
        let mut plan = pair(AlternateFrequency::MonthsByMonths);
        plan[0].alternate_months_value = Some(0);
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-20")));
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2024-02-01")));
    }

    #[test]
    fn dates_before_start_keep_parity() {
        let plan = pair(AlternateFrequency::DayByDay);
        assert!(!should_show_therapy_today(&plan[0], &plan, d("2023-12-31")));
        assert!(should_show_therapy_today(&plan[0], &plan, d("2023-12-30")));
    }

    #[test]
    fn unparsable_start_shows_item() {
        let mut plan = pair(AlternateFrequency::DayByDay);
        plan[1].start_date = "soon".into();
        assert!(should_show_therapy_today(&plan[0], &plan, d("2024-01-02")));
        assert!(should_show_therapy_today(&plan[1], &plan, d("2024-01-02")));
    }

    #[test]
    fn course_in_days_is_end_exclusive() {
        let mut t = item(1, "2024-01-01");
        t.duration = TherapyDuration { duration_type: DurationType::Days, value: 10 };
        assert!(!is_within_course(&t, d("2023-12-31")));
        assert!(is_within_course(&t, d("2024-01-10")));
        assert!(!is_within_course(&t, d("2024-01-11")));
    }

    #[test]
    fn course_in_months() {
        let mut t = item(1, "2024-01-31");
        t.duration = TherapyDuration { duration_type: DurationType::Months, value: 1 };
        assert!(is_within_course(&t, d("2024-02-28")));
        assert!(!is_within_course(&t, d("2024-02-29")));
    }

    #[test]
    fn days_per_month_repeats_monthly() {
        let mut t = item(1, "2024-01-05");
        t.duration = TherapyDuration { duration_type: DurationType::DaysPerMonth, value: 3 };
        assert!(is_within_course(&t, d("2024-01-07")));
        assert!(!is_within_course(&t, d("2024-01-08")));
        assert!(is_within_course(&t, d("2024-03-05")));
        assert!(!is_within_course(&t, d("2024-03-04")));
    }

    #[test]
    fn zero_duration_is_open_ended() {
        let t = item(1, "2020-01-01");
        assert!(is_within_course(&t, d("2030-01-01")));
    }

    #[test]
    fn therapies_for_day_filters_and_sorts() {
        let mut plan = pair(AlternateFrequency::DayByDay);
        let mut morning = item(7, "2024-01-01");
        morning.time = "08:00".into();
        let mut paused = item(8, "2024-01-01");
        paused.paused = true;
        let future = item(9, "2025-01-01");
        plan.extend([morning, paused, future]);

        // Day 11 of the pair: odd, so item 5 (already started) is active.
        let ids: Vec<u32> = therapies_for_day(&plan, d("2024-01-12"))
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![7, 5]);
    }

    #[test]
    fn time_to_minutes_parses_and_rejects() {
        assert_eq!(time_to_minutes("22:30"), Some(1350));
        assert_eq!(time_to_minutes(" 8:05 "), Some(485));
        assert_eq!(time_to_minutes("25:00"), None);
        assert_eq!(time_to_minutes(""), None);
    }
}
