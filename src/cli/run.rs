//! Dispatch of parsed commands to the command layer.
//!
//! Results are printed as pretty JSON on stdout; logs go to stderr.

use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use super::args::{
    AlternationArgs, AppointmentCmd, DayCmd, DiaryCmd, NotificationCmd, ProfileCmd, RampArgs,
    ReminderCmd, TherapyCmd, VoidingCmd,
};
use super::Command;
use crate::commands::{
    self, appointment, backup, day, diary, notifications, profile, therapy, voiding,
};
use crate::core_state::CoreState;
use crate::models::{
    AppointmentDraft, DailyLogDraft, DiaryPatch, FeatureTogglesPatch, NewDiary, NewTherapy,
    NotificationPrefsPatch, ProfilePatch, SwabScores, SwabTestPatch, TherapyDuration,
    TherapyPatch, TherapyVariation,
};

/// What every command runs against.
pub struct Context {
    pub state: CoreState,
    pub today: NaiveDate,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

impl RampArgs {
    fn variation(&self) -> Option<TherapyVariation> {
        Some(TherapyVariation {
            initial_qty: self.ramp_initial?,
            increase_by: self.ramp_by?,
            every_value: self.ramp_every?,
            every_period: self.ramp_period,
            final_qty: self.ramp_final?,
        })
    }
}

impl AlternationArgs {
    fn apply(&self, patch: &mut TherapyPatch) {
        if let Some(id) = self.alternate_with {
            patch.alternate_with_id = Some(Some(id));
        }
        if let Some(freq) = self.alternate_frequency {
            patch.alternate_frequency = Some(Some(freq));
        }
        if let Some(months) = self.alternate_months {
            patch.alternate_months_value = Some(Some(months));
        }
    }
}

impl Command {
    pub fn run(&self, ctx: &Context) -> Result<(), String> {
        match self {
            Command::Today => print_json(&commands::today(ctx.today, &ctx.state)?),
            Command::Therapy { cmd } => cmd.run(ctx),
            Command::Day { cmd } => cmd.run(ctx),
            Command::Appointment { cmd } => cmd.run(ctx),
            Command::Diary { cmd } => cmd.run(ctx),
            Command::Voiding { cmd } => cmd.run(ctx),
            Command::Profile { cmd } => cmd.run(ctx),
            Command::Reminders { cmd } => cmd.run(ctx),
            Command::Notifications { cmd } => cmd.run(ctx),
            Command::Check => print_json(&notifications::check_now(&ctx.state)?),
            Command::Watch { interval } => {
                let secs = (*interval).max(1);
                let handle = notifications::start_watch(&ctx.state, Duration::from_secs(secs));
                eprintln!("Checking reminders every {secs}s, Ctrl-C to stop");
                while handle.is_running() {
                    std::thread::sleep(Duration::from_secs(1));
                }
                Ok(())
            }
            Command::Export { path } => {
                let count = backup::export_backup(path, &ctx.state)?;
                println!("Exported {count} keys to {}", path.display());
                Ok(())
            }
            Command::Import { path } => {
                let count = backup::import_backup(path, &ctx.state)?;
                println!("Imported {count} keys from {}", path.display());
                Ok(())
            }
            Command::Reset { yes } => {
                backup::reset_app(*yes, &ctx.state)?;
                println!("All data deleted");
                Ok(())
            }
        }
    }
}

impl TherapyCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            TherapyCmd::List => print_json(&therapy::list_therapies(state)?),
            TherapyCmd::On { date } => {
                print_json(&therapy::therapies_on(date.unwrap_or(ctx.today), state)?)
            }
            TherapyCmd::Add {
                name,
                form,
                form_other,
                quantity,
                start,
                time,
                duration_type,
                duration,
                cream_time,
                notes,
                alternation,
                ramp,
            } => {
                let new = NewTherapy {
                    name: name.clone(),
                    form: *form,
                    form_other: form_other.clone(),
                    quantity: quantity.clone(),
                    posology: None,
                    start_date: start.clone(),
                    duration: TherapyDuration {
                        duration_type: *duration_type,
                        value: *duration,
                    },
                    therapy_variation: ramp.variation(),
                    gocce_ramp: None,
                    alternate_with_id: alternation.alternate_with,
                    alternate_frequency: alternation.alternate_frequency,
                    alternate_months_value: alternation.alternate_months,
                    time: time.clone(),
                    cream_time_of_day: *cream_time,
                    paused: false,
                    notes: notes.clone(),
                };
                print_json(&therapy::add_therapy(new, state)?)
            }
            TherapyCmd::Update {
                id,
                name,
                form,
                quantity,
                start,
                time,
                duration_type,
                duration,
                notes,
                clear_alternation,
                clear_ramp,
                alternation,
                ramp,
            } => {
                let mut patch = TherapyPatch {
                    name: name.clone(),
                    form: *form,
                    quantity: quantity.clone(),
                    start_date: start.clone(),
                    time: time.clone(),
                    notes: notes.clone(),
                    ..TherapyPatch::default()
                };
                if let Some(value) = duration {
                    let duration_type = match duration_type {
                        Some(t) => *t,
                        None => therapy::list_therapies(state)?
                            .into_iter()
                            .find(|t| t.id == *id)
                            .map(|t| t.duration.duration_type)
                            .unwrap_or_default(),
                    };
                    patch.duration = Some(TherapyDuration {
                        duration_type,
                        value: *value,
                    });
                }
                if *clear_alternation {
                    patch.alternate_with_id = Some(None);
                    patch.alternate_frequency = Some(None);
                    patch.alternate_months_value = Some(None);
                } else {
                    alternation.apply(&mut patch);
                }
                if *clear_ramp {
                    patch.therapy_variation = Some(None);
                } else if let Some(v) = ramp.variation() {
                    patch.therapy_variation = Some(Some(v));
                }
                print_json(&therapy::update_therapy(*id, patch, state)?)
            }
            TherapyCmd::Remove { id } => {
                let removed = therapy::remove_therapy(*id, state)?;
                println!("Removed {} ({})", removed.name, removed.id);
                Ok(())
            }
            TherapyCmd::Pause { id } => print_json(&therapy::pause_therapy(*id, state)?),
            TherapyCmd::Resume { id } => print_json(&therapy::resume_therapy(*id, state)?),
            TherapyCmd::History => print_json(&therapy::therapy_history(state)?),
            TherapyCmd::Schedule { id } => print_json(&therapy::therapy_schedule(*id, state)?),
            TherapyCmd::Seed => {
                if therapy::seed_default_plan(state)? {
                    println!("Starter plan written");
                } else {
                    println!("A plan already exists, nothing written");
                }
                Ok(())
            }
            TherapyCmd::Forms => print_json(&therapy::therapy_forms()),
        }
    }
}

impl DayCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            DayCmd::Show { date } => print_json(&day::get_day(date.unwrap_or(ctx.today), state)?),
            DayCmd::Set {
                date,
                pain,
                clear_pain,
                flow,
                no_period,
                notes,
            } => {
                let update = day::DayUpdate {
                    pain_level: *pain,
                    clear_pain: *clear_pain,
                    period_flow: *flow,
                    clear_period: *no_period,
                    notes: notes.clone(),
                };
                print_json(&day::set_day(*date, update, state)?)
            }
            DayCmd::Take {
                date,
                therapy_id,
                undo,
            } => print_json(&day::take_therapy(*date, *therapy_id, !undo, state)?),
            DayCmd::Month { year, month } => print_json(&day::month(*year, *month, state)?),
            DayCmd::Log {
                date,
                pain,
                period,
                flow,
                adherent,
                notes,
            } => {
                let draft = DailyLogDraft {
                    id: None,
                    date: *date,
                    pain_level: *pain,
                    menstruation: *period,
                    flow_intensity: *flow,
                    therapy_adherence_simple: *adherent,
                    notes: notes.clone(),
                    created_at: None,
                };
                print_json(&day::record_daily_log(draft, state)?)
            }
            DayCmd::Logs { year, month } => {
                print_json(&day::daily_logs_in_month(*year, *month, state)?)
            }
        }
    }
}

impl AppointmentCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            AppointmentCmd::Add {
                date,
                kind,
                other,
                time,
                place,
                remind,
            } => {
                let draft = AppointmentDraft {
                    appointment_type: *kind,
                    type_other: other.clone(),
                    time: time.clone(),
                    place: place.clone(),
                };
                print_json(&appointment::add_appointment(*date, draft, *remind, state)?)
            }
            AppointmentCmd::Move {
                from,
                id,
                to,
                kind,
                other,
                time,
                place,
                remind,
            } => {
                let draft = AppointmentDraft {
                    appointment_type: *kind,
                    type_other: other.clone(),
                    time: time.clone(),
                    place: place.clone(),
                };
                let moved = appointment::move_appointment(*from, id, *to, draft, *remind, state)?;
                print_json(&moved)
            }
            AppointmentCmd::Remove { date, id } => {
                appointment::remove_appointment(*date, id, state)?;
                println!("Appointment {id} removed");
                Ok(())
            }
            AppointmentCmd::Upcoming => {
                print_json(&appointment::upcoming_appointments(ctx.today, state)?)
            }
        }
    }
}

impl DiaryCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            DiaryCmd::List => print_json(&diary::list_diaries(state)?),
            DiaryCmd::Show { id } => print_json(&diary::get_diary(id, state)?),
            DiaryCmd::Add {
                name,
                kind,
                start,
                content,
            } => {
                let new = NewDiary {
                    name: name.clone(),
                    diary_type: *kind,
                    start_date: start.unwrap_or(ctx.today),
                    content: content.clone(),
                };
                print_json(&diary::add_diary(new, state)?)
            }
            DiaryCmd::Update {
                id,
                name,
                start,
                content,
            } => {
                let patch = DiaryPatch {
                    name: name.clone(),
                    diary_type: None,
                    start_date: *start,
                    content: content.clone(),
                };
                print_json(&diary::update_diary(id, patch, state)?)
            }
            DiaryCmd::Remove { id } => {
                let removed = diary::remove_diary(id, state)?;
                println!("Diary {} removed", removed.name);
                Ok(())
            }
        }
    }
}

impl VoidingCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        let now = Local::now().fixed_offset();
        match self {
            VoidingCmd::Intake {
                diary_id,
                at,
                kind,
                ml,
                label,
            } => {
                let intake = voiding::add_fluid_intake(
                    diary_id,
                    at.unwrap_or(now),
                    *kind,
                    *ml,
                    label.clone(),
                    state,
                )?;
                print_json(&intake)
            }
            VoidingCmd::Void {
                diary_id,
                at,
                ml,
                urgency,
                burning,
            } => {
                let entry = voiding::add_voiding(
                    diary_id,
                    at.unwrap_or(now),
                    *ml,
                    *urgency,
                    *burning,
                    state,
                )?;
                print_json(&entry)
            }
            VoidingCmd::Remove { id } => {
                voiding::remove_record(id, state)?;
                println!("Record {id} removed");
                Ok(())
            }
            VoidingCmd::Blocks { diary_id, date } => {
                print_json(&voiding::voiding_day(diary_id, date.unwrap_or(ctx.today), state)?)
            }
        }
    }
}

impl ProfileCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            ProfileCmd::Show => print_json(&profile::get_profile(ctx.today, state)?),
            ProfileCmd::Set {
                first_name,
                last_name,
                birth,
                age,
                diagnosis,
                swab_result,
                swab_note,
                voiding_diary,
            } => {
                let swab_test = (swab_result.is_some() || swab_note.is_some()).then(|| {
                    SwabTestPatch {
                        result: *swab_result,
                        note: swab_note.clone(),
                        scores: None,
                    }
                });
                let patch = ProfilePatch {
                    first_name: first_name.clone(),
                    last_name: last_name.clone(),
                    date_of_birth: *birth,
                    age: *age,
                    diagnosis_date: *diagnosis,
                    swab_test,
                    features: voiding_diary.map(|v| FeatureTogglesPatch {
                        voiding_diary_enabled: Some(v),
                    }),
                    ..ProfilePatch::default()
                };
                print_json(&profile::update_profile(patch, state)?)
            }
            ProfileCmd::Swab {
                date,
                clitoride,
                orefizio_uretrale,
                labbro_destro,
                labbro_sinistro,
                forchetta,
            } => {
                let scores = SwabScores {
                    clitoride: *clitoride,
                    orefizio_uretrale: *orefizio_uretrale,
                    labbro_destro: *labbro_destro,
                    labbro_sinistro: *labbro_sinistro,
                    forchetta: *forchetta,
                };
                print_json(&profile::add_swab_visit(*date, scores, state)?)
            }
            ProfileCmd::RemoveSwab { id } => {
                profile::remove_swab_visit(id, state)?;
                println!("Swab visit {id} removed");
                Ok(())
            }
            ProfileCmd::Specialist { kind, other, start } => {
                print_json(&profile::add_specialist(*kind, other.clone(), *start, state)?)
            }
            ProfileCmd::EndSpecialist { id, end } => {
                print_json(&profile::end_specialist(id, end.unwrap_or(ctx.today), state)?)
            }
        }
    }
}

impl ReminderCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            ReminderCmd::List => print_json(&notifications::get_reminders(state)?),
            ReminderCmd::Medicine {
                therapy_id,
                time,
                off,
            } => {
                notifications::set_medicine_reminder(*therapy_id, time, !off, state)?;
                print_json(&notifications::get_reminders(state)?.medicine)
            }
            ReminderCmd::Appointment { id, minutes, off } => {
                appointment::set_appointment_reminder(id, *minutes, !off, state)?;
                print_json(&notifications::get_reminders(state)?.appointment)
            }
            ReminderCmd::Prefs {
                medicine,
                appointments,
                minutes,
            } => {
                if medicine.is_none() && appointments.is_none() && minutes.is_none() {
                    return print_json(&notifications::get_prefs(state)?);
                }
                let patch = NotificationPrefsPatch {
                    medicine_enabled: *medicine,
                    appointment_enabled: *appointments,
                    appointment_minutes_before: *minutes,
                };
                print_json(&notifications::set_prefs(patch, state)?)
            }
        }
    }
}

impl NotificationCmd {
    fn run(&self, ctx: &Context) -> Result<(), String> {
        let state = &ctx.state;
        match self {
            NotificationCmd::List => print_json(&notifications::notification_log(state)?),
            NotificationCmd::Read { id } => notifications::mark_read(id, state),
            NotificationCmd::ReadAll => notifications::mark_all_read(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::commands::parse_date;
    use clap::Parser;

    fn context() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            state: CoreState::with_path(dir.path().join("dyna.db")),
            today: parse_date("2024-03-04").unwrap(),
        };
        (dir, ctx)
    }

    fn run(ctx: &Context, args: &[&str]) -> Result<(), String> {
        let mut argv = vec!["dyna"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).map_err(|e| e.to_string())?;
        cli.command.unwrap_or(Command::Today).run(ctx)
    }

    #[test]
    fn therapy_add_with_ramp() {
        let (_dir, ctx) = context();
        run(
            &ctx,
            &[
                "therapy", "add", "--name", "Gocce", "--form", "gocce", "--quantity",
                "5 gocce", "--start", "2024-03-01", "--ramp-initial", "5", "--ramp-by", "5",
                "--ramp-every", "7", "--ramp-final", "20",
            ],
        )
        .unwrap();

        let plan = therapy::list_therapies(&ctx.state).unwrap();
        let variation = plan[0].therapy_variation.clone().unwrap();
        assert_eq!(variation.final_qty, 20.0);
        assert_eq!(therapy::therapy_schedule(plan[0].id, &ctx.state).unwrap().len(), 3);
    }

    #[test]
    fn therapy_update_clears_alternation() {
        let (_dir, ctx) = context();
        run(&ctx, &["therapy", "seed"]).unwrap();
        run(
            &ctx,
            &["therapy", "update", "1", "--alternate-with", "2", "--alternate-frequency", "1_day_1_day"],
        )
        .unwrap();
        assert_eq!(therapy::list_therapies(&ctx.state).unwrap()[0].alternate_with_id, Some(2));

        run(&ctx, &["therapy", "update", "1", "--clear-alternation"]).unwrap();
        let item = &therapy::list_therapies(&ctx.state).unwrap()[0];
        assert_eq!(item.alternate_with_id, None);
        assert_eq!(item.alternate_frequency, None);
    }

    #[test]
    fn day_and_appointment_flow() {
        let (_dir, ctx) = context();
        run(&ctx, &["therapy", "seed"]).unwrap();
        run(&ctx, &["day", "set", "2024-03-04", "--pain", "2", "--flow", "light"]).unwrap();
        run(&ctx, &["day", "take", "2024-03-04", "1"]).unwrap();
        run(&ctx, &["appointment", "add", "2024-03-06", "--type", "ginecologo", "--time", "10:00"])
            .unwrap();

        let view = commands::today(ctx.today, &ctx.state).unwrap();
        assert_eq!(view.entry.pain_level, Some(2));
        assert!(view.entry.therapies.iter().any(|t| t.id == 1 && t.taken));
        assert_eq!(view.next_appointment.unwrap().appointment.time, "10:00");
        run(&ctx, &[]).unwrap();
    }

    #[test]
    fn errors_surface_as_messages() {
        let (_dir, ctx) = context();
        let err = run(&ctx, &["day", "set", "2024-03-04", "--pain", "9"]).unwrap_err();
        assert!(err.contains("between 1 and 4"));
        assert!(run(&ctx, &["reset"]).is_err());
        run(&ctx, &["reset", "--yes"]).unwrap();
    }
}
