use chrono::{DateTime, FixedOffset, NaiveDate};
use clap::{Args, Subcommand};

use crate::commands::{parse_date, parse_instant};
use crate::models::{
    AlternateFrequency, AppointmentType, DiaryType, DurationType, FlowIntensity,
    FluidIntakeType, PosologyPeriod, SpecialistType, SwabTestResult, TherapyForm, TimeOfDay,
};

/// Dose ramp options shared by `therapy add` and `therapy update`.
#[derive(Args, Debug, Clone)]
pub struct RampArgs {
    #[arg(
        long,
        value_name = "QTY",
        requires_all = ["ramp_by", "ramp_every", "ramp_final"],
        help = "Starting dose of the ramp"
    )]
    pub ramp_initial: Option<f64>,
    #[arg(long, value_name = "QTY", help = "Dose change per step")]
    pub ramp_by: Option<f64>,
    #[arg(long, value_name = "N", help = "Step interval, in --ramp-period units")]
    pub ramp_every: Option<u32>,
    #[arg(long, value_name = "PERIOD", default_value = "day", help = "day, month or year")]
    pub ramp_period: PosologyPeriod,
    #[arg(long, value_name = "QTY", help = "Dose the ramp stops at")]
    pub ramp_final: Option<f64>,
}

/// Alternation options shared by `therapy add` and `therapy update`.
#[derive(Args, Debug, Clone, Default)]
pub struct AlternationArgs {
    #[arg(long, value_name = "ID", help = "Therapy to alternate with")]
    pub alternate_with: Option<u32>,
    #[arg(
        long,
        value_name = "FREQ",
        help = "1_day_1_day, 1_week_1_week or x_months_x_months"
    )]
    pub alternate_frequency: Option<AlternateFrequency>,
    #[arg(long, value_name = "N", help = "Months per turn with x_months_x_months")]
    pub alternate_months: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TherapyCmd {
    #[command(about = "List the therapy plan")]
    List,
    #[command(about = "List therapies scheduled on a day (default today)")]
    On {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    #[command(about = "Add a therapy to the plan")]
    Add {
        #[arg(long)]
        name: String,
        #[arg(
            long,
            value_name = "FORM",
            help = "crema, gocce, pastiglia, bustine, supposta, integratore, ovulo or altro"
        )]
        form: TherapyForm,
        #[arg(long, value_name = "TEXT", help = "Form label when --form altro")]
        form_other: Option<String>,
        #[arg(long, default_value = "", help = "Dose text, e.g. \"10mg\" or \"5 gocce\"")]
        quantity: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: String,
        #[arg(long, value_name = "HH:MM", default_value = "09:00")]
        time: String,
        #[arg(
            long,
            value_name = "TYPE",
            default_value = "months",
            help = "days, months or days_per_month"
        )]
        duration_type: DurationType,
        #[arg(long, value_name = "N", default_value_t = 0, help = "Course length; 0 = open-ended")]
        duration: u32,
        #[arg(long, value_name = "WHEN", help = "day or night, for creams")]
        cream_time: Option<TimeOfDay>,
        #[arg(long, default_value = "")]
        notes: String,
        #[command(flatten)]
        alternation: AlternationArgs,
        #[command(flatten)]
        ramp: RampArgs,
    },
    #[command(about = "Change a therapy")]
    Update {
        id: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_name = "FORM")]
        form: Option<TherapyForm>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start: Option<String>,
        #[arg(long, value_name = "HH:MM")]
        time: Option<String>,
        #[arg(long, value_name = "TYPE", requires = "duration")]
        duration_type: Option<DurationType>,
        #[arg(long, value_name = "N")]
        duration: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value_t = false, help = "Stop alternating")]
        clear_alternation: bool,
        #[arg(long, default_value_t = false, help = "Drop the dose ramp")]
        clear_ramp: bool,
        #[command(flatten)]
        alternation: AlternationArgs,
        #[command(flatten)]
        ramp: RampArgs,
    },
    #[command(about = "Remove a therapy")]
    Remove { id: u32 },
    #[command(about = "Pause a therapy")]
    Pause { id: u32 },
    #[command(about = "Resume a paused therapy")]
    Resume { id: u32 },
    #[command(about = "Show the plan change history")]
    History,
    #[command(about = "Show the dates a therapy's dose changes")]
    Schedule { id: u32 },
    #[command(about = "Write the starter plan if the plan is empty")]
    Seed,
    #[command(about = "List therapy forms and their dose units")]
    Forms,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DayCmd {
    #[command(about = "Show a day (default today)")]
    Show {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    #[command(about = "Record pain, period and notes for a day")]
    Set {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, value_name = "1-4", conflicts_with = "clear_pain")]
        pain: Option<u8>,
        #[arg(long, default_value_t = false)]
        clear_pain: bool,
        #[arg(
            long,
            value_name = "FLOW",
            help = "light, medium or heavy",
            conflicts_with = "no_period"
        )]
        flow: Option<FlowIntensity>,
        #[arg(long, default_value_t = false, help = "Clear the period flow")]
        no_period: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    #[command(about = "Tick a therapy scheduled on a day")]
    Take {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        therapy_id: u32,
        #[arg(long, default_value_t = false, help = "Untick instead")]
        undo: bool,
    },
    #[command(about = "List the recorded days of a month")]
    Month { year: i32, month: u32 },
    #[command(about = "Write the simple daily log for a day")]
    Log {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, value_name = "0-4")]
        pain: u8,
        #[arg(long, default_value_t = false)]
        period: bool,
        #[arg(long, value_name = "FLOW", help = "light, medium or heavy; needs --period")]
        flow: Option<FlowIntensity>,
        #[arg(long, value_name = "BOOL", help = "Whether the therapy was followed")]
        adherent: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
    },
    #[command(about = "List the daily logs of a month")]
    Logs { year: i32, month: u32 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AppointmentCmd {
    #[command(about = "Add an appointment")]
    Add {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        #[arg(
            long = "type",
            value_name = "TYPE",
            default_value = "altro",
            help = "ginecologo, nutrizionista, fisioterapista or altro"
        )]
        kind: AppointmentType,
        #[arg(long, value_name = "TEXT", help = "Label when --type altro")]
        other: Option<String>,
        #[arg(long, value_name = "HH:MM", default_value = "09:00")]
        time: String,
        #[arg(long)]
        place: Option<String>,
        #[arg(
            long,
            value_name = "MIN",
            help = "Reminder lead time (default from preferences)"
        )]
        remind: Option<u32>,
    },
    #[command(about = "Change an appointment, optionally moving it to another day")]
    Move {
        #[arg(value_name = "FROM", value_parser = parse_date)]
        from: NaiveDate,
        id: String,
        #[arg(value_name = "TO", value_parser = parse_date)]
        to: NaiveDate,
        #[arg(long = "type", value_name = "TYPE", default_value = "altro")]
        kind: AppointmentType,
        #[arg(long, value_name = "TEXT")]
        other: Option<String>,
        #[arg(long, value_name = "HH:MM", default_value = "09:00")]
        time: String,
        #[arg(long)]
        place: Option<String>,
        #[arg(long, value_name = "MIN")]
        remind: Option<u32>,
    },
    #[command(about = "Remove an appointment")]
    Remove {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        id: String,
    },
    #[command(about = "List appointments of the coming week")]
    Upcoming,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DiaryCmd {
    #[command(about = "List diaries")]
    List,
    #[command(about = "Show a diary")]
    Show { id: String },
    #[command(about = "Create a diary")]
    Add {
        #[arg(long)]
        name: String,
        #[arg(long = "type", value_name = "TYPE", help = "minzionale or personale")]
        kind: DiaryType,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long)]
        content: Option<String>,
    },
    #[command(about = "Change a diary")]
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        start: Option<NaiveDate>,
        #[arg(long)]
        content: Option<String>,
    },
    #[command(about = "Delete a diary and, for voiding diaries, its records")]
    Remove { id: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum VoidingCmd {
    #[command(about = "Record a drink", visible_alias = "drink")]
    Intake {
        diary_id: String,
        #[arg(
            long,
            value_name = "TIME",
            value_parser = parse_instant,
            help = "RFC 3339 or YYYY-MM-DDTHH:MM (default now)"
        )]
        at: Option<DateTime<FixedOffset>>,
        #[arg(
            long = "type",
            value_name = "TYPE",
            default_value = "acqua",
            help = "acqua, caffe, te, succo or altro"
        )]
        kind: FluidIntakeType,
        #[arg(long, value_name = "ML")]
        ml: u32,
        #[arg(long)]
        label: Option<String>,
    },
    #[command(about = "Record a voiding")]
    Void {
        diary_id: String,
        #[arg(long, value_name = "TIME", value_parser = parse_instant)]
        at: Option<DateTime<FixedOffset>>,
        #[arg(long, value_name = "ML")]
        ml: Option<u32>,
        #[arg(long, default_value_t = false)]
        urgency: bool,
        #[arg(long, default_value_t = false)]
        burning: bool,
    },
    #[command(about = "Delete a drink or voiding record")]
    Remove { id: String },
    #[command(about = "Show a day in two-hour blocks (default today)")]
    Blocks {
        diary_id: String,
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCmd {
    #[command(about = "Show the profile")]
    Show,
    #[command(about = "Change profile fields")]
    Set {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        birth: Option<NaiveDate>,
        #[arg(long)]
        age: Option<u32>,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        diagnosis: Option<NaiveDate>,
        #[arg(long, value_name = "RESULT", help = "positivo, negativo or non_eseguito")]
        swab_result: Option<SwabTestResult>,
        #[arg(long)]
        swab_note: Option<String>,
        #[arg(long, value_name = "BOOL")]
        voiding_diary: Option<bool>,
    },
    #[command(about = "Record a swab test visit")]
    Swab {
        #[arg(value_name = "YYYY-MM-DD", value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, value_name = "0-10")]
        clitoride: Option<u8>,
        #[arg(long, value_name = "0-10")]
        orefizio_uretrale: Option<u8>,
        #[arg(long, value_name = "0-10")]
        labbro_destro: Option<u8>,
        #[arg(long, value_name = "0-10")]
        labbro_sinistro: Option<u8>,
        #[arg(long, value_name = "0-10")]
        forchetta: Option<u8>,
    },
    #[command(about = "Delete a swab test visit")]
    RemoveSwab { id: String },
    #[command(about = "Add a specialist followed")]
    Specialist {
        #[arg(long = "type", value_name = "TYPE")]
        kind: SpecialistType,
        #[arg(long, value_name = "TEXT")]
        other: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        start: NaiveDate,
    },
    #[command(about = "Mark a specialist's care as ended")]
    EndSpecialist {
        id: String,
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
        end: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ReminderCmd {
    #[command(about = "List configured reminders")]
    List,
    #[command(about = "Set or clear a therapy's daily reminder")]
    Medicine {
        therapy_id: u32,
        #[arg(value_name = "HH:MM")]
        time: String,
        #[arg(long, default_value_t = false)]
        off: bool,
    },
    #[command(about = "Set or clear an appointment reminder")]
    Appointment {
        id: String,
        #[arg(value_name = "MIN")]
        minutes: u32,
        #[arg(long, default_value_t = false)]
        off: bool,
    },
    #[command(about = "Show or change notification preferences")]
    Prefs {
        #[arg(long, value_name = "BOOL")]
        medicine: Option<bool>,
        #[arg(long, value_name = "BOOL")]
        appointments: Option<bool>,
        #[arg(long, value_name = "MIN")]
        minutes: Option<u32>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum NotificationCmd {
    #[command(about = "Show the notification log, newest first")]
    List,
    #[command(about = "Mark one notification read")]
    Read { id: String },
    #[command(about = "Mark every notification read")]
    ReadAll,
}
