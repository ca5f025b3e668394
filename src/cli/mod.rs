//! Command-line surface.

pub mod args;
pub mod run;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::commands::parse_date;
use crate::config::REMINDER_CHECK_INTERVAL_SECS;

pub use args::{
    AppointmentCmd, DayCmd, DiaryCmd, NotificationCmd, ProfileCmd, ReminderCmd, TherapyCmd,
    VoidingCmd,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Private health diary for vulvodynia",
    long_about = "Dyna keeps a symptom calendar, a therapy plan with alternation and dose ramps, a voiding diary and reminders, all in a local SQLite file.\n\nEnvironment:\n  DYNA_DATA_DIR   Data directory (default ~/Dyna)\n  RUST_LOG        Log filter (default dyna=info)\n",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory holding the database (overrides DYNA_DATA_DIR)"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "YYYY-MM-DD",
        value_parser = parse_date,
        help = "Act as if today were this date"
    )]
    pub today: Option<NaiveDate>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(about = "Show today: therapies, pain, next appointment, unread notifications")]
    Today,
    #[command(about = "Therapy plan management")]
    Therapy {
        #[command(subcommand)]
        cmd: TherapyCmd,
    },
    #[command(about = "Calendar days and daily logs")]
    Day {
        #[command(subcommand)]
        cmd: DayCmd,
    },
    #[command(about = "Appointments")]
    Appointment {
        #[command(subcommand)]
        cmd: AppointmentCmd,
    },
    #[command(about = "Personal and voiding diaries")]
    Diary {
        #[command(subcommand)]
        cmd: DiaryCmd,
    },
    #[command(about = "Fluid intakes and voidings of a voiding diary")]
    Voiding {
        #[command(subcommand)]
        cmd: VoidingCmd,
    },
    #[command(about = "Profile, swab visits and specialists")]
    Profile {
        #[command(subcommand)]
        cmd: ProfileCmd,
    },
    #[command(about = "Medicine and appointment reminders, notification preferences")]
    Reminders {
        #[command(subcommand)]
        cmd: ReminderCmd,
    },
    #[command(about = "Notification log")]
    Notifications {
        #[command(subcommand)]
        cmd: NotificationCmd,
    },
    #[command(about = "Run every reminder check once")]
    Check,
    #[command(
        about = "Keep running reminder checks",
        long_about = "Run the reminder checker in the foreground until interrupted."
    )]
    Watch {
        #[arg(
            long,
            default_value_t = REMINDER_CHECK_INTERVAL_SECS,
            value_name = "SECS",
            help = "Seconds between checks"
        )]
        interval: u64,
    },
    #[command(about = "Export all data to a JSON backup file")]
    Export {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    #[command(about = "Replace all data with a JSON backup file")]
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    #[command(about = "Delete all data")]
    Reset {
        #[arg(long, default_value_t = false, help = "Confirm deleting all data")]
        yes: bool,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_therapy_add() {
        let cli = Cli::try_parse_from([
            "dyna",
            "--today",
            "2024-03-01",
            "therapy",
            "add",
            "--name",
            "Amitriptilina",
            "--form",
            "pastiglia",
            "--start",
            "2024-01-01",
            "--time",
            "22:00",
        ])
        .unwrap();
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(matches!(
            cli.command,
            Some(Command::Therapy {
                cmd: TherapyCmd::Add { .. }
            })
        ));
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["dyna", "--today", "01/03/2024"]).is_err());
    }

    #[test]
    fn no_subcommand_means_today() {
        let cli = Cli::try_parse_from(["dyna"]).unwrap();
        assert!(cli.command.is_none());
    }
}
