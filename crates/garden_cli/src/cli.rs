//! Command-line surface of the `garden` binary.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use garden_core::{AlertJob, CareKind};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "garden", version)]
#[command(about = "Track plants, their care history and garden alerts")]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "GARDEN_DB", default_value = "garden.sqlite3", global = true)]
    pub db: PathBuf,
    /// Directory for rolling log files; logging stays off when unset
    #[arg(long, env = "GARDEN_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error
    #[arg(long, env = "GARDEN_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage plants
    #[command(subcommand)]
    Plant(PlantCommand),
    /// Record and inspect care events
    #[command(subcommand)]
    Care(CareCommand),
    /// Run or schedule alert checks
    #[command(subcommand)]
    Alerts(AlertsCommand),
}

#[derive(Subcommand, Debug)]
pub enum PlantCommand {
    /// Register a new plant
    Add(PlantFields),
    /// Replace every field of a plant
    Update {
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        fields: PlantFields,
    },
    /// Show one plant with its derived dates
    Show { id: Uuid },
    /// Delete a plant and its care history
    Delete { id: Uuid },
    /// List plants, optionally filtered
    List(PlantFilter),
    /// Plants due for watering or pruning, or ready for harvest
    Due {
        #[arg(value_enum)]
        what: DueKind,
        /// Evaluate as of this date instead of today
        #[arg(long)]
        on: Option<NaiveDate>,
    },
    /// Plant counts by type
    Stats,
    /// Plants already grown in a region
    Suggest { region: String },
}

#[derive(Args, Debug, Clone)]
pub struct PlantFields {
    #[arg(short = 'n', long)]
    pub name: String,
    #[arg(short = 't', long = "type")]
    pub plant_type: String,
    /// Planting date, YYYY-MM-DD
    #[arg(short = 'p', long)]
    pub planted_on: Option<NaiveDate>,
    /// Days from planting to harvest
    #[arg(long, allow_negative_numbers = true)]
    pub cycle_days: Option<i64>,
    #[arg(long)]
    pub region: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Defaults to 3
    #[arg(long, allow_negative_numbers = true)]
    pub watering_days: Option<i64>,
    /// Defaults to 30
    #[arg(long, allow_negative_numbers = true)]
    pub pruning_days: Option<i64>,
}

#[derive(Args, Debug, Default)]
pub struct PlantFilter {
    /// Name contains this text
    #[arg(long, conflicts_with_all = ["plant_type", "region", "recent_days"])]
    pub name: Option<String>,
    #[arg(long = "type")]
    pub plant_type: Option<String>,
    #[arg(long)]
    pub region: Option<String>,
    /// Planted within the last N days
    #[arg(long, conflicts_with_all = ["plant_type", "region"])]
    pub recent_days: Option<u32>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueKind {
    Watering,
    Pruning,
    Harvest,
}

#[derive(Subcommand, Debug)]
pub enum CareCommand {
    /// Record a care event
    Add(CareFields),
    /// Replace date, kind, notes and actor of a care event
    Update {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        kind: Option<CareKind>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long = "by")]
        performed_by: Option<String>,
    },
    Show { id: Uuid },
    Delete { id: Uuid },
    /// List care events, optionally filtered
    List(CareFilter),
    /// Record a watering done today
    Water(QuickCare),
    /// Record a pruning done today
    Prune(QuickCare),
    /// Record a harvest done today
    Harvest(QuickCare),
    /// Care counts
    Stats {
        #[arg(long, value_enum, default_value_t = CareStatsBy::Kind)]
        by: CareStatsBy,
    },
    /// Latest care of one kind for a plant
    Last {
        plant: Uuid,
        #[arg(long)]
        kind: CareKind,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CareFields {
    #[arg(long)]
    pub plant: Uuid,
    /// Date performed, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// watering|pruning|harvest|fertilizing|transplanting|treatment|other
    #[arg(long)]
    pub kind: Option<CareKind>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long = "by")]
    pub performed_by: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct QuickCare {
    pub plant: Uuid,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long = "by")]
    pub performed_by: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CareFilter {
    #[arg(long, conflicts_with_all = ["kind", "from", "by", "recent", "today"])]
    pub plant: Option<Uuid>,
    #[arg(long, conflicts_with_all = ["from", "by", "recent", "today"])]
    pub kind: Option<CareKind>,
    /// Range start, inclusive; requires --to
    #[arg(long, requires = "to", conflicts_with_all = ["by", "recent", "today"])]
    pub from: Option<NaiveDate>,
    /// Range end, inclusive; requires --from
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
    #[arg(long, conflicts_with_all = ["recent", "today"])]
    pub by: Option<String>,
    /// Performed within the last seven days
    #[arg(long, conflicts_with = "today")]
    pub recent: bool,
    /// Performed today
    #[arg(long)]
    pub today: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareStatsBy {
    Kind,
    Plant,
    Month,
}

#[derive(Subcommand, Debug)]
pub enum AlertsCommand {
    /// Run one check now
    Check { job: AlertJob },
    /// Run the watering, pruning and harvest checks now
    Test,
    /// Print the next fire time of every job
    Schedule,
    /// Run jobs at their scheduled times until interrupted
    Daemon,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_plant_add_with_defaults() {
        let cli = Cli::try_parse_from([
            "garden",
            "plant",
            "add",
            "--name",
            "Tomato",
            "--type",
            "vegetable",
            "--planted-on",
            "2024-03-01",
            "--cycle-days",
            "90",
        ])
        .unwrap();

        assert_eq!(cli.db, PathBuf::from("garden.sqlite3"));
        assert!(!cli.json);
        match cli.command {
            Command::Plant(PlantCommand::Add(fields)) => {
                assert_eq!(fields.name, "Tomato");
                assert_eq!(fields.plant_type, "vegetable");
                assert_eq!(fields.planted_on, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(fields.cycle_days, Some(90));
                assert_eq!(fields.watering_days, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_care_kind_and_global_flags_after_subcommand() {
        let plant = Uuid::new_v4();
        let plant_arg = plant.to_string();
        let cli = Cli::try_parse_from([
            "garden",
            "care",
            "last",
            plant_arg.as_str(),
            "--kind",
            "Pruning",
            "--json",
            "--db",
            "/tmp/g.sqlite3",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.db, PathBuf::from("/tmp/g.sqlite3"));
        match cli.command {
            Command::Care(CareCommand::Last { plant: parsed, kind }) => {
                assert_eq!(parsed, plant);
                assert_eq!(kind, CareKind::Pruning);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn alert_job_names_parse() {
        let cli = Cli::try_parse_from(["garden", "alerts", "check", "summary"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Alerts(AlertsCommand::Check {
                job: AlertJob::WeeklySummary
            })
        ));
        assert!(Cli::try_parse_from(["garden", "alerts", "check", "weekly"]).is_err());
    }

    #[test]
    fn date_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["garden", "care", "list", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from([
            "garden",
            "care",
            "list",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31"
        ])
        .is_ok());
    }
}
