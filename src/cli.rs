//! CLI mode implementation
//!
//! Interactive login plus a few commands for inspecting the session and
//! calling the API with it

use clap::{Args, Parser, Subcommand};

/// Garmin Connect session CLI
#[derive(Parser, Debug)]
#[command(name = "garmin-session")]
#[command(about = "Log in to Garmin Connect and call its API with the saved session", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Garmin account email
    #[arg(short = 'u', long, global = true, env = "GARMIN_EMAIL")]
    pub email: Option<String>,

    /// Garmin account password
    #[arg(short = 'p', long, global = true, env = "GARMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and save tokens
    Login(LoginArgs),
    /// Show the saved session without touching the network
    Status,
    /// Remove saved tokens
    Logout,
    /// Authenticated GET of an API endpoint, printed as JSON
    Get(GetArgs),
    /// Daily health snapshot
    Snapshot(SnapshotArgs),
    /// Recent activities
    Activities(ActivitiesArgs),
}

/// Login command arguments
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Discard saved tokens and log in again
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path relative to the API base (e.g. /userprofile-service/socialProfile) or a full URL
    pub endpoint: String,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Calendar date, YYYY-MM-DD (defaults to today)
    #[arg(short, long)]
    pub date: Option<String>,
}

#[derive(Args, Debug)]
pub struct ActivitiesArgs {
    /// Offset into the activity list
    #[arg(short, long, default_value_t = 0)]
    pub start: u32,

    /// Maximum number of activities
    #[arg(short, long, default_value_t = garmin_session::endpoints::DEFAULT_ACTIVITIES_LIMIT)]
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from([
            "garmin-session",
            "get",
            "/device-service/deviceregistration/devices",
        ])
        .unwrap();
        match cli.command {
            Commands::Get(args) => {
                assert_eq!(args.endpoint, "/device-service/deviceregistration/devices")
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "garmin-session",
            "login",
            "--force",
            "-u",
            "me@example.com",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.email.as_deref(), Some("me@example.com"));
        assert!(matches!(cli.command, Commands::Login(LoginArgs { force: true })));
    }

    #[test]
    fn test_parse_activities_defaults() {
        let cli = Cli::try_parse_from(["garmin-session", "activities"]).unwrap();
        match cli.command {
            Commands::Activities(args) => {
                assert_eq!(args.start, 0);
                assert_eq!(args.limit, 20);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_snapshot_date() {
        let cli = Cli::try_parse_from(["garmin-session", "snapshot", "--date", "2024-05-01"]).unwrap();
        match cli.command {
            Commands::Snapshot(args) => assert_eq!(args.date.as_deref(), Some("2024-05-01")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["garmin-session"]).is_err());
    }
}
