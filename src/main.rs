//! garmin-session CLI
//!
//! - `login` - interactive SSO login (email, password, MFA code), tokens saved to disk
//! - `status` / `logout` - inspect or remove the saved session
//! - `get`, `snapshot`, `activities` - authenticated API calls

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use futures::FutureExt;
use garmin_session::auth::{LoginCredentials, MfaPrompt, SessionPhase, TokenStore};
use garmin_session::utils::is_valid_date;
use garmin_session::{AppError, ClientConfig, ErrorKind, FitnessApi, GarminClient};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity flags; RUST_LOG wins when set
    let log_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // Log to stderr to keep stdout clean
        .init();

    let result = run(cli).await;

    // Handle result and exit with appropriate code
    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(get_exit_code(&e));
        }
    }
}

async fn run(cli: Cli) -> Result<String> {
    let config = ClientConfig::from_env()?;

    match cli.command {
        Commands::Login(args) => execute_login(cli.email, cli.password, args, config).await,
        Commands::Status => execute_status(config).await,
        Commands::Logout => execute_logout(config),
        Commands::Get(args) => {
            let client = connect(cli.email, cli.password, config).await?;
            let value: serde_json::Value = client.get(&args.endpoint).await?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        Commands::Snapshot(args) => {
            if let Some(date) = args.date.as_deref() {
                if !is_valid_date(date) {
                    return Err(AppError::InvalidInput(format!(
                        "Invalid date '{}', expected YYYY-MM-DD",
                        date
                    ))
                    .into());
                }
            }
            let api = FitnessApi::new(Arc::new(connect(cli.email, cli.password, config).await?));
            let value = api.daily_snapshot(args.date.as_deref()).await?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
        Commands::Activities(args) => {
            let api = FitnessApi::new(Arc::new(connect(cli.email, cli.password, config).await?));
            let value = api.activities(args.start, args.limit).await?;
            Ok(serde_json::to_string_pretty(&value)?)
        }
    }
}

/// Execute login command
async fn execute_login(
    email: Option<String>,
    password: Option<String>,
    args: cli::LoginArgs,
    config: ClientConfig,
) -> Result<String> {
    eprintln!("Garmin Connect login");
    eprintln!("Tokens will be saved to {}\n", config.token_dir.display());

    if args.force {
        TokenStore::new(&config.token_dir).clear()?;
    }

    let credentials = resolve_credentials(email, password).await?;
    let token_dir = config.token_dir.clone();
    let client = GarminClient::with_config(credentials, Some(mfa_prompt()), config)?;
    client.login().await?;

    info!("Tokens saved to {}", token_dir.display());
    Ok(format!("✓ Logged in as {}", client.display_name()))
}

async fn execute_status(config: ClientConfig) -> Result<String> {
    let client = GarminClient::with_config(LoginCredentials::default(), None, config)?;
    let snapshot = client.session().snapshot().await;

    if snapshot.phase == SessionPhase::Empty {
        return Ok("Not logged in. Use 'garmin-session login' to authenticate.".to_string());
    }

    let mut output = format!("Session: {:?}\n", snapshot.phase);
    output.push_str(&format!(
        "Token directory: {}\n",
        client.session().token_store().dir().display()
    ));
    if let Some(profile) = &snapshot.profile {
        output.push_str(&format!(
            "Account: {} (profile {})\n",
            profile.display_name, profile.profile_id
        ));
    }
    output.push_str(&format!(
        "OAuth1 token: {}\n",
        if snapshot.has_oauth1 { "present" } else { "missing" }
    ));
    if let Some(expires_at) = snapshot.access_expires_at {
        output.push_str(&format!("Access token expires: {}\n", format_timestamp(expires_at)));
    }
    if let Some(expires_at) = snapshot.refresh_expires_at.filter(|t| *t > 0) {
        output.push_str(&format!("Refresh token expires: {}\n", format_timestamp(expires_at)));
    }

    Ok(output.trim_end().to_string())
}

fn execute_logout(config: ClientConfig) -> Result<String> {
    let store = TokenStore::new(&config.token_dir);
    store.clear()?;
    Ok(format!("✓ Removed saved tokens from {}", store.dir().display()))
}

/// Client for data commands. Credentials are only prompted for when the
/// saved tokens cannot authenticate on their own.
async fn connect(
    email: Option<String>,
    password: Option<String>,
    config: ClientConfig,
) -> Result<GarminClient> {
    let saved = TokenStore::new(&config.token_dir).load();
    let credentials = if !saved.can_resume(chrono::Utc::now().timestamp()) {
        resolve_credentials(email, password).await?
    } else {
        LoginCredentials::new(email.unwrap_or_default(), password.unwrap_or_default())
    };
    Ok(GarminClient::with_config(credentials, Some(mfa_prompt()), config)?)
}

async fn resolve_credentials(
    email: Option<String>,
    password: Option<String>,
) -> Result<LoginCredentials> {
    let email = match email.filter(|e| !e.trim().is_empty()) {
        Some(e) => e,
        None => prompt_line("Garmin email: ").await?,
    };
    let password = match password.filter(|p| !p.is_empty()) {
        Some(p) => p,
        None => prompt_line("Garmin password: ").await?,
    };

    let credentials = LoginCredentials::new(email.trim(), password);
    if !credentials.is_complete() {
        return Err(AppError::InvalidInput("Email and password are required".to_string()).into());
    }
    Ok(credentials)
}

fn mfa_prompt() -> MfaPrompt {
    Arc::new(|| {
        async {
            eprintln!("\nMFA code required - check your email or authenticator app");
            prompt_line("MFA code: ")
                .await
                .map_err(|e| AppError::InvalidInput(e.to_string()))
        }
        .boxed()
    })
}

/// Prompt on stderr and read one line from stdin without blocking the runtime
async fn prompt_line(question: &str) -> Result<String> {
    let question = question.to_string();
    let line = tokio::task::spawn_blocking(move || -> io::Result<String> {
        eprint!("{}", question);
        io::stderr().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    })
    .await??;
    Ok(line)
}

fn format_timestamp(epoch_secs: i64) -> String {
    chrono::DateTime::from_timestamp(epoch_secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| epoch_secs.to_string())
}

/// Exit codes: 1 invalid input, 2 network/HTTP, 3 login/authorization,
/// 4 timeout, 5 anything else
fn get_exit_code(err: &anyhow::Error) -> i32 {
    let Some(app) = err.downcast_ref::<AppError>() else {
        return 5;
    };

    match app {
        AppError::InvalidInput(_) | AppError::Config(_) => 1,
        AppError::Timeout(_) => 4,
        _ => match app.kind() {
            ErrorKind::Authorization => 3,
            ErrorKind::Transient | ErrorKind::Protocol => 2,
            ErrorKind::Setup if matches!(app, AppError::Network(_) | AppError::Http { .. }) => 2,
            _ => 5,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let code = |e: AppError| get_exit_code(&anyhow::Error::from(e));

        assert_eq!(code(AppError::InvalidInput("x".to_string())), 1);
        assert_eq!(code(AppError::Network("reset".to_string())), 2);
        assert_eq!(
            code(AppError::Http {
                status: 503,
                body: String::new()
            }),
            2
        );
        assert_eq!(code(AppError::LoginFailed("bad".to_string())), 3);
        assert_eq!(
            code(AppError::Http {
                status: 401,
                body: String::new()
            }),
            3
        );
        assert_eq!(code(AppError::Timeout("slow".to_string())), 4);
        assert_eq!(code(AppError::Storage("disk".to_string())), 5);
        assert_eq!(get_exit_code(&anyhow::anyhow!("other")), 5);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
    }
}
