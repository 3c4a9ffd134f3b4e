//! microintern - Micro-internship marketplace client
//!
//! Application entry point. Uses `anyhow` for command errors, but library
//! errors stay typed (`AccountError`, `MarketError`) until the boundary
//! below turns them into user-facing text.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod render;

use app::App;
use commands::{account, draft, market, session};

use kernel::error::app_error::AppError;

const FALLBACK_HINT: &str = "re-run the command, or run `microintern home`";

/// microintern - find, apply to and run micro-internships
#[derive(Parser, Debug)]
#[command(name = "microintern")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Who is signed in and what needs attention
    Home,

    // === Account ===
    /// Sign in with email and password
    Login(account::LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Create an account
    Signup(account::SignupArgs),

    /// Password strength, reset and change
    #[command(subcommand)]
    Password(account::PasswordCommand),

    /// Sign in through a third-party provider
    #[command(subcommand)]
    Oauth(account::OauthCommand),

    /// Two-factor authentication
    #[command(name = "2fa", subcommand)]
    TwoFactor(account::TwoFactorCommand),

    /// Download everything stored about you
    Export(account::ExportArgs),

    // === Marketplace ===
    /// Browse, post and close opportunities
    #[command(subcommand, alias = "opps")]
    Opportunities(market::OpportunityCommand),

    /// Apply to an opportunity
    Apply(market::ApplyArgs),

    /// Your applications, or those you received
    #[command(subcommand)]
    Applications(market::ApplicationCommand),

    /// Resume files
    #[command(subcommand)]
    Resume(market::ResumeCommand),

    /// Conversations about applications
    #[command(subcommand)]
    Messages(market::MessageCommand),

    /// Role-specific summary
    Dashboard,

    /// Recruiter analytics
    Analytics,

    /// AI-suggested opportunities or candidates
    Match(market::MatchArgs),

    /// Completion certificates
    Certificates,

    // === Local state ===
    /// Saved form drafts
    #[command(subcommand)]
    Draft(draft::DraftCommand),

    /// Session inactivity timeout
    #[command(subcommand)]
    Session(session::SessionCommand),
}

/// Used when `RUST_LOG` is unset; this binary's own events log under its crate name
const DEFAULT_LOG_FILTER: &str = concat!(
    env!("CARGO_CRATE_NAME"),
    "=info,account=info,marketplace=info,platform=info,baas=info"
);

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    install_panic_hook();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let home = App::home_dir();
    // Local-only commands work without a configured backend
    let command = match cli.command {
        Commands::Draft(command) => return draft::run(&home, command),
        Commands::Password(account::PasswordCommand::Check(args)) => {
            return account::check_password(args).await;
        }
        command => command,
    };

    let app = App::from_env(&home)?;
    match command {
        Commands::Home => commands::home(&app).await,
        Commands::Login(args) => account::login(&app, args).await,
        Commands::Logout => account::logout(&app).await,
        Commands::Signup(args) => account::signup(&app, args).await,
        Commands::Password(command) => account::password(&app, command).await,
        Commands::Oauth(command) => account::oauth(&app, command).await,
        Commands::TwoFactor(command) => account::two_factor(&app, command).await,
        Commands::Export(args) => account::export(&app, args).await,
        Commands::Opportunities(command) => market::opportunities(&app, command).await,
        Commands::Apply(args) => market::apply(&app, args).await,
        Commands::Applications(command) => market::applications(&app, command).await,
        Commands::Resume(command) => market::resume(&app, command).await,
        Commands::Messages(command) => market::messages(&app, command).await,
        Commands::Dashboard => market::dashboard(&app).await,
        Commands::Analytics => market::analytics(&app).await,
        Commands::Match(args) => market::matches(&app, args).await,
        Commands::Certificates => market::certificates(&app).await,
        Commands::Session(command) => session::run(&app, command).await,
        Commands::Draft(command) => draft::run(&app.home, command),
    }
}

/// Top-level error boundary
///
/// Typed library errors the user can act on print their own message and
/// suggested action; anything else gets the generic fallback.
fn report(err: anyhow::Error) {
    match into_app_error(err) {
        Ok(app_error) if !app_error.is_server_error() => {
            eprintln!("error: {}", app_error.message());
            if let Some(action) = app_error.action() {
                eprintln!("hint: {}", action);
            }
        }
        Ok(app_error) => fallback(&app_error),
        Err(other) => fallback(&format!("{:#}", other)),
    }
}

fn into_app_error(err: anyhow::Error) -> Result<AppError, anyhow::Error> {
    let err = match err.downcast::<::account::AccountError>() {
        Ok(e) => {
            e.log();
            return Ok(e.into());
        }
        Err(err) => err,
    };
    let err = match err.downcast::<marketplace::MarketError>() {
        Ok(e) => {
            e.log();
            return Ok(e.into());
        }
        Err(err) => err,
    };
    let err = match err.downcast::<baas::BaasError>() {
        Ok(e) => {
            e.log();
            return Ok(e.into());
        }
        Err(err) => err,
    };
    err.downcast::<AppError>()
}

fn fallback(detail: &dyn std::fmt::Display) {
    tracing::error!(error = %detail, "Command failed");
    eprintln!("Something went wrong");
    eprintln!("{}", FALLBACK_HINT);
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "Panic");
        eprintln!("Something went wrong");
        eprintln!("{}", FALLBACK_HINT);
        if std::env::var_os("RUST_BACKTRACE").is_some() {
            default_hook(info);
        }
    }));
}
