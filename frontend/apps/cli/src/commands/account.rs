//! Account commands

use std::path::PathBuf;

use account::models::{TotpCode, UserRole};
use account::use_cases::{
    DataExportUseCase, OAuthFlowUseCase, PasswordResetUseCase, SignInInput, SignInOutcome,
    SignInUseCase, SignOutUseCase, SignUpInput, SignUpUseCase, TwoFactorUseCase,
};
use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose;
use baas::OAuthProvider;
use clap::{Args, Subcommand};
use platform::password::{HibpClient, PasswordStrength, check_leaked};

use crate::app::App;
use crate::commands::{prompt, secret};

#[derive(Args, Debug)]
pub struct LoginArgs {
    pub email: String,
    #[arg(long, env = "MICROINTERN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Authenticator code, if two-factor is enabled
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub captcha: Option<String>,
}

#[derive(Args, Debug)]
pub struct SignupArgs {
    pub email: String,
    #[arg(long)]
    pub name: String,
    /// student or recruiter
    #[arg(long, default_value = "student")]
    pub role: UserRole,
    #[arg(long, env = "MICROINTERN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long)]
    pub captcha: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// Score a password locally, optionally against breach data
    Check(CheckArgs),
    /// Mail a recovery link
    Reset {
        email: String,
        #[arg(long)]
        captcha: Option<String>,
    },
    /// Set a new password
    Update {
        /// Link from the recovery mail, when not signed in
        #[arg(long)]
        recovery_url: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long, env = "MICROINTERN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Also look the password up in known breaches
    #[arg(long)]
    pub online: bool,
}

#[derive(Subcommand, Debug)]
pub enum OauthCommand {
    /// Print the provider sign-in URL (google, github, linkedin)
    Url { provider: OAuthProvider },
    /// Finish sign-in with the code from the callback
    Exchange { code: String },
}

#[derive(Subcommand, Debug)]
pub enum TwoFactorCommand {
    /// Start enrollment
    Setup {
        /// Write the QR code PNG here
        #[arg(long)]
        qr_out: Option<PathBuf>,
    },
    /// Confirm enrollment with a code from the app
    Verify { code: String },
    Disable { code: String },
    Status,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory to write the export into
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

fn sign_in_use_case(
    app: &App,
) -> SignInUseCase<
    account::BaasAccountGateway,
    account::BaasAccountGateway,
    account::BaasAccountGateway,
    account::BaasAccountGateway,
    platform::storage::FileStore,
> {
    SignInUseCase::new(
        app.account.clone(),
        app.account.clone(),
        app.guards.clone(),
        app.sessions.clone(),
    )
}

pub async fn login(app: &App, args: LoginArgs) -> Result<()> {
    let password = secret(args.password, "Password")?;
    let use_case = sign_in_use_case(app);
    let outcome = use_case
        .execute(SignInInput {
            email: args.email,
            password,
            captcha_token: args.captcha,
            totp_code: args.code,
        })
        .await?;

    let session = match outcome {
        SignInOutcome::SignedIn(session) => session,
        SignInOutcome::TwoFactorRequired(pending) => {
            let raw = prompt("Authentication code")?;
            let code = match TotpCode::parse(&raw) {
                Ok(code) => code,
                Err(e) => {
                    use_case.abandon(pending).await;
                    return Err(e.into());
                }
            };
            use_case.complete(pending, &code).await?
        }
    };

    println!(
        "Signed in as {}",
        session.user.email.as_deref().unwrap_or("your account")
    );
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.resume().await?;
    SignOutUseCase::new(app.account.clone(), app.sessions.clone())
        .execute()
        .await?;
    println!("Signed out");
    Ok(())
}

pub async fn signup(app: &App, args: SignupArgs) -> Result<()> {
    let (password, confirm) = match args.password {
        Some(password) => (password.clone(), password),
        None => (prompt("Password")?, prompt("Confirm password")?),
    };
    let output = SignUpUseCase::new(
        app.account.clone(),
        app.breach.clone(),
        app.guards.clone(),
        app.sessions.clone(),
        app.account_config.clone(),
    )
    .execute(SignUpInput {
        email: args.email,
        password,
        confirm_password: confirm,
        full_name: args.name,
        role: args.role,
        captcha_token: args.captcha,
    })
    .await?;

    if output.confirmation_required {
        println!("Account created. Check your inbox to confirm your email, then run `microintern login`.");
    } else {
        println!("Account created and signed in");
    }
    Ok(())
}

pub async fn check_password(args: CheckArgs) -> Result<()> {
    let password = secret(args.password, "Password")?;
    let strength = PasswordStrength::evaluate(&password);
    println!(
        "Strength: {} ({}%)",
        strength.level(),
        strength.percent()
    );
    for rule in strength.missing() {
        println!("  - {}", rule.hint());
    }

    if args.online {
        let source = HibpClient::new(reqwest::Client::new());
        let check = check_leaked(&source, &password).await;
        if check.leaked {
            println!(
                "Found in {} known breaches. Pick a different password.",
                check.count
            );
        } else {
            println!("Not found in known breaches");
        }
    }
    Ok(())
}

pub async fn password(app: &App, command: PasswordCommand) -> Result<()> {
    let use_case = PasswordResetUseCase::new(
        app.account.clone(),
        app.breach.clone(),
        app.guards.clone(),
        app.sessions.clone(),
        app.account_config.clone(),
    );
    match command {
        PasswordCommand::Check(args) => check_password(args).await,
        PasswordCommand::Reset { email, captcha } => {
            use_case.request(&email, captcha.as_deref()).await?;
            println!("If an account exists for that address, a recovery link is on its way");
            Ok(())
        }
        PasswordCommand::Update { recovery_url } => {
            match recovery_url {
                Some(url) => use_case.complete_recovery(&url).await?,
                None => {
                    app.resume().await?;
                }
            }
            let password = prompt("New password")?;
            let confirm = prompt("Confirm new password")?;
            use_case.update_password(password, &confirm).await?;
            println!("Password updated");
            Ok(())
        }
    }
}

pub async fn oauth(app: &App, command: OauthCommand) -> Result<()> {
    let use_case = OAuthFlowUseCase::new(
        app.account.clone(),
        app.storage.clone(),
        app.sessions.clone(),
        app.account_config.clone(),
    );
    match command {
        OauthCommand::Url { provider } => {
            let url = use_case.start(provider)?;
            println!("Open this link to continue:\n{}", url);
            println!("Then run `microintern oauth exchange <code>` with the code it returns.");
        }
        OauthCommand::Exchange { code } => {
            use_case.complete(&code).await?;
            println!("Signed in");
        }
    }
    Ok(())
}

pub async fn two_factor(app: &App, command: TwoFactorCommand) -> Result<()> {
    app.resume().await?;
    let use_case = TwoFactorUseCase::new(app.account.clone(), app.sessions.clone());
    match command {
        TwoFactorCommand::Setup { qr_out } => {
            let enrollment = use_case.setup().await?;
            println!("Add this key to your authenticator app:");
            println!("  {}", enrollment.grouped_secret());
            println!("  {}", enrollment.otpauth_url);
            if let Some(path) = qr_out {
                let png = general_purpose::STANDARD
                    .decode(enrollment.qr_png_base64()?)
                    .context("QR code is not valid base64")?;
                std::fs::write(&path, png)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("QR code saved to {}", path.display());
            }
            println!("Then run `microintern 2fa verify <code>`.");
        }
        TwoFactorCommand::Verify { code } => {
            use_case.enable(&code).await?;
            println!("Two-factor authentication is on");
        }
        TwoFactorCommand::Disable { code } => {
            use_case.disable(&code).await?;
            println!("Two-factor authentication is off");
        }
        TwoFactorCommand::Status => {
            let status = use_case.status().await?;
            match (status.enabled, status.enrolled_at) {
                (true, Some(at)) => println!("On since {}", at.format("%Y-%m-%d")),
                (true, None) => println!("On"),
                (false, _) => println!("Off"),
            }
        }
    }
    Ok(())
}

pub async fn export(app: &App, args: ExportArgs) -> Result<()> {
    app.resume().await?;
    let export = DataExportUseCase::new(app.account.clone(), app.sessions.clone())
        .execute()
        .await?;
    let path = args.out.join(&export.file_name);
    std::fs::write(&path, export.contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {}", path.display());
    println!("sha256 {}", export.checksum);
    Ok(())
}
