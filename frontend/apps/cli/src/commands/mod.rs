//! Subcommand handlers

pub mod account;
pub mod draft;
pub mod market;
pub mod session;

use std::io::{self, BufRead, Write};

use ::account::use_cases::CurrentProfileUseCase;
use anyhow::{Context, Result, bail};

use crate::app::App;

/// Read one line from stdin after printing `label`
pub fn prompt(label: &str) -> Result<String> {
    eprint!("{}: ", label);
    io::stderr().flush().ok();
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    if read == 0 {
        bail!("No input for {}", label.to_lowercase());
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Use the provided value, or ask for it
pub fn secret(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => prompt(label),
    }
}

pub async fn home(app: &App) -> Result<()> {
    if !app.resume().await? {
        println!("Not signed in. Run `microintern login` or `microintern signup`.");
        return Ok(());
    }
    let profile = CurrentProfileUseCase::new(app.account.clone(), app.sessions.clone())
        .execute()
        .await?;
    println!("{} ({})", profile.display_name(), profile.role.code());
    market::dashboard(app).await
}
