//! Inactivity timeout
//!
//! `session watch` keeps the session alive while lines arrive on stdin and
//! signs out when the idle window runs out. Typing `extend` during the
//! warning keeps the session; any other line only counts before it.

use std::sync::Arc;

use account::BaasAccountGateway;
use account::domain::session_timeout::TimeoutState;
use account::use_cases::{SessionTimeoutHandle, SignOutHandler, SignOutUseCase};
use anyhow::Result;
use clap::Subcommand;
use platform::storage::FileStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use crate::app::App;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Stay signed in while active; sign out after the idle window
    Watch,
}

struct SignOutOnTimeout {
    sign_out: SignOutUseCase<BaasAccountGateway, FileStore>,
}

impl SignOutHandler for SignOutOnTimeout {
    async fn on_timeout(&self) {
        if let Err(e) = self.sign_out.execute().await {
            tracing::warn!(error = %e, "Sign-out after inactivity failed");
        }
    }
}

pub async fn run(app: &App, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Watch => watch(app).await,
    }
}

async fn watch(app: &App) -> Result<()> {
    if !app.resume().await? {
        println!("Not signed in");
        return Ok(());
    }
    let handler = Arc::new(SignOutOnTimeout {
        sign_out: SignOutUseCase::new(app.account.clone(), app.sessions.clone()),
    });
    let handle = SessionTimeoutHandle::spawn(app.account_config.session_timeout, handler);
    let mut states = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "Watching for inactivity ({} min). Press Enter to stay active, type `extend` when warned.",
        app.account_config.session_timeout.total().as_secs() / 60
    );

    loop {
        tokio::select! {
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *states.borrow_and_update();
                match snapshot.state {
                    TimeoutState::Warning => {
                        let secs = snapshot
                            .remaining(Instant::now())
                            .map(|left| left.as_secs())
                            .unwrap_or_default();
                        println!("You will be signed out in {}s. Type `extend` to stay signed in.", secs);
                    }
                    TimeoutState::Expired => {
                        // The coordinator drops its sender once sign-out is done
                        while states.changed().await.is_ok() {}
                        println!("Signed out after inactivity");
                        break;
                    }
                    TimeoutState::Idle => println!("Session extended"),
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(text) if text.trim().eq_ignore_ascii_case("extend") => handle.extend(),
                    Some(_) => handle.record_activity(),
                    None => break,
                }
            }
        }
    }
    Ok(())
}
