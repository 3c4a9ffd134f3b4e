//! Marketplace commands

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use baas::PollingChangeFeed;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use kernel::id::{ApplicationId, ConversationId, OpportunityId};
use marketplace::models::{ApplicationStatus, ExperienceLevel, LocationType, OpportunityFilter};
use marketplace::use_cases::{
    ApplicationUseCase, ApplyInput, CertificateUseCase, DashboardUseCase, MatchingUseCase,
    MessagingUseCase, OpportunityUseCase, PostOpportunityInput, ResumeUseCase,
};
use marketplace::{BaasMarketGateway, Viewer};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::app::App;
use crate::commands::draft;
use crate::render;

/// Parse a snake_case enum value the way rows spell it
fn snake_case<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let wanted = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(Value::String(wanted)).map_err(|_| format!("unknown value: {}", raw))
}

#[derive(Subcommand, Debug)]
pub enum OpportunityCommand {
    /// Open opportunities, or your own postings with `--mine`
    List(ListArgs),
    Show {
        id: OpportunityId,
    },
    /// Publish a new opportunity (recruiters)
    Post(PostArgs),
    /// Stop accepting applications (recruiters)
    Close {
        id: OpportunityId,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Match title, company, description or skills
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long = "skill")]
    pub skills: Vec<String>,
    /// beginner, intermediate or advanced
    #[arg(long, value_parser = snake_case::<ExperienceLevel>)]
    pub level: Option<ExperienceLevel>,
    /// remote, onsite or hybrid
    #[arg(long, value_parser = snake_case::<LocationType>)]
    pub location: Option<LocationType>,
    #[arg(long)]
    pub min_weeks: Option<u32>,
    #[arg(long)]
    pub max_weeks: Option<u32>,
    #[arg(long)]
    pub paid: bool,
    /// Hide postings whose deadline has passed
    #[arg(long)]
    pub open_now: bool,
    #[arg(long)]
    pub mine: bool,
}

#[derive(Args, Debug)]
pub struct PostArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub company: String,
    #[arg(long, default_value = "")]
    pub description: String,
    #[arg(long = "skill")]
    pub skills: Vec<String>,
    #[arg(long)]
    pub weeks: u32,
    #[arg(long, value_parser = snake_case::<ExperienceLevel>, default_value = "beginner")]
    pub level: ExperienceLevel,
    #[arg(long, value_parser = snake_case::<LocationType>, default_value = "remote")]
    pub location: LocationType,
    #[arg(long)]
    pub stipend: Option<u32>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub deadline: Option<NaiveDate>,
    /// Save without publishing
    #[arg(long)]
    pub draft: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    pub opportunity_id: OpportunityId,
    /// 50 to 2000 characters; restored from the saved draft when omitted
    #[arg(long)]
    pub cover_letter: Option<String>,
    /// PDF to upload and attach
    #[arg(long, conflicts_with = "resume_path")]
    pub resume_file: Option<PathBuf>,
    /// Previously uploaded resume
    #[arg(long)]
    pub resume_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ApplicationCommand {
    /// Your applications, or with `--received` those to your postings
    List {
        #[arg(long)]
        received: bool,
    },
    Withdraw {
        id: ApplicationId,
    },
    /// Move an application along: accepted, rejected, in_progress, completed
    Status {
        id: ApplicationId,
        status: ApplicationStatus,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResumeCommand {
    /// Upload a PDF (max 5 MB)
    Upload { file: PathBuf },
    Remove { path: String },
    /// Time-limited download link
    Url { path: String },
}

#[derive(Subcommand, Debug)]
pub enum MessageCommand {
    /// Your conversations
    List,
    Send {
        conversation_id: ConversationId,
        text: String,
    },
    /// Print the conversation and follow new messages
    Watch { conversation_id: ConversationId },
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Rank candidates for one of your opportunities instead
    #[arg(long)]
    pub opportunity: Option<OpportunityId>,
}

fn opportunity_use_case(app: &App) -> OpportunityUseCase<BaasMarketGateway> {
    OpportunityUseCase::new(app.market.clone(), app.cache.clone())
}

fn application_use_case(app: &App) -> ApplicationUseCase<BaasMarketGateway, BaasMarketGateway> {
    ApplicationUseCase::new(app.market.clone(), app.market.clone(), app.cache.clone())
}

fn resume_use_case(app: &App) -> ResumeUseCase<BaasMarketGateway> {
    ResumeUseCase::new(app.market.clone(), app.market_config.clone())
}

fn dashboard_use_case(
    app: &App,
) -> DashboardUseCase<BaasMarketGateway, BaasMarketGateway, BaasMarketGateway> {
    DashboardUseCase::new(
        app.market.clone(),
        app.market.clone(),
        app.market.clone(),
        app.cache.clone(),
        app.market_config.clone(),
    )
}

pub async fn opportunities(app: &App, command: OpportunityCommand) -> Result<()> {
    let use_case = opportunity_use_case(app);
    match command {
        OpportunityCommand::List(args) => {
            let found = if args.mine {
                let viewer = app.viewer().await?;
                use_case.list_mine(&viewer).await?
            } else {
                app.resume().await?;
                let filter = OpportunityFilter {
                    search: args.search,
                    skills: args.skills,
                    level: args.level,
                    location_type: args.location,
                    min_weeks: args.min_weeks,
                    max_weeks: args.max_weeks,
                    paid_only: args.paid,
                    open_on: args.open_now.then(|| chrono::Utc::now().date_naive()),
                };
                use_case.browse(&filter).await?
            };
            if found.is_empty() {
                println!("No opportunities match");
            }
            for opportunity in &found {
                println!("{}", render::opportunity_line(opportunity));
            }
        }
        OpportunityCommand::Show { id } => {
            app.resume().await?;
            render::opportunity_detail(&use_case.get(&id).await?);
        }
        OpportunityCommand::Post(args) => {
            let viewer = app.viewer().await?;
            let created = use_case
                .post(
                    &viewer,
                    PostOpportunityInput {
                        title: args.title,
                        company: args.company,
                        description: args.description,
                        skills: args.skills,
                        duration_weeks: args.weeks,
                        level: args.level,
                        location_type: args.location,
                        stipend: args.stipend,
                        deadline: args.deadline,
                        draft: args.draft,
                    },
                )
                .await?;
            println!("Posted {} ({})", created.id, created.status);
        }
        OpportunityCommand::Close { id } => {
            let viewer = app.viewer().await?;
            use_case.close(&viewer, &id).await?;
            println!("Closed {}", id);
        }
    }
    Ok(())
}

pub async fn apply(app: &App, args: ApplyArgs) -> Result<()> {
    let viewer = app.viewer().await?;
    let form_id = format!("apply_{}", args.opportunity_id);
    let draft = draft::open(app.storage.clone(), &form_id);

    let mut cover_letter = args.cover_letter;
    if cover_letter.is_none() {
        draft.restore(|data| {
            cover_letter = data
                .get("cover_letter")
                .and_then(Value::as_str)
                .map(str::to_string);
        })?;
        if cover_letter.is_some() {
            println!("Using your saved cover letter");
        }
    }

    let resume_path = match args.resume_file {
        Some(file) => Some(upload_resume(app, &viewer, &file).await?),
        None => args.resume_path,
    };
    draft.flush(json!({ "cover_letter": cover_letter, "resume_path": resume_path }))?;

    let submitted = application_use_case(app)
        .apply(
            &viewer,
            ApplyInput {
                opportunity_id: args.opportunity_id,
                cover_letter,
                resume_path,
            },
        )
        .await;
    match submitted {
        Ok(application) => {
            draft.clear()?;
            println!("Applied: {}", render::application_line(&application));
            Ok(())
        }
        Err(e) => {
            if draft.has_draft() {
                eprintln!("Your answers are saved; see `microintern draft show {}`", form_id);
            }
            Err(e.into())
        }
    }
}

pub async fn applications(app: &App, command: ApplicationCommand) -> Result<()> {
    let viewer = app.viewer().await?;
    let use_case = application_use_case(app);
    match command {
        ApplicationCommand::List { received } => {
            let found = if received {
                use_case.list_received(&viewer).await?
            } else {
                use_case.list_mine(&viewer).await?
            };
            if found.is_empty() {
                println!("No applications yet");
            }
            for application in &found {
                println!("{}", render::application_line(application));
            }
        }
        ApplicationCommand::Withdraw { id } => {
            use_case.withdraw(&viewer, &id).await?;
            println!("Withdrawn");
        }
        ApplicationCommand::Status { id, status } => {
            let updated = use_case.change_status(&viewer, &id, status).await?;
            println!("{}", render::application_line(&updated));
        }
    }
    Ok(())
}

async fn upload_resume(app: &App, viewer: &Viewer, file: &std::path::Path) -> Result<String> {
    let name = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("{} is not a file name", file.display()))?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(resume_use_case(app).upload(viewer, name, bytes).await?)
}

pub async fn resume(app: &App, command: ResumeCommand) -> Result<()> {
    let viewer = app.viewer().await?;
    match command {
        ResumeCommand::Upload { file } => {
            let path = upload_resume(app, &viewer, &file).await?;
            println!("Uploaded as {}", path);
        }
        ResumeCommand::Remove { path } => {
            resume_use_case(app).remove(&viewer, &path).await?;
            println!("Removed");
        }
        ResumeCommand::Url { path } => {
            println!("{}", resume_use_case(app).link(&viewer, &path).await?);
        }
    }
    Ok(())
}

pub async fn messages(app: &App, command: MessageCommand) -> Result<()> {
    let viewer = app.viewer().await?;
    let feed = Arc::new(PollingChangeFeed::new(Arc::new(app.market.client().clone())));
    let use_case = MessagingUseCase::new(app.market.clone(), feed);
    match command {
        MessageCommand::List => {
            let conversations = use_case.conversations(&viewer).await?;
            if conversations.is_empty() {
                println!("No conversations yet");
            }
            for summary in &conversations {
                println!("{}", render::conversation_line(summary));
            }
        }
        MessageCommand::Send {
            conversation_id,
            text,
        } => {
            let sent = use_case.send(&viewer, &conversation_id, &text).await?;
            println!("{}", render::message_line(&sent, &viewer.user_id));
        }
        MessageCommand::Watch { conversation_id } => {
            let mut watch = use_case.watch(&viewer, &conversation_id).await?;
            for message in watch.messages() {
                println!("{}", render::message_line(message, &viewer.user_id));
            }
            loop {
                tokio::select! {
                    next = watch.next() => match next {
                        Some(message) => println!("{}", render::message_line(&message, &viewer.user_id)),
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

pub async fn dashboard(app: &App) -> Result<()> {
    let viewer = app.viewer().await?;
    let dashboard = dashboard_use_case(app).execute(&viewer).await?;
    render::dashboard(&dashboard);
    Ok(())
}

pub async fn analytics(app: &App) -> Result<()> {
    let viewer = app.viewer().await?;
    let analytics = dashboard_use_case(app).analytics(&viewer).await?;
    render::analytics(&analytics);
    Ok(())
}

pub async fn matches(app: &App, args: MatchArgs) -> Result<()> {
    let viewer = app.viewer().await?;
    let use_case = MatchingUseCase::new(app.market.clone(), app.market.clone(), app.market_config.clone());
    match args.opportunity {
        Some(id) => {
            for candidate in use_case.for_opportunity(&viewer, &id).await? {
                println!(
                    "{:>3.0}  {}  {}",
                    candidate.score,
                    candidate.full_name.as_deref().unwrap_or("(no name)"),
                    candidate.matched_skills.join(", ")
                );
                for reason in &candidate.reasons {
                    println!("       {}", reason);
                }
            }
        }
        None => {
            for suggestion in use_case.for_student(&viewer).await? {
                println!(
                    "{:>3.0}  {}  {}",
                    suggestion.score,
                    suggestion.opportunity_id,
                    suggestion.title.as_deref().unwrap_or("")
                );
                for reason in &suggestion.reasons {
                    println!("       {}", reason);
                }
            }
        }
    }
    Ok(())
}

pub async fn certificates(app: &App) -> Result<()> {
    let viewer = app.viewer().await?;
    let certificates = CertificateUseCase::new(app.market.clone(), app.cache.clone())
        .list_mine(&viewer)
        .await?;
    if certificates.is_empty() {
        println!("No certificates yet. They are issued when an internship is completed.");
    }
    for certificate in &certificates {
        println!("{}", render::certificate_line(certificate));
    }
    Ok(())
}
