//! Plain-text views

use kernel::id::UserId;
use marketplace::models::{
    Analytics, Application, Certificate, Message, Opportunity, RecruiterDashboard,
    StudentDashboard,
};
use marketplace::use_cases::{ConversationSummary, Dashboard};

pub fn opportunity_line(opportunity: &Opportunity) -> String {
    let stipend = match opportunity.stipend {
        Some(amount) => format!("paid {}", amount),
        None => "unpaid".to_string(),
    };
    format!(
        "{}  {} at {}  [{} wk, {}, {}, {}]",
        opportunity.id,
        opportunity.title,
        opportunity.company,
        opportunity.duration_weeks,
        opportunity.level,
        opportunity.location_type,
        stipend
    )
}

pub fn opportunity_detail(opportunity: &Opportunity) {
    println!("{} at {}", opportunity.title, opportunity.company);
    println!("  id        {}", opportunity.id);
    println!("  status    {}", opportunity.status);
    println!(
        "  duration  {} weeks, {}, {}",
        opportunity.duration_weeks, opportunity.level, opportunity.location_type
    );
    if let Some(stipend) = opportunity.stipend {
        println!("  stipend   {}", stipend);
    }
    if let Some(deadline) = opportunity.deadline {
        println!("  deadline  {}", deadline);
    }
    if !opportunity.skills.is_empty() {
        println!("  skills    {}", opportunity.skills.join(", "));
    }
    if !opportunity.description.is_empty() {
        println!();
        println!("{}", opportunity.description);
    }
}

pub fn application_line(application: &Application) -> String {
    let target = match &application.opportunity {
        Some(opportunity) => format!("{} at {}", opportunity.title, opportunity.company),
        None => application.opportunity_id.to_string(),
    };
    format!(
        "{}  {:<11}  {}  (applied {})",
        application.id,
        application.status.to_string(),
        target,
        application.created_at.format("%Y-%m-%d")
    )
}

pub fn conversation_line(summary: &ConversationSummary) -> String {
    let last = summary
        .conversation
        .last_message_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "no messages yet".to_string());
    format!(
        "{}  with {}  ({})",
        summary.conversation.id, summary.counterpart, last
    )
}

pub fn message_line(message: &Message, viewer: &UserId) -> String {
    let who = if message.sender_id == *viewer { "you" } else { "them" };
    format!(
        "[{}] {}: {}",
        message.created_at.format("%m-%d %H:%M"),
        who,
        message.content
    )
}

pub fn certificate_line(certificate: &Certificate) -> String {
    let mut line = format!(
        "{}  {}  (issued {})",
        certificate.id,
        certificate.headline(),
        certificate.issued_at.format("%Y-%m-%d")
    );
    if let Some(url) = &certificate.certificate_url {
        line.push_str("  ");
        line.push_str(url);
    }
    line
}

pub fn dashboard(dashboard: &Dashboard) {
    match dashboard {
        Dashboard::Student(d) => student_dashboard(d),
        Dashboard::Recruiter(d) => recruiter_dashboard(d),
    }
}

fn student_dashboard(d: &StudentDashboard) {
    println!("Applications  {} ({} active, {} completed)", d.total_applications, d.active, d.completed);
    println!("Certificates  {}", d.certificates);
    for (status, count) in &d.by_status {
        println!("  {:<11} {}", status, count);
    }
}

fn recruiter_dashboard(d: &RecruiterDashboard) {
    println!(
        "Opportunities  {} open of {}",
        d.open_opportunities, d.total_opportunities
    );
    println!(
        "Applications   {} ({} to review, {} in progress, {} completed)",
        d.total_applications, d.pending_review, d.in_progress, d.completed
    );
}

pub fn percent(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.0}%", rate * 100.0),
        None => "-".to_string(),
    }
}

pub fn analytics(analytics: &Analytics) {
    println!("Applications     {}", analytics.total_applications);
    println!("Acceptance rate  {}", percent(analytics.acceptance_rate));
    println!("Completion rate  {}", percent(analytics.completion_rate));
    println!();
    for stats in &analytics.per_opportunity {
        println!(
            "  {:<32} {:>3} applied  {:>3} pending  {:>3} accepted  {:>3} rejected  {}",
            stats.title,
            stats.applications,
            stats.pending,
            stats.accepted,
            stats.rejected,
            percent(stats.acceptance_rate)
        );
    }
    println!();
    let peak = analytics.daily.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    for (day, count) in &analytics.daily {
        let bar = "#".repeat(count * 40 / peak);
        println!("  {}  {:>3} {}", day.format("%m-%d"), count, bar);
    }
}
