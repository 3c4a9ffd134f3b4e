//! Dashboard and Analytics Aggregates
//!
//! Computed locally from rows the viewer can already read.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use kernel::id::OpportunityId;
use serde::Serialize;

use crate::domain::entity::{Application, ApplicationStatus, Opportunity, OpportunityStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudentDashboard {
    pub total_applications: usize,
    /// pending, accepted or in progress
    pub active: usize,
    pub completed: usize,
    pub certificates: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl StudentDashboard {
    pub fn compute(applications: &[Application], certificates: usize) -> Self {
        let mut by_status = BTreeMap::new();
        for application in applications {
            *by_status.entry(application.status.to_string()).or_insert(0) += 1;
        }
        Self {
            total_applications: applications.len(),
            active: applications.iter().filter(|a| a.status.is_active()).count(),
            completed: count(applications, ApplicationStatus::Completed),
            certificates,
            by_status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecruiterDashboard {
    pub open_opportunities: usize,
    pub total_opportunities: usize,
    pub total_applications: usize,
    /// Applications waiting for a decision
    pub pending_review: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl RecruiterDashboard {
    pub fn compute(opportunities: &[Opportunity], applications: &[Application]) -> Self {
        Self {
            open_opportunities: opportunities
                .iter()
                .filter(|o| o.status == OpportunityStatus::Open)
                .count(),
            total_opportunities: opportunities.len(),
            total_applications: applications.len(),
            pending_review: count(applications, ApplicationStatus::Pending),
            in_progress: count(applications, ApplicationStatus::InProgress),
            completed: count(applications, ApplicationStatus::Completed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityStats {
    pub opportunity_id: OpportunityId,
    pub title: String,
    pub applications: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Share of decided applications that were accepted
    pub acceptance_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total_applications: usize,
    pub acceptance_rate: Option<f64>,
    pub completion_rate: Option<f64>,
    pub per_opportunity: Vec<OpportunityStats>,
    /// Applications received per day over the window, oldest first
    pub daily: Vec<(NaiveDate, usize)>,
}

impl Analytics {
    /// Aggregate over the last `days` days ending at `today` (inclusive)
    pub fn compute(
        opportunities: &[Opportunity],
        applications: &[Application],
        today: NaiveDate,
        days: u32,
    ) -> Self {
        let per_opportunity = opportunities
            .iter()
            .map(|opportunity| {
                let own: Vec<&Application> = applications
                    .iter()
                    .filter(|a| a.opportunity_id == opportunity.id)
                    .collect();
                let (accepted, rejected) = decisions(own.iter().copied());
                OpportunityStats {
                    opportunity_id: opportunity.id,
                    title: opportunity.title.clone(),
                    applications: own.len(),
                    pending: own
                        .iter()
                        .filter(|a| a.status == ApplicationStatus::Pending)
                        .count(),
                    accepted,
                    rejected,
                    acceptance_rate: ratio(accepted, accepted + rejected),
                }
            })
            .collect();

        let (accepted, rejected) = decisions(applications.iter());
        let completed = count(applications, ApplicationStatus::Completed);

        Self {
            total_applications: applications.len(),
            acceptance_rate: ratio(accepted, accepted + rejected),
            completion_rate: ratio(completed, accepted),
            per_opportunity,
            daily: daily_counts(applications, today, days),
        }
    }
}

fn count(applications: &[Application], status: ApplicationStatus) -> usize {
    applications.iter().filter(|a| a.status == status).count()
}

/// (accepted at some point, rejected)
fn decisions<'a>(applications: impl Iterator<Item = &'a Application>) -> (usize, usize) {
    applications.fold((0, 0), |(accepted, rejected), a| match a.status {
        ApplicationStatus::Accepted | ApplicationStatus::InProgress | ApplicationStatus::Completed => {
            (accepted + 1, rejected)
        }
        ApplicationStatus::Rejected => (accepted, rejected + 1),
        _ => (accepted, rejected),
    })
}

fn ratio(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

fn daily_counts(applications: &[Application], today: NaiveDate, days: u32) -> Vec<(NaiveDate, usize)> {
    if days == 0 {
        return Vec::new();
    }
    let first = today
        .checked_sub_days(Days::new(u64::from(days - 1)))
        .unwrap_or(NaiveDate::MIN);

    let mut buckets: BTreeMap<NaiveDate, usize> = first
        .iter_days()
        .take_while(|day| *day <= today)
        .map(|day| (day, 0))
        .collect();
    for application in applications {
        let day = application.created_at.date_naive();
        if let Some(slot) = buckets.get_mut(&day) {
            *slot += 1;
        }
    }
    buckets.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::opportunity::fixtures::opportunity;
    use chrono::{TimeZone, Utc};
    use kernel::id::{ApplicationId, UserId};

    fn application(opportunity: &Opportunity, status: ApplicationStatus, day: u32) -> Application {
        let at = Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap();
        Application {
            id: ApplicationId::new(),
            opportunity_id: opportunity.id,
            student_id: UserId::new(),
            status,
            cover_letter: None,
            resume_path: None,
            created_at: at,
            updated_at: at,
            opportunity: None,
        }
    }

    #[test]
    fn test_student_dashboard() {
        let opp = opportunity("API", &[]);
        let apps = vec![
            application(&opp, ApplicationStatus::Pending, 1),
            application(&opp, ApplicationStatus::Completed, 2),
            application(&opp, ApplicationStatus::Rejected, 3),
        ];
        let dashboard = StudentDashboard::compute(&apps, 1);
        assert_eq!(dashboard.total_applications, 3);
        assert_eq!(dashboard.active, 1);
        assert_eq!(dashboard.completed, 1);
        assert_eq!(dashboard.by_status.get("rejected"), Some(&1));
    }

    #[test]
    fn test_analytics_rates_and_window() {
        let api = opportunity("API", &[]);
        let mut site = opportunity("Site", &[]);
        site.status = OpportunityStatus::Closed;
        let apps = vec![
            application(&api, ApplicationStatus::Accepted, 10),
            application(&api, ApplicationStatus::Completed, 10),
            application(&api, ApplicationStatus::Rejected, 11),
            application(&api, ApplicationStatus::Pending, 1),
            application(&site, ApplicationStatus::Withdrawn, 12),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();

        let analytics = Analytics::compute(&[api.clone(), site], &apps, today, 3);

        assert_eq!(analytics.total_applications, 5);
        assert_eq!(analytics.acceptance_rate, Some(2.0 / 3.0));
        assert_eq!(analytics.completion_rate, Some(0.5));
        assert_eq!(analytics.per_opportunity[0].applications, 4);
        assert_eq!(analytics.per_opportunity[0].pending, 1);
        assert_eq!(analytics.per_opportunity[1].acceptance_rate, None);
        assert_eq!(
            analytics.daily,
            vec![
                (NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(), 2),
                (NaiveDate::from_ymd_opt(2025, 5, 11).unwrap(), 1),
                (today, 1),
            ]
        );

        let recruiter = RecruiterDashboard::compute(&[api], &apps);
        assert_eq!(recruiter.open_opportunities, 1);
        assert_eq!(recruiter.pending_review, 1);
    }
}
