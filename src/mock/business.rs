use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;

use super::{minutes_ago, pick, round1, sequential_id};
use crate::model::{
    CalendarEvent, CalendarEventKind, Lead, LeadStage, MarketTrend, Milestone, MilestoneStatus,
    PipelineStage, Project, ProjectStatus, TrendDirection,
};

const COMPANIES: &[&str] = &[
    "Acme Corp", "Globex", "Initech", "Umbrella", "Stark Industries", "Wayne Enterprises",
    "Hooli", "Vandelay Imports", "Soylent", "Tyrell", "Cyberdyne", "Wonka Industries",
];

const CONTACTS: &[&str] = &[
    "A. Rivera", "B. Chen", "C. Okafor", "D. Novak", "E. Haddad", "F. Lindqvist", "G. Tanaka",
];

const LEAD_SOURCES: &[&str] = &["website", "referral", "event", "outbound", "partner", "webinar"];

const SEGMENTS: &[&str] = &[
    "Enterprise SaaS",
    "Mid-market Retail",
    "Healthcare Analytics",
    "Fintech Compliance",
    "Logistics Automation",
    "Public Sector",
];

const COMPETITORS: &[&str] = &["Northwind", "Contoso", "Fabrikam", "Litware", "Adatum", "Proseware"];

const PROJECT_NAMES: &[&str] = &[
    "CRM Migration",
    "Agent Onboarding Portal",
    "Revenue Forecasting",
    "Support Automation",
    "Data Warehouse Refresh",
    "Partner API",
];

const OWNERS: &[&str] = &["Operations", "Sales Ops", "Platform", "Finance", "Customer Success"];

const EVENT_TITLES: &[&str] = &[
    "Pipeline review",
    "Quarterly business review",
    "Release cutover",
    "Board update",
    "Vendor negotiation",
    "Campaign launch",
];

/// Generate `count` leads spread across every pipeline stage
pub fn leads<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Lead> {
    (0..count)
        .map(|i| {
            let stage = pick(rng, LeadStage::ALL);
            let probability = match stage {
                LeadStage::Prospect => rng.gen_range(5.0..20.0),
                LeadStage::Qualified => rng.gen_range(20.0..40.0),
                LeadStage::Proposal => rng.gen_range(40.0..65.0),
                LeadStage::Negotiation => rng.gen_range(65.0..90.0),
                LeadStage::ClosedWon => 100.0,
                LeadStage::ClosedLost => 0.0,
            };

            Lead {
                id: sequential_id("lead", i),
                company: pick(rng, COMPANIES).to_string(),
                contact: pick(rng, CONTACTS).to_string(),
                stage,
                value: (rng.gen_range(5_000.0..500_000.0_f64) / 100.0).round() * 100.0,
                probability_percent: round1(probability),
                source: pick(rng, LEAD_SOURCES).to_string(),
                assigned_agent: sequential_id("agent", rng.gen_range(0..20)),
                created_at: minutes_ago(rng, 90 * 24 * 60),
            }
        })
        .collect()
}

/// Aggregate leads into one row per pipeline stage, in pipeline order
///
/// The conversion rate of an open stage (and of `closed_won`) is the
/// share of all leads that reached that stage or any later non-lost one.
/// For `closed_lost` it is simply the share of lost leads.
pub fn pipeline_stages(leads: &[Lead]) -> Vec<PipelineStage> {
    let total = leads.len();

    LeadStage::ALL
        .iter()
        .enumerate()
        .map(|(ordinal, &stage)| {
            let in_stage: Vec<&Lead> = leads.iter().filter(|l| l.stage == stage).collect();
            let total_value: f64 = in_stage.iter().map(|l| l.value).sum();
            let weighted_value: f64 = in_stage
                .iter()
                .map(|l| l.value * l.probability_percent / 100.0)
                .sum();

            let reached = if stage == LeadStage::ClosedLost {
                in_stage.len()
            } else {
                leads
                    .iter()
                    .filter(|l| l.stage != LeadStage::ClosedLost)
                    .filter(|l| stage_ordinal(l.stage) >= ordinal)
                    .count()
            };

            PipelineStage {
                stage,
                lead_count: in_stage.len(),
                total_value,
                weighted_value: weighted_value.round(),
                conversion_rate_percent: if total == 0 {
                    0.0
                } else {
                    round1(reached as f64 / total as f64 * 100.0)
                },
            }
        })
        .collect()
}

fn stage_ordinal(stage: LeadStage) -> usize {
    LeadStage::ALL
        .iter()
        .position(|s| *s == stage)
        .unwrap_or_default()
}

/// Generate `count` market segment trends
pub fn market_trends<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<MarketTrend> {
    (0..count)
        .map(|i| {
            let change = rng.gen_range(-15.0..25.0_f64);
            let direction = if change > 1.0 {
                TrendDirection::Up
            } else if change < -1.0 {
                TrendDirection::Down
            } else {
                TrendDirection::Stable
            };
            let competitor_count = rng.gen_range(1..=3);
            let competitors = (0..competitor_count)
                .map(|_| pick(rng, COMPETITORS).to_string())
                .collect();

            MarketTrend {
                id: sequential_id("trend", i),
                segment: SEGMENTS[i % SEGMENTS.len()].to_string(),
                direction,
                change_percent: round1(change),
                market_share_percent: round1(rng.gen_range(1.0..35.0)),
                confidence_percent: round1(rng.gen_range(55.0..98.0)),
                competitors,
            }
        })
        .collect()
}

/// Generate `count` projects with two to five milestones each
pub fn projects<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Project> {
    let today = Utc::now().date_naive();

    (0..count)
        .map(|i| {
            let status = pick(rng, ProjectStatus::ALL);
            let progress = match status {
                ProjectStatus::Planning => rng.gen_range(0.0..15.0),
                ProjectStatus::Completed => 100.0,
                _ => rng.gen_range(15.0..95.0),
            };
            let budget = (rng.gen_range(20_000.0..900_000.0_f64) / 1_000.0).round() * 1_000.0;
            let spent = (budget * rng.gen_range(0.0..1.2_f64)).round();

            let milestone_count = rng.gen_range(2..=5);
            let milestones = (0..milestone_count)
                .map(|m| {
                    let offset = rng.gen_range(-45..90);
                    let due_date = today + ChronoDuration::days(offset);
                    let status = if status == ProjectStatus::Completed {
                        MilestoneStatus::Completed
                    } else if offset < 0 {
                        if rng.gen_bool(0.7) {
                            MilestoneStatus::Completed
                        } else {
                            MilestoneStatus::Overdue
                        }
                    } else if offset < 14 {
                        MilestoneStatus::InProgress
                    } else {
                        MilestoneStatus::Pending
                    };

                    Milestone {
                        id: format!("{}-m{}", sequential_id("project", i), m + 1),
                        title: format!("Phase {}", m + 1),
                        due_date,
                        status,
                    }
                })
                .collect();

            Project {
                id: sequential_id("project", i),
                name: PROJECT_NAMES[i % PROJECT_NAMES.len()].to_string(),
                status,
                progress_percent: round1(progress),
                budget,
                spent,
                owner: pick(rng, OWNERS).to_string(),
                team_size: rng.gen_range(2..25),
                milestones,
            }
        })
        .collect()
}

/// Generate `count` calendar entries within the next 60 days, sorted by date
pub fn calendar_events<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<CalendarEvent> {
    let today = Utc::now().date_naive();

    let mut events: Vec<CalendarEvent> = (0..count)
        .map(|i| {
            let offset = rng.gen_range(-14..60);
            CalendarEvent {
                id: sequential_id("event", i),
                title: pick(rng, EVENT_TITLES).to_string(),
                kind: pick(rng, CalendarEventKind::ALL),
                date: today + ChronoDuration::days(offset),
                duration_minutes: pick(rng, &[15, 30, 45, 60, 90, 120]),
                owner: pick(rng, OWNERS).to_string(),
                completed: offset < 0 && rng.gen_bool(0.85),
            }
        })
        .collect();

    events.sort_by_key(|e| e.date);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn lead(stage: LeadStage, value: f64, probability: f64) -> Lead {
        Lead {
            id: "lead-x".to_string(),
            company: "Acme Corp".to_string(),
            contact: "A. Rivera".to_string(),
            stage,
            value,
            probability_percent: probability,
            source: "website".to_string(),
            assigned_agent: "agent-001".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pipeline_stage_rollup() {
        let batch = vec![
            lead(LeadStage::Prospect, 1_000.0, 10.0),
            lead(LeadStage::Proposal, 4_000.0, 50.0),
            lead(LeadStage::ClosedWon, 2_000.0, 100.0),
            lead(LeadStage::ClosedLost, 3_000.0, 0.0),
        ];
        let stages = pipeline_stages(&batch);

        assert_eq!(stages.len(), LeadStage::ALL.len());
        assert_eq!(stages[0].stage, LeadStage::Prospect);
        // prospect, proposal and closed_won all reached the first stage
        assert_eq!(stages[0].conversion_rate_percent, 75.0);
        assert_eq!(stages[2].weighted_value, 2_000.0);
        assert_eq!(stages[4].conversion_rate_percent, 25.0);
        assert_eq!(stages[5].lead_count, 1);
        assert_eq!(stages[5].conversion_rate_percent, 25.0);
    }

    #[test]
    fn test_pipeline_stages_empty() {
        let stages = pipeline_stages(&[]);
        assert!(stages.iter().all(|s| s.lead_count == 0 && s.conversion_rate_percent == 0.0));
    }

    #[test]
    fn test_closed_leads_have_fixed_probability() {
        let mut rng = StdRng::seed_from_u64(11);
        for l in leads(&mut rng, 200) {
            match l.stage {
                LeadStage::ClosedWon => assert_eq!(l.probability_percent, 100.0),
                LeadStage::ClosedLost => assert_eq!(l.probability_percent, 0.0),
                _ => assert!(l.probability_percent > 0.0 && l.probability_percent < 100.0),
            }
        }
    }

    #[test]
    fn test_completed_projects_complete_milestones() {
        let mut rng = StdRng::seed_from_u64(5);
        for project in projects(&mut rng, 50) {
            assert!((2..=5).contains(&project.milestones.len()));
            if project.status == ProjectStatus::Completed {
                assert_eq!(project.progress_percent, 100.0);
                assert!(project
                    .milestones
                    .iter()
                    .all(|m| m.status == MilestoneStatus::Completed));
            }
        }
    }

    #[test]
    fn test_calendar_sorted() {
        let mut rng = StdRng::seed_from_u64(2);
        let events = calendar_events(&mut rng, 30);
        assert!(events.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
