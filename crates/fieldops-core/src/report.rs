//! Aggregate reporting over visit collections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::lifecycle::VisitStatus;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Visit counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub scheduled: usize,
    pub cancelled: usize,
}

impl StatusCounts {
    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = VisitStatus>,
    {
        statuses
            .into_iter()
            .fold(StatusCounts::default(), |mut counts, status| {
                counts.total += 1;
                match status {
                    VisitStatus::Scheduled => counts.scheduled += 1,
                    VisitStatus::InProgress => counts.in_progress += 1,
                    VisitStatus::Completed => counts.completed += 1,
                    VisitStatus::Cancelled => counts.cancelled += 1,
                }
                counts
            })
    }
}

/// Duration in hours; zero when either end is unknown
pub fn hours_between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> f64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_milliseconds() as f64 / MILLIS_PER_HOUR,
        _ => 0.0,
    }
}

/// A completed visit flattened with the names the hours report shows
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedVisit {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub team_id: Uuid,
    pub team_name: String,
    pub client_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VisitHours {
    pub id: Uuid,
    pub title: String,
    pub date: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub hours: f64,
    /// Client name
    pub client: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct TeamHours {
    pub team_id: Uuid,
    pub team_name: String,
    pub total_hours: f64,
    pub visits: Vec<VisitHours>,
}

/// Group completed visits by team and sum their hours
///
/// Teams appear in the order their first visit was seen.
pub fn hours_by_team<I>(visits: I) -> Vec<TeamHours>
where
    I: IntoIterator<Item = CompletedVisit>,
{
    let mut teams: Vec<TeamHours> = Vec::new();

    for visit in visits {
        let hours = hours_between(visit.start_time, visit.end_time);
        let entry = VisitHours {
            id: visit.id,
            title: visit.title,
            date: visit.date,
            start_time: visit.start_time,
            end_time: visit.end_time,
            hours,
            client: visit.client_name,
        };

        match teams.iter_mut().find(|t| t.team_id == visit.team_id) {
            Some(team) => {
                team.total_hours += hours;
                team.visits.push(entry);
            }
            None => teams.push(TeamHours {
                team_id: visit.team_id,
                team_name: visit.team_name,
                total_hours: hours,
                visits: vec![entry],
            }),
        }
    }

    teams
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn completed(team_id: Uuid, team: &str, start: (u32, u32), end: (u32, u32)) -> CompletedVisit {
        CompletedVisit {
            id: Uuid::new_v4(),
            title: "Maintenance".to_string(),
            date: at(0, 0),
            start_time: Some(at(start.0, start.1)),
            end_time: Some(at(end.0, end.1)),
            team_id,
            team_name: team.to_string(),
            client_name: "Acme".to_string(),
        }
    }

    #[test]
    fn test_tally_counts_each_status() {
        let counts = StatusCounts::tally([
            VisitStatus::Scheduled,
            VisitStatus::Completed,
            VisitStatus::Completed,
            VisitStatus::Cancelled,
            VisitStatus::InProgress,
        ]);

        assert_eq!(
            counts,
            StatusCounts {
                total: 5,
                completed: 2,
                in_progress: 1,
                scheduled: 1,
                cancelled: 1,
            }
        );
    }

    #[test]
    fn test_tally_serializes_camel_case() {
        let json = serde_json::to_value(StatusCounts::tally([VisitStatus::InProgress])).unwrap();
        assert_eq!(json["inProgress"], 1);
        assert_eq!(json["total"], 1);
    }

    #[test]
    fn test_hours_between_missing_end_is_zero() {
        assert_eq!(hours_between(Some(at(9, 0)), None), 0.0);
        assert_eq!(hours_between(None, Some(at(9, 0))), 0.0);
        assert_eq!(hours_between(Some(at(9, 0)), Some(at(10, 30))), 1.5);
    }

    #[test]
    fn test_hours_by_team_sums_per_team() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();

        let report = hours_by_team(vec![
            completed(t1, "North", (9, 0), (11, 0)),
            completed(t2, "South", (8, 0), (9, 0)),
            completed(t1, "North", (13, 0), (13, 45)),
        ]);

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].team_id, t1);
        assert_eq!(report[0].total_hours, 2.75);
        assert_eq!(report[0].visits.len(), 2);
        assert_eq!(report[0].visits[1].hours, 0.75);
        assert_eq!(report[1].team_name, "South");
        assert_eq!(report[1].total_hours, 1.0);
    }

    #[test]
    fn test_hours_by_team_empty() {
        assert!(hours_by_team(Vec::new()).is_empty());
    }
}
