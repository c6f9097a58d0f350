//! Read-side aggregation over completed time entries. All monetary math uses
//! the entry's snapshot rate, never a live lookup, so historical reports stay
//! stable when rates change.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

use crate::models::TimeEntry;

#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub entry_count: usize,
    pub total_duration_secs: i64,
    pub total_earnings: f64,
    pub average_session_secs: f64,
    pub by_project: Vec<ProjectSubtotal>,
    pub by_day: Vec<DaySubtotal>,
}

#[derive(Debug, Serialize)]
pub struct ProjectSubtotal {
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub duration_secs: i64,
    pub earnings: f64,
}

#[derive(Debug, Serialize)]
pub struct DaySubtotal {
    pub day: String,
    pub duration_secs: i64,
    pub earnings: f64,
}

#[derive(Debug, Serialize)]
pub struct EarningsReport {
    pub total_earnings: f64,
    pub total_hours: f64,
    pub average_hourly_rate: f64,
    pub by_project: Vec<ProjectEarnings>,
    pub by_month: Vec<MonthSubtotal>,
}

#[derive(Debug, Serialize)]
pub struct ProjectEarnings {
    pub project_id: Option<Uuid>,
    pub project_name: Option<String>,
    pub hours: f64,
    pub earnings: f64,
    pub average_hourly_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthSubtotal {
    pub month: String,
    pub hours: f64,
    pub earnings: f64,
}

fn entry_duration(entry: &TimeEntry) -> i64 {
    entry.duration_secs.unwrap_or(0)
}

fn entry_earnings(entry: &TimeEntry) -> f64 {
    entry.hourly_rate.unwrap_or(0.0) * entry_duration(entry) as f64 / 3600.0
}

fn project_name(names: &HashMap<Uuid, String>, id: Option<Uuid>) -> Option<String> {
    id.and_then(|id| names.get(&id).cloned())
}

pub fn summary(entries: &[TimeEntry], project_names: &HashMap<Uuid, String>) -> SummaryReport {
    let total_duration_secs: i64 = entries.iter().map(entry_duration).sum();
    let total_earnings: f64 = entries.iter().map(entry_earnings).sum();
    let average_session_secs = if entries.is_empty() {
        0.0
    } else {
        total_duration_secs as f64 / entries.len() as f64
    };

    let mut by_project: BTreeMap<Option<Uuid>, (i64, f64)> = BTreeMap::new();
    let mut by_day: BTreeMap<String, (i64, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = by_project.entry(entry.project_id).or_default();
        slot.0 += entry_duration(entry);
        slot.1 += entry_earnings(entry);

        // Calendar day of the entry's start, in UTC.
        let day = entry.start_time.format("%Y-%m-%d").to_string();
        let slot = by_day.entry(day).or_default();
        slot.0 += entry_duration(entry);
        slot.1 += entry_earnings(entry);
    }

    SummaryReport {
        entry_count: entries.len(),
        total_duration_secs,
        total_earnings,
        average_session_secs,
        by_project: by_project
            .into_iter()
            .map(|(id, (duration_secs, earnings))| ProjectSubtotal {
                project_id: id,
                project_name: project_name(project_names, id),
                duration_secs,
                earnings,
            })
            .collect(),
        by_day: by_day
            .into_iter()
            .map(|(day, (duration_secs, earnings))| DaySubtotal {
                day,
                duration_secs,
                earnings,
            })
            .collect(),
    }
}

pub fn earnings(entries: &[TimeEntry], project_names: &HashMap<Uuid, String>) -> EarningsReport {
    let total_earnings: f64 = entries.iter().map(entry_earnings).sum();
    let total_hours: f64 = entries
        .iter()
        .map(|e| entry_duration(e) as f64 / 3600.0)
        .sum();
    let average_hourly_rate = if total_hours == 0.0 {
        0.0
    } else {
        total_earnings / total_hours
    };

    let mut by_project: BTreeMap<Option<Uuid>, (f64, f64)> = BTreeMap::new();
    let mut by_month: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for entry in entries {
        let hours = entry_duration(entry) as f64 / 3600.0;
        let slot = by_project.entry(entry.project_id).or_default();
        slot.0 += hours;
        slot.1 += entry_earnings(entry);

        let month = entry.start_time.format("%Y-%m").to_string();
        let slot = by_month.entry(month).or_default();
        slot.0 += hours;
        slot.1 += entry_earnings(entry);
    }

    EarningsReport {
        total_earnings,
        total_hours,
        average_hourly_rate,
        by_project: by_project
            .into_iter()
            .map(|(id, (hours, earnings))| ProjectEarnings {
                project_id: id,
                project_name: project_name(project_names, id),
                hours,
                earnings,
                average_hourly_rate: if hours == 0.0 { 0.0 } else { earnings / hours },
            })
            .collect(),
        by_month: by_month
            .into_iter()
            .map(|(month, (hours, earnings))| MonthSubtotal {
                month,
                hours,
                earnings,
            })
            .collect(),
    }
}

/// Row-per-entry CSV, ascending by start time. Fields are always quoted;
/// missing project/task render as empty strings.
pub fn export_csv(
    entries: &[TimeEntry],
    project_names: &HashMap<Uuid, String>,
    task_names: &HashMap<Uuid, String>,
) -> String {
    use std::fmt::Write;

    let mut sorted: Vec<&TimeEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.start_time);

    let mut csv = String::new();
    let _ = writeln!(
        csv,
        "{}",
        csv_row(&[
            "Date",
            "Start Time",
            "End Time",
            "Duration (hours)",
            "Description",
            "Project",
            "Task",
            "Hourly Rate",
            "Earnings",
        ])
    );

    for entry in sorted {
        let date = entry.start_time.format("%Y-%m-%d").to_string();
        let start = entry.start_time.format("%H:%M:%S").to_string();
        let end = entry
            .end_time
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        let hours = format!("{:.2}", entry_duration(entry) as f64 / 3600.0);
        let description = entry.description.clone().unwrap_or_default();
        let project = project_name(project_names, entry.project_id).unwrap_or_default();
        let task = entry
            .task_id
            .and_then(|id| task_names.get(&id).cloned())
            .unwrap_or_default();
        let rate = format!("{:.2}", entry.hourly_rate.unwrap_or(0.0));
        let earned = format!("{:.2}", entry_earnings(entry));

        let _ = writeln!(
            csv,
            "{}",
            csv_row(&[
                &date,
                &start,
                &end,
                &hours,
                &description,
                &project,
                &task,
                &rate,
                &earned,
            ])
        );
    }

    csv
}

fn csv_row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn entry(
        start: DateTime<Utc>,
        duration_secs: i64,
        rate: Option<f64>,
        project_id: Option<Uuid>,
    ) -> TimeEntry {
        let now = Utc::now();
        TimeEntry {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            project_id,
            task_id: None,
            description: None,
            start_time: start,
            end_time: Some(start + chrono::Duration::seconds(duration_secs)),
            duration_secs: Some(duration_secs),
            is_running: false,
            hourly_rate: rate,
            created_at: now,
            updated_at: now,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn one_hour_at_fifty_earns_fifty() {
        let entries = vec![entry(at(2026, 3, 1, 9), 3600, Some(50.0), None)];
        let report = summary(&entries, &HashMap::new());
        assert_eq!(report.total_duration_secs, 3600);
        assert!((report.total_earnings - 50.0).abs() < 1e-9);
    }

    #[test]
    fn average_rate_times_hours_equals_earnings() {
        let entries = vec![
            entry(at(2026, 3, 1, 9), 3600, Some(50.0), None),
            entry(at(2026, 3, 2, 9), 7200, Some(20.0), None),
            entry(at(2026, 3, 3, 9), 1800, None, None),
        ];
        let report = earnings(&entries, &HashMap::new());
        assert!((report.average_hourly_rate * report.total_hours - report.total_earnings).abs() < 1e-9);
    }

    #[test]
    fn empty_set_has_zero_average_rate() {
        let report = earnings(&[], &HashMap::new());
        assert_eq!(report.average_hourly_rate, 0.0);
        assert_eq!(report.total_hours, 0.0);
    }

    #[test]
    fn groups_by_utc_day_and_month() {
        let entries = vec![
            entry(at(2026, 3, 1, 9), 600, Some(10.0), None),
            entry(at(2026, 3, 1, 23), 600, Some(10.0), None),
            entry(at(2026, 4, 2, 0), 600, Some(10.0), None),
        ];
        let report = summary(&entries, &HashMap::new());
        assert_eq!(report.by_day.len(), 2);
        assert_eq!(report.by_day[0].day, "2026-03-01");
        assert_eq!(report.by_day[0].duration_secs, 1200);

        let earn = earnings(&entries, &HashMap::new());
        assert_eq!(earn.by_month.len(), 2);
        assert_eq!(earn.by_month[0].month, "2026-03");
        assert_eq!(earn.by_month[1].month, "2026-04");
    }

    #[test]
    fn per_project_subtotals_use_snapshot_rates() {
        let project = Uuid::now_v7();
        let mut names = HashMap::new();
        names.insert(project, "Client A".to_string());

        let entries = vec![
            entry(at(2026, 3, 1, 9), 3600, Some(50.0), Some(project)),
            entry(at(2026, 3, 1, 12), 3600, Some(30.0), Some(project)),
            entry(at(2026, 3, 2, 9), 3600, Some(10.0), None),
        ];
        let report = earnings(&entries, &names);
        assert_eq!(report.by_project.len(), 2);

        let client = report
            .by_project
            .iter()
            .find(|p| p.project_id == Some(project))
            .unwrap();
        assert_eq!(client.project_name.as_deref(), Some("Client A"));
        assert!((client.earnings - 80.0).abs() < 1e-9);
        assert!((client.average_hourly_rate - 40.0).abs() < 1e-9);
    }

    #[test]
    fn csv_quotes_every_field_and_blanks_missing_refs() {
        let mut e = entry(at(2026, 3, 1, 9), 5400, Some(40.0), None);
        e.description = Some("said \"hello\", then left".to_string());

        let csv = export_csv(&[e], &HashMap::new(), &HashMap::new());
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("\"Date\",\"Start Time\""));

        let row = lines.next().unwrap();
        assert!(row.contains("\"2026-03-01\""));
        assert!(row.contains("\"1.50\""));
        assert!(row.contains("\"said \"\"hello\"\", then left\""));
        assert!(row.contains("\"40.00\""));
        assert!(row.contains("\"60.00\""));
        // Missing project and task are empty strings, not "null".
        assert!(row.contains(",\"\",\"\","));
    }

    #[test]
    fn export_rows_sorted_by_start_ascending() {
        let entries = vec![
            entry(at(2026, 3, 2, 9), 60, None, None),
            entry(at(2026, 3, 1, 9), 60, None, None),
        ];
        let csv = export_csv(&entries, &HashMap::new(), &HashMap::new());
        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert!(rows[0].contains("2026-03-01"));
        assert!(rows[1].contains("2026-03-02"));
    }
}
