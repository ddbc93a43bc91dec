use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use log::info;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::vocab::{Priority, TicketStatus};
use crate::error::{DeskError, ValidationError};
use crate::storage::repository::{DepartmentRepository, TicketDto, TicketRepository};

const HOUR_MS: f64 = 3_600_000.0;

fn day_start_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

fn date_of(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTrend {
    pub date: NaiveDate,
    pub created: u64,
    pub closed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total: u64,
    pub active: u64,
    pub closed_today: u64,
    /// Mean of `updated_at - created_at` over closed tickets.
    pub avg_resolution_hours: Option<f64>,
    pub by_status: Vec<(TicketStatus, u64)>,
    pub trend: Vec<DayTrend>,
    pub today: Vec<TicketDto>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Summary,
    Detailed,
    Performance,
    Trend,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::Summary,
        ReportKind::Detailed,
        ReportKind::Performance,
        ReportKind::Trend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Summary => "summary",
            ReportKind::Detailed => "detailed",
            ReportKind::Performance => "performance",
            ReportKind::Trend => "trend",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Summary => "Summary Report",
            ReportKind::Detailed => "Detailed Analysis",
            ReportKind::Performance => "Performance Report",
            ReportKind::Trend => "Trend Analysis",
        }
    }
}

impl FromStr for ReportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "jenis laporan",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Txt,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Txt => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "excel" => Ok(ExportFormat::Csv),
            "txt" | "text" | "pdf" => Ok(ExportFormat::Txt),
            _ => Err(ValidationError::InvalidValue {
                field: "format",
                value: s.to_string(),
            }),
        }
    }
}

/// Date bounds are inclusive calendar days (UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRow {
    #[serde(rename = "Month")]
    pub month: String,
    #[serde(rename = "Total Tickets")]
    pub total: u64,
    #[serde(rename = "Resolved Tickets")]
    pub resolved: u64,
    #[serde(rename = "Avg Time")]
    pub avg_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentRow {
    #[serde(rename = "Department")]
    pub name: String,
    #[serde(rename = "Tickets")]
    pub tickets: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekRow {
    #[serde(rename = "Week")]
    pub week: String,
    #[serde(rename = "Critical Priority")]
    pub critical: u64,
    #[serde(rename = "High Priority")]
    pub high: u64,
    #[serde(rename = "Medium Priority")]
    pub medium: u64,
    #[serde(rename = "Low Priority")]
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub request: ReportRequest,
    pub department_name: Option<String>,
    pub total: u64,
    pub resolved: u64,
    pub monthly: Vec<MonthlyRow>,
    pub departments: Vec<DepartmentRow>,
    pub weekly_priority: Vec<WeekRow>,
}

impl Report {
    pub fn resolution_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.resolved as f64 * 100.0 / self.total as f64
        }
    }

    pub fn file_name(&self, date: NaiveDate) -> String {
        format!(
            "{}_report_{}",
            self.request.kind.as_str(),
            date.format("%Y-%m-%d")
        )
    }

    /// Summary exports months, detailed exports the weekly priority mix and
    /// the other kinds export per-department counts.
    pub fn to_csv(&self) -> Result<Vec<u8>, DeskError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        match self.request.kind {
            ReportKind::Summary => {
                for row in &self.monthly {
                    wtr.serialize(row)?;
                }
                if self.monthly.is_empty() {
                    wtr.write_record(["Month", "Total Tickets", "Resolved Tickets", "Avg Time"])?;
                }
            }
            ReportKind::Detailed => {
                for row in &self.weekly_priority {
                    wtr.serialize(row)?;
                }
                if self.weekly_priority.is_empty() {
                    wtr.write_record([
                        "Week",
                        "Critical Priority",
                        "High Priority",
                        "Medium Priority",
                        "Low Priority",
                    ])?;
                }
            }
            ReportKind::Performance | ReportKind::Trend => {
                for row in &self.departments {
                    wtr.serialize(row)?;
                }
                if self.departments.is_empty() {
                    wtr.write_record(["Department", "Tickets"])?;
                }
            }
        }
        wtr.into_inner()
            .map_err(|e| DeskError::Io(e.into_error()))
    }

    pub fn to_text(&self) -> String {
        let range = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "N/A".to_string())
        };
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.request.kind.title());
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Date Range: {} - {}",
            range(self.request.from),
            range(self.request.to)
        );
        let _ = writeln!(
            out,
            "Department: {}",
            self.department_name.as_deref().unwrap_or("all")
        );
        let _ = writeln!(
            out,
            "Tickets: {} (resolved {}, {:.1}%)",
            self.total,
            self.resolved,
            self.resolution_rate()
        );

        let _ = writeln!(out, "\nMonthly");
        for m in &self.monthly {
            let _ = writeln!(
                out,
                "  {}  total {:>4}  resolved {:>4}  avg {:.1}h",
                m.month, m.total, m.resolved, m.avg_hours
            );
        }
        let _ = writeln!(out, "\nDepartments");
        for d in &self.departments {
            let _ = writeln!(out, "  {:<28} {:>4}", d.name, d.tickets);
        }
        let _ = writeln!(out, "\nPriority by week (critical/high/medium/low)");
        for w in &self.weekly_priority {
            let _ = writeln!(
                out,
                "  {}  {}/{}/{}/{}",
                w.week, w.critical, w.high, w.medium, w.low
            );
        }
        out
    }
}

pub struct ReportService {
    db: Arc<DatabaseConnection>,
    report_dir: PathBuf,
}

impl ReportService {
    pub fn new(db: Arc<DatabaseConnection>, report_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            report_dir: report_dir.into(),
        }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, DeskError> {
        self.dashboard_at(Utc::now()).await
    }

    pub async fn dashboard_at(&self, now: DateTime<Utc>) -> Result<DashboardStats, DeskError> {
        let today = now.date_naive();
        let week_start = today - Duration::days(6);

        let (total, counts, closed, recent) = futures::try_join!(
            TicketRepository::count(&self.db),
            TicketRepository::status_counts(&self.db),
            TicketRepository::closed(&self.db),
            TicketRepository::created_between(&self.db, Some(day_start_ms(week_start)), None, None),
        )?;

        let by_status: Vec<(TicketStatus, u64)> = TicketStatus::ALL
            .iter()
            .map(|s| (*s, counts.get(s.as_str()).copied().unwrap_or(0)))
            .collect();
        let active = by_status
            .iter()
            .filter(|(s, _)| s.is_active())
            .map(|(_, n)| n)
            .sum();

        // no close timestamp is stored; a closed ticket's last update stands in
        let closed_today = closed
            .iter()
            .filter(|t| date_of(t.updated_at) == Some(today))
            .count() as u64;
        let avg_resolution_hours = average_hours(&closed);

        let trend = (0..7)
            .map(|offset| {
                let date = week_start + Duration::days(offset);
                DayTrend {
                    date,
                    created: recent
                        .iter()
                        .filter(|t| date_of(t.created_at) == Some(date))
                        .count() as u64,
                    closed: closed
                        .iter()
                        .filter(|t| date_of(t.updated_at) == Some(date))
                        .count() as u64,
                }
            })
            .collect();

        let mut today_tickets: Vec<TicketDto> = recent
            .into_iter()
            .filter(|t| date_of(t.created_at) == Some(today))
            .collect();
        today_tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(DashboardStats {
            total,
            active,
            closed_today,
            avg_resolution_hours,
            by_status,
            trend,
            today: today_tickets,
        })
    }

    pub async fn build(&self, request: ReportRequest) -> Result<Report, DeskError> {
        let from = request.from.map(day_start_ms);
        let to = request
            .to
            .map(|d| day_start_ms(d + Duration::days(1)));
        let tickets =
            TicketRepository::created_between(&self.db, from, to, request.department_id).await?;

        let dept_ids: Vec<i32> = {
            let mut ids: Vec<i32> = tickets.iter().map(|t| t.department_id).collect();
            ids.extend(request.department_id);
            ids.sort_unstable();
            ids.dedup();
            ids
        };
        let names = DepartmentRepository::names_by_ids(&self.db, dept_ids).await?;

        let mut monthly: BTreeMap<String, Vec<&TicketDto>> = BTreeMap::new();
        let mut per_dept: BTreeMap<String, u64> = BTreeMap::new();
        let mut weekly: BTreeMap<String, WeekRow> = BTreeMap::new();

        for t in &tickets {
            let Some(date) = date_of(t.created_at) else {
                continue;
            };
            monthly
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .push(t);

            let dept = names
                .get(&t.department_id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", t.department_id));
            *per_dept.entry(dept).or_default() += 1;

            let iso = date.iso_week();
            let key = format!("{}-W{:02}", iso.year(), iso.week());
            let row = weekly.entry(key.clone()).or_insert_with(|| WeekRow {
                week: key,
                critical: 0,
                high: 0,
                medium: 0,
                low: 0,
            });
            match t.priority {
                Some(Priority::Critical) => row.critical += 1,
                Some(Priority::High) => row.high += 1,
                Some(Priority::Medium) => row.medium += 1,
                Some(Priority::Low) => row.low += 1,
                None => {}
            }
        }

        let monthly = monthly
            .into_iter()
            .map(|(month, list)| {
                let closed: Vec<TicketDto> = list
                    .iter()
                    .filter(|t| t.status == TicketStatus::Closed)
                    .map(|t| (*t).clone())
                    .collect();
                MonthlyRow {
                    month,
                    total: list.len() as u64,
                    resolved: closed.len() as u64,
                    avg_hours: average_hours(&closed)
                        .map(|h| (h * 10.0).round() / 10.0)
                        .unwrap_or(0.0),
                }
            })
            .collect();

        let mut departments: Vec<DepartmentRow> = per_dept
            .into_iter()
            .map(|(name, tickets)| DepartmentRow { name, tickets })
            .collect();
        departments.sort_by(|a, b| b.tickets.cmp(&a.tickets).then(a.name.cmp(&b.name)));

        let resolved = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Closed)
            .count() as u64;

        Ok(Report {
            department_name: request
                .department_id
                .and_then(|id| names.get(&id).cloned()),
            request,
            total: tickets.len() as u64,
            resolved,
            monthly,
            departments,
            weekly_priority: weekly.into_values().collect(),
        })
    }

    /// Writes `<kind>_report_<YYYY-MM-DD>.<ext>` into the report directory.
    pub async fn export(
        &self,
        report: &Report,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<PathBuf, DeskError> {
        let bytes = match format {
            ExportFormat::Csv => report.to_csv()?,
            ExportFormat::Txt => report.to_text().into_bytes(),
        };
        tokio::fs::create_dir_all(&self.report_dir).await?;
        let path = self.report_dir.join(format!(
            "{}.{}",
            report.file_name(date),
            format.extension()
        ));
        tokio::fs::write(&path, bytes).await?;
        info!("Report written to {}", path.display());
        Ok(path)
    }
}

fn average_hours(closed: &[TicketDto]) -> Option<f64> {
    if closed.is_empty() {
        return None;
    }
    let sum: i64 = closed
        .iter()
        .map(|t| (t.updated_at - t.created_at).max(0))
        .sum();
    Some(sum as f64 / closed.len() as f64 / HOUR_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticket::TicketUpdate;
    use crate::domain::vocab::RequestType;
    use crate::storage::connection::test_connection;
    use crate::storage::repository::{DepartmentForm, NewTicket};
    use chrono::TimeZone;

    const HOUR: i64 = 3_600_000;

    async fn ticket(
        db: &DatabaseConnection,
        id: &str,
        dept: i32,
        prio: Option<Priority>,
        created: DateTime<Utc>,
        closed_after_hours: Option<i64>,
    ) {
        let created_ms = created.timestamp_millis();
        TicketRepository::insert(
            db,
            NewTicket {
                id: id.into(),
                title: None,
                description: None,
                requester_name: "Budi".into(),
                requester_contact: None,
                department_id: dept,
                area_id: None,
                request_type: RequestType::Repair,
                priority: prio,
                before_photos: vec![],
            },
            created_ms,
        )
        .await
        .unwrap();
        if let Some(h) = closed_after_hours {
            let update = TicketUpdate {
                status: Some(TicketStatus::Closed),
                ..Default::default()
            };
            TicketRepository::apply_update(db, id, &update, created_ms + h * HOUR)
                .await
                .unwrap();
        }
    }

    async fn department(db: &DatabaseConnection, name: &str) -> i32 {
        DepartmentRepository::create(
            db,
            DepartmentForm {
                name: name.into(),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn dashboard_counts_from_store() {
        let (_dir, db) = test_connection().await;
        let mt = department(&db, "MAINTENANCE").await;
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();

        ticket(&db, "TPM-20240115-0001", mt, None, now - Duration::hours(4), Some(2)).await;
        ticket(&db, "TPM-20240115-0002", mt, None, now - Duration::hours(1), None).await;
        ticket(&db, "TPM-20240112-0003", mt, None, now - Duration::days(3), Some(4)).await;
        ticket(&db, "TPM-20231201-0004", mt, None, now - Duration::days(45), None).await;

        let svc = ReportService::new(Arc::new(db), "unused");
        let stats = svc.dashboard_at(now).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.closed_today, 1);
        assert_eq!(stats.avg_resolution_hours, Some(3.0));
        assert_eq!(stats.by_status[0], (TicketStatus::Open, 2));
        assert_eq!(stats.trend.len(), 7);
        assert_eq!(stats.trend[6].date, now.date_naive());
        assert_eq!(stats.trend[6].created, 2);
        assert_eq!(stats.trend[3].created, 1);
        assert_eq!(
            stats.today.iter().map(|t| t.id.as_str()).collect::<Vec<_>>(),
            ["TPM-20240115-0002", "TPM-20240115-0001"]
        );
    }

    #[tokio::test]
    async fn last_update_dates_a_closed_ticket() {
        let (_dir, db) = test_connection().await;
        let mt = department(&db, "MAINTENANCE").await;
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        ticket(&db, "TPM-20240112-0001", mt, None, now - Duration::days(3), Some(2)).await;

        let svc = ReportService::new(Arc::new(db.clone()), "unused");
        assert_eq!(svc.dashboard_at(now).await.unwrap().closed_today, 0);

        let note = TicketUpdate {
            admin_notes: Some("belt diganti".into()),
            ..Default::default()
        };
        TicketRepository::apply_update(&db, "TPM-20240112-0001", &note, now.timestamp_millis())
            .await
            .unwrap();
        let stats = svc.dashboard_at(now).await.unwrap();
        assert_eq!(stats.closed_today, 1);
        assert_eq!(stats.trend[6].closed, 1);
        assert_eq!(stats.avg_resolution_hours, Some(72.0));
    }

    #[tokio::test]
    async fn report_aggregates_and_exports() {
        let (_dir, db) = test_connection().await;
        let mt = department(&db, "MAINTENANCE").await;
        let qa = department(&db, "QUALITY").await;
        let jan = |d| Utc.with_ymd_and_hms(2024, 1, d, 8, 0, 0).unwrap();

        ticket(&db, "TPM-20240102-0001", mt, Some(Priority::High), jan(2), Some(5)).await;
        ticket(&db, "TPM-20240103-0002", mt, Some(Priority::Low), jan(3), None).await;
        ticket(&db, "TPM-20240110-0003", qa, Some(Priority::High), jan(10), None).await;
        ticket(
            &db,
            "TPM-20240205-0004",
            qa,
            None,
            Utc.with_ymd_and_hms(2024, 2, 5, 8, 0, 0).unwrap(),
            None,
        )
        .await;

        let out = tempfile::tempdir().unwrap();
        let svc = ReportService::new(Arc::new(db), out.path().join("reports"));

        let report = svc
            .build(ReportRequest {
                kind: ReportKind::Summary,
                from: NaiveDate::from_ymd_opt(2024, 1, 1),
                to: NaiveDate::from_ymd_opt(2024, 1, 31),
                department_id: None,
            })
            .await
            .unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.resolved, 1);
        assert_eq!(report.monthly.len(), 1);
        assert_eq!(report.monthly[0].avg_hours, 5.0);
        assert_eq!(report.departments[0].name, "MAINTENANCE");
        assert_eq!(report.departments[0].tickets, 2);
        assert_eq!(report.weekly_priority[0].week, "2024-W01");
        assert_eq!(report.weekly_priority[0].high, 1);

        let date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let path = svc.export(&report, ExportFormat::Csv, date).await.unwrap();
        assert!(path.ends_with("summary_report_2024-02-01.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            ["Month,Total Tickets,Resolved Tickets,Avg Time", "2024-01,3,1,5.0"]
        );

        let only_qa = svc
            .build(ReportRequest {
                kind: ReportKind::Performance,
                from: None,
                to: None,
                department_id: Some(qa),
            })
            .await
            .unwrap();
        assert_eq!(only_qa.total, 2);
        assert_eq!(only_qa.department_name.as_deref(), Some("QUALITY"));
        let path = svc.export(&only_qa, ExportFormat::Txt, date).await.unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Performance Report"));
        assert!(text.contains("Department: QUALITY"));
    }

    #[test]
    fn kinds_and_formats_parse() {
        assert_eq!("TREND".parse::<ReportKind>().unwrap(), ReportKind::Trend);
        assert!("weekly".parse::<ReportKind>().is_err());
        assert_eq!("excel".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Txt);
    }
}
