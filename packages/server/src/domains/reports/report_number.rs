//! Human-readable report numbers: `<VR|PB>-<K|N>-<YYMMDD>-<NNNN>`.
//!
//! `VR` marks volunteer reports, `PB` public ones. `K` is a victim report,
//! `N` a needs report. `NNNN` counts every report created that UTC day.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use super::models::{Report, ReportType};
use crate::common::time::start_of_utc_day;

/// Advisory lock key serializing number generation across connections.
const REPORT_NUMBER_LOCK: i64 = 0x5250_5f4e_554d;

pub fn format_report_number(
    is_volunteer: bool,
    report_type: ReportType,
    now: DateTime<Utc>,
    sequence: i64,
) -> String {
    let source = if is_volunteer { "VR" } else { "PB" };
    let kind = match report_type {
        ReportType::Korban => "K",
        ReportType::Kebutuhan => "N",
    };
    format!("{}-{}-{}-{:04}", source, kind, now.format("%y%m%d"), sequence)
}

/// Next number for today. Must run inside the transaction that inserts the
/// report; the lock is held until that transaction ends.
pub async fn next_report_number(
    is_volunteer: bool,
    report_type: ReportType,
    now: DateTime<Utc>,
    conn: &mut PgConnection,
) -> Result<String> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(REPORT_NUMBER_LOCK)
        .execute(&mut *conn)
        .await?;

    let today = Report::count_created_since(start_of_utc_day(now), &mut *conn).await?;
    Ok(format_report_number(is_volunteer, report_type, now, today + 1))
}
