//! Report creation action
//!
//! Single place that turns extracted data into a report row with its
//! persons, needs and audit entry, all in one transaction.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::extraction::{ExtractedReport, Intent};
use crate::domains::reports::models::{
    NewReport, Report, ReportNeed, ReportPerson, ReportStatus, ReportType,
};
use crate::domains::reports::report_number::next_report_number;
use crate::domains::users::{User, UserRole};

pub const DEFAULT_LOCATION: &str = "Tidak disebutkan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSource {
    WhatsApp,
    Web,
}

impl ReportSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSource::WhatsApp => "whatsapp",
            ReportSource::Web => "web",
        }
    }
}

/// Volunteers and sufficiently trusted reporters skip manual verification.
pub fn initial_status(reporter: &User, auto_verify_trust_level: i32) -> ReportStatus {
    if reporter.role == UserRole::Volunteer || reporter.trust_level >= auto_verify_trust_level {
        ReportStatus::Verified
    } else {
        ReportStatus::PendingVerification
    }
}

#[derive(Debug, Clone)]
pub struct CreatedReport {
    pub report: Report,
    pub persons: Vec<ReportPerson>,
    pub needs: Vec<ReportNeed>,
}

pub async fn create_report(
    reporter: &User,
    extracted: &ExtractedReport,
    raw_message: &str,
    source: ReportSource,
    auto_verify_trust_level: i32,
    now: DateTime<Utc>,
    pool: &PgPool,
) -> Result<CreatedReport> {
    let report_type = ReportType::from_intent(extracted.intent);
    let status = initial_status(reporter, auto_verify_trust_level);
    let verified = status == ReportStatus::Verified;

    let location = match extracted.location.trim() {
        "" => DEFAULT_LOCATION.to_string(),
        location => location.to_string(),
    };
    let summary = match extracted.summary.trim() {
        "" => raw_message.chars().take(200).collect(),
        summary => summary.to_string(),
    };

    let mut tx = pool.begin().await?;

    let report_number =
        next_report_number(reporter.is_volunteer(), report_type, now, &mut *tx).await?;

    let report = Report::insert(
        &NewReport {
            report_number,
            report_type,
            status,
            urgency: extracted.urgency,
            reporter_id: reporter.id,
            reporter_phone: reporter.phone_number.clone(),
            report_source: source.as_str().to_string(),
            location,
            location_detail: extracted.location_detail.clone(),
            latitude: extracted.latitude,
            longitude: extracted.longitude,
            summary,
            raw_message: raw_message.to_string(),
            extracted_data: serde_json::to_value(extracted)?,
            verified_by: verified.then_some(reporter.id),
            verified_at: verified.then_some(now),
            created_at: now,
        },
        &mut *tx,
    )
    .await?;

    let mut persons = Vec::new();
    if extracted.intent == Intent::Korban {
        for person in &extracted.persons {
            persons.push(ReportPerson::insert(report.id, person, &mut *tx).await?);
        }
    }

    let mut needs = Vec::new();
    if extracted.intent == Intent::Kebutuhan {
        for need in &extracted.needs {
            needs.push(ReportNeed::insert(report.id, need, &mut *tx).await?);
        }
    }

    AuditLog::record(
        NewAuditLog::new(AuditAction::Create, "Report", report.id)
            .by(reporter.id)
            .report(report.id)
            .metadata(json!({
                "source": source.as_str(),
                "aiExtracted": !extracted.fallback,
                "fallback": extracted.fallback,
            })),
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        report_number = %report.report_number,
        report_type = report.report_type.as_str(),
        urgency = report.urgency.as_str(),
        status = report.status.as_str(),
        persons = persons.len(),
        needs = needs.len(),
        "Report created"
    );

    Ok(CreatedReport {
        report,
        persons,
        needs,
    })
}
