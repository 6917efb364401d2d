//! Notification fan-out after report creation and dashboard updates.
//!
//! Every function here swallows delivery failures after logging them; a
//! report is never rolled back because a message could not be sent.

use chrono::Utc;
use tracing::{info, warn};

use super::{telegram, whatsapp};
use crate::domains::extraction::ExtractionUnavailable;
use crate::domains::reports::actions::{StatusUpdate, StatusUpdated};
use crate::domains::reports::models::{Report, ReportStatus, Urgency};
use crate::domains::users::User;
use crate::kernel::ServerDeps;

async fn send_alert(html: &str, deps: &ServerDeps) {
    if let Err(e) = deps.telegram.send_alert(html).await {
        warn!(error = %e, "Failed to send Telegram alert");
    }
}

async fn send_whatsapp(to: &str, body: &str, deps: &ServerDeps) {
    if let Err(e) = deps.whatsapp.send_text(to, body).await {
        warn!(phone = %to, error = %e, "Failed to send WhatsApp message");
    }
}

/// Operator alerts for a freshly created report plus critical auto-assignment.
/// Returns the report as it stands afterwards.
pub async fn send_report_notifications(report: Report, reporter: &User, deps: &ServerDeps) -> Report {
    if report.urgency == Urgency::Critical {
        send_alert(&telegram::critical_report_alert(&report), deps).await;
    } else {
        send_alert(&telegram::new_report_alert(&report, reporter), deps).await;
    }

    if report.status == ReportStatus::PendingVerification {
        send_alert(
            &telegram::verification_needed_alert(&report, reporter.trust_level),
            deps,
        )
        .await;
    }

    if report.urgency == Urgency::Critical {
        if let Some(phone) = deps.intake.auto_assign_critical_to.as_deref() {
            match auto_assign(&report, phone, deps).await {
                Ok(Some(assigned)) => return assigned,
                Ok(None) => warn!(phone = %phone, "Auto-assign target not found"),
                Err(e) => warn!(
                    report_number = %report.report_number,
                    error = %e,
                    "Failed to auto-assign critical report"
                ),
            }
        }
    }

    report
}

async fn auto_assign(report: &Report, phone: &str, deps: &ServerDeps) -> anyhow::Result<Option<Report>> {
    let Some(assignee) = User::find_by_phone(phone, &deps.db_pool).await? else {
        return Ok(None);
    };

    let assigned = Report::assign(report.id, assignee.id, &deps.db_pool).await?;
    info!(
        report_number = %assigned.report_number,
        assignee = %assignee.phone_number,
        "Critical report auto-assigned"
    );

    send_whatsapp(
        &assignee.phone_number,
        &whatsapp::status_update(&assigned, whatsapp::ASSIGNMENT_NOTE, Utc::now()),
        deps,
    )
    .await;

    Ok(Some(assigned))
}

/// WhatsApp follow-ups for a dashboard status change: the reporter hears
/// about verification and resolution, a new assignee about the assignment.
pub async fn notify_status_change(updated: &StatusUpdated, update: &StatusUpdate, deps: &ServerDeps) {
    let report = &updated.report;
    let now = Utc::now();

    if report.status != updated.previous_status {
        if let Some(note) = whatsapp::status_change_note(report.status) {
            send_whatsapp(
                &report.reporter_phone,
                &whatsapp::status_update(report, note, now),
                deps,
            )
            .await;
        }
    }

    let Some(assignee_id) = update.assigned_to_id else {
        return;
    };
    match User::find_by_id(assignee_id, &deps.db_pool).await {
        Ok(Some(assignee)) => {
            let note = match update.notes.as_deref().map(str::trim) {
                Some(notes) if !notes.is_empty() => {
                    format!("{} {}", whatsapp::ASSIGNMENT_NOTE, notes)
                }
                _ => whatsapp::ASSIGNMENT_NOTE.to_string(),
            };
            send_whatsapp(
                &assignee.phone_number,
                &whatsapp::status_update(report, &note, now),
                deps,
            )
            .await;
        }
        Ok(None) => warn!(user_id = %assignee_id, "Assignee not found for notification"),
        Err(e) => warn!(user_id = %assignee_id, error = %e, "Failed to load assignee"),
    }
}

/// Reporter-facing text for a failed intake.
pub fn error_message_for(error: &anyhow::Error) -> whatsapp::ErrorMessage {
    if error.chain().any(|cause| cause.is::<ExtractionUnavailable>()) {
        whatsapp::ErrorMessage::AiTimeout
    } else {
        whatsapp::ErrorMessage::General
    }
}

/// Tell the sender something went wrong and page the operators.
pub async fn notify_processing_error(phone: &str, error: &anyhow::Error, deps: &ServerDeps) {
    send_whatsapp(phone, error_message_for(error).text(), deps).await;
    send_alert(
        &telegram::processing_error_alert(phone, &format!("{:#}", error)),
        deps,
    )
    .await;
}
