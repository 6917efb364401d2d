//! WhatsApp message processor
//!
//! One inbound message either starts a report, continues an open
//! conversation that is still missing a critical field, or is rejected as
//! not being a report at all.

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info, warn};
use whatsapp::IncomingMessage;

use crate::common::ReportId;
use crate::domains::chat_state::{is_critical, ChatState, ConversationState};
use crate::domains::extraction::{follow_up_question, ExtractedReport, Intent};
use crate::domains::media::{store_pending_media, PendingMedia};
use crate::domains::notifications::{
    notify_processing_error, send_report_notifications, whatsapp as messages, ErrorMessage,
};
use crate::domains::reports::actions::{create_report, ReportSource};
use crate::domains::users::{NewUser, User, UserRole};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    /// Not recognisable as a report; the sender got usage examples.
    UnknownIntent,
    /// A critical field is missing; the sender was asked for it.
    NeedsFollowUp { question: String },
    ReportCreated {
        report_id: ReportId,
        report_number: String,
    },
}

/// Critical fields the extraction could not fill, in ask order. A blank
/// location counts as missing even if the model forgot to list it.
pub fn missing_critical_fields(extracted: &ExtractedReport) -> Vec<String> {
    let mut missing: Vec<String> = extracted
        .missing_fields
        .iter()
        .filter(|f| is_critical(f))
        .cloned()
        .collect();
    if extracted.location.trim().is_empty() && !missing.iter().any(|f| f == "location") {
        missing.push("location".to_string());
    }
    missing
}

/// Store a follow-up answer in the field it was asked for.
pub fn fill_field(extracted: &mut ExtractedReport, field: &str, answer: &str) {
    let answer = answer.trim().to_string();
    match field {
        "location" => extracted.location = answer,
        "locationDetail" => extracted.location_detail = Some(answer),
        "summary" => extracted.summary = answer,
        other => warn!(field = other, "No slot for follow-up answer"),
    }
    extracted.remove_missing(field);
}

/// Run the full intake for one message. Any failure is reported to the
/// sender and the operators before being returned.
pub async fn process_message(incoming: &IncomingMessage, deps: &ServerDeps) -> Result<IntakeOutcome> {
    match handle_message(incoming, deps).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            error!(phone = %incoming.from, error = %e, "Failed to process message");
            notify_processing_error(&incoming.from, &e, deps).await;
            Err(e)
        }
    }
}

async fn handle_message(incoming: &IncomingMessage, deps: &ServerDeps) -> Result<IntakeOutcome> {
    if let Err(e) = deps.whatsapp.mark_as_read(&incoming.message_id).await {
        warn!(message_id = %incoming.message_id, error = %e, "Failed to mark message as read");
    }

    let user = get_or_create_user(incoming, deps).await?;
    let pending_media = incoming
        .media
        .as_ref()
        .map(|media| PendingMedia::from_incoming(media, &incoming.text));

    match ChatState::find_active(&incoming.from, Utc::now(), &deps.db_pool).await? {
        Some(chat) => continue_conversation(&user, chat.state.0, incoming, pending_media, deps).await,
        None => start_report(&user, incoming, pending_media, deps).await,
    }
}

async fn get_or_create_user(incoming: &IncomingMessage, deps: &ServerDeps) -> Result<User> {
    let name = incoming
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&incoming.from);

    let (user, created) = User::find_or_create(
        &NewUser {
            phone_number: incoming.from.clone(),
            name: name.to_string(),
            // Admins demote senders who are not field volunteers
            role: UserRole::Volunteer,
            organization: None,
            trust_level: 0,
        },
        &deps.db_pool,
    )
    .await
    .context("Failed to load reporter")?;

    if created {
        info!(phone = %user.phone_number, user_id = %user.id, "New reporter registered");
        let deps = deps.clone();
        let phone = user.phone_number.clone();
        // Nobody has vouched for a fresh sender yet
        let welcome = messages::welcome(false);
        tokio::spawn(async move {
            if let Err(e) = deps.whatsapp.send_text(&phone, &welcome).await {
                warn!(phone = %phone, error = %e, "Failed to send welcome message");
            }
        });
    }

    Ok(user)
}

async fn reply(to: &str, body: &str, deps: &ServerDeps) -> Result<()> {
    deps.whatsapp
        .send_text(to, body)
        .await
        .map(|_| ())
        .context("Failed to send WhatsApp reply")
}

async fn start_report(
    user: &User,
    incoming: &IncomingMessage,
    pending_media: Option<PendingMedia>,
    deps: &ServerDeps,
) -> Result<IntakeOutcome> {
    let extracted = deps.extractor.extract(&incoming.text, None).await?;

    if extracted.intent == Intent::Unknown {
        info!(phone = %incoming.from, "Message is not a report");
        reply(&incoming.from, ErrorMessage::InvalidFormat.text(), deps).await?;
        return Ok(IntakeOutcome::UnknownIntent);
    }

    let missing = missing_critical_fields(&extracted);
    let pending_media: Vec<PendingMedia> = pending_media.into_iter().collect();

    if !missing.is_empty() {
        let state = ConversationState {
            extracted_data: extracted,
            missing_fields: missing,
            original_message: incoming.text.clone(),
            pending_media,
        };
        return ask_follow_up(&incoming.from, &state, deps).await;
    }

    finalize_report(user, &extracted, &incoming.text, &pending_media, deps).await
}

async fn continue_conversation(
    user: &User,
    mut state: ConversationState,
    incoming: &IncomingMessage,
    pending_media: Option<PendingMedia>,
    deps: &ServerDeps,
) -> Result<IntakeOutcome> {
    state.pending_media.extend(pending_media);

    let answer = incoming.text.trim();
    if !state.missing_fields.is_empty() {
        // Media without a caption: keep it and ask again
        if answer.is_empty() {
            return ask_follow_up(&incoming.from, &state, deps).await;
        }
        let field = state.missing_fields.remove(0);
        fill_field(&mut state.extracted_data, &field, answer);
        if !state.missing_fields.is_empty() {
            return ask_follow_up(&incoming.from, &state, deps).await;
        }
    }

    let raw_message = if answer.is_empty() {
        state.original_message.clone()
    } else {
        format!("{}\n{}", state.original_message, answer)
    };
    finalize_report(user, &state.extracted_data, &raw_message, &state.pending_media, deps).await
}

async fn ask_follow_up(phone: &str, state: &ConversationState, deps: &ServerDeps) -> Result<IntakeOutcome> {
    ChatState::save(phone, state, Utc::now(), &deps.db_pool).await?;

    let question = follow_up_question(&state.missing_fields)
        .context("Conversation saved without a missing field")?;
    reply(phone, &question, deps).await?;

    info!(phone = %phone, missing = ?state.missing_fields, "Asked follow-up question");
    Ok(IntakeOutcome::NeedsFollowUp { question })
}

async fn finalize_report(
    user: &User,
    extracted: &ExtractedReport,
    raw_message: &str,
    pending_media: &[PendingMedia],
    deps: &ServerDeps,
) -> Result<IntakeOutcome> {
    let created = create_report(
        user,
        extracted,
        raw_message,
        ReportSource::WhatsApp,
        deps.intake.auto_verify_trust_level,
        Utc::now(),
        &deps.db_pool,
    )
    .await?;
    let report = created.report;

    if !pending_media.is_empty() {
        let stored = store_pending_media(report.id, pending_media, deps).await;
        info!(
            report_number = %report.report_number,
            stored = stored.len(),
            received = pending_media.len(),
            "Report media processed"
        );
    }

    reply(&user.phone_number, &messages::report_confirmation(&report), deps).await?;

    let report = send_report_notifications(report, user, deps).await;

    ChatState::clear(&user.phone_number, &deps.db_pool).await?;

    Ok(IntakeOutcome::ReportCreated {
        report_id: report.id,
        report_number: report.report_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_location_is_missing() {
        let extracted = ExtractedReport {
            intent: Intent::Korban,
            missing_fields: vec!["name".into()],
            ..Default::default()
        };
        assert_eq!(missing_critical_fields(&extracted), vec!["location".to_string()]);
    }

    #[test]
    fn test_non_critical_fields_do_not_block() {
        let extracted = ExtractedReport {
            intent: Intent::Kebutuhan,
            location: "Posko Desa Sukamaju".into(),
            missing_fields: vec!["quantity".into(), "peopleAffected".into()],
            ..Default::default()
        };
        assert!(missing_critical_fields(&extracted).is_empty());
    }

    #[test]
    fn test_listed_location_not_duplicated() {
        let extracted = ExtractedReport {
            intent: Intent::Korban,
            missing_fields: vec!["location".into()],
            ..Default::default()
        };
        assert_eq!(missing_critical_fields(&extracted), vec!["location".to_string()]);
    }

    #[test]
    fn test_fill_location() {
        let mut extracted = ExtractedReport {
            missing_fields: vec!["location".into(), "name".into()],
            ..Default::default()
        };
        fill_field(&mut extracted, "location", "  Dusun Kali RT 02 ");
        assert_eq!(extracted.location, "Dusun Kali RT 02");
        assert_eq!(extracted.missing_fields, vec!["name".to_string()]);
    }
}
