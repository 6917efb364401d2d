//! Report submission from the public web form
//!
//! Same extraction and creation path as WhatsApp, but single-shot: there is
//! no conversation to ask for a missing location, so it is rejected instead.

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::processor::missing_critical_fields;
use crate::domains::extraction::Intent;
use crate::domains::notifications::send_report_notifications;
use crate::domains::reports::actions::{create_report, ReportSource};
use crate::domains::reports::models::{Report, Urgency};
use crate::domains::users::{NewUser, User, UserRole};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebReportForm {
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
    /// Overrides whatever location extraction finds
    pub location: Option<String>,
    /// Overrides the extracted urgency
    pub urgency: Option<String>,
}

pub enum WebReportResult {
    Created(Report),
    MissingFields,
    UnknownIntent,
    MissingLocation,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub async fn submit_web_report(form: &WebReportForm, deps: &ServerDeps) -> Result<WebReportResult> {
    let (Some(phone_number), Some(message)) = (
        non_empty(form.phone_number.as_deref()),
        non_empty(form.message.as_deref()),
    ) else {
        return Ok(WebReportResult::MissingFields);
    };

    let mut extracted = deps.extractor.extract(message, None).await?;

    if let Some(location) = non_empty(form.location.as_deref()) {
        extracted.location = location.to_string();
        extracted.remove_missing("location");
    }
    if let Some(urgency) = non_empty(form.urgency.as_deref()) {
        extracted.urgency = Urgency::from_extracted(urgency);
    }

    if extracted.intent == Intent::Unknown {
        return Ok(WebReportResult::UnknownIntent);
    }
    if !missing_critical_fields(&extracted).is_empty() {
        return Ok(WebReportResult::MissingLocation);
    }

    let name = non_empty(form.name.as_deref()).unwrap_or(phone_number);
    let (reporter, _) = User::find_or_create(
        &NewUser {
            phone_number: phone_number.to_string(),
            name: name.to_string(),
            role: UserRole::Public,
            organization: None,
            trust_level: 0,
        },
        &deps.db_pool,
    )
    .await?;

    let created = create_report(
        &reporter,
        &extracted,
        message,
        ReportSource::Web,
        deps.intake.auto_verify_trust_level,
        Utc::now(),
        &deps.db_pool,
    )
    .await?;

    info!(
        report_number = %created.report.report_number,
        phone = %reporter.phone_number,
        "Web report submitted"
    );

    let report = send_report_notifications(created.report, &reporter, deps).await;
    Ok(WebReportResult::Created(report))
}
