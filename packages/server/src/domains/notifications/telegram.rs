//! Operator alerts rendered as Telegram HTML.
//!
//! Every value that originates from a reporter goes through [`escape_html`].

use crate::common::time::format_wib;
use crate::domains::reports::models::{Report, ReportType};
use crate::domains::users::{User, UserRole};

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn report_icon(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Korban => "🆘",
        ReportType::Kebutuhan => "📦",
    }
}

pub fn new_report_alert(report: &Report, reporter: &User) -> String {
    let reporter_name = if reporter.name.trim().is_empty() {
        &reporter.phone_number
    } else {
        &reporter.name
    };
    let trust_line = if reporter.role == UserRole::Volunteer {
        "✅ <i>Relawan terverifikasi</i>"
    } else {
        "⚠️ <i>Pelapor bukan relawan terverifikasi</i>"
    };
    let location_detail = report
        .location_detail
        .as_deref()
        .map(|d| format!("<i>{}</i>", escape_html(d)))
        .unwrap_or_default();

    format!(
        "{icon} <b>LAPORAN BARU {urgency_icon}</b>\n\n\
         <b>ID:</b> {number}\n\
         <b>Jenis:</b> {kind}\n\
         <b>Urgensi:</b> {urgency}\n\n\
         <b>Pelapor:</b> {reporter}\n\
         {trust_line}\n\n\
         <b>Lokasi:</b> {location}\n\
         {location_detail}\n\n\
         <b>Ringkasan:</b>\n\
         {summary}\n\n\
         <b>Status:</b> {status}\n\n\
         <i>Waktu: {time}</i>",
        icon = report_icon(report.report_type),
        urgency_icon = report.urgency.icon(),
        number = escape_html(&report.report_number),
        kind = report.report_type.label(),
        urgency = report.urgency.label(),
        reporter = escape_html(reporter_name),
        trust_line = trust_line,
        location = escape_html(&report.location),
        location_detail = location_detail,
        summary = escape_html(&report.summary),
        status = report.status.label(),
        time = format_wib(report.created_at),
    )
}

pub fn critical_report_alert(report: &Report) -> String {
    format!(
        "🚨🚨🚨\n\
         🚨🚨🚨 <b>LAPORAN KRITIS!</b> 🚨🚨🚨\n\n\
         <b>ID:</b> {number}\n\
         <b>Jenis:</b> {kind}\n\
         <b>Lokasi:</b> {location}\n\n\
         <b>Ringkasan:</b>\n\
         {summary}\n\n\
         ⚡ <b>MEMERLUKAN TINDAKAN SEGERA!</b>\n\n\
         <i>Waktu: {time}</i>\n\
         🚨🚨🚨",
        number = escape_html(&report.report_number),
        kind = report.report_type.label(),
        location = escape_html(&report.location),
        summary = escape_html(&report.summary),
        time = format_wib(report.created_at),
    )
}

pub fn verification_needed_alert(report: &Report, reporter_trust_level: i32) -> String {
    format!(
        "⏳ <b>PERLU VERIFIKASI</b>\n\n\
         <b>ID:</b> {number}\n\
         <b>Jenis:</b> {kind}\n\
         <b>Lokasi:</b> {location}\n\n\
         <b>Pelapor:</b> {phone}\n\
         <i>Trust Level: {trust}</i>\n\n\
         <b>Ringkasan:</b>\n\
         {summary}\n\n\
         📞 <b>Tindakan:</b> Hubungi pelapor untuk verifikasi.",
        number = escape_html(&report.report_number),
        kind = report.report_type.label(),
        location = escape_html(&report.location),
        phone = escape_html(&report.reporter_phone),
        trust = reporter_trust_level,
        summary = escape_html(&report.summary),
    )
}

pub fn processing_error_alert(phone: &str, error: &str) -> String {
    format!(
        "❌ Error processing message from {}:\n{}",
        escape_html(phone),
        escape_html(error)
    )
}
