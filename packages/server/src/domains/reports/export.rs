//! CSV rendering for report exports.

use anyhow::{Context, Result};
use serde::Serialize;

use super::actions::ReportListItem;
use crate::common::time::format_wib;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    report_number: &'a str,
    #[serde(rename = "type")]
    report_type: &'static str,
    status: &'static str,
    urgency: &'static str,
    location: &'a str,
    summary: &'a str,
    reporter_name: &'a str,
    reporter_phone: &'a str,
    report_source: &'a str,
    persons: String,
    needs: String,
    created_at: String,
    resolved_at: String,
}

fn describe_persons(item: &ReportListItem) -> String {
    item.persons
        .iter()
        .map(|p| format!("{} ({:?})", p.name, p.status))
        .collect::<Vec<_>>()
        .join("; ")
}

fn describe_needs(item: &ReportListItem) -> String {
    item.needs
        .iter()
        .map(|n| match n.quantity {
            Some(quantity) => format!("{:?}: {} x{}", n.category, n.description, quantity),
            None => format!("{:?}: {}", n.category, n.description),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn reports_to_csv(items: &[ReportListItem]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for item in items {
        let report = &item.report;
        let reporter_name = item.reporter.as_ref().map(|r| r.name.as_str()).unwrap_or("");
        writer.serialize(ExportRow {
            report_number: &report.report_number,
            report_type: report.report_type.as_str(),
            status: report.status.as_str(),
            urgency: report.urgency.as_str(),
            location: &report.location,
            summary: &report.summary,
            reporter_name,
            reporter_phone: &report.reporter_phone,
            report_source: &report.report_source,
            persons: describe_persons(item),
            needs: describe_needs(item),
            created_at: format_wib(report.created_at),
            resolved_at: report.resolved_at.map(format_wib).unwrap_or_default(),
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("{}", e.error()))
        .context("Failed to finish CSV export")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{NeedId, ReportId, UserId};
    use crate::domains::reports::models::*;
    use chrono::{TimeZone, Utc};

    fn item() -> ReportListItem {
        let created_at = Utc.with_ymd_and_hms(2026, 10, 19, 1, 2, 3).unwrap();
        let id = ReportId::new();
        ReportListItem {
            report: Report {
                id,
                report_number: "PB-N-261019-0001".into(),
                report_type: ReportType::Kebutuhan,
                status: ReportStatus::PendingVerification,
                urgency: Urgency::High,
                reporter_id: UserId::new(),
                reporter_phone: "6281234567890".into(),
                report_source: "whatsapp".into(),
                location: "Desa Sukamaju, RT 03".into(),
                location_detail: None,
                latitude: None,
                longitude: None,
                summary: "Butuh air bersih".into(),
                raw_message: "butuh air".into(),
                extracted_data: serde_json::json!({}),
                verified_by: None,
                verified_at: None,
                assigned_to_id: None,
                assigned_at: None,
                resolved_at: None,
                created_at,
                updated_at: created_at,
            },
            reporter: None,
            assigned_to: None,
            persons: Vec::new(),
            needs: vec![ReportNeed {
                id: NeedId::new(),
                report_id: id,
                category: NeedCategory::Air,
                description: "Air bersih".into(),
                quantity: Some(50),
                people_affected: None,
                status: NeedStatus::BelumTerpenuhi,
                created_at,
            }],
            action_count: 0,
        }
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let csv = String::from_utf8(reports_to_csv(&[item()]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "reportNumber,type,status,urgency,location,summary,reporterName,reporterPhone,reportSource,persons,needs,createdAt,resolvedAt"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("PB-N-261019-0001,KEBUTUHAN,PENDING_VERIFICATION,HIGH,\"Desa Sukamaju, RT 03\""));
        assert!(row.contains("Air: Air bersih x50"));
        assert!(row.contains("19/10/2026, 08.02.03 WIB"));
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let csv = reports_to_csv(&[]).unwrap();
        assert!(csv.is_empty());
    }
}
