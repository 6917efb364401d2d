use serde::{Deserialize, Serialize};

use crate::domains::extraction::Intent;

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    Korban,
    Kebutuhan,
}

impl ReportType {
    /// Anything that is not a victim report is filed as a needs report.
    pub fn from_intent(intent: Intent) -> Self {
        match intent {
            Intent::Korban => ReportType::Korban,
            _ => ReportType::Kebutuhan,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Korban => "KORBAN",
            ReportType::Kebutuhan => "KEBUTUHAN",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportType::Korban => "Korban (Meninggal/Hilang/Luka)",
            ReportType::Kebutuhan => "Kebutuhan Bantuan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "report_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    PendingVerification,
    Verified,
    Assigned,
    InProgress,
    Resolved,
    Closed,
    Stale,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::PendingVerification => "PENDING_VERIFICATION",
            ReportStatus::Verified => "VERIFIED",
            ReportStatus::Assigned => "ASSIGNED",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
            ReportStatus::Closed => "CLOSED",
            ReportStatus::Stale => "STALE",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::PendingVerification => "Menunggu Verifikasi",
            ReportStatus::Verified => "Terverifikasi",
            ReportStatus::Assigned => "Sudah Ditugaskan",
            ReportStatus::InProgress => "Sedang Ditangani",
            ReportStatus::Resolved => "Selesai",
            ReportStatus::Closed => "Ditutup",
            ReportStatus::Stale => "Kadaluarsa",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "urgency_level", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl Urgency {
    /// Case-insensitive; anything unrecognised is MEDIUM.
    pub fn from_extracted(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Urgency::Critical,
            "HIGH" => Urgency::High,
            "LOW" => Urgency::Low,
            _ => Urgency::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "CRITICAL",
            Urgency::High => "HIGH",
            Urgency::Medium => "MEDIUM",
            Urgency::Low => "LOW",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Critical => "Kritis (Segera!)",
            Urgency::High => "Tinggi",
            Urgency::Medium => "Sedang",
            Urgency::Low => "Rendah",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Urgency::Critical => "🚨",
            Urgency::High => "🔴",
            Urgency::Medium => "🟡",
            Urgency::Low => "🟢",
        }
    }
}

// ============================================================================
// Persons and needs
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "person_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonStatus {
    Meninggal,
    Hilang,
    LukaBerat,
    LukaSedang,
    LukaRingan,
    Sakit,
}

impl PersonStatus {
    /// Unknown or missing statuses default to LUKA_SEDANG.
    pub fn from_extracted(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
            Some("MENINGGAL") => PersonStatus::Meninggal,
            Some("HILANG") => PersonStatus::Hilang,
            Some("LUKA_BERAT") => PersonStatus::LukaBerat,
            Some("LUKA_RINGAN") => PersonStatus::LukaRingan,
            Some("SAKIT") => PersonStatus::Sakit,
            _ => PersonStatus::LukaSedang,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "need_category", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeedCategory {
    Pangan,
    Air,
    Medis,
    Shelter,
    Evakuasi,
    Sanitasi,
    LogistikLain,
    Perlindungan,
}

impl NeedCategory {
    /// Unknown or missing categories default to LOGISTIK_LAIN.
    pub fn from_extracted(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()).as_deref() {
            Some("PANGAN") => NeedCategory::Pangan,
            Some("AIR") => NeedCategory::Air,
            Some("MEDIS") => NeedCategory::Medis,
            Some("SHELTER") => NeedCategory::Shelter,
            Some("EVAKUASI") => NeedCategory::Evakuasi,
            Some("SANITASI") => NeedCategory::Sanitasi,
            Some("PERLINDUNGAN") => NeedCategory::Perlindungan,
            _ => NeedCategory::LogistikLain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "need_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeedStatus {
    BelumTerpenuhi,
    SebagianTerpenuhi,
    Terpenuhi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "action_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    StatusUpdate,
    Assignment,
}
