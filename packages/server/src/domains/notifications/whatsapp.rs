//! Reporter-facing WhatsApp texts (Indonesian, WhatsApp markdown).

use chrono::{DateTime, Utc};

use crate::common::time::format_wib;
use crate::domains::reports::models::{Report, ReportStatus, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMessage {
    General,
    AiTimeout,
    InvalidFormat,
}

impl ErrorMessage {
    pub fn text(&self) -> &'static str {
        match self {
            ErrorMessage::General => {
                "❌ Maaf, terjadi kesalahan sistem. Tim kami telah diberitahu. Silakan coba lagi dalam beberapa menit atau hubungi admin."
            }
            ErrorMessage::AiTimeout => {
                "⏳ Maaf, sistem sedang sibuk. Laporan Anda sudah kami terima dan akan diproses segera. Mohon tunggu konfirmasi."
            }
            ErrorMessage::InvalidFormat => {
                "❓ Maaf, kami tidak dapat memproses pesan Anda. Pastikan Anda mengirim laporan dalam format yang jelas.\n\nContoh:\n\"Ada korban luka di Desa X\"\n\"Butuh bantuan makanan untuk 50 orang di Posko Y\""
            }
        }
    }
}

fn urgency_line(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "🚨 KRITIS - Tindakan segera!",
        Urgency::High => "🔴 TINGGI - Tindakan dalam hitungan jam",
        Urgency::Medium => "🟡 SEDANG",
        Urgency::Low => "🟢 RENDAH",
    }
}

pub fn report_confirmation(report: &Report) -> String {
    let mut message = String::from("✅ *LAPORAN DITERIMA*\n\n");
    message.push_str(&format!("ID Laporan: *{}*\n", report.report_number));
    message.push_str(&format!("Jenis: {}\n", report.report_type.label()));
    message.push_str(&format!("Tingkat Urgensi: {}\n", urgency_line(report.urgency)));
    message.push_str(&format!("Lokasi: {}\n\n", report.location));
    message.push_str(&format!("📋 *Ringkasan:*\n{}\n\n", report.summary));

    if report.status == ReportStatus::PendingVerification {
        message.push_str("⏳ Status: Menunggu verifikasi\n");
        message.push_str("Tim kami akan menghubungi Anda segera untuk konfirmasi.\n\n");
    } else {
        message.push_str("✅ Status: Terverifikasi\n");
        if matches!(report.urgency, Urgency::Critical | Urgency::High) {
            message.push_str(
                "Tim tanggap darurat telah diberitahu dan akan segera menindaklanjuti.\n\n",
            );
        }
    }

    message.push_str("Mohon standby di nomor ini untuk update lebih lanjut.\n\n");
    message.push_str(&format!("_Waktu: {}_", format_wib(report.created_at)));
    message
}

pub fn status_update(report: &Report, status_message: &str, now: DateTime<Utc>) -> String {
    format!(
        "📢 *UPDATE LAPORAN #{}*\n\n{}\n\nLokasi: {}\n_{}_",
        report.report_number,
        status_message,
        report.location,
        format_wib(now)
    )
}

pub fn welcome(is_verified_volunteer: bool) -> String {
    let mut message = String::from("👋 Selamat datang di *Sistem Tanggap Darurat Bencana*\n\n");
    if is_verified_volunteer {
        message.push_str("✅ Anda terdaftar sebagai relawan terverifikasi.\n\n");
    }
    message.push_str("Anda dapat melaporkan:\n");
    message.push_str("🆘 Korban (meninggal, hilang, luka)\n");
    message.push_str("📦 Kebutuhan bantuan (pangan, air, medis, shelter, dll)\n\n");
    message.push_str("*Cara Melapor:*\n");
    message.push_str("Kirim pesan dengan format bebas, contoh:\n");
    message.push_str("\"Ada 3 orang terluka di Dusun Kali RT 02, butuh evakuasi segera\"\n\n");
    message.push_str("Sistem AI kami akan membantu mengekstrak informasi. Jika ada data yang kurang, kami akan bertanya.\n\n");
    message.push_str("_Pastikan nomor ini aktif untuk menerima update._");
    message
}

/// Reporter-facing note for dashboard transitions that warrant one.
pub fn status_change_note(status: ReportStatus) -> Option<&'static str> {
    match status {
        ReportStatus::Verified => {
            Some("Laporan Anda telah diverifikasi dan akan segera ditindaklanjuti.")
        }
        ReportStatus::Resolved => {
            Some("Laporan Anda telah selesai ditangani. Terima kasih atas laporannya.")
        }
        _ => None,
    }
}

pub const ASSIGNMENT_NOTE: &str = "Anda ditugaskan untuk menangani laporan ini.";
