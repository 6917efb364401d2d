//! End-to-end tests for the WhatsApp intake pipeline: extraction,
//! follow-up conversations, report creation and notifications.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use server_core::common::ReportId;
use server_core::domains::chat_state::ChatState;
use server_core::domains::extraction::rule_based_extract;
use server_core::domains::intake::{process_message, IntakeOutcome};
use server_core::domains::media::{MediaType, ReportMedia};
use server_core::domains::reports::actions::{create_report, ReportSource};
use server_core::domains::reports::models::{ReportNeed, ReportPerson};
use server_core::domains::reports::{Report, ReportStatus, ReportType, Urgency};
use server_core::domains::users::{User, UserRole};
use server_core::kernel::test_dependencies::{MockLlm, MockWhatsApp};
use test_context::test_context;

fn today() -> String {
    Utc::now().format("%y%m%d").to_string()
}

async fn created_report(outcome: IntakeOutcome, ctx: &TestHarness) -> Report {
    let IntakeOutcome::ReportCreated { report_id, .. } = outcome else {
        panic!("expected a report, got {:?}", outcome);
    };
    load_report(report_id, ctx).await
}

async fn load_report(id: ReportId, ctx: &TestHarness) -> Report {
    Report::find_by_id(id, &ctx.db_pool)
        .await
        .unwrap()
        .expect("report exists")
}

#[test_context(TestHarness)]
#[tokio::test]
async fn complete_victim_report_is_created_from_first_message(ctx: &TestHarness) {
    let message = text_message("6281200000001", "Ada 2 orang terluka di Desa Sukamaju RT 03");

    let outcome = process_message(&message, &ctx.deps).await.unwrap();
    let report = created_report(outcome, ctx).await;
    ctx.settle().await;

    // New senders are registered as volunteers, so the report skips verification
    let reporter = User::find_by_phone("6281200000001", &ctx.db_pool)
        .await
        .unwrap()
        .expect("reporter registered");
    assert_eq!(reporter.role, UserRole::Volunteer);
    assert_eq!(reporter.trust_level, 0);
    assert_eq!(reporter.name, "Warga");
    assert_eq!(report.reporter_id, reporter.id);

    assert_eq!(report.report_number, format!("VR-K-{}-0001", today()));
    assert_eq!(report.report_type, ReportType::Korban);
    assert_eq!(report.status, ReportStatus::Verified);
    assert_eq!(report.verified_by, Some(reporter.id));
    assert_eq!(report.urgency, Urgency::Medium);
    assert_eq!(report.location, "Desa Sukamaju RT 03");
    assert_eq!(report.report_source, "whatsapp");

    let persons = ReportPerson::find_by_report_ids(&[report.id], &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(persons.len(), 2);

    assert_eq!(ctx.whatsapp.read_receipts(), vec![message.message_id.clone()]);
    let replies = ctx.whatsapp.sent_to("6281200000001");
    let welcome = replies
        .iter()
        .find(|m| m.contains("Selamat datang"))
        .expect("welcome sent");
    assert!(!welcome.contains("relawan terverifikasi"));
    assert!(replies
        .iter()
        .any(|m| m.contains("LAPORAN DITERIMA") && m.contains(&report.report_number)));

    assert!(ctx.telegram.was_alerted_with("LAPORAN BARU"));
    assert!(!ctx.telegram.was_alerted_with("PERLU VERIFIKASI"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn public_reporter_needs_verification(ctx: &TestHarness) {
    let phone = "6281200000012";
    create_user(&ctx.db_pool, phone, "Bu Ani", UserRole::Public, 0)
        .await
        .unwrap();

    let outcome = process_message(
        &text_message(phone, "Ada 2 orang terluka di Desa Sukamaju RT 03"),
        &ctx.deps,
    )
    .await
    .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.report_number, format!("PB-K-{}-0001", today()));
    assert_eq!(report.status, ReportStatus::PendingVerification);
    assert!(report.verified_by.is_none());
    assert!(report.verified_at.is_none());

    assert!(ctx.telegram.was_alerted_with("PERLU VERIFIKASI"));
    assert!(ctx.telegram.was_alerted_with("Pelapor bukan relawan terverifikasi"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn report_numbers_count_up_within_a_day(ctx: &TestHarness) {
    let first = process_message(
        &text_message("6281200000013", "Ada 2 orang terluka di Desa Sukamaju RT 03"),
        &ctx.deps,
    )
    .await
    .unwrap();
    let second = process_message(
        &text_message("6281200000014", "butuh obat di Desa Cibodas"),
        &ctx.deps,
    )
    .await
    .unwrap();

    let first = created_report(first, ctx).await;
    let second = created_report(second, ctx).await;
    assert_eq!(first.report_number, format!("VR-K-{}-0001", today()));
    assert_eq!(second.report_number, format!("VR-N-{}-0002", today()));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn report_is_stamped_with_the_instant_it_was_numbered(ctx: &TestHarness) {
    // Half a second past midnight on the application clock, whatever the
    // database clock says
    let just_after_midnight = Utc.with_ymd_and_hms(2031, 3, 1, 0, 0, 0).unwrap()
        + Duration::milliseconds(500);
    let reporter = create_user(&ctx.db_pool, "6281200000015", "Relawan Dewi", UserRole::Volunteer, 0)
        .await
        .unwrap();
    let extracted = rule_based_extract("Ada 2 orang terluka di Desa Sukamaju RT 03");

    let mut numbers = Vec::new();
    for _ in 0..2 {
        let created = create_report(
            &reporter,
            &extracted,
            "Ada 2 orang terluka di Desa Sukamaju RT 03",
            ReportSource::WhatsApp,
            ctx.deps.intake.auto_verify_trust_level,
            just_after_midnight,
            &ctx.db_pool,
        )
        .await
        .unwrap();
        assert_eq!(created.report.created_at, just_after_midnight);
        numbers.push(created.report.report_number);
    }

    assert_eq!(numbers, vec!["VR-K-310301-0001", "VR-K-310301-0002"]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn missing_location_starts_a_conversation(ctx: &TestHarness) {
    let phone = "6281200000002";

    let outcome = process_message(&text_message(phone, "kami butuh beras dan air minum"), &ctx.deps)
        .await
        .unwrap();
    let IntakeOutcome::NeedsFollowUp { question } = outcome else {
        panic!("expected follow-up, got {:?}", outcome);
    };
    assert!(question.contains("Lokasi kejadian"));

    let chat = ChatState::find_active(phone, Utc::now(), &ctx.db_pool)
        .await
        .unwrap()
        .expect("conversation saved");
    assert_eq!(chat.state.0.missing_fields, vec!["location".to_string()]);
    assert_eq!(chat.state.0.original_message, "kami butuh beras dan air minum");

    let outcome = process_message(&text_message(phone, "Posko Balai Desa Mekarsari"), &ctx.deps)
        .await
        .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.report_number, format!("VR-N-{}-0001", today()));
    assert_eq!(report.report_type, ReportType::Kebutuhan);
    assert_eq!(report.location, "Posko Balai Desa Mekarsari");
    assert_eq!(
        report.raw_message,
        "kami butuh beras dan air minum\nPosko Balai Desa Mekarsari"
    );

    let needs = ReportNeed::find_by_report_ids(&[report.id], &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(needs.len(), 2);

    // Conversation closed
    assert!(ChatState::find_active(phone, Utc::now(), &ctx.db_pool)
        .await
        .unwrap()
        .is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn blank_follow_up_asks_again(ctx: &TestHarness) {
    let phone = "6281200000003";
    process_message(&text_message(phone, "tolong kami perlu tenda"), &ctx.deps)
        .await
        .unwrap();

    let outcome = process_message(&text_message(phone, "   "), &ctx.deps)
        .await
        .unwrap();
    assert!(matches!(outcome, IntakeOutcome::NeedsFollowUp { .. }));

    let reports = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports")
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(reports, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unrecognised_message_gets_usage_examples(ctx: &TestHarness) {
    let phone = "6281200000004";

    let outcome = process_message(&text_message(phone, "Selamat pagi semuanya"), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(outcome, IntakeOutcome::UnknownIntent);

    let replies = ctx.whatsapp.sent_to(phone);
    assert!(replies.iter().any(|m| m.contains("Contoh:")));
    assert!(ctx.telegram.alerts().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn volunteer_reports_are_verified_on_creation(ctx: &TestHarness) {
    let phone = "6281200000005";
    let volunteer = create_user(&ctx.db_pool, phone, "Relawan Budi", UserRole::Volunteer, 1)
        .await
        .unwrap();

    let outcome = process_message(
        &text_message(phone, "Ada korban hilang di Dusun Karang RW 05"),
        &ctx.deps,
    )
    .await
    .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.report_number, format!("VR-K-{}-0001", today()));
    assert_eq!(report.status, ReportStatus::Verified);
    assert_eq!(report.verified_by, Some(volunteer.id));
    assert!(report.verified_at.is_some());

    assert!(ctx.telegram.was_alerted_with("Relawan terverifikasi"));
    assert!(!ctx.telegram.was_alerted_with("PERLU VERIFIKASI"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn trusted_public_reporter_is_auto_verified(ctx: &TestHarness) {
    let phone = "6281200000006";
    create_user(&ctx.db_pool, phone, "Pak RT", UserRole::Public, 3)
        .await
        .unwrap();

    let outcome = process_message(&text_message(phone, "butuh obat di Desa Cibodas"), &ctx.deps)
        .await
        .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.status, ReportStatus::Verified);
    assert!(report.report_number.starts_with("PB-N-"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn critical_report_is_auto_assigned(ctx: &TestHarness) {
    let coordinator = create_user(
        &ctx.db_pool,
        "6281299999999",
        "Koordinator Lapangan",
        UserRole::Coordinator,
        5,
    )
    .await
    .unwrap();
    let deps = ctx.deps_with(|d| d.auto_assign_critical_to("6281299999999"));

    let outcome = process_message(
        &text_message("6281200000007", "3 orang meninggal di Desa Lembang RT 01"),
        &deps,
    )
    .await
    .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.urgency, Urgency::Critical);
    assert_eq!(report.status, ReportStatus::Assigned);
    assert_eq!(report.assigned_to_id, Some(coordinator.id));
    assert!(report.assigned_at.is_some());

    assert!(ctx.telegram.was_alerted_with("LAPORAN KRITIS"));
    let to_coordinator = ctx.whatsapp.sent_to("6281299999999");
    assert_eq!(to_coordinator.len(), 1);
    assert!(to_coordinator[0].contains(&report.report_number));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn photo_sent_during_conversation_is_attached(ctx: &TestHarness) {
    let phone = "6281200000008";
    let jpeg = b"\xff\xd8\xff\xe0fake-jpeg-bytes";
    let whatsapp = MockWhatsApp::new().with_media("media-42", "image/jpeg", jpeg);
    let deps = ctx.deps_with(|d| d.mock_whatsapp(whatsapp));

    let outcome = process_message(&image_message(phone, "media-42", "butuh tenda darurat"), &deps)
        .await
        .unwrap();
    assert!(matches!(outcome, IntakeOutcome::NeedsFollowUp { .. }));

    let outcome = process_message(&text_message(phone, "Lapangan Desa Sirnagalih"), &deps)
        .await
        .unwrap();
    let report = created_report(outcome, ctx).await;

    let media = ReportMedia::find_by_report(report.id, &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].media_type, MediaType::Image);
    assert_eq!(media[0].file_size, jpeg.len() as i64);
    assert_eq!(media[0].caption.as_deref(), Some("butuh tenda darurat"));
    assert!(media[0].file_path.starts_with("images/"));
    assert!(media[0].file_name.ends_with(".jpg"));

    let stored = deps.media_storage.read(&media[0].file_path).await.unwrap();
    assert_eq!(stored.as_deref(), Some(&jpeg[..]));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn llm_extraction_is_used_when_configured(ctx: &TestHarness) {
    ctx.llm.push_response(
        r#"```json
{"intent":"kebutuhan","urgency":"high","location":"Posko Gereja Santo Yosef","summary":"Butuh 100 paket makanan","needs":[{"category":"pangan","description":"Paket makanan","quantity":"100","peopleAffected":100}],"missingFields":[]}
```"#,
    );
    let deps = ctx.deps_with(|d| d.mock_llm(ctx.llm.clone()));

    let outcome = process_message(
        &text_message("6281200000009", "pengungsi di gereja perlu makanan 100 paket"),
        &deps,
    )
    .await
    .unwrap();
    let report = created_report(outcome, ctx).await;

    assert_eq!(report.urgency, Urgency::High);
    assert_eq!(report.location, "Posko Gereja Santo Yosef");
    assert_eq!(report.summary, "Butuh 100 paket makanan");

    let needs = ReportNeed::find_by_report_ids(&[report.id], &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(needs.len(), 1);
    assert_eq!(needs[0].quantity, Some(100));

    let prompts = ctx.llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("pengungsi di gereja perlu makanan 100 paket"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn delivery_failure_alerts_operators(ctx: &TestHarness) {
    let deps = ctx.deps_with(|d| d.mock_whatsapp(MockWhatsApp::new().failing_sends()));

    let result = process_message(&text_message("6281200000010", "Halo"), &deps).await;

    assert!(result.is_err());
    assert!(ctx
        .telegram
        .was_alerted_with("Error processing message from 6281200000010"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn llm_outage_without_fallback_tells_sender_to_wait(ctx: &TestHarness) {
    let deps = ctx.deps_with(|d| {
        d.mock_llm(MockLlm::new().failing("connection refused"))
            .without_rule_fallback()
    });
    let phone = "6281200000016";

    let result = process_message(
        &text_message(phone, "Ada 2 orang terluka di Desa Sukamaju RT 03"),
        &deps,
    )
    .await;

    assert!(result.is_err());
    let replies = ctx.whatsapp.sent_to(phone);
    assert!(replies.iter().any(|m| m.contains("sistem sedang sibuk")));
    assert!(!replies.iter().any(|m| m.contains("terjadi kesalahan sistem")));
    assert!(ctx
        .telegram
        .was_alerted_with(&format!("Error processing message from {}", phone)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn expired_conversation_starts_over(ctx: &TestHarness) {
    let phone = "6281200000011";
    process_message(&text_message(phone, "kami perlu air bersih"), &ctx.deps)
        .await
        .unwrap();

    sqlx::query("UPDATE chat_states SET last_message_at = $2 WHERE phone_number = $1")
        .bind(phone)
        .bind(Utc::now() - Duration::minutes(61))
        .execute(&ctx.db_pool)
        .await
        .unwrap();

    // Treated as a fresh message, not as the location answer
    let outcome = process_message(&text_message(phone, "Selamat siang"), &ctx.deps)
        .await
        .unwrap();
    assert_eq!(outcome, IntakeOutcome::UnknownIntent);
    assert!(ChatState::find_active(phone, Utc::now(), &ctx.db_pool)
        .await
        .unwrap()
        .is_none());
}
