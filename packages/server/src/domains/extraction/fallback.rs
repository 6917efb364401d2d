//! Keyword extraction used when the LLM is disabled, unreachable, or returns
//! something unparseable.

use lazy_static::lazy_static;
use regex::Regex;

use super::types::{ExtractedNeed, ExtractedPerson, ExtractedReport, Intent};
use crate::domains::reports::models::Urgency;

lazy_static! {
    // "di Desa Sukamaju RT 03" - capitalised place name after "di"
    static ref LOCATION_REGEX: Regex =
        Regex::new(r"\bdi\s+([A-Z][a-zA-Z\s]+(?:RT|RW)?[\s\d/]*)").expect("valid location regex");

    static ref PERSON_COUNT_REGEX: Regex =
        Regex::new(r"(\d+)\s*(orang|korban|jiwa)").expect("valid count regex");
}

const KORBAN_KEYWORDS: &[&str] = &[
    "mati", "meninggal", "tewas", "hilang", "luka", "cedera", "terluka", "sakit", "korban",
];
const KEBUTUHAN_KEYWORDS: &[&str] = &["butuh", "perlu", "minta", "bantuan", "tolong", "darurat"];
const URGENT_KEYWORDS: &[&str] = &["darurat", "segera", "cepat", "kritis", "parah", "bahaya"];
const CRITICAL_KEYWORDS: &[&str] = &["mati", "meninggal", "tewas", "kritis", "parah sekali", "sekarat"];

const NEED_KEYWORDS: &[(&str, &[&str])] = &[
    ("pangan", &["makan", "makanan", "beras", "pangan", "lapar"]),
    ("air", &["air", "minum"]),
    ("medis", &["obat", "medis", "dokter", "puskesmas", "rs", "rumah sakit"]),
    ("shelter", &["tenda", "tempat tinggal", "shelter", "terpal", "matras"]),
    ("evakuasi", &["evakuasi", "dievakuasi", "pindah", "selamatkan"]),
];

const MAX_PLACEHOLDER_PERSONS: usize = 100;
const SUMMARY_CHARS: usize = 200;

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

pub fn rule_based_extract(message: &str) -> ExtractedReport {
    let lower = message.to_lowercase();

    let mut report = ExtractedReport {
        summary: message.chars().take(SUMMARY_CHARS).collect(),
        missing_fields: vec!["location".to_string()],
        fallback: true,
        ..Default::default()
    };

    if contains_any(&lower, KORBAN_KEYWORDS) {
        report.intent = Intent::Korban;
    } else if contains_any(&lower, KEBUTUHAN_KEYWORDS) {
        report.intent = Intent::Kebutuhan;
    }

    if contains_any(&lower, URGENT_KEYWORDS) {
        report.urgency = Urgency::High;
    }
    if contains_any(&lower, CRITICAL_KEYWORDS) {
        report.urgency = Urgency::Critical;
    }

    if let Some(location) = LOCATION_REGEX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
    {
        report.location = location.to_string();
        report.remove_missing("location");
    }

    if report.intent == Intent::Korban {
        let count = PERSON_COUNT_REGEX
            .captures(message)
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .unwrap_or(0)
            .min(MAX_PLACEHOLDER_PERSONS);
        report.persons = (1..=count)
            .map(|i| ExtractedPerson::unnamed(i, "luka_sedang"))
            .collect();
    }

    if report.intent == Intent::Kebutuhan {
        report.needs = NEED_KEYWORDS
            .iter()
            .filter(|(_, keywords)| contains_any(&lower, keywords))
            .map(|(category, _)| ExtractedNeed {
                category: Some(category.to_string()),
                description: format!("Kebutuhan {} (extracted via fallback)", category),
                quantity: None,
                people_affected: None,
            })
            .collect();
    }

    report
}
