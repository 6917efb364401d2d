use anyhow::{Context, Result};

use super::types::ExtractedReport;

/// Strip markdown code fences the model sometimes wraps its JSON in.
pub fn strip_code_fences(response: &str) -> &str {
    let mut cleaned = response.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

pub fn parse_llm_response(response: &str) -> Result<ExtractedReport> {
    let cleaned = strip_code_fences(response);
    serde_json::from_str::<ExtractedReport>(cleaned).context("Failed to parse AI response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::extraction::Intent;
    use crate::domains::reports::models::Urgency;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = r#"```json
{
  "intent": "korban",
  "urgency": "critical",
  "location": "Desa Sukamaju RT 03",
  "summary": "2 orang meninggal",
  "persons": [{"name": "Pak Ahmad", "status": "meninggal", "age": "60"}],
  "missingFields": []
}
```"#;
        let report = parse_llm_response(response).unwrap();
        assert_eq!(report.intent, Intent::Korban);
        assert_eq!(report.urgency, Urgency::Critical);
        assert_eq!(report.location, "Desa Sukamaju RT 03");
        assert_eq!(report.persons[0].age, Some(60));
        assert!(report.needs.is_empty());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(parse_llm_response("Maaf, saya tidak mengerti.").is_err());
    }
}
