use serde_json::{Map, Value};

use crate::models::{
    AnalysisFailure, AnalysisResult, DishReport, MacroEstimate, NutrientValue,
};

/// Pulls the structured report out of free-form model text. Models wrap
/// their JSON in prose or markdown fences often enough that we just take
/// the substring between the first '{' and the last '}' and parse that.
/// Stateless and infallible: anything unparseable becomes a Failure value.
pub fn extract(raw: &str) -> AnalysisResult {
    if raw.trim().is_empty() {
        return AnalysisResult::Failure(AnalysisFailure::exhausted());
    }

    let Some(start) = raw.find('{') else {
        log::warn!("⚠️ Model response contains no JSON object");
        return AnalysisResult::Failure(AnalysisFailure::parse(raw));
    };
    let Some(end) = raw.rfind('}') else {
        log::warn!("⚠️ Model response contains an unterminated JSON object");
        return AnalysisResult::Failure(AnalysisFailure::parse(raw));
    };
    if end < start {
        return AnalysisResult::Failure(AnalysisFailure::parse(raw));
    }

    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Object(map)) => AnalysisResult::Success(report_from(&map)),
        Ok(_) => AnalysisResult::Failure(AnalysisFailure::parse(raw)),
        Err(e) => {
            log::warn!("⚠️ Could not parse model JSON: {}", e);
            AnalysisResult::Failure(AnalysisFailure::parse(raw))
        }
    }
}

// Field-by-field and lax on purpose: a missing or oddly-typed field
// renders as "?" downstream instead of failing the whole analysis.
fn report_from(map: &Map<String, Value>) -> DishReport {
    let macros = map
        .get("macros")
        .and_then(Value::as_object)
        .map(|m| MacroEstimate {
            calories: nutrient(m, "calories"),
            protein_g: nutrient(m, "protein_g"),
            carbs_g: nutrient(m, "carbs_g"),
            fat_g: nutrient(m, "fat_g"),
        })
        .unwrap_or_default();

    DishReport {
        dish_name: string_field(map, &["ulam_name", "dish_name"]),
        macros,
        health_facts: string_field(map, &["health_facts"]),
        warnings: string_field(map, &["warnings"]),
    }
}

fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| map.get(*key))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn nutrient(map: &Map<String, Value>, key: &str) -> Option<NutrientValue> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64().map(NutrientValue::Number),
        Value::String(s) => Some(NutrientValue::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;

    #[test]
    fn json_wrapped_in_prose_extracts() {
        let raw = "prefix { \"ulam_name\": \"Adobo\", \"health_facts\": \"salty\" } suffix";
        let AnalysisResult::Success(report) = extract(raw) else {
            panic!("expected success");
        };
        assert_eq!(report.dish_name.as_deref(), Some("Adobo"));
        assert_eq!(report.health_facts.as_deref(), Some("salty"));
    }

    #[test]
    fn markdown_fenced_json_extracts() {
        let raw = "```json\n{\"ulam_name\": \"Kare-kare\"}\n```";
        let AnalysisResult::Success(report) = extract(raw) else {
            panic!("expected success");
        };
        assert_eq!(report.dish_name.as_deref(), Some("Kare-kare"));
    }

    #[test]
    fn full_scenario_parses_name_and_calories() {
        let raw = "Sure! {\"ulam_name\":\"Sinigang\",\"macros\":{\"calories\":180,\
                   \"protein_g\":8.5,\"carbs_g\":12.0,\"fat_g\":6.0},\
                   \"health_facts\":\"Rich in vitamin C\",\"warnings\":\"High sodium\"}";
        let AnalysisResult::Success(report) = extract(raw) else {
            panic!("expected success");
        };
        assert_eq!(report.dish_name.as_deref(), Some("Sinigang"));
        assert_eq!(report.macros.calories, Some(NutrientValue::Number(180.0)));
        assert_eq!(report.macros.protein_g, Some(NutrientValue::Number(8.5)));
        assert_eq!(report.warnings.as_deref(), Some("High sodium"));
    }

    #[test]
    fn not_available_macros_survive_as_text() {
        let raw = "{\"ulam_name\":\"Lumpia\",\"macros\":{\"calories\":\"N/A\"}}";
        let AnalysisResult::Success(report) = extract(raw) else {
            panic!("expected success");
        };
        assert_eq!(
            report.macros.calories,
            Some(NutrientValue::Text("N/A".to_string()))
        );
        assert_eq!(report.macros.protein_g, None);
    }

    #[test]
    fn unbalanced_braces_fail_with_original_text() {
        let raw = "this { never closes";
        let AnalysisResult::Failure(failure) = extract(raw) else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Parse);
        assert_eq!(failure.raw_text.as_deref(), Some(raw));
    }

    #[test]
    fn braceless_text_fails_with_original_text() {
        let raw = "I cannot see any food in this picture.";
        let AnalysisResult::Failure(failure) = extract(raw) else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Parse);
        assert_eq!(failure.raw_text.as_deref(), Some(raw));
    }

    #[test]
    fn empty_raw_is_exhaustion_not_parse_failure() {
        let AnalysisResult::Failure(failure) = extract("  ") else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Exhausted);
        assert_eq!(failure.raw_text, None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let raw = "{\"ulam_name\":\"Tinola\",\"macros\":{\"calories\":95}}";
        assert_eq!(extract(raw), extract(raw));
    }
}
