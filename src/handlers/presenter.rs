use crate::models::{AnalysisFailure, AnalysisResult, DishReport, FailureKind, NutrientValue};

const UNKNOWN: &str = "?";

/// Renders one analysis result for display. Whatever the model left out
/// shows up as "?" rather than hiding the rest of the report.
pub fn format_analysis(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::Success(report) => format_report(report),
        AnalysisResult::Failure(failure) => format_failure(failure),
    }
}

fn format_report(report: &DishReport) -> String {
    let name = report.dish_name.as_deref().unwrap_or(UNKNOWN);
    let macros = &report.macros;

    let mut out = format!(
        "🍲 *{}*\n\n\
         🔥 Calories: {} kcal\n\
         🥩 Protein: {} g\n\
         🍚 Carbs: {} g\n\
         🧈 Fat: {} g\n\n\
         💡 {}",
        name,
        nutrient(&macros.calories),
        nutrient(&macros.protein_g),
        nutrient(&macros.carbs_g),
        nutrient(&macros.fat_g),
        report.health_facts.as_deref().unwrap_or(UNKNOWN),
    );

    match report.warnings.as_deref() {
        Some(warnings) if !warnings.trim().is_empty() => {
            out.push_str("\n⚠️ ");
            out.push_str(warnings);
        }
        _ => {}
    }

    out
}

fn format_failure(failure: &AnalysisFailure) -> String {
    match failure.kind {
        FailureKind::Cancelled => "🛑 Analysis cancelled.".to_string(),
        FailureKind::CredentialMissing => format!("🔑 {}", failure.error),
        FailureKind::Parse => {
            let raw = failure.raw_text.as_deref().unwrap_or_default();
            format!(
                "❌ {}\n\nThe model said:\n{}",
                failure.error,
                truncate(raw, 400)
            )
        }
        FailureKind::Exhausted | FailureKind::Io => format!("❌ {}", failure.error),
    }
}

fn nutrient(value: &Option<NutrientValue>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MacroEstimate;

    #[test]
    fn full_report_renders_all_fields() {
        let report = DishReport {
            dish_name: Some("Sinigang".to_string()),
            macros: MacroEstimate {
                calories: Some(NutrientValue::Number(180.0)),
                protein_g: Some(NutrientValue::Number(8.5)),
                carbs_g: Some(NutrientValue::Number(12.0)),
                fat_g: Some(NutrientValue::Number(6.0)),
            },
            health_facts: Some("Rich in vitamin C".to_string()),
            warnings: Some("High sodium".to_string()),
        };

        let text = format_analysis(&AnalysisResult::Success(report));
        assert!(text.contains("Sinigang"));
        assert!(text.contains("180 kcal"));
        assert!(text.contains("8.5 g"));
        assert!(text.contains("High sodium"));
    }

    #[test]
    fn missing_fields_render_as_question_marks() {
        let text = format_analysis(&AnalysisResult::Success(DishReport::default()));
        assert!(text.contains("🍲 *?*"));
        assert!(text.contains("Calories: ? kcal"));
        // no warnings section when the model gave none
        assert!(!text.contains("⚠️"));
    }

    #[test]
    fn not_available_values_render_verbatim() {
        let report = DishReport {
            macros: MacroEstimate {
                calories: Some(NutrientValue::Text("N/A".to_string())),
                ..Default::default()
            },
            ..Default::default()
        };
        let text = format_analysis(&AnalysisResult::Success(report));
        assert!(text.contains("Calories: N/A kcal"));
    }

    #[test]
    fn parse_failure_shows_the_raw_model_text() {
        let failure = AnalysisFailure::parse("I am not valid JSON");
        let text = format_analysis(&AnalysisResult::Failure(failure));
        assert!(text.contains("I am not valid JSON"));
    }

    #[test]
    fn cancellation_renders_distinctly() {
        let text = format_analysis(&AnalysisResult::Failure(AnalysisFailure::cancelled()));
        assert_eq!(text, "🛑 Analysis cancelled.");
    }
}
