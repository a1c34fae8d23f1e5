use serde::{Deserialize, Serialize};

/// A still frame handed over by the camera source. RGB8, row-major.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// One stage of the fallback chain. Order matters: vision first,
/// raw HTTP upload second, text-only estimate third, legacy shape last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierKind {
    Vision,
    HttpRaw,
    TextOnly,
    Legacy,
}

impl std::fmt::Display for TierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TierKind::Vision => "vision",
            TierKind::HttpRaw => "http-raw",
            TierKind::TextOnly => "text-only",
            TierKind::Legacy => "legacy",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTier {
    pub name: String,
    pub kind: TierKind,
}

impl ModelTier {
    pub fn new(name: impl Into<String>, kind: TierKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A macro value as the model reports it: a number, or "N/A" when the
/// model could not estimate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NutrientValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for NutrientValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NutrientValue::Number(n) if n.fract() == 0.0 => write!(f, "{:.0}", n),
            NutrientValue::Number(n) => write!(f, "{}", n),
            NutrientValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroEstimate {
    pub calories: Option<NutrientValue>,
    pub protein_g: Option<NutrientValue>,
    pub carbs_g: Option<NutrientValue>,
    pub fat_g: Option<NutrientValue>,
}

/// Structured analysis of one ulam picture. Every field is optional:
/// the extractor is lax and the presenter shows "?" for whatever the
/// model left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DishReport {
    pub dish_name: Option<String>,
    pub macros: MacroEstimate,
    pub health_facts: Option<String>,
    pub warnings: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    CredentialMissing,
    Exhausted,
    Parse,
    Cancelled,
    Io,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisFailure {
    pub kind: FailureKind,
    pub error: String,
    pub raw_text: Option<String>,
}

impl AnalysisFailure {
    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            error: "Analysis cancelled by user.".to_string(),
            raw_text: None,
        }
    }

    pub fn credential_missing() -> Self {
        Self {
            kind: FailureKind::CredentialMissing,
            error: "No API key configured. Set OPENROUTER_API_KEY and try again.".to_string(),
            raw_text: None,
        }
    }

    pub fn exhausted() -> Self {
        Self {
            kind: FailureKind::Exhausted,
            error: "No model tier produced a response. Check your connection and model list."
                .to_string(),
            raw_text: None,
        }
    }

    pub fn parse(raw_text: &str) -> Self {
        Self {
            kind: FailureKind::Parse,
            error: "Could not parse JSON from the model response.".to_string(),
            raw_text: Some(raw_text.to_string()),
        }
    }

    pub fn io(err: &anyhow::Error) -> Self {
        Self {
            kind: FailureKind::Io,
            error: format!("Could not stage the captured picture: {}", err),
            raw_text: None,
        }
    }
}

/// Exactly one of these is delivered per invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnalysisResult {
    Success(DishReport),
    Failure(AnalysisFailure),
}
