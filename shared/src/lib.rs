use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Scores strictly below this value are read as an infected cell.
/// The classifier was trained with "infected" as class 0, so a low score is
/// the positive finding.
pub const INFECTION_THRESHOLD: f32 = 0.5;

pub const ADVICE_INFECTED: &str =
    "⚠️ Recommandation : consulter un professionnel de santé pour analyse complémentaire.";
pub const ADVICE_HEALTHY: &str = "✅ Recommandation : faible risque détecté.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CellLabel {
    #[serde(rename = "Cellule infectée")]
    #[strum(serialize = "Cellule infectée")]
    Infected,
    #[serde(rename = "Cellule saine")]
    #[strum(serialize = "Cellule saine")]
    Healthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertColor {
    Red,
    Green,
}

impl AlertColor {
    pub fn hex(&self) -> &'static str {
        match self {
            AlertColor::Red => "#dc3545",
            AlertColor::Green => "#28a745",
        }
    }

    /// CSS class of the result box.
    pub fn style_class(&self) -> &'static str {
        match self {
            AlertColor::Red => "positive",
            AlertColor::Green => "negative",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: CellLabel,
    /// Confidence in `label`, never below 0.5.
    pub displayed_probability: f32,
    pub advisory_text: String,
    pub is_infected: bool,
    pub color: AlertColor,
    /// Raw classifier output the verdict was derived from.
    pub score: f32,
}

impl Verdict {
    /// Maps a classifier score in `[0, 1]` to a verdict.
    ///
    /// `score == 0.5` lands on the healthy side.
    pub fn from_score(score: f32) -> Self {
        let is_infected = score < INFECTION_THRESHOLD;

        if is_infected {
            Self {
                label: CellLabel::Infected,
                displayed_probability: 1.0 - score,
                advisory_text: ADVICE_INFECTED.to_string(),
                is_infected,
                color: AlertColor::Red,
                score,
            }
        } else {
            Self {
                label: CellLabel::Healthy,
                displayed_probability: score,
                advisory_text: ADVICE_HEALTHY.to_string(),
                is_infected,
                color: AlertColor::Green,
                score,
            }
        }
    }

    pub fn percentage(&self) -> f32 {
        self.displayed_probability * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub request_id: String,
    pub analyzed_at: String,
    pub image_sha256: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The classifier could not be loaded; nothing can be analyzed.
    ModelUnavailable,
    /// The upload was rejected before reaching the classifier.
    InvalidImage,
    /// The classifier ran but its output was unusable.
    AnalysisFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModelStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ModelStatus,
    pub model_path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}
