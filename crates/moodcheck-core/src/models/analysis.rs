//! Sentiment analysis request and result types.

use serde::{Deserialize, Serialize};

/// Body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
}

/// Successful `/predict` response, kept exactly as the backend sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub text: String,
    /// 1 (very negative) to 5 (very positive)
    pub score: u8,
    /// Label as returned by the backend, e.g. "positif" or "neutral"
    pub sentiment: String,
    pub user: String,
}

/// Highest score the backend hands out.
pub const MAX_SCORE: u8 = 5;

impl AnalysisResult {
    /// Normalized sentiment, from the label when it is recognized and from
    /// the score otherwise.
    pub fn polarity(&self) -> Polarity {
        Polarity::from_label(&self.sentiment).unwrap_or_else(|| Polarity::from_score(self.score))
    }

    /// Score as a fraction of the maximum, clamped to 0.0..=1.0.
    pub fn score_ratio(&self) -> f64 {
        (f64::from(self.score) / f64::from(MAX_SCORE)).clamp(0.0, 1.0)
    }
}

/// Sentiment class independent of the backend's label language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// Parse a backend label. Accepts English and French labels in any case.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "positive" | "positif" => Some(Polarity::Positive),
            "negative" | "négatif" | "negatif" => Some(Polarity::Negative),
            "neutral" | "neutre" => Some(Polarity::Neutral),
            _ => None,
        }
    }

    /// 1-2 negative, 3 neutral, 4-5 positive.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=2 => Polarity::Negative,
            3 => Polarity::Neutral,
            _ => Polarity::Positive,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }
}
