use serde::{Deserialize, Serialize};

/// One labelled prediction shown in the analysis feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Probability in `[0, 1]`
    pub score: f64,
    /// Hex color, e.g. `#FF8800`
    pub color: String,
}

/// The canned analysis that goes with a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

impl AnalysisResult {
    /// Used when a template carries no analysis of its own
    pub fn fallback() -> Self {
        Self {
            summary: "Conversation indicates a high probability of planning disruptive activities. \
                      Key indicators include references to 'riot police', 'demonstrations', and \
                      'support structure'. Sentiment shows alignment with dissenting groups."
                .to_string(),
            predictions: vec![
                Prediction {
                    label: "Civil Unrest".to_string(),
                    score: 0.95,
                    color: "#FF0000".to_string(),
                },
                Prediction {
                    label: "Coordination".to_string(),
                    score: 0.88,
                    color: "#FF8800".to_string(),
                },
                Prediction {
                    label: "Violence Potential".to_string(),
                    score: 0.45,
                    color: "#FFFF00".to_string(),
                },
            ],
        }
    }

    /// The text of each typewriter stage, in reveal order
    pub fn feed_lines(&self) -> [String; 4] {
        let top = self
            .predictions
            .first()
            .map(|p| {
                format!("  most likely: probably: {} ({})", p.label, format_percent(p.score))
            })
            .unwrap_or_default();
        let second = self
            .predictions
            .get(1)
            .map(|p| {
                format!(
                    "  second most likely: potentially: {} ({})",
                    p.label,
                    format_percent(p.score)
                )
            })
            .unwrap_or_default();

        [
            self.summary.clone(),
            PREDICTIONS_LABEL.to_string(),
            top,
            second,
        ]
    }
}

pub const PREDICTIONS_LABEL: &str = "> PREDICTIONS:";

/// Render a probability as a percentage with one decimal place
pub fn format_percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}
