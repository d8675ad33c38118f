//! Analysis-detail flow: render a prediction, resolve its calories, feed the
//! daily counter and append the outcome to local history.
//!
//! Nutrition resolution and history persistence run as independent tasks.
//! Either may finish without the other.

use crate::error::AppError;
use crate::progress::DailyProgress;
use crate::session::AuthSession;
use crate::state::ResultState;
use providers::{DataPredict, FoodProvider, NutritionData};
use serde::Serialize;
use std::sync::Arc;
use storage::{HistoryStore, NewHistory};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub const INCOMPLETE_NOTICE: &str = "Incomplete information, the analysis cannot be saved.";
pub const IMAGE_NOTICE: &str = "Failed to load image.";

pub type NutritionState = ResultState<Option<NutritionData>>;

/// Data handed over from the screen that produced the prediction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRequest {
    pub label: Option<String>,
    pub confidence: Option<String>,
    pub image: Option<String>,
    pub nutrition: Option<String>,
    pub recommendation: Option<String>,
}

impl DetailRequest {
    pub fn from_prediction(prediction: &DataPredict, image: impl Into<String>) -> Self {
        Self {
            label: Some(prediction.predicted_class_name.clone()),
            confidence: Some(format_confidence(prediction.confidence_score)),
            image: Some(image.into()),
            nutrition: None,
            recommendation: Some(prediction.recommendation.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub title: Option<String>,
    pub description: Option<String>,
    pub score: String,
    pub image: Option<String>,
    pub recommendation: Option<String>,
    pub notices: Vec<String>,
}

/// An opened detail screen. Dropping it detaches from the lookup; the
/// lookup task itself keeps running.
pub struct DetailScreen {
    pub view: DetailView,
    pub nutrition: Option<watch::Receiver<NutritionState>>,
    pub saved: Option<JoinHandle<()>>,
}

impl DetailScreen {
    /// Waits until the nutrition lookup leaves `Loading`.
    pub async fn settled_nutrition(&mut self) -> Option<NutritionState> {
        let rx = self.nutrition.as_mut()?;
        let state = rx.wait_for(|s| s.is_settled()).await.ok()?;
        Some(state.clone())
    }
}

#[derive(Clone)]
pub struct AnalysisWorkflow {
    food: Arc<dyn FoodProvider>,
    history: HistoryStore,
    progress: DailyProgress,
    session: Option<AuthSession>,
}

impl AnalysisWorkflow {
    pub fn new(
        food: Arc<dyn FoodProvider>,
        history: HistoryStore,
        progress: DailyProgress,
        session: Option<AuthSession>,
    ) -> Self {
        Self {
            food,
            history,
            progress,
            session,
        }
    }

    pub fn progress(&self) -> &DailyProgress {
        &self.progress
    }

    /// Renders whatever the request carries, then starts the lookup and
    /// the history write. Never fails; gaps are reported as notices.
    pub fn open(&self, request: DetailRequest) -> DetailScreen {
        let DetailRequest {
            label,
            confidence,
            image,
            nutrition,
            recommendation,
        } = request;
        let label = label.filter(|l| !l.trim().is_empty());
        let image = image.filter(|i| !i.trim().is_empty());
        let score = confidence.unwrap_or_else(|| "0".to_string());

        let mut notices = Vec::new();
        if label.is_none() || image.is_none() {
            warn!(
                has_label = label.is_some(),
                has_image = image.is_some(),
                "incomplete analysis data"
            );
            notices.push(INCOMPLETE_NOTICE.to_string());
        }
        if image.is_none() {
            notices.push(IMAGE_NOTICE.to_string());
        }

        let saved = match (&label, &image) {
            (Some(l), Some(i)) => Some(self.persist_record(
                i,
                l,
                nutrition.as_deref().unwrap_or_default(),
                &score,
            )),
            _ => None,
        };

        let food_name = label.as_deref().map(capitalize);
        let nutrition_rx = food_name.as_deref().map(|name| self.resolve_nutrition(name));

        DetailScreen {
            view: DetailView {
                title: label,
                description: food_name,
                score,
                image,
                recommendation,
                notices,
            },
            nutrition: nutrition_rx,
            saved,
        }
    }

    /// Looks up calories for `class_name`. The receiver starts at `Loading`
    /// and moves to `Success` or `Error` exactly once. Found calories are
    /// added to the daily total. Without a session the lookup settles as
    /// `Error` straight away.
    pub fn resolve_nutrition(&self, class_name: &str) -> watch::Receiver<NutritionState> {
        let Some(session) = &self.session else {
            let err = AppError::missing("not logged in");
            warn!(food = %class_name, "nutrition lookup without a session");
            let (_tx, rx) = watch::channel(ResultState::Error(err.to_string()));
            return rx;
        };
        let (tx, rx) = watch::channel(ResultState::Loading);
        let food = Arc::clone(&self.food);
        let progress = self.progress.clone();
        let token = session.token().to_string();
        let name = class_name.to_string();
        tokio::spawn(async move {
            let state = match food.nutrition(&token, &name).await {
                Ok(resp) => {
                    if let Some(calories) = resp.data.as_ref().and_then(|d| d.calories) {
                        progress.increase(calories);
                    } else {
                        info!(food = %name, "no nutrition record");
                    }
                    ResultState::Success(resp.data)
                }
                Err(e) => {
                    warn!(food = %name, error = %e, "nutrition lookup failed");
                    ResultState::Error(AppError::from(e).to_string())
                }
            };
            // Nobody left watching is fine; the result is simply dropped.
            let _ = tx.send(state);
        });
        rx
    }

    /// Best-effort history append on its own task. Failures are logged only.
    pub fn persist_record(
        &self,
        image: &str,
        label: &str,
        nutrition: &str,
        confidence: &str,
    ) -> JoinHandle<()> {
        let record = NewHistory {
            image_uri: image.to_string(),
            analyze_result: label.to_string(),
            nutrition: nutrition.to_string(),
            confidence_score: parse_confidence(confidence),
        };
        let history = self.history.clone();
        tokio::spawn(async move {
            match history.insert(&record).await {
                Ok(id) => info!(id, result = %record.analyze_result, "analysis saved"),
                Err(e) => warn!(error = %e, "failed to save analysis history"),
            }
        })
    }
}

/// Parses a display score such as `"87%"`. Anything unparsable is 0.
pub fn parse_confidence(raw: &str) -> f32 {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

pub fn format_confidence(score: f32) -> String {
    format!("{:.2}%", score)
}

/// Uppercases the first character, leaving the rest untouched.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_parsing() {
        assert_eq!(parse_confidence("87%"), 87.0);
        assert_eq!(parse_confidence("87.5"), 87.5);
        assert_eq!(parse_confidence(" 42 % "), 42.0);
        assert_eq!(parse_confidence("abc"), 0.0);
        assert_eq!(parse_confidence(""), 0.0);
        assert_eq!(parse_confidence("%"), 0.0);
        assert_eq!(parse_confidence("NaN"), 0.0);
    }

    #[test]
    fn confidence_round_trips_through_display() {
        let shown = format_confidence(91.234);
        assert_eq!(shown, "91.23%");
        assert!((parse_confidence(&shown) - 91.23).abs() < 1e-4);
    }

    #[test]
    fn capitalize_first_letter_only() {
        assert_eq!(capitalize("rendang"), "Rendang");
        assert_eq!(capitalize("nasi goreng"), "Nasi goreng");
        assert_eq!(capitalize("éclair"), "Éclair");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn request_from_prediction() {
        let p = DataPredict {
            predicted_class_name: "sate".into(),
            recommendation: "Good protein source".into(),
            confidence_score: 75.0,
        };
        let req = DetailRequest::from_prediction(&p, "/photos/sate.jpg");
        assert_eq!(req.label.as_deref(), Some("sate"));
        assert_eq!(req.confidence.as_deref(), Some("75.00%"));
        assert_eq!(req.image.as_deref(), Some("/photos/sate.jpg"));
        assert_eq!(req.recommendation.as_deref(), Some("Good protein source"));
    }
}
