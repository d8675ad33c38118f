//! Remote API contract for the food-analysis backend.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod http;
pub mod memory;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("not implemented")]
    NotImplemented,
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("request timed out")]
    Timeout,
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::RequestFailed(err.to_string())
        }
    }
}

/// Profile fields shared by registration, login and profile responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub age_years: Option<u32>,
    pub arm_circumference_cm: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<LoginData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginData {
    pub token: String,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoutResponse {
    pub status: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<DataPredict>,
}

/// Model output for one uploaded image. `confidence_score` is a percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPredict {
    pub predicted_class_name: String,
    #[serde(default)]
    pub recommendation: String,
    #[serde(default)]
    pub confidence_score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Option<NutritionData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutritionData {
    pub calories: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TipsResponse {
    pub status: Option<String>,
    pub message: Option<String>,
    pub data: Vec<Tip>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tip {
    pub id: Option<String>,
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub height_cm: f32,
    pub weight_kg: f32,
    pub age_years: u32,
    pub arm_circumference_cm: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub full_name: String,
    pub weight_kg: f32,
    pub age_years: u32,
    pub arm_circumference_cm: f32,
    pub height_cm: f32,
}

/// A single image part for the predict endpoint.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Bytes,
}

/// Builds the `Authorization` header value for a raw session token.
/// Tokens that already carry a scheme are passed through.
pub fn authorization_value(token: &str) -> String {
    let token = token.trim();
    if token.contains(' ') {
        token.to_string()
    } else {
        format!("Bearer {}", token)
    }
}

#[async_trait::async_trait]
pub trait AccountProvider: Send + Sync {
    async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse, ProviderError>;
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ProviderError>;
    async fn logout(&self, token: &str) -> Result<LogoutResponse, ProviderError>;
    async fn update_profile(
        &self,
        token: &str,
        form: &ProfileForm,
    ) -> Result<ProfileResponse, ProviderError>;
}

#[async_trait::async_trait]
pub trait FoodProvider: Send + Sync {
    async fn predict(
        &self,
        token: &str,
        image: ImageUpload,
    ) -> Result<PredictResponse, ProviderError>;
    async fn nutrition(&self, token: &str, name: &str) -> Result<NutritionResponse, ProviderError>;
    async fn tips(&self, token: &str) -> Result<TipsResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_value_adds_bearer_scheme() {
        assert_eq!(authorization_value("abc123"), "Bearer abc123");
        assert_eq!(authorization_value("Bearer abc123"), "Bearer abc123");
        assert_eq!(authorization_value(" abc123 "), "Bearer abc123");
    }

    #[test]
    fn nutrition_without_record_decodes_to_none() {
        let resp: NutritionResponse =
            serde_json::from_str(r#"{"status":"fail","message":"Food not found"}"#).unwrap();
        assert!(resp.data.is_none());

        let resp: NutritionResponse =
            serde_json::from_str(r#"{"status":"success","data":{"name":"Rendang"}}"#).unwrap();
        assert_eq!(resp.data.unwrap().calories, None);
    }

    #[test]
    fn predict_response_uses_camel_case() {
        let body = r#"{
            "status": "success",
            "data": {
                "predictedClassName": "rendang",
                "recommendation": "Eat in moderation",
                "confidenceScore": 87.5
            }
        }"#;
        let resp: PredictResponse = serde_json::from_str(body).unwrap();
        let data = resp.data.unwrap();
        assert_eq!(data.predicted_class_name, "rendang");
        assert_eq!(data.recommendation, "Eat in moderation");
        assert!((data.confidence_score - 87.5).abs() < f32::EPSILON);
    }

    #[test]
    fn integer_calories_decode() {
        let resp: NutritionResponse =
            serde_json::from_str(r#"{"data":{"calories":193}}"#).unwrap();
        assert_eq!(resp.data.unwrap().calories, Some(193.0));
    }

    #[test]
    fn register_form_serializes_wire_field_names() {
        let form = RegisterForm {
            email: "a@b.c".into(),
            password: "12345678".into(),
            full_name: "Ana".into(),
            height_cm: 160.0,
            weight_kg: 50.0,
            age_years: 21,
            arm_circumference_cm: 24.5,
        };
        let value = serde_json::to_value(&form).unwrap();
        for key in [
            "email",
            "password",
            "fullName",
            "heightCm",
            "weightKg",
            "ageYears",
            "armCircumferenceCm",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }
}
