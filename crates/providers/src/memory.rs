use crate::{
    AccountProvider, DataPredict, FoodProvider, ImageUpload, LoginData, LoginResponse,
    LogoutResponse, NutritionData, NutritionResponse, PredictResponse, ProfileForm,
    ProfileResponse, ProviderError, RegisterForm, RegisterResponse, Tip, TipsResponse,
    UserProfile,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Canned backend used when no network is wanted.
///
/// Food names are matched case-insensitively. `fail_with` turns every call
/// into a `RequestFailed` error.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    prediction: Option<DataPredict>,
    foods: HashMap<String, f32>,
    tips: Vec<Tip>,
    token: String,
    fail_with: Option<String>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self {
            token: "memory-token".to_string(),
            ..Self::default()
        }
    }

    pub fn with_prediction(mut self, prediction: DataPredict) -> Self {
        self.prediction = Some(prediction);
        self
    }

    pub fn with_food(mut self, name: &str, calories: f32) -> Self {
        self.foods.insert(name.to_lowercase(), calories);
        self
    }

    pub fn with_tip(mut self, title: &str, description: &str) -> Self {
        self.tips.push(Tip {
            id: Some(format!("tip-{}", self.tips.len() + 1)),
            title: title.to_string(),
            description: Some(description.to_string()),
        });
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Food names passed to `nutrition`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), ProviderError> {
        match &self.fail_with {
            Some(msg) => Err(ProviderError::RequestFailed(msg.clone())),
            None => Ok(()),
        }
    }

    fn check_token(&self, token: &str) -> Result<(), ProviderError> {
        self.check()?;
        if token.trim().is_empty() {
            return Err(ProviderError::Status {
                status: 401,
                message: "missing token".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountProvider for MemoryProvider {
    async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse, ProviderError> {
        self.check()?;
        Ok(RegisterResponse {
            status: Some("success".into()),
            message: Some("User registered".into()),
            data: Some(UserProfile {
                email: Some(form.email.clone()),
                full_name: Some(form.full_name.clone()),
                height_cm: Some(form.height_cm),
                weight_kg: Some(form.weight_kg),
                age_years: Some(form.age_years),
                arm_circumference_cm: Some(form.arm_circumference_cm),
            }),
        })
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ProviderError> {
        self.check()?;
        Ok(LoginResponse {
            status: Some("success".into()),
            message: None,
            data: Some(LoginData {
                token: self.token.clone(),
                user: Some(UserProfile {
                    email: Some(email.to_string()),
                    ..UserProfile::default()
                }),
            }),
        })
    }

    async fn logout(&self, token: &str) -> Result<LogoutResponse, ProviderError> {
        self.check_token(token)?;
        Ok(LogoutResponse {
            status: Some("success".into()),
            message: Some("Logged out".into()),
        })
    }

    async fn update_profile(
        &self,
        token: &str,
        form: &ProfileForm,
    ) -> Result<ProfileResponse, ProviderError> {
        self.check_token(token)?;
        Ok(ProfileResponse {
            status: Some("success".into()),
            message: None,
            data: Some(UserProfile {
                email: None,
                full_name: Some(form.full_name.clone()),
                height_cm: Some(form.height_cm),
                weight_kg: Some(form.weight_kg),
                age_years: Some(form.age_years),
                arm_circumference_cm: Some(form.arm_circumference_cm),
            }),
        })
    }
}

#[async_trait::async_trait]
impl FoodProvider for MemoryProvider {
    async fn predict(
        &self,
        token: &str,
        _image: ImageUpload,
    ) -> Result<PredictResponse, ProviderError> {
        self.check_token(token)?;
        match &self.prediction {
            Some(p) => Ok(PredictResponse {
                status: Some("success".into()),
                message: None,
                data: Some(p.clone()),
            }),
            None => Err(ProviderError::NotImplemented),
        }
    }

    async fn nutrition(&self, token: &str, name: &str) -> Result<NutritionResponse, ProviderError> {
        if let Ok(mut l) = self.lookups.lock() {
            l.push(name.to_string());
        }
        self.check_token(token)?;
        let data = self
            .foods
            .get(&name.to_lowercase())
            .map(|calories| NutritionData {
                calories: Some(*calories),
            });
        Ok(NutritionResponse {
            status: Some("success".into()),
            message: None,
            data,
        })
    }

    async fn tips(&self, token: &str) -> Result<TipsResponse, ProviderError> {
        self.check_token(token)?;
        Ok(TipsResponse {
            status: Some("success".into()),
            message: None,
            data: self.tips.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_food_is_not_an_error() {
        let p = MemoryProvider::new().with_food("Rendang", 193.0);
        let hit = p.nutrition("t", "rendang").await.unwrap();
        assert_eq!(hit.data.unwrap().calories, Some(193.0));
        let miss = p.nutrition("t", "Sushi").await.unwrap();
        assert!(miss.data.is_none());
        assert_eq!(p.lookups(), vec!["rendang".to_string(), "Sushi".to_string()]);
    }

    #[tokio::test]
    async fn failing_provider_errors_every_call() {
        let p = MemoryProvider::new().failing("offline");
        let err = p.tips("t").await.unwrap_err();
        assert!(matches!(err, ProviderError::RequestFailed(m) if m == "offline"));
        assert!(p.login("a@b.c", "pw").await.is_err());
    }

    #[tokio::test]
    async fn empty_token_is_rejected() {
        let p = MemoryProvider::new();
        let err = p.tips("").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }
}
