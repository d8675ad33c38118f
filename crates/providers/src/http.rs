use crate::{
    authorization_value, AccountProvider, FoodProvider, ImageUpload, LoginResponse,
    LogoutResponse, NutritionResponse, PredictResponse, ProfileForm, ProfileResponse,
    ProviderError, RegisterForm, RegisterResponse, TipsResponse,
};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct HttpProvider {
    client: Client,
    cfg: Arc<HttpConfig>,
}

impl HttpProvider {
    pub fn new(cfg: HttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    /// Joins path segments onto the base url, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.cfg.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", self.cfg.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidUrl(self.cfg.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ProviderError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
            return Err(ProviderError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        let parsed = resp.json::<T>().await?;
        Ok(parsed)
    }
}

/// Extracts the envelope `message` from an error body, falling back to raw text.
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        message: Option<String>,
    }
    serde_json::from_slice::<Envelope>(body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[async_trait::async_trait]
impl AccountProvider for HttpProvider {
    async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse, ProviderError> {
        let url = self.endpoint(&["register"])?;
        debug!(%url, email = %form.email, "register");
        self.send(self.client.post(url).form(form)).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ProviderError> {
        let url = self.endpoint(&["login"])?;
        debug!(%url, %email, "login");
        let fields = [("email", email), ("password", password)];
        self.send(self.client.post(url).form(&fields)).await
    }

    async fn logout(&self, token: &str) -> Result<LogoutResponse, ProviderError> {
        let url = self.endpoint(&["logout"])?;
        debug!(%url, "logout");
        self.send(
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, authorization_value(token)),
        )
        .await
    }

    async fn update_profile(
        &self,
        token: &str,
        form: &ProfileForm,
    ) -> Result<ProfileResponse, ProviderError> {
        let url = self.endpoint(&["profile"])?;
        debug!(%url, "update profile");
        self.send(
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, authorization_value(token))
                .form(form),
        )
        .await
    }
}

#[async_trait::async_trait]
impl FoodProvider for HttpProvider {
    async fn predict(
        &self,
        token: &str,
        image: ImageUpload,
    ) -> Result<PredictResponse, ProviderError> {
        let url = self.endpoint(&["predict"])?;
        debug!(%url, file = %image.file_name, size = image.bytes.len(), "predict");
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name)
            .mime_str(&image.mime)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let form = Form::new().part("file", part);
        self.send(
            self.client
                .post(url)
                .header(reqwest::header::AUTHORIZATION, authorization_value(token))
                .multipart(form),
        )
        .await
    }

    async fn nutrition(&self, token: &str, name: &str) -> Result<NutritionResponse, ProviderError> {
        let url = self.endpoint(&["food", name])?;
        debug!(%url, "nutrition lookup");
        let result = self
            .send(
                self.client
                    .get(url)
                    .header(reqwest::header::AUTHORIZATION, authorization_value(token)),
            )
            .await;
        match result {
            // An unknown food is an empty record, not a failure.
            Err(ProviderError::Status {
                status: 404,
                message,
            }) => {
                debug!(food = %name, %message, "no nutrition record");
                Ok(NutritionResponse {
                    status: None,
                    message: Some(message),
                    data: None,
                })
            }
            other => other,
        }
    }

    async fn tips(&self, token: &str) -> Result<TipsResponse, ProviderError> {
        let url = self.endpoint(&["tips"])?;
        self.send(
            self.client
                .get(url)
                .header(reqwest::header::AUTHORIZATION, authorization_value(token)),
        )
        .await
    }
}
