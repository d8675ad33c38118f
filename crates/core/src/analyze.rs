use crate::error::AppError;
use crate::session::AuthSession;
use bytes::Bytes;
use providers::{DataPredict, FoodProvider, ImageUpload};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const FALLBACK_MIME: &str = "image/jpeg";

/// Uploads food photos for classification.
#[derive(Clone)]
pub struct AnalyzeService {
    food: Arc<dyn FoodProvider>,
    session: AuthSession,
}

impl AnalyzeService {
    pub fn new(food: Arc<dyn FoodProvider>, session: AuthSession) -> Self {
        Self { food, session }
    }

    pub async fn predict_image(&self, path: &Path) -> Result<DataPredict, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::missing(format!("image {}: {}", path.display(), e)))?;
        let upload = image_upload(path, Bytes::from(bytes))?;
        info!(file = %upload.file_name, mime = %upload.mime, "uploading image");
        let resp = self.food.predict(self.session.token(), upload).await?;
        resp.data.ok_or_else(|| {
            AppError::missing(
                resp.message
                    .unwrap_or_else(|| "prediction response without data".to_string()),
            )
        })
    }
}

/// Builds the multipart payload, sniffing the MIME type from content.
pub fn image_upload(path: &Path, bytes: Bytes) -> Result<ImageUpload, AppError> {
    if bytes.is_empty() {
        return Err(AppError::missing(format!("image {} is empty", path.display())));
    }
    let mime = match infer::get(&bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind.mime_type(),
        Some(kind) => {
            return Err(AppError::missing(format!(
                "{} is not an image ({})",
                path.display(),
                kind.mime_type()
            )))
        }
        None => FALLBACK_MIME,
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.jpg".to_string());
    Ok(ImageUpload {
        file_name,
        mime: mime.to_string(),
        bytes,
    })
}
