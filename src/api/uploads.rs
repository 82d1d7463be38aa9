use crate::api::AppState;
use crate::api::extract::ApiJson;
use crate::api::schemas::messages::SendMessage;
use crate::domain::image::Image;
use crate::domain::message::MessageDraft;
use crate::error::{AppError, Result};
use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use axum::response::IntoResponse;
use uuid::Uuid;

/// A send-message request, accepted either as JSON or as `multipart/form-data` with an `image` file.
#[derive(Debug)]
pub struct MessageForm(pub MessageDraft);

impl FromRequest<AppState> for MessageForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        if !is_multipart(&req) {
            let ApiJson(body) = ApiJson::<SendMessage>::from_request(req, state).await?;
            return Ok(Self(MessageDraft { contents: body.contents, recipient: body.recipient, group: body.group, image: None }));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        let max_image_bytes = state.message_service.max_image_bytes();

        let mut draft = MessageDraft::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "contents" => draft.contents = Some(field.text().await.map_err(multipart_error)?),
                "recipient" => draft.recipient = read_id(field, "recipient").await?,
                "group" => draft.group = read_id(field, "group").await?,
                "image" => draft.image = read_image(field, max_image_bytes).await?,
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(Self(draft))
    }
}

/// A multipart upload carrying a single `image` file.
#[derive(Debug)]
pub struct ImageUpload(pub Image);

impl FromRequest<AppState> for ImageUpload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        let max_image_bytes = state.group_service.max_image_bytes();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some("image") {
                continue;
            }
            if let Some(image) = read_image(field, max_image_bytes).await? {
                return Ok(Self(image));
            }
        }

        Err(AppError::bad_request("Image is required"))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

fn multipart_error(error: MultipartError) -> AppError {
    AppError::bad_request(error.body_text())
}

async fn read_id(field: Field<'_>, what: &str) -> Result<Option<Uuid>> {
    let raw = field.text().await.map_err(multipart_error)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(raw).map(Some).map_err(|_| AppError::bad_request(format!("Invalid {what} id")))
}

// An empty file part is what browsers send when no file was picked.
async fn read_image(field: Field<'_>, max_image_bytes: usize) -> Result<Option<Image>> {
    let content_type = field.content_type().map(str::to_owned);
    let data = field.bytes().await.map_err(multipart_error)?;
    if data.is_empty() {
        return Ok(None);
    }
    Image::new(content_type.as_deref(), data, max_image_bytes).map(Some)
}

/// Raw image bytes served with their stored content type.
pub(crate) fn image_response(image: Image) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, image.content_type)], image.data)
}
