//! Body extractor that accepts either a JSON object or a multipart form.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{Map, Value};

use crate::ApiFailure;

/// A file part received in a multipart body.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Text fields plus at most one file, whichever encoding the client chose.
#[derive(Debug, Default)]
pub struct FormFields {
    pub text: Map<String, Value>,
    pub file: Option<UploadedFile>,
    pub multipart: bool,
}

impl FormFields {
    /// Trimmed, non-empty string value of `name`.
    pub fn str(&self, name: &str) -> Option<&str> {
        self.text
            .get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

impl<S> FromRequest<S> for FormFields
where
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(text) = Json::<Map<String, Value>>::from_request(req, state)
                .await
                .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
            return Ok(Self {
                text,
                file: None,
                multipart: false,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
        let mut fields = Self {
            multipart: true,
            ..Self::default()
        };
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiFailure::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
                    fields.file = Some(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
                    fields.text.insert(name, Value::String(value));
                }
            }
        }
        Ok(fields)
    }
}
