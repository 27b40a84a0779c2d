//! Resource operation descriptors and payload encoding.
//!
//! # Design
//! Every backend call is described by a static `Operation`: method, path
//! template, payload kind and whether a token is required. `encode_payload`
//! is the single place that turns a payload into a `RequestBody`, branching
//! on `PayloadKind`; call sites never set content headers themselves.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, MultipartForm, RequestBody, Upload};

/// How an operation's payload goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// No body.
    None,
    /// `application/json` body.
    Json,
    /// `multipart/form-data` when an upload is attached. Without an upload the
    /// same fields are sent as JSON.
    Multipart {
        /// Form field that carries the binary asset.
        file_field: &'static str,
    },
}

impl PayloadKind {
    pub fn label(&self) -> &'static str {
        match self {
            PayloadKind::None => "none",
            PayloadKind::Json => "json",
            PayloadKind::Multipart { .. } => "multipart",
        }
    }
}

/// A single named network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path relative to the API base. `{id}` is substituted per call.
    pub path: &'static str,
    pub payload: PayloadKind,
    pub auth_required: bool,
}

impl Operation {
    pub fn has_id(&self) -> bool {
        self.path.contains("{id}")
    }

    /// Fill in the `{id}` placeholder, percent-encoding the id.
    pub fn path_for(&self, id: Option<&str>) -> String {
        match id {
            Some(id) => self.path.replace("{id}", &urlencoding::encode(id)),
            None => self.path.to_string(),
        }
    }
}

/// Encode `fields` (and an optional upload) according to `kind`.
///
/// JSON bodies get `content-type: application/json` in the returned headers.
/// Multipart bodies get no headers at all: the backend sets the content type
/// together with the boundary it generates.
pub fn encode_payload<T: Serialize + ?Sized>(
    kind: PayloadKind,
    fields: Option<&T>,
    upload: Option<Upload>,
) -> Result<(RequestBody, Vec<(String, String)>), ApiError> {
    match (kind, fields, upload) {
        (PayloadKind::None, _, _) | (PayloadKind::Json, None, _) => {
            Ok((RequestBody::Empty, Vec::new()))
        }
        (PayloadKind::Multipart { file_field }, fields, Some(upload)) => {
            let mut form = MultipartForm::new();
            if let Some(fields) = fields {
                // The new file replaces whatever path the fields still carry.
                for (name, value) in form_fields(fields)? {
                    if name != file_field {
                        form = form.text(name, value);
                    }
                }
            }
            Ok((RequestBody::Multipart(form.file(file_field, upload)), Vec::new()))
        }
        (PayloadKind::Json, Some(fields), _) | (PayloadKind::Multipart { .. }, Some(fields), None) => {
            let body =
                serde_json::to_string(fields).map_err(|e| ApiError::Serialization(e.to_string()))?;
            Ok((
                RequestBody::Json(body),
                vec![("content-type".to_string(), "application/json".to_string())],
            ))
        }
        (PayloadKind::Multipart { .. }, None, None) => Ok((RequestBody::Empty, Vec::new())),
    }
}

/// Flatten a serializable struct into multipart text fields. Nulls are
/// skipped; strings go as-is; anything else is sent as its JSON text.
fn form_fields<T: Serialize + ?Sized>(fields: &T) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(fields).map_err(|e| ApiError::Serialization(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(ApiError::Serialization(
            "multipart fields must serialize to an object".to_string(),
        ));
    };
    Ok(map
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(s) => Some((name, s)),
            other => Some((name, other.to_string())),
        })
        .collect())
}
