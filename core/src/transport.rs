//! Shared HTTP transport for every resource operation.
//!
//! # Design
//! `Transport` owns the base URL, the session and an `HttpBackend` that does
//! the actual I/O. Each call goes through the same steps:
//!
//! 1. Auth-required operations without a token fail with `Unauthenticated`
//!    before anything is built or sent.
//! 2. The operation's payload is encoded (`encode_payload`).
//! 3. The request interceptor attaches `Authorization: Bearer <token>`
//!    whenever a token exists, whatever the operation declares.
//! 4. The response interceptor passes 2xx through. A 401 clears the token and
//!    asks the `Navigator` for the login route, then still returns the error
//!    to the caller. Every other failure is returned untouched.
//!
//! There is no retry and no queuing; concurrent calls are independent.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{FormPart, HttpMethod, HttpRequest, HttpResponse, MultipartForm, RequestBody, Upload};
use crate::operation::{encode_payload, Operation};
use crate::session::SessionStore;

/// Route the 401 interceptor navigates to.
pub const LOGIN_ROUTE: &str = "/login";

/// Executes plain-data requests against the network (or a stand-in).
pub trait HttpBackend: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, ApiError>> + Send;
}

/// Receives navigation requests raised by the transport.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, route: &str) {
        self(route)
    }
}

/// Navigator that only records the request in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigation requested");
    }
}

/// `reqwest`-based backend.
#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.body(body),
            // reqwest sets `multipart/form-data; boundary=...` from the form.
            RequestBody::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn to_reqwest_form(form: MultipartForm) -> Result<reqwest::multipart::Form, ApiError> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.parts {
        out = match part {
            FormPart::Text { name, value } => out.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                bytes,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::InvalidUpload(format!("{content_type}: {e}")))?;
                out.part(name, part)
            }
        };
    }
    Ok(out)
}

/// Per-call addressing: the `{id}` substitution and query parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Target<'a> {
    pub id: Option<&'a str>,
    pub query: &'a [(&'a str, &'a str)],
}

impl<'a> Target<'a> {
    pub fn id(id: &'a str) -> Self {
        Self {
            id: Some(id),
            query: &[],
        }
    }

    pub fn query(query: &'a [(&'a str, &'a str)]) -> Self {
        Self { id: None, query }
    }
}

pub struct Transport<B = ReqwestBackend> {
    base_url: String,
    backend: B,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl<B: HttpBackend> Transport<B> {
    pub fn new(base_url: &str, backend: B, session: SessionStore) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            backend,
            session,
            navigator: Arc::new(TracingNavigator),
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Ask the navigator for the login route.
    pub fn navigate_to_login(&self) {
        self.navigator.navigate(LOGIN_ROUTE);
    }

    /// Build the request for `op` without the bearer header and without
    /// sending it.
    pub fn prepare<T: Serialize + ?Sized>(
        &self,
        op: &Operation,
        target: Target<'_>,
        fields: Option<&T>,
        upload: Option<Upload>,
    ) -> Result<HttpRequest, ApiError> {
        let (body, headers) = encode_payload(op.payload, fields, upload)?;

        let mut url = format!("{}{}", self.base_url, op.path_for(target.id));
        for (i, (key, value)) in target.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        Ok(HttpRequest {
            method: op.method,
            url,
            headers,
            body,
        })
    }

    /// Run `op` through the full request/response pipeline.
    pub async fn send<T: Serialize + ?Sized>(
        &self,
        op: &Operation,
        target: Target<'_>,
        fields: Option<&T>,
        upload: Option<Upload>,
    ) -> Result<HttpResponse, ApiError> {
        if op.auth_required && !self.session.has_token() {
            tracing::warn!(operation = op.name, "no session token, refusing to send");
            return Err(ApiError::Unauthenticated);
        }

        let mut request = self.prepare(op, target, fields, upload)?;
        let authorized = self.attach_bearer(&mut request);
        tracing::debug!(
            operation = op.name,
            method = request.method.as_str(),
            url = %request.url,
            authorized,
            "sending request"
        );

        let response = match self.backend.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(operation = op.name, error = %e, "request failed");
                return Err(e);
            }
        };
        self.intercept_response(op, response)
    }

    /// Request interceptor. Returns whether a token was attached.
    fn attach_bearer(&self, request: &mut HttpRequest) -> bool {
        match self.session.token() {
            Some(token) => {
                request
                    .headers
                    .push(("authorization".to_string(), format!("Bearer {token}")));
                true
            }
            None => false,
        }
    }

    /// Response interceptor.
    fn intercept_response(
        &self,
        op: &Operation,
        response: HttpResponse,
    ) -> Result<HttpResponse, ApiError> {
        if response.is_success() {
            return Ok(response);
        }

        let message = server_message(&response.body);
        match response.status {
            401 => {
                tracing::warn!(operation = op.name, "server rejected session, logging out");
                self.session.clear_token();
                self.navigate_to_login();
                Err(ApiError::Unauthorized { message })
            }
            404 => Err(ApiError::NotFound { message }),
            status => {
                tracing::debug!(operation = op.name, status, "request rejected");
                Err(ApiError::Http {
                    status,
                    message,
                    body: response.body,
                })
            }
        }
    }
}

/// Pull `message` out of a JSON error body.
fn server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::testing::RecordingBackend;
    use parking_lot::Mutex;

    fn transport(backend: RecordingBackend) -> Transport<RecordingBackend> {
        Transport::new("http://localhost:5000/api/", backend, SessionStore::in_memory())
    }

    #[test]
    fn prepare_builds_url_and_query() {
        let t = transport(RecordingBackend::new());
        let req = t
            .prepare(
                &catalog::GET_ANALYTICS,
                Target::query(&[("days", "30")]),
                None::<&()>,
                None,
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:5000/api/analytics?days=30");
        assert_eq!(req.body, RequestBody::Empty);
        assert!(req.headers.is_empty());

        let req = t
            .prepare(&catalog::MARK_CONTACT_AS_READ, Target::id("c1"), Some(&serde_json::json!({})), None)
            .unwrap();
        assert_eq!(req.url, "http://localhost:5000/api/contact/c1/read");
        assert_eq!(req.body, RequestBody::Json("{}".to_string()));
    }

    #[tokio::test]
    async fn bearer_is_attached_even_to_public_operations() {
        let backend = RecordingBackend::new().respond(200, "{}");
        let t = transport(backend.clone());
        t.session().set_token("abc123");

        t.send(&catalog::GET_HERO, Target::default(), None::<&()>, None)
            .await
            .unwrap();

        let sent = backend.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("authorization"), Some("Bearer abc123"));
    }

    #[tokio::test]
    async fn no_bearer_without_token() {
        let backend = RecordingBackend::new().respond(200, "{}");
        let t = transport(backend.clone());

        t.send(&catalog::GET_HERO, Target::default(), None::<&()>, None)
            .await
            .unwrap();
        assert_eq!(backend.requests()[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn auth_required_without_token_never_reaches_backend() {
        let backend = RecordingBackend::new().respond(200, "{}");
        let t = transport(backend.clone());

        let err = t
            .send(&catalog::DELETE_CLIENT, Target::id("c1"), None::<&()>, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn unauthorized_clears_token_navigates_and_propagates() {
        let backend = RecordingBackend::new().respond(401, r#"{"message":"Token expired"}"#);
        let routes = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = routes.clone();
        let t = transport(backend.clone())
            .with_navigator(Arc::new(move |route: &str| seen.lock().push(route.to_string())));
        t.session().set_token("stale");

        let err = t
            .send(&catalog::GET_CONTACTS, Target::default(), None::<&()>, None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(err.server_message(), Some("Token expired"));
        assert_eq!(t.session().token(), None);
        assert_eq!(*routes.lock(), vec![LOGIN_ROUTE.to_string()]);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn other_failures_pass_through_untouched() {
        let backend = RecordingBackend::new()
            .respond(422, r#"{"message":"title is required"}"#)
            .respond(404, r#"{"message":"Client not found"}"#)
            .respond(500, "boom");
        let t = transport(backend.clone());
        t.session().set_token("abc123");

        let err = t
            .send(&catalog::ADD_SERVICE_CARD, Target::default(), Some(&serde_json::json!({})), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 422, .. }));
        assert_eq!(err.server_message(), Some("title is required"));

        let err = t
            .send(&catalog::DELETE_CLIENT, Target::id("missing"), None::<&()>, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));

        let err = t
            .send(&catalog::GET_HERO, Target::default(), None::<&()>, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, ref body, .. } if body == "boom"));

        assert_eq!(t.session().token().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn transport_errors_are_returned_once() {
        let backend = RecordingBackend::new().fail("connection refused");
        let t = transport(backend.clone());

        let err = t
            .send(&catalog::GET_VALUES, Target::default(), None::<&()>, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(ref m) if m == "connection refused"));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn server_message_requires_json_string() {
        assert_eq!(server_message(r#"{"message":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(server_message(r#"{"message":3}"#), None);
        assert_eq!(server_message("plain text"), None);
    }
}
