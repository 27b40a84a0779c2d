//! In-memory stand-in for the agency site backend.
//!
//! Serves the same routes under `/api` as the real server, plus uploaded
//! files under `/uploads`. Admin routes require `Authorization: Bearer
//! <token>` matching the configured admin account. Every request is recorded
//! (method, path, content type, authorization) so tests can inspect what
//! actually went over the wire.

pub mod form;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

use crate::form::{FormFields, UploadedFile};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

const MAX_ANALYTICS_DAYS: u32 = 365;
const DEFAULT_ANALYTICS_DAYS: u32 = 14;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error response with a JSON `{"message": ...}` body.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: StatusCode,
    pub message: String,
}

impl ApiFailure {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The single admin account the server accepts.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
    /// Token issued on login and required on admin routes.
    pub token: String,
}

impl AdminAccount {
    pub fn new(email: &str, password: &str, token: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            token: token.to_string(),
        }
    }

    /// `ADMIN_EMAIL` / `ADMIN_PASSWORD`, falling back to the defaults.
    pub fn from_env() -> Self {
        let var = |key: &str, default: &str| std::env::var(key).unwrap_or_else(|_| default.to_string());
        Self {
            email: var("ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL),
            password: var("ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            token: Uuid::new_v4().simple().to_string(),
        }
    }
}

impl Default for AdminAccount {
    fn default() -> Self {
        Self::new(
            DEFAULT_ADMIN_EMAIL,
            DEFAULT_ADMIN_PASSWORD,
            &Uuid::new_v4().simple().to_string(),
        )
    }
}

/// What the server saw for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
}

/// A message left through the contact form.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub is_replied: bool,
    pub email_sent: bool,
    pub reply_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct Visit {
    pub path: String,
    pub visitor_id: String,
    pub at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct StoredFile {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Document-shaped resources with create/update/delete by id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Testimonial,
    ServiceCard,
    ServiceDetail,
    Client,
}

impl Collection {
    fn label(self) -> &'static str {
        match self {
            Collection::Testimonial => "Testimonial",
            Collection::ServiceCard => "Service card",
            Collection::ServiceDetail => "Service detail",
            Collection::Client => "Client",
        }
    }

    /// Text fields the resource stores.
    fn fields(self) -> &'static [&'static str] {
        match self {
            Collection::Testimonial => &["author", "content"],
            Collection::ServiceCard | Collection::ServiceDetail => &["title", "description"],
            Collection::Client => &["name"],
        }
    }

    fn required(self) -> &'static [&'static str] {
        match self {
            Collection::Testimonial => &["author", "content"],
            Collection::ServiceCard | Collection::ServiceDetail => &["title"],
            Collection::Client => &["name"],
        }
    }

    fn file_field(self) -> &'static str {
        match self {
            Collection::Client => "logo",
            _ => "image",
        }
    }
}

/// Single-document resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Singleton {
    About,
    Values,
    Hero,
    Settings,
}

impl Singleton {
    fn file_field(self) -> Option<&'static str> {
        match self {
            Singleton::Hero => Some("heroImage"),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct SiteData {
    pub singletons: HashMap<Singleton, Map<String, Value>>,
    pub collections: HashMap<Collection, Vec<Map<String, Value>>>,
    pub contacts: Vec<Contact>,
    pub visits: Vec<Visit>,
    pub uploads: HashMap<String, StoredFile>,
}

#[derive(Clone)]
pub struct AppState {
    admin: Arc<AdminAccount>,
    data: Arc<RwLock<SiteData>>,
    log: Arc<RwLock<Vec<RecordedRequest>>>,
}

impl AppState {
    pub fn new(admin: AdminAccount) -> Self {
        Self {
            admin: Arc::new(admin),
            data: Arc::new(RwLock::new(SiteData::default())),
            log: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn admin(&self) -> &AdminAccount {
        &self.admin
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.log.read().await.clone()
    }

    fn require_admin(&self, headers: &HeaderMap) -> ApiResult<()> {
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match presented {
            Some(token) if token == self.admin.token => Ok(()),
            _ => Err(ApiFailure::unauthorized()),
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Router with a default admin account.
pub fn app() -> Router {
    router(AppState::new(AdminAccount::default()))
}

pub fn router(state: AppState) -> Router {
    let mut api = Router::new()
        .route("/auth/login", post(login))
        .route("/analytics", get(analytics_summary))
        .route("/analytics/track", post(track_visit))
        .route("/contact", get(list_contacts).post(submit_contact))
        .route("/contact/unread", get(unread_count))
        .route("/contact/{id}", axum::routing::delete(delete_contact))
        .route("/contact/{id}/read", put(mark_contact_read))
        .route("/contact/{id}/reply", put(reply_contact));

    for (path, singleton) in [
        ("/about", Singleton::About),
        ("/values", Singleton::Values),
        ("/hero", Singleton::Hero),
        ("/settings", Singleton::Settings),
    ] {
        api = with_singleton(api, path, singleton);
    }
    for (path, collection) in [
        ("/testimonial", Collection::Testimonial),
        ("/service-card", Collection::ServiceCard),
        ("/service-detail", Collection::ServiceDetail),
        ("/client", Collection::Client),
    ] {
        api = with_collection(api, path, collection);
    }

    Router::new()
        .nest("/api", api)
        .route("/uploads/{name}", get(serve_upload))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

fn with_singleton(router: Router<AppState>, path: &str, kind: Singleton) -> Router<AppState> {
    router.route(
        path,
        get(move |State(state): State<AppState>| get_singleton(state, kind)).put(
            move |State(state): State<AppState>, headers: HeaderMap, form: FormFields| {
                put_singleton(state, headers, form, kind)
            },
        ),
    )
}

fn with_collection(router: Router<AppState>, path: &str, kind: Collection) -> Router<AppState> {
    router
        .route(
            path,
            get(move |State(state): State<AppState>| list_items(state, kind)).post(
                move |State(state): State<AppState>, headers: HeaderMap, form: FormFields| {
                    create_item(state, headers, form, kind)
                },
            ),
        )
        .route(
            &format!("{path}/{{id}}"),
            put(
                move |State(state): State<AppState>,
                      Path(id): Path<String>,
                      headers: HeaderMap,
                      form: FormFields| { update_item(state, id, headers, form, kind) },
            )
            .delete(
                move |State(state): State<AppState>, Path(id): Path<String>, headers: HeaderMap| {
                    delete_item(state, id, headers, kind)
                },
            ),
        )
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with_state(listener, AppState::new(AdminAccount::from_env())).await
}

pub async fn run_with_state(listener: TcpListener, state: AppState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn record(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let entry = RecordedRequest {
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        content_type: header_text(req.headers(), CONTENT_TYPE),
        authorization: header_text(req.headers(), AUTHORIZATION),
    };
    tracing::debug!(method = %entry.method, path = %entry.path, "request");
    state.log.write().await.push(entry);
    next.run(req).await
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> ApiResult<Json<Value>> {
    let admin = state.admin();
    if body.email != admin.email || body.password != admin.password {
        return Err(ApiFailure::new(
            StatusCode::UNAUTHORIZED,
            "Invalid email or password",
        ));
    }
    Ok(Json(json!({ "token": admin.token, "message": "Login successful" })))
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

/// Store an uploaded file and return its server-relative path.
fn store_upload(data: &mut SiteData, file: UploadedFile) -> String {
    let name = format!("{}-{}", Uuid::new_v4().simple(), sanitize(&file.file_name));
    data.uploads.insert(
        name.clone(),
        StoredFile {
            content_type: file.content_type,
            bytes: file.bytes,
        },
    );
    format!("/uploads/{name}")
}

fn sanitize(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

async fn serve_upload(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Response> {
    let data = state.data.read().await;
    let file = data.uploads.get(&name).ok_or_else(|| ApiFailure::not_found("File"))?;
    Ok(([(CONTENT_TYPE, file.content_type.clone())], file.bytes.clone()).into_response())
}

// ---------------------------------------------------------------------------
// Singletons
// ---------------------------------------------------------------------------

async fn get_singleton(state: AppState, kind: Singleton) -> Json<Map<String, Value>> {
    let data = state.data.read().await;
    Json(data.singletons.get(&kind).cloned().unwrap_or_default())
}

async fn put_singleton(
    state: AppState,
    headers: HeaderMap,
    form: FormFields,
    kind: Singleton,
) -> ApiResult<Json<Map<String, Value>>> {
    state.require_admin(&headers)?;
    let mut data = state.data.write().await;

    let upload = match (kind.file_field(), form.file) {
        (Some(field), Some(file)) if file.field == field => {
            Some((field, store_upload(&mut data, file)))
        }
        _ => None,
    };

    let doc = data.singletons.entry(kind).or_default();
    for (key, value) in form.text {
        doc.insert(key, value);
    }
    if let Some((field, path)) = upload {
        doc.insert(field.to_string(), Value::String(path));
    }
    Ok(Json(doc.clone()))
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

async fn list_items(state: AppState, kind: Collection) -> Json<Vec<Map<String, Value>>> {
    let data = state.data.read().await;
    Json(data.collections.get(&kind).cloned().unwrap_or_default())
}

async fn create_item(
    state: AppState,
    headers: HeaderMap,
    form: FormFields,
    kind: Collection,
) -> ApiResult<(StatusCode, Json<Map<String, Value>>)> {
    state.require_admin(&headers)?;
    if let Some(missing) = kind.required().iter().find(|f| form.str(f).is_none()) {
        return Err(ApiFailure::bad_request(format!("{missing} is required")));
    }

    let mut data = state.data.write().await;
    let mut doc = Map::new();
    doc.insert("_id".to_string(), Value::String(Uuid::new_v4().simple().to_string()));
    apply_fields(&mut data, &mut doc, form, kind);
    data.collections.entry(kind).or_default().push(doc.clone());
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn update_item(
    state: AppState,
    id: String,
    headers: HeaderMap,
    form: FormFields,
    kind: Collection,
) -> ApiResult<Json<Map<String, Value>>> {
    state.require_admin(&headers)?;
    let mut data = state.data.write().await;
    let mut doc = find_doc(&data, kind, &id)
        .cloned()
        .ok_or_else(|| ApiFailure::not_found(kind.label()))?;
    apply_fields(&mut data, &mut doc, form, kind);

    let docs = data.collections.entry(kind).or_default();
    if let Some(slot) = docs.iter_mut().find(|d| doc_id(d) == Some(id.as_str())) {
        *slot = doc.clone();
    }
    Ok(Json(doc))
}

async fn delete_item(
    state: AppState,
    id: String,
    headers: HeaderMap,
    kind: Collection,
) -> ApiResult<Json<Value>> {
    state.require_admin(&headers)?;
    let mut data = state.data.write().await;
    let docs = data.collections.entry(kind).or_default();
    let before = docs.len();
    docs.retain(|d| doc_id(d) != Some(id.as_str()));
    if docs.len() == before {
        return Err(ApiFailure::not_found(kind.label()));
    }
    Ok(Json(json!({ "message": format!("{} deleted", kind.label()) })))
}

fn doc_id(doc: &Map<String, Value>) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

fn find_doc<'a>(data: &'a SiteData, kind: Collection, id: &str) -> Option<&'a Map<String, Value>> {
    data.collections
        .get(&kind)?
        .iter()
        .find(|d| doc_id(d) == Some(id))
}

/// Copy the resource's known text fields from `form` and store its file.
fn apply_fields(data: &mut SiteData, doc: &mut Map<String, Value>, form: FormFields, kind: Collection) {
    for field in kind.fields() {
        if let Some(value) = form.text.get(*field) {
            doc.insert(field.to_string(), value.clone());
        }
    }
    if let Some(file) = form.file.filter(|f| f.field == kind.file_field()) {
        let path = store_upload(data, file);
        doc.insert(kind.file_field().to_string(), Value::String(path));
    }
}

// ---------------------------------------------------------------------------
// Contact messages
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyBody {
    #[serde(default)]
    pub reply_message: String,
}

async fn list_contacts(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Vec<Contact>>> {
    state.require_admin(&headers)?;
    let data = state.data.read().await;
    let mut contacts = data.contacts.clone();
    contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(contacts))
}

async fn unread_count(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    state.require_admin(&headers)?;
    let data = state.data.read().await;
    let count = data.contacts.iter().filter(|c| !c.is_read).count();
    Ok(Json(json!({ "count": count })))
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let blank = |s: &str| s.trim().is_empty();
    if blank(&form.name) || blank(&form.email) || blank(&form.message) {
        return Err(ApiFailure::bad_request("Name, email and message are required"));
    }
    let contact = Contact {
        id: Uuid::new_v4().simple().to_string(),
        name: form.name,
        email: form.email,
        phone: form.phone.filter(|p| !blank(p)),
        subject: form.subject.filter(|s| !blank(s)),
        message: form.message,
        is_read: false,
        is_replied: false,
        email_sent: false,
        reply_message: None,
        created_at: Utc::now(),
    };
    state.data.write().await.contacts.push(contact.clone());
    Ok((StatusCode::CREATED, Json(contact)))
}

async fn mark_contact_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Contact>> {
    state.require_admin(&headers)?;
    let mut data = state.data.write().await;
    let contact = data
        .contacts
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiFailure::not_found("Message"))?;
    contact.is_read = true;
    Ok(Json(contact.clone()))
}

async fn reply_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReplyBody>,
) -> ApiResult<Json<Contact>> {
    state.require_admin(&headers)?;
    if body.reply_message.trim().is_empty() {
        return Err(ApiFailure::bad_request("Reply message is required"));
    }
    let mut data = state.data.write().await;
    let contact = data
        .contacts
        .iter_mut()
        .find(|c| c.id == id)
        .ok_or_else(|| ApiFailure::not_found("Message"))?;
    contact.is_read = true;
    contact.is_replied = true;
    contact.reply_message = Some(body.reply_message);
    Ok(Json(contact.clone()))
}

async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    state.require_admin(&headers)?;
    let mut data = state.data.write().await;
    let before = data.contacts.len();
    data.contacts.retain(|c| c.id != id);
    if data.contacts.len() == before {
        return Err(ApiFailure::not_found("Message"));
    }
    Ok(Json(json!({ "message": "Message deleted" })))
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackBody {
    #[serde(default = "root_path")]
    pub path: String,
    pub visitor_id: String,
}

fn root_path() -> String {
    "/".to_string()
}

#[derive(Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

async fn track_visit(
    State(state): State<AppState>,
    Json(body): Json<TrackBody>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if body.visitor_id.trim().is_empty() {
        return Err(ApiFailure::bad_request("visitorId is required"));
    }
    state.data.write().await.visits.push(Visit {
        path: body.path,
        visitor_id: body.visitor_id,
        at: Utc::now(),
    });
    Ok((StatusCode::CREATED, Json(json!({ "message": "Visit tracked" }))))
}

async fn analytics_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<Value>> {
    state.require_admin(&headers)?;
    let days = query
        .days
        .unwrap_or(DEFAULT_ANALYTICS_DAYS)
        .clamp(1, MAX_ANALYTICS_DAYS);
    let now = Utc::now();
    let data = state.data.read().await;

    let since = (now - Duration::days(i64::from(days) - 1)).date_naive();
    let recent: Vec<&Visit> = data
        .visits
        .iter()
        .filter(|v| v.at.date_naive() >= since)
        .collect();

    let traffic: Vec<Value> = (0..days)
        .rev()
        .map(|offset| {
            let day = (now - Duration::days(i64::from(offset))).date_naive();
            let count = recent.iter().filter(|v| v.at.date_naive() == day).count();
            json!({ "date": day.format("%Y-%m-%d").to_string(), "count": count })
        })
        .collect();
    let unique: HashSet<&str> = recent.iter().map(|v| v.visitor_id.as_str()).collect();
    let count = |kind: Collection| data.collections.get(&kind).map_or(0, Vec::len);
    let filled = |kind: Singleton| data.singletons.get(&kind).is_some_and(|doc| !doc.is_empty());

    Ok(Json(json!({
        "totals": {
            "users": 1,
            "clients": count(Collection::Client),
            "testimonials": count(Collection::Testimonial),
            "serviceCards": count(Collection::ServiceCard),
            "serviceDetails": count(Collection::ServiceDetail),
        },
        "traffic": traffic,
        "visitorStats": {
            "totalViews": recent.len(),
            "uniqueVisitors": unique.len(),
            "devices": {},
        },
        "contentStatus": {
            "aboutSections": filled(Singleton::About),
            "valuesSections": filled(Singleton::Values),
        },
        "lastUpdated": now.to_rfc3339(),
    })))
}
