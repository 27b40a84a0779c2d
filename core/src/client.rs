//! Typed client for the site API.
//!
//! # Design
//! `SiteClient` exposes one async method per backend capability. Each method
//! names its `Operation` from the catalog and hands it to `Transport`, which
//! owns auth checks, payload encoding and failure handling. Methods here only
//! pick the target, shape the payload and parse the response.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use crate::assets::resolve_asset_url;
use crate::catalog;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpResponse, Upload};
use crate::operation::Operation;
use crate::session::SessionStore;
use crate::transport::{HttpBackend, Navigator, ReqwestBackend, Target, Transport};
use crate::types::{
    AboutUs, Analytics, Client, ClientInput, ContactMessage, ContactReply, ContactSubmission,
    Hero, LoginRequest, LoginResponse, ServiceInput, ServiceItem, Settings, Testimonial,
    TestimonialInput, TrackVisit, UnreadCount, Values,
};

/// Lookback window used by `get_analytics` when none is given.
pub const DEFAULT_ANALYTICS_DAYS: u32 = 14;

/// Path recorded by `track_visit` when none is given.
pub const DEFAULT_TRACK_PATH: &str = "/";

pub struct SiteClient<B = ReqwestBackend> {
    transport: Transport<B>,
}

impl SiteClient<ReqwestBackend> {
    /// Build a network client from `config`. The session is file-backed when
    /// `config.session_file` is set, in-memory otherwise.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let session = match &config.session_file {
            Some(path) => SessionStore::file(path),
            None => SessionStore::in_memory(),
        };
        let backend = ReqwestBackend::new(config)?;
        Ok(Self::with_backend(&config.api_base_url, backend, session))
    }
}

impl<B: HttpBackend> SiteClient<B> {
    pub fn with_backend(base_url: &str, backend: B, session: SessionStore) -> Self {
        Self {
            transport: Transport::new(base_url, backend, session),
        }
    }

    pub fn with_navigator(self, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport: self.transport.with_navigator(navigator),
        }
    }

    pub fn transport(&self) -> &Transport<B> {
        &self.transport
    }

    pub fn session(&self) -> &SessionStore {
        self.transport.session()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Resolve a stored asset path (image, logo) to a browser-usable URL.
    /// `None` means there is no asset to show.
    pub fn asset_url(&self, path: Option<&str>) -> Option<String> {
        resolve_asset_url(path, self.base_url())
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    /// Log in and store the returned token in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: LoginResponse = self.write(&catalog::LOGIN, Target::default(), &body, None).await?;
        self.session().set_token(response.token.as_str());
        tracing::info!("logged in");
        Ok(response)
    }

    /// Drop the token and navigate to the login route. The visitor id stays.
    pub fn logout(&self) {
        self.session().clear_token();
        self.transport.navigate_to_login();
        tracing::info!("logged out");
    }

    // -----------------------------------------------------------------------
    // About / values
    // -----------------------------------------------------------------------

    pub async fn get_about_us(&self) -> Result<AboutUs, ApiError> {
        self.fetch(&catalog::GET_ABOUT_US, Target::default()).await
    }

    pub async fn update_about_us(&self, about: &AboutUs) -> Result<AboutUs, ApiError> {
        self.write(&catalog::UPDATE_ABOUT_US, Target::default(), about, None).await
    }

    pub async fn get_values(&self) -> Result<Values, ApiError> {
        self.fetch(&catalog::GET_VALUES, Target::default()).await
    }

    pub async fn update_values(&self, values: &Values) -> Result<Values, ApiError> {
        self.write(&catalog::UPDATE_VALUES, Target::default(), values, None).await
    }

    // -----------------------------------------------------------------------
    // Testimonials
    // -----------------------------------------------------------------------

    pub async fn get_testimonials(&self) -> Result<Vec<Testimonial>, ApiError> {
        self.fetch(&catalog::GET_TESTIMONIALS, Target::default()).await
    }

    pub async fn add_testimonial(
        &self,
        input: &TestimonialInput,
        image: Option<Upload>,
    ) -> Result<Testimonial, ApiError> {
        self.write(&catalog::ADD_TESTIMONIAL, Target::default(), input, image).await
    }

    pub async fn update_testimonial(
        &self,
        id: &str,
        input: &TestimonialInput,
        image: Option<Upload>,
    ) -> Result<Testimonial, ApiError> {
        self.write(&catalog::UPDATE_TESTIMONIAL, Target::id(id), input, image).await
    }

    pub async fn delete_testimonial(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&catalog::DELETE_TESTIMONIAL, id).await
    }

    // -----------------------------------------------------------------------
    // Service cards
    // -----------------------------------------------------------------------

    pub async fn get_service_cards(&self) -> Result<Vec<ServiceItem>, ApiError> {
        self.fetch(&catalog::GET_SERVICE_CARDS, Target::default()).await
    }

    pub async fn add_service_card(
        &self,
        input: &ServiceInput,
        image: Option<Upload>,
    ) -> Result<ServiceItem, ApiError> {
        self.write(&catalog::ADD_SERVICE_CARD, Target::default(), input, image).await
    }

    pub async fn update_service_card(
        &self,
        id: &str,
        input: &ServiceInput,
        image: Option<Upload>,
    ) -> Result<ServiceItem, ApiError> {
        self.write(&catalog::UPDATE_SERVICE_CARD, Target::id(id), input, image).await
    }

    pub async fn delete_service_card(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&catalog::DELETE_SERVICE_CARD, id).await
    }

    // -----------------------------------------------------------------------
    // Service details
    // -----------------------------------------------------------------------

    pub async fn get_service_details(&self) -> Result<Vec<ServiceItem>, ApiError> {
        self.fetch(&catalog::GET_SERVICE_DETAILS, Target::default()).await
    }

    pub async fn add_service_detail(
        &self,
        input: &ServiceInput,
        image: Option<Upload>,
    ) -> Result<ServiceItem, ApiError> {
        self.write(&catalog::ADD_SERVICE_DETAIL, Target::default(), input, image).await
    }

    pub async fn update_service_detail(
        &self,
        id: &str,
        input: &ServiceInput,
        image: Option<Upload>,
    ) -> Result<ServiceItem, ApiError> {
        self.write(&catalog::UPDATE_SERVICE_DETAIL, Target::id(id), input, image).await
    }

    pub async fn delete_service_detail(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&catalog::DELETE_SERVICE_DETAIL, id).await
    }

    // -----------------------------------------------------------------------
    // Clients
    // -----------------------------------------------------------------------

    pub async fn get_clients(&self) -> Result<Vec<Client>, ApiError> {
        self.fetch(&catalog::GET_CLIENTS, Target::default()).await
    }

    pub async fn add_client(
        &self,
        input: &ClientInput,
        logo: Option<Upload>,
    ) -> Result<Client, ApiError> {
        self.write(&catalog::ADD_CLIENT, Target::default(), input, logo).await
    }

    pub async fn update_client(
        &self,
        id: &str,
        input: &ClientInput,
        logo: Option<Upload>,
    ) -> Result<Client, ApiError> {
        self.write(&catalog::UPDATE_CLIENT, Target::id(id), input, logo).await
    }

    pub async fn delete_client(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&catalog::DELETE_CLIENT, id).await
    }

    // -----------------------------------------------------------------------
    // Analytics
    // -----------------------------------------------------------------------

    /// Dashboard summary over the last `days` days (default 14).
    pub async fn get_analytics(&self, days: Option<u32>) -> Result<Analytics, ApiError> {
        let days = days.unwrap_or(DEFAULT_ANALYTICS_DAYS).to_string();
        let query = [("days", days.as_str())];
        self.fetch(&catalog::GET_ANALYTICS, Target::query(&query)).await
    }

    /// Record a page view for this visitor. Creates the visitor id on first
    /// use. Returns the visit that was sent.
    pub async fn track_visit(&self, path: Option<&str>) -> Result<TrackVisit, ApiError> {
        let visit = TrackVisit {
            path: path.unwrap_or(DEFAULT_TRACK_PATH).to_string(),
            visitor_id: self.session().get_or_create_visitor_id(),
        };
        self.transport
            .send(&catalog::TRACK_VISIT, Target::default(), Some(&visit), None)
            .await?;
        Ok(visit)
    }

    // -----------------------------------------------------------------------
    // Contact messages
    // -----------------------------------------------------------------------

    pub async fn get_contacts(&self) -> Result<Vec<ContactMessage>, ApiError> {
        self.fetch(&catalog::GET_CONTACTS, Target::default()).await
    }

    pub async fn get_unread_count(&self) -> Result<u64, ApiError> {
        let unread: UnreadCount = self.fetch(&catalog::GET_UNREAD_COUNT, Target::default()).await?;
        Ok(unread.count)
    }

    /// Anonymous: works without a token.
    pub async fn submit_contact(
        &self,
        submission: &ContactSubmission,
    ) -> Result<ContactMessage, ApiError> {
        self.write(&catalog::SUBMIT_CONTACT, Target::default(), submission, None).await
    }

    pub async fn mark_contact_as_read(&self, id: &str) -> Result<ContactMessage, ApiError> {
        self.write(&catalog::MARK_CONTACT_AS_READ, Target::id(id), &json!({}), None).await
    }

    pub async fn reply_contact(
        &self,
        id: &str,
        reply_message: &str,
    ) -> Result<ContactMessage, ApiError> {
        let body = ContactReply {
            reply_message: reply_message.to_string(),
        };
        self.write(&catalog::REPLY_CONTACT, Target::id(id), &body, None).await
    }

    pub async fn delete_contact(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&catalog::DELETE_CONTACT, id).await
    }

    // -----------------------------------------------------------------------
    // Hero / settings
    // -----------------------------------------------------------------------

    pub async fn get_hero(&self) -> Result<Hero, ApiError> {
        self.fetch(&catalog::GET_HERO, Target::default()).await
    }

    pub async fn update_hero(&self, hero: &Hero, image: Option<Upload>) -> Result<Hero, ApiError> {
        self.write(&catalog::UPDATE_HERO, Target::default(), hero, image).await
    }

    pub async fn get_settings(&self) -> Result<Settings, ApiError> {
        self.fetch(&catalog::GET_SETTINGS, Target::default()).await
    }

    pub async fn update_settings(&self, settings: &Settings) -> Result<Settings, ApiError> {
        self.write(&catalog::UPDATE_SETTINGS, Target::default(), settings, None).await
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn fetch<R: DeserializeOwned>(
        &self,
        op: &Operation,
        target: Target<'_>,
    ) -> Result<R, ApiError> {
        let response = self.transport.send(op, target, None::<&()>, None).await?;
        parse_json(&response)
    }

    async fn write<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        op: &Operation,
        target: Target<'_>,
        fields: &T,
        upload: Option<Upload>,
    ) -> Result<R, ApiError> {
        let response = self.transport.send(op, target, Some(fields), upload).await?;
        parse_json(&response)
    }

    async fn delete(&self, op: &Operation, id: &str) -> Result<(), ApiError> {
        self.transport
            .send(op, Target::id(id), None::<&()>, None)
            .await?;
        Ok(())
    }
}

fn parse_json<R: DeserializeOwned>(response: &HttpResponse) -> Result<R, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
