//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port with a known admin
//! account, then drives `SiteClient` over real HTTP through `ReqwestBackend`.
//! The server records what it received, which lets the tests check wire
//! details (multipart boundaries, bearer headers) the client never sees.

use std::sync::Arc;

use mock_server::{AdminAccount, AppState};
use parking_lot::Mutex;
use site_core::types::{
    ClientInput, ContactSubmission, ServiceInput, Settings, TestimonialInput,
};
use site_core::{ApiError, ClientConfig, SessionStore, SiteClient, Upload, LOGIN_ROUTE};

const EMAIL: &str = "a@b.com";
const PASSWORD: &str = "secret";
const TOKEN: &str = "abc123";

struct Harness {
    base_url: String,
    state: AppState,
    client: SiteClient,
    navigations: Arc<Mutex<Vec<String>>>,
}

async fn start() -> Harness {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(AdminAccount::new(EMAIL, PASSWORD, TOKEN));
    tokio::spawn(mock_server::run_with_state(listener, state.clone()));

    let base_url = format!("http://{addr}/api");
    let navigations = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&navigations);
    let client = SiteClient::new(&ClientConfig::new(&base_url))
        .unwrap()
        .with_navigator(Arc::new(move |route: &str| seen.lock().push(route.to_string())));

    Harness {
        base_url,
        state,
        client,
        navigations,
    }
}

fn testimonial(author: &str, content: &str) -> TestimonialInput {
    TestimonialInput {
        author: author.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn login_stores_token() {
    let h = start().await;
    let response = h.client.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(response.token, TOKEN);
    assert_eq!(h.client.session().token().as_deref(), Some(TOKEN));
}

#[tokio::test(flavor = "multi_thread")]
async fn bad_credentials_surface_server_message() {
    let h = start().await;
    let err = h.client.login(EMAIL, "wrong").await.unwrap_err();
    match err {
        ApiError::Unauthorized { message } => {
            assert_eq!(message.as_deref(), Some("Invalid email or password"));
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert!(!h.client.session().has_token());
}

#[tokio::test(flavor = "multi_thread")]
async fn admin_call_without_token_never_reaches_server() {
    let h = start().await;
    let err = h.client.get_contacts().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));
    assert!(h.state.requests().await.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_clears_session_and_navigates_to_login() {
    let h = start().await;
    h.client.session().set_token("bogus");

    let err = h.client.get_unread_count().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(!h.client.session().has_token());
    assert_eq!(h.navigations.lock().as_slice(), [LOGIN_ROUTE.to_string()]);

    let recorded = h.state.requests().await;
    assert_eq!(recorded[0].authorization.as_deref(), Some("Bearer bogus"));
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_upload_round_trips_through_asset_url() {
    let h = start().await;
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    let image = Upload::from_bytes("jane.png", b"PNGDATA".to_vec());
    let created = h
        .client
        .add_testimonial(&testimonial("Jane", "Great work"), Some(image))
        .await
        .unwrap();
    assert_eq!(created.author, "Jane");

    let recorded = h.state.requests().await;
    let upload_request = recorded
        .iter()
        .find(|r| r.path == "/api/testimonial" && r.method == "POST")
        .unwrap();
    let content_type = upload_request.content_type.as_deref().unwrap();
    assert!(
        content_type.starts_with("multipart/form-data; boundary="),
        "{content_type}"
    );
    assert_eq!(upload_request.authorization.as_deref(), Some("Bearer abc123"));

    let url = h.client.asset_url(created.image.as_deref()).unwrap();
    assert!(url.starts_with(h.base_url.trim_end_matches("/api")));
    assert!(!url.contains("/api/"));
    let bytes = reqwest::get(&url).await.unwrap().bytes().await.unwrap();
    assert_eq!(&bytes[..], b"PNGDATA");
}

#[tokio::test(flavor = "multi_thread")]
async fn multipart_operation_without_file_sends_json() {
    let h = start().await;
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    let created = h
        .client
        .add_client(&ClientInput { name: "Acme".to_string() }, None)
        .await
        .unwrap();
    assert_eq!(created.name, "Acme");
    assert!(created.logo.is_none());

    let recorded = h.state.requests().await;
    let last = recorded.last().unwrap();
    assert_eq!(last.content_type.as_deref(), Some("application/json"));
}

#[tokio::test(flavor = "multi_thread")]
async fn anonymous_visitor_flow() {
    let h = start().await;

    let message = h
        .client
        .submit_contact(&ContactSubmission {
            name: "X".to_string(),
            email: "x@x.com".to_string(),
            phone: None,
            subject: Some("Hello".to_string()),
            message: "hi".to_string(),
        })
        .await
        .unwrap();
    assert!(!message.is_read);

    let first = h.client.track_visit(None).await.unwrap();
    let second = h.client.track_visit(Some("/services")).await.unwrap();
    assert_eq!(first.path, "/");
    assert_eq!(first.visitor_id, second.visitor_id);
    assert!(first.visitor_id.starts_with("v_"));

    let recorded = h.state.requests().await;
    assert!(recorded.iter().all(|r| r.authorization.is_none()));

    h.client.login(EMAIL, PASSWORD).await.unwrap();
    assert_eq!(h.client.get_unread_count().await.unwrap(), 1);
    let analytics = h.client.get_analytics(None).await.unwrap();
    assert_eq!(analytics.traffic.len(), 14);
    assert_eq!(analytics.total_views(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn repeated_reads_are_stable() {
    let h = start().await;
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    h.client
        .add_testimonial(&testimonial("A", "one"), None)
        .await
        .unwrap();

    let first = h.client.get_testimonials().await.unwrap();
    let second = h.client.get_testimonials().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn crud_lifecycle() {
    let h = start().await;
    h.client.login(EMAIL, PASSWORD).await.unwrap();

    // create
    let card = h
        .client
        .add_service_card(
            &ServiceInput {
                title: "Design".to_string(),
                description: "UI work".to_string(),
            },
            None,
        )
        .await
        .unwrap();

    // update
    let updated = h
        .client
        .update_service_card(
            &card.id,
            &ServiceInput {
                title: "Design".to_string(),
                description: "UI and UX".to_string(),
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(updated.id, card.id);
    assert_eq!(updated.description, "UI and UX");

    // delete
    h.client.delete_service_card(&card.id).await.unwrap();
    assert!(h.client.get_service_cards().await.unwrap().is_empty());

    // delete again
    let err = h.client.delete_service_card(&card.id).await.unwrap_err();
    match err {
        ApiError::NotFound { message } => {
            assert_eq!(message.as_deref(), Some("Service card not found"));
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn contact_inbox_lifecycle() {
    let h = start().await;
    let submitted = h
        .client
        .submit_contact(&ContactSubmission {
            name: "X".to_string(),
            email: "x@x.com".to_string(),
            phone: Some("0812".to_string()),
            subject: None,
            message: "hi".to_string(),
        })
        .await
        .unwrap();

    h.client.login(EMAIL, PASSWORD).await.unwrap();
    let read = h.client.mark_contact_as_read(&submitted.id).await.unwrap();
    assert!(read.is_read);
    assert_eq!(h.client.get_unread_count().await.unwrap(), 0);

    let replied = h.client.reply_contact(&submitted.id, "Thanks!").await.unwrap();
    assert!(replied.is_replied);
    assert_eq!(replied.reply_message.as_deref(), Some("Thanks!"));

    h.client.delete_contact(&submitted.id).await.unwrap();
    assert!(h.client.get_contacts().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn settings_update_then_public_read() {
    let h = start().await;
    h.client.login(EMAIL, PASSWORD).await.unwrap();
    let settings = Settings {
        company_name: "DSF".to_string(),
        email: "hi@dsf.id".to_string(),
        ..Settings::default()
    };
    h.client.update_settings(&settings).await.unwrap();

    h.client.logout();
    assert!(!h.client.session().has_token());
    let fetched = h.client.get_settings().await.unwrap();
    assert_eq!(fetched, settings);
}

#[tokio::test(flavor = "multi_thread")]
async fn file_session_survives_a_new_client() {
    let h = start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let config = ClientConfig::new(&h.base_url).with_session_file(&path);
    let first = SiteClient::new(&config).unwrap();
    first.login(EMAIL, PASSWORD).await.unwrap();
    let visitor = first.session().get_or_create_visitor_id();

    let second = SiteClient::new(&config).unwrap();
    assert_eq!(second.session().token().as_deref(), Some(TOKEN));
    assert_eq!(second.session().get_or_create_visitor_id(), visitor);
    assert_eq!(second.get_unread_count().await.unwrap(), 0);

    let reopened = SessionStore::file(&path);
    assert!(reopened.has_token());
}
