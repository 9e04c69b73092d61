use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::{Value, json};

use super::*;
use crate::session::MemorySessionStore;
use crate::tokens::AccessToken;
use crate::ErrorStatus;

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>;

/// Transport that answers from a closure and records every request.
struct MockTransport {
    handler: Handler,
    refresh_delay: Option<Duration>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    fn new(
        handler: impl Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            refresh_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = Some(delay);
        self
    }

    fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.calls.lock().unwrap().push(request.clone());
        if request.path == REFRESH
            && let Some(delay) = self.refresh_delay
        {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(request)
    }
}

#[derive(Default)]
struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to_login(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    client: AuthClient<Arc<MockTransport>>,
    transport: Arc<MockTransport>,
    store: Arc<MemorySessionStore>,
    navigator: Arc<RecordingNavigator>,
}

fn harness(transport: MockTransport, token: Option<&str>, config: ClientConfig) -> Harness {
    let transport = Arc::new(transport);
    let store = Arc::new(match token {
        Some(token) => {
            MemorySessionStore::with_credentials(SessionCredentials::new(AccessToken::new(token)))
        }
        None => MemorySessionStore::new(),
    });
    let navigator = Arc::new(RecordingNavigator::default());

    let client = AuthClient::new(
        Arc::clone(&transport),
        store.clone(),
        navigator.clone(),
        config,
    );

    Harness {
        client,
        transport,
        store,
        navigator,
    }
}

fn bearer(request: &ApiRequest) -> Option<&str> {
    request.header_value("authorization")
}

fn ok(data: Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(200, data))
}

fn status(code: u16) -> Result<ApiResponse, ApiError> {
    Err(ApiError::http(code, json!({"message": format!("status {}", code)})))
}

/// Data endpoint accepts only `valid`; refresh hands out `valid`.
fn rotating_server(request: &ApiRequest) -> Result<ApiResponse, ApiError> {
    match request.path.as_str() {
        REFRESH => ok(json!({"accessToken": "valid"})),
        _ if bearer(request) == Some("Bearer valid") => ok(json!({"rooms": 12})),
        _ => status(401),
    }
}

#[tokio::test]
async fn passes_through_success_without_refresh() {
    let h = harness(
        MockTransport::new(|_| ok(json!({"city": "Porto"}))),
        Some("current"),
        ClientConfig::default(),
    );

    let response = h.client.request(&ApiRequest::get("/location")).await.unwrap();

    assert_eq!(response, ApiResponse::new(200, json!({"city": "Porto"})));
    assert!(h.transport.calls_to(REFRESH).is_empty());
    assert_eq!(bearer(&h.transport.calls()[0]), Some("Bearer current"));
}

#[tokio::test]
async fn passes_through_non_401_errors_unchanged() {
    let h = harness(
        MockTransport::new(|_| status(500)),
        Some("current"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/offers")).await.unwrap_err();

    assert_eq!(err, ApiError::http(500, json!({"message": "status 500"})));
    assert_eq!(h.transport.calls().len(), 1);
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn network_failures_pass_through() {
    let h = harness(
        MockTransport::new(|_| Err(ApiError::fetch("connection refused"))),
        Some("current"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/offers")).await.unwrap_err();

    assert_eq!(err.status, ErrorStatus::Fetch);
    assert!(h.transport.calls_to(REFRESH).is_empty());
}

#[tokio::test]
async fn refreshes_once_and_replays_on_401() {
    let h = harness(
        MockTransport::new(rotating_server),
        Some("stale"),
        ClientConfig::default(),
    );

    let response = h.client.request(&ApiRequest::get("/rooms")).await.unwrap();

    assert_eq!(response.data, json!({"rooms": 12}));

    let calls = h.transport.calls();
    let paths: Vec<_> = calls.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["/rooms", REFRESH, "/rooms"]);
    assert_eq!(bearer(&calls[0]), Some("Bearer stale"));
    assert_eq!(bearer(&calls[1]), None, "refresh must not carry the bearer token");
    assert_eq!(bearer(&calls[2]), Some("Bearer valid"));

    assert_eq!(h.store.get().unwrap().access_token.as_str(), "valid");
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn replay_keeps_original_method_body_and_headers() {
    let h = harness(
        MockTransport::new(rotating_server),
        Some("stale"),
        ClientConfig::default(),
    );

    let request = ApiRequest::patch("/settings", json!({"currency": "EUR"}))
        .header("X-Locale", "pt-PT");
    h.client.request(&request).await.unwrap();

    let replay = h.transport.calls_to("/settings").pop().unwrap();
    assert_eq!(replay.method, Method::Patch);
    assert_eq!(replay.body, Some(json!({"currency": "EUR"})));
    assert_eq!(replay.header_value("x-locale"), Some("pt-PT"));
}

#[tokio::test]
async fn second_401_is_returned_without_another_refresh() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => ok(json!({"accessToken": "also-rejected"})),
            _ => status(401),
        }),
        Some("stale"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/blog")).await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
    assert_eq!(h.transport.calls_to("/blog").len(), 2);
    // The refresh itself worked, so the session survives.
    assert_eq!(h.store.get().unwrap().access_token.as_str(), "also-rejected");
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn forbidden_refresh_logs_out_with_expiry_message() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => status(403),
            _ => status(401),
        }),
        Some("stale"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/profile")).await.unwrap_err();

    assert!(err.is_forbidden());
    assert_eq!(err.message.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.redirects(), 1);
    // The original request is not replayed after a failed refresh.
    assert_eq!(h.transport.calls_to("/profile").len(), 1);
}

#[tokio::test]
async fn other_refresh_failures_log_out_without_annotation() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => status(500),
            _ => status(401),
        }),
        Some("stale"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/profile")).await.unwrap_err();

    assert_eq!(err, ApiError::http(500, json!({"message": "status 500"})));
    assert!(err.message.is_none());
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn refresh_without_token_in_body_logs_out() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => ok(json!({"status": "ok"})),
            _ => status(401),
        }),
        Some("stale"),
        ClientConfig::default(),
    );

    let err = h.client.request(&ApiRequest::get("/profile")).await.unwrap_err();

    assert_eq!(err.status, ErrorStatus::Parsing);
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn later_requests_use_the_refreshed_token() {
    let h = harness(
        MockTransport::new(rotating_server),
        Some("stale"),
        ClientConfig::default(),
    );

    h.client.request(&ApiRequest::get("/rooms")).await.unwrap();
    h.client.request(&ApiRequest::get("/gallery")).await.unwrap();

    let gallery = h.transport.calls_to("/gallery");
    assert_eq!(gallery.len(), 1);
    assert_eq!(bearer(&gallery[0]), Some("Bearer valid"));
    assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let h = harness(
        MockTransport::new(|_| ok(json!(["lobby.jpg", "pool.jpg"]))),
        None,
        ClientConfig::default(),
    );

    let response = h.client.request(&ApiRequest::get("/gallery")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(bearer(&h.transport.calls()[0]), None);
}

#[tokio::test]
async fn custom_refresh_path_is_used() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            "/session/renew" => ok(json!({"accessToken": "valid"})),
            _ if bearer(request) == Some("Bearer valid") => ok(Value::Null),
            _ => status(401),
        }),
        Some("stale"),
        ClientConfig::default().with_refresh_path("/session/renew"),
    );

    h.client.request(&ApiRequest::get("/rooms")).await.unwrap();
    assert_eq!(h.transport.calls_to("/session/renew").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_401s_share_one_refresh() {
    let h = harness(
        MockTransport::new(rotating_server).with_refresh_delay(Duration::from_millis(50)),
        Some("stale"),
        ClientConfig::default(),
    );

    let requests: Vec<_> = (0..5)
        .map(|i| ApiRequest::get(format!("/rooms/{}", i)))
        .collect();
    let results = join_all(requests.iter().map(|r| h.client.request(r))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_401s_refresh_independently_when_coalescing_is_off() {
    let h = harness(
        MockTransport::new(rotating_server).with_refresh_delay(Duration::from_millis(50)),
        Some("stale"),
        ClientConfig::default().with_coalesced_refresh(false),
    );

    let requests: Vec<_> = (0..5)
        .map(|i| ApiRequest::get(format!("/rooms/{}", i)))
        .collect();
    let results = join_all(requests.iter().map(|r| h.client.request(r))).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(h.transport.calls_to(REFRESH).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn dropped_request_abandons_its_refresh() {
    let h = harness(
        MockTransport::new(rotating_server).with_refresh_delay(Duration::from_millis(50)),
        Some("stale"),
        ClientConfig::default(),
    );

    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        h.client.request(&ApiRequest::get("/rooms")),
    )
    .await;
    assert!(abandoned.is_err());
    assert_eq!(h.transport.calls_to(REFRESH).len(), 1);

    // Nothing was published or stored for the abandoned refresh.
    assert_eq!(h.client.inner.refresh.generation(), 0);
    assert_eq!(h.store.get().unwrap().access_token.as_str(), "stale");

    let response = h.client.request(&ApiRequest::get("/rooms")).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(h.transport.calls_to(REFRESH).len(), 2);
    assert_eq!(h.store.get().unwrap().access_token.as_str(), "valid");
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_refusal_redirects_once() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            REFRESH => status(403),
            _ => status(401),
        })
        .with_refresh_delay(Duration::from_millis(50)),
        Some("stale"),
        ClientConfig::default(),
    );

    let requests: Vec<_> = (0..3)
        .map(|i| ApiRequest::get(format!("/offers/{}", i)))
        .collect();
    let results = join_all(requests.iter().map(|r| h.client.request(r))).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.message.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    }
    assert_eq!(h.transport.calls_to(REFRESH).len(), 1);
    assert_eq!(h.navigator.redirects(), 1);
    assert!(h.store.get().is_none());
}

#[tokio::test]
async fn login_stores_session() {
    let h = harness(
        MockTransport::new(|request| match request.path.as_str() {
            LOGIN => ok(json!({"accessToken": "fresh", "expiresIn": 900})),
            _ => status(404),
        }),
        None,
        ClientConfig::default(),
    );

    let session = h
        .client
        .login(&LoginCredentials::new("manager", "hunter2"))
        .await
        .unwrap();

    assert_eq!(session.access_token.as_str(), "fresh");
    assert_eq!(h.client.session(), Some(session));

    let logins = h.transport.calls_to(LOGIN);
    let login = &logins[0];
    assert_eq!(login.method, Method::Post);
    assert_eq!(
        login.body,
        Some(json!({"identifier": "manager", "password": "hunter2"}))
    );
}

#[tokio::test]
async fn failed_login_leaves_session_untouched() {
    let h = harness(
        MockTransport::new(|_| status(401)),
        None,
        ClientConfig::default(),
    );

    let err = h
        .client
        .login(&LoginCredentials::new("manager", "wrong"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert!(h.client.session().is_none());
    // A rejected login is not an expired session.
    assert!(h.transport.calls_to(REFRESH).is_empty());
    assert_eq!(h.navigator.redirects(), 0);
}

#[tokio::test]
async fn explicit_refresh_replaces_token() {
    let h = harness(
        MockTransport::new(rotating_server),
        Some("stale"),
        ClientConfig::default(),
    );

    let session = h.client.refresh().await.unwrap();
    assert_eq!(session.access_token.as_str(), "valid");

    let again = h.client.refresh().await.unwrap();
    assert_eq!(again.access_token.as_str(), "valid");
    assert_eq!(h.transport.calls_to(REFRESH).len(), 2);
}

#[tokio::test]
async fn logout_clears_session_even_when_server_fails() {
    let h = harness(
        MockTransport::new(|_| status(502)),
        Some("current"),
        ClientConfig::default(),
    );

    let err = h.client.logout().await.unwrap_err();

    assert_eq!(err.status, ErrorStatus::Http(502));
    assert!(h.store.get().is_none());
    assert_eq!(h.navigator.redirects(), 0);
    assert_eq!(bearer(&h.transport.calls_to(LOGOUT)[0]), Some("Bearer current"));
}

#[test]
fn debug_output_hides_session() {
    let h = harness(
        MockTransport::new(|_| ok(Value::Null)),
        Some("secret-token"),
        ClientConfig::default(),
    );
    let debug = format!("{:?}", h.client);
    assert!(!debug.contains("secret-token"));
    assert!(debug.contains("/auth/refresh"));
}
