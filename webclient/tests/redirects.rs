use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use axum::response::Redirect;
use axum::routing::{any, get};
use axum::Router;
use hyper::header::{HeaderName, AUTHORIZATION, CONTENT_LENGTH};
use hyper::{Request, StatusCode};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use webclient::client::{HttpClient, MAX_REDIRECTS};
use webclient::tls::insecure_client_config;
use webclient::AttemptError;

#[derive(Debug, Clone, PartialEq)]
struct Landed {
    method: Method,
    body: Bytes,
    content_length: Option<String>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct RedirectState {
    port: u16,
    loop_hits: Arc<AtomicUsize>,
    landed: Arc<Mutex<Vec<Landed>>>,
}

async fn redirect_loop(State(state): State<RedirectState>) -> Redirect {
    state.loop_hits.fetch_add(1, Ordering::SeqCst);
    Redirect::temporary("/loop")
}

async fn cross_host(State(state): State<RedirectState>) -> Redirect {
    Redirect::temporary(&format!("http://localhost:{}/landing", state.port))
}

async fn landing(State(state): State<RedirectState>, method: Method, headers: HeaderMap, body: Bytes) -> &'static str {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    };
    state.landed.lock().unwrap().push(Landed {
        method,
        body,
        content_length: header(CONTENT_LENGTH),
        authorization: header(AUTHORIZATION),
    });
    "landed"
}

async fn spawn_redirect_server() -> (SocketAddr, RedirectState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = RedirectState {
        port: addr.port(),
        loop_hits: Arc::default(),
        landed: Arc::default(),
    };
    let app = Router::new()
        .route("/loop", get(redirect_loop))
        .route("/see-other", any(|| async { Redirect::to("/landing") }))
        .route("/temp", any(|| async { Redirect::temporary("/landing") }))
        .route("/cross", get(cross_host))
        .route("/landing", any(landing))
        .with_state(state.clone());
    tokio::spawn(async move { axum::serve(listener, app).await });
    (addr, state)
}

fn client() -> HttpClient {
    HttpClient::new(&insecure_client_config().unwrap())
}

fn post_with_body(url: String) -> Request<Option<Bytes>> {
    Request::post(url)
        .header(CONTENT_LENGTH, "7")
        .header(AUTHORIZATION, "Bearer secret")
        .body(Some(Bytes::from_static(b"payload")))
        .unwrap()
}

#[tokio::test]
async fn endless_redirects_stop_after_ten_requests() {
    let (addr, state) = spawn_redirect_server().await;
    let url = format!("http://{addr}/loop");
    let request = Request::get(&url).body(None).unwrap();

    let err = client().send_recv(request).await.unwrap_err();

    assert!(
        matches!(err, AttemptError::TooManyRedirects { limit: MAX_REDIRECTS, .. }),
        "{err:?}"
    );
    assert!(err.is_transport());
    assert_eq!(format!(r#"GET "{url}": stopped after 10 redirects"#), err.to_string());
    assert_eq!(MAX_REDIRECTS, state.loop_hits.load(Ordering::SeqCst));
}

#[tokio::test]
async fn see_other_turns_post_into_bodyless_get() {
    let (addr, state) = spawn_redirect_server().await;

    let (status, body) = client()
        .send_recv(post_with_body(format!("http://{addr}/see-other")))
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, status);
    assert_eq!(b"landed".as_slice(), body.as_slice());
    let landed = state.landed.lock().unwrap();
    assert_eq!(1, landed.len());
    assert_eq!(Method::GET, landed[0].method);
    assert!(landed[0].body.is_empty());
    assert_eq!(None, landed[0].content_length);
    assert_eq!(Some("Bearer secret"), landed[0].authorization.as_deref());
}

#[tokio::test]
async fn temporary_redirect_keeps_method_and_body() {
    let (addr, state) = spawn_redirect_server().await;

    let (status, _) = client()
        .send_recv(post_with_body(format!("http://{addr}/temp")))
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, status);
    assert_eq!(
        vec![Landed {
            method: Method::POST,
            body: Bytes::from_static(b"payload"),
            content_length: Some("7".to_string()),
            authorization: Some("Bearer secret".to_string()),
        }],
        *state.landed.lock().unwrap()
    );
}

#[tokio::test]
async fn credentials_are_dropped_when_the_host_changes() {
    let (addr, state) = spawn_redirect_server().await;
    let request = Request::get(format!("http://{addr}/cross"))
        .header(AUTHORIZATION, "Bearer secret")
        .body(None)
        .unwrap();

    let (status, _) = client().send_recv(request).await.unwrap();

    assert_eq!(StatusCode::OK, status);
    let landed = state.landed.lock().unwrap();
    assert_eq!(1, landed.len());
    assert_eq!(Method::GET, landed[0].method);
    assert_eq!(None, landed[0].authorization);
}
