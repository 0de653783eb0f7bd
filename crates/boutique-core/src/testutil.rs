//! Shared test support: a one-shot HTTP mock backend built on tiny_http.
//!
//! The server thread answers a fixed queue of canned responses, records what
//! it received, and hands the recorded requests back through `join()`.

use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tiny_http::{Header, Response, Server};

use crate::api::ApiClient;
use crate::db::LocalStore;

pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: String::new(),
        }
    }
}

pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub authorization: Option<String>,
}

/// Spawn a mock backend serving `responses` in order. Returns the base URL
/// and a handle yielding the recorded requests.
pub fn spawn_server(responses: Vec<MockResponse>) -> (String, JoinHandle<Vec<RecordedRequest>>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}", port);

    let handle = std::thread::spawn(move || {
        let mut recorded = Vec::new();
        for canned in responses {
            let mut request = server
                .recv_timeout(Duration::from_secs(10))
                .unwrap()
                .expect("mock server timed out waiting for a request");

            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            let authorization = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Authorization"))
                .map(|h| h.value.to_string());

            recorded.push(RecordedRequest {
                method: request.method().to_string(),
                url: request.url().to_string(),
                body,
                authorization,
            });

            let content_type =
                Header::from_bytes(&b"Content-Type"[..], canned.content_type.as_bytes()).unwrap();
            let response = Response::from_string(canned.body)
                .with_status_code(canned.status)
                .with_header(content_type);
            request.respond(response).unwrap();
        }
        recorded
    });

    (base_url, handle)
}

/// A LocalStore on a temporary file, with its guard.
pub fn temp_store() -> (tempfile::TempDir, Arc<LocalStore>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boutique.redb");
    let store = Arc::new(LocalStore::open(path.to_str()).unwrap());
    (dir, store)
}

/// An ApiClient wired to a fresh temp store against the given base URL.
pub fn client_against(base_url: &str) -> (tempfile::TempDir, ApiClient) {
    let (dir, store) = temp_store();
    (dir, ApiClient::with_base_url(base_url, store))
}
