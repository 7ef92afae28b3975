use crate::models::ChatMessage;
use crate::sync::token::AuthToken;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub const USER_ID_HEADER: &str = "X-User-ID";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Unauthorized)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EventStart {
    #[serde(rename = "dateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Google Calendar event as relayed by the backend; only the fields the
/// client reads.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteEvent {
    #[serde(default)]
    pub start: Option<EventStart>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteTask {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub due: Option<String>,
    #[serde(rename = "listTitle", default)]
    pub list_title: Option<String>,
}

#[derive(Deserialize)]
struct ItemsResponse<T> {
    items: Option<Vec<T>>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatMessage],
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Data endpoints the sync manager depends on.
pub trait Backend: Send + Sync {
    fn fetch_events(&self, token: Option<&AuthToken>) -> Result<Vec<RemoteEvent>, FetchError>;
    fn fetch_tasks(&self, token: Option<&AuthToken>) -> Result<Vec<RemoteTask>, FetchError>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `timeout_seconds == 0` leaves requests unbounded.
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self, FetchError> {
        let timeout = (timeout_seconds > 0).then(|| Duration::from_secs(timeout_seconds));
        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn send_chat(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatResponse, FetchError> {
        let resp = self
            .client
            .post(format!("{}/chat", self.base_url))
            .json(&ChatRequest { message, history })
            .send()?;
        let resp = check_status(resp)?;
        Ok(resp.json()?)
    }

    fn get_items<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: Option<&AuthToken>,
    ) -> Result<Vec<T>, FetchError> {
        let request = self.client.get(format!("{}/{endpoint}", self.base_url));
        let resp = with_identity(request, token).send()?;
        let resp = check_status(resp)?;
        let body: ItemsResponse<T> = resp.json()?;
        Ok(body.items.unwrap_or_default())
    }
}

impl Backend for HttpBackend {
    fn fetch_events(&self, token: Option<&AuthToken>) -> Result<Vec<RemoteEvent>, FetchError> {
        self.get_items("events", token)
    }

    fn fetch_tasks(&self, token: Option<&AuthToken>) -> Result<Vec<RemoteTask>, FetchError> {
        self.get_items("tasks", token)
    }
}

fn with_identity(request: RequestBuilder, token: Option<&AuthToken>) -> RequestBuilder {
    match token {
        Some(token) => request.header(USER_ID_HEADER, token.as_str()),
        None => request,
    }
}

fn check_status(resp: Response) -> Result<Response, FetchError> {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(FetchError::Unauthorized);
    }
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Author;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    // The blocking client owns its own runtime, so it is built, used and
    // dropped on a blocking thread.
    async fn on_blocking<T, F>(f: F) -> T
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f).await.expect("blocking task")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn events_request_carries_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .and(header(USER_ID_HEADER, "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"summary": "Standup", "start": {"dateTime": "2025-06-15T09:00:00Z"}},
                    {"start": {"date": "2025-03-10"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let events = on_blocking(move || {
            let backend = HttpBackend::new(&uri, 5).expect("client");
            backend.fetch_events(AuthToken::new("abc123").as_ref())
        })
        .await
        .expect("events");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].summary.as_deref(), Some("Standup"));
        assert_eq!(
            events[1].start.as_ref().and_then(|s| s.date.as_deref()),
            Some("2025-03-10")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn requests_without_token_omit_the_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"title": "Pay rent", "due": "2025-06-20T00:00:00.000Z", "listTitle": "Home"}]
            })))
            .mount(&server)
            .await;

        let uri = server.uri();
        let tasks = on_blocking(move || {
            let backend = HttpBackend::new(&uri, 5).expect("client");
            backend.fetch_tasks(None)
        })
        .await
        .expect("tasks");

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].list_title.as_deref(), Some("Home"));

        let received: Vec<Request> = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
        assert!(!received[0].headers.contains_key(USER_ID_HEADER));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_items_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let uri = server.uri();
        let tasks = on_blocking(move || HttpBackend::new(&uri, 5).expect("client").fetch_tasks(None))
            .await
            .expect("tasks");
        assert!(tasks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unauthorized_and_bad_bodies_are_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "User not authenticated"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let (events, tasks) = on_blocking(move || {
            let backend = HttpBackend::new(&uri, 5).expect("client");
            (backend.fetch_events(None), backend.fetch_tasks(None))
        })
        .await;

        assert!(matches!(events, Err(FetchError::Unauthorized)));
        assert!(matches!(tasks, Err(FetchError::Decode(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn server_errors_keep_their_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let uri = server.uri();
        let result = on_blocking(move || HttpBackend::new(&uri, 5).expect("client").fetch_events(None)).await;
        match result {
            Err(FetchError::Status(status)) => assert_eq!(status, StatusCode::BAD_GATEWAY),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn chat_posts_message_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(body_partial_json(json!({
                "message": "What's on today?",
                "history": [{"author": "jarvis", "content": "Hello"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"reply": "Two meetings.", "error": null})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let reply = on_blocking(move || {
            let history = vec![ChatMessage {
                id: 1,
                author: Author::Jarvis,
                content: "Hello".to_string(),
                timestamp: "09:00 AM".to_string(),
            }];
            HttpBackend::new(&uri, 5)
                .expect("client")
                .send_chat("What's on today?", &history)
        })
        .await
        .expect("chat");

        assert_eq!(reply.reply, "Two meetings.");
        assert_eq!(reply.error, None);
    }
}
