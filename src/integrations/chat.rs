use crate::integrations::backend::{ChatResponse, FetchError, HttpBackend};
use crate::models::{Author, ChatMessage};
use chrono::Local;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tracing::warn;

pub const GREETING: &str = "Welcome back sir! How may I assist you today?";
pub const FALLBACK_REPLY: &str =
    "Sorry, I couldn't reach the backend. Please check if the server is running.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub reply: String,
    pub error: Option<String>,
}

/// Sends the message on a background thread. The receiver always yields
/// exactly one reply; failures turn into the fallback text.
pub fn spawn_chat(
    backend: Arc<HttpBackend>,
    message: String,
    history: Vec<ChatMessage>,
) -> Receiver<ChatReply> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let reply = into_reply(backend.send_chat(&message, &history));
        let _ = sender.send(reply);
    });
    receiver
}

pub fn into_reply(result: Result<ChatResponse, FetchError>) -> ChatReply {
    match result {
        Ok(resp) => ChatReply {
            reply: resp.reply,
            error: resp.error,
        },
        Err(e) => {
            warn!(error = %e, "chat request failed");
            ChatReply {
                reply: FALLBACK_REPLY.to_string(),
                error: Some(e.to_string()),
            }
        }
    }
}

pub fn chat_timestamp() -> String {
    Local::now().format("%I:%M %p").to_string()
}

pub fn greeting() -> ChatMessage {
    ChatMessage {
        id: 1,
        author: Author::Jarvis,
        content: GREETING.to_string(),
        timestamp: chat_timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn failures_become_the_fallback_reply() {
        let reply = into_reply(Err(FetchError::Transport("connection refused".to_string())));
        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert!(reply.error.is_some_and(|e| e.contains("connection refused")));
    }

    #[test]
    fn backend_errors_are_passed_through() {
        let reply = into_reply(Ok(ChatResponse {
            reply: "I could not check your calendar.".to_string(),
            error: Some("calendar unavailable".to_string()),
        }));
        assert_eq!(reply.reply, "I could not check your calendar.");
        assert_eq!(reply.error.as_deref(), Some("calendar unavailable"));
    }

    #[test]
    fn greeting_comes_from_jarvis() {
        let message = greeting();
        assert_eq!(message.author, Author::Jarvis);
        assert_eq!(message.content, GREETING);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn spawned_chat_reports_server_errors_as_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let uri = server.uri();
        let reply = tokio::task::spawn_blocking(move || {
            let backend = Arc::new(HttpBackend::new(&uri, 5).expect("client"));
            let rx = spawn_chat(backend, "hello".to_string(), vec![greeting()]);
            rx.recv_timeout(Duration::from_secs(10)).expect("reply")
        })
        .await
        .expect("blocking task");

        assert_eq!(reply.reply, FALLBACK_REPLY);
        assert!(reply.error.is_some());
    }
}
