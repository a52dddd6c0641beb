//! Shared helpers for the integration tests: a local collaborator mock and
//! a scripted operator prompt.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;

use internadmin::config::Settings;
use internadmin::error::AdminError;
use internadmin::prompt::Prompt;

/// Serve an axum router on an ephemeral port.
pub async fn spawn(app: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });
    addr
}

/// Settings pointed at the mock, with fast retries.
pub fn test_settings(addr: SocketAddr) -> Settings {
    Settings {
        base_url: format!("http://{addr}"),
        request_timeout: 5,
        retry_attempts: 3,
        retry_base_delay_ms: 5,
        retry_max_delay_ms: 20,
        ..Settings::default()
    }
}

/// Prompt whose answers are scripted up front. Confirmations default to
/// yes once the script runs out; messages are captured for assertions.
#[derive(Default)]
pub struct ScriptedPrompt {
    confirms: Mutex<VecDeque<bool>>,
    choice: Mutex<Option<usize>>,
    messages: Mutex<Vec<(&'static str, String)>>,
}

impl ScriptedPrompt {
    pub fn with_confirms(answers: &[bool]) -> Self {
        Self {
            confirms: Mutex::new(answers.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn with_choice(index: Option<usize>) -> Self {
        Self {
            choice: Mutex::new(index),
            ..Self::default()
        }
    }

    pub fn messages(&self, level: &str) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl Prompt for ScriptedPrompt {
    async fn confirm(&self, _message: &str) -> Result<bool, AdminError> {
        Ok(self.confirms.lock().unwrap().pop_front().unwrap_or(true))
    }

    async fn choose(&self, _title: &str, options: &[String]) -> Result<Option<usize>, AdminError> {
        Ok((*self.choice.lock().unwrap()).filter(|i| *i < options.len()))
    }

    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(("info", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(("warn", message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(("error", message.to_string()));
    }
}
