//! HTTP transport for the Apps Script webhook.
//!
//! The sync engine talks to the sheet through [`SheetTransport`] so fetch and
//! dispatch logic can run against a scripted transport in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PipelineError;

/// Status code and raw body of a webhook response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait SheetTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<TransportResponse, PipelineError>;

    /// POST a JSON document. `body` is already serialized.
    async fn post_json(&self, url: &str, body: String) -> Result<TransportResponse, PipelineError>;
}

/// reqwest-backed transport with a per-request timeout.
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::ConfigurationError(format!("HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    fn map_err(&self, err: reqwest::Error) -> PipelineError {
        if err.is_timeout() {
            PipelineError::Timeout(self.timeout.as_secs())
        } else {
            PipelineError::NetworkError(err.to_string())
        }
    }

    async fn into_response(
        &self,
        resp: reqwest::Response,
    ) -> Result<TransportResponse, PipelineError> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.map_err(e))?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl SheetTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, PipelineError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;
        self.into_response(resp).await
    }

    async fn post_json(&self, url: &str, body: String) -> Result<TransportResponse, PipelineError> {
        let resp = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;
        self.into_response(resp).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for fetch/dispatch tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub type Scripted = Result<TransportResponse, PipelineError>;

    #[derive(Default)]
    pub struct ScriptedTransport {
        gets: Mutex<VecDeque<Scripted>>,
        posts: Mutex<VecDeque<Scripted>>,
        /// Bodies of every POST, in call order.
        pub posted: Mutex<Vec<String>>,
        pub get_calls: Mutex<usize>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_get(self, response: Scripted) -> Self {
            self.gets.lock().unwrap().push_back(response);
            self
        }

        pub fn on_post(self, response: Scripted) -> Self {
            self.posts.lock().unwrap().push_back(response);
            self
        }

        pub fn post_count(&self) -> usize {
            self.posted.lock().unwrap().len()
        }

        /// Number of rows carried by each POST body.
        pub fn posted_batch_sizes(&self) -> Vec<usize> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .map(|b| {
                    let v: serde_json::Value = serde_json::from_str(b).unwrap();
                    v["data"].as_array().unwrap().len()
                })
                .collect()
        }
    }

    #[async_trait]
    impl SheetTransport for ScriptedTransport {
        async fn get(&self, _url: &str) -> Result<TransportResponse, PipelineError> {
            *self.get_calls.lock().unwrap() += 1;
            self.gets
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::new(200, "[]")))
        }

        async fn post_json(
            &self,
            _url: &str,
            body: String,
        ) -> Result<TransportResponse, PipelineError> {
            self.posted.lock().unwrap().push(body);
            self.posts
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::new(200, r#"{"status":"ok"}"#)))
        }
    }
}
