//! Transports for OpenAI-compatible APIs.
//!
//! Two shapes are supported: the "responses" API, through
//! [`ResponsesTransport`], and the "chat completions" API, through
//! [`ChatCompletionsTransport`]. The latter also works with most
//! compatible servers.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use chatkit_model::{
    ApiKind, ChatCompletion, ErrorKind, ProviderResponse, ResponsesOutput,
    Transport, TransportError, TransportRequest,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::Instrument;

pub use config::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAIConfig, OpenAIConfigBuilder,
};

/// Error type of the transports in this crate.
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
    body: Option<String>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
            body: None,
        }
    }

    fn from_status(status: StatusCode, body: String) -> Self {
        let kind = if status == StatusCode::TOO_MANY_REQUESTS {
            ErrorKind::RateLimitExceeded
        } else {
            ErrorKind::Status
        };
        Self {
            message: format!("provider responded with {status}"),
            kind,
            status: Some(status.as_u16()),
            body: Some(body),
        }
    }

    fn from_encoding(err: serde_json::Error) -> Self {
        Self::new(format!("cannot encode the request: {err}"), ErrorKind::Other)
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() || err.is_request() {
            ErrorKind::Network
        } else {
            ErrorKind::Other
        };
        Self::new(format!("{err}"), kind)
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns whether sending the same request again may succeed.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_transient()
            || self.status.is_some_and(|status| status >= 500)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(body) = &self.body {
            write!(f, ": {body}")?;
        }
        Ok(())
    }
}

impl StdError for Error {}

impl TransportError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status(&self) -> Option<u16> {
        self.status
    }

    #[inline]
    fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// Transport for the OpenAI "responses" API.
#[derive(Clone, Debug)]
pub struct ResponsesTransport {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl ResponsesTransport {
    /// Creates a new `ResponsesTransport` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Transport for ResponsesTransport {
    type Error = Error;

    #[inline]
    fn api_kind(&self) -> ApiKind {
        ApiKind::Responses
    }

    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<ProviderResponse, Self::Error>> + Send + 'static
    {
        let body = serde_json::to_value(proto::create_responses_request(
            req,
            &self.config.model,
        ));
        let url = self.config.url_for("/responses");
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            let body = body.map_err(Error::from_encoding)?;
            let output: ResponsesOutput =
                post_json(&client, &config, &url, &body).await?;
            Ok(ProviderResponse::Responses(output))
        }
        .instrument(debug_span!("responses request"))
    }
}

/// Transport for the "chat completions" API, usable with any compatible
/// server.
#[derive(Clone, Debug)]
pub struct ChatCompletionsTransport {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl ChatCompletionsTransport {
    /// Creates a new `ChatCompletionsTransport` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Transport for ChatCompletionsTransport {
    type Error = Error;

    #[inline]
    fn api_kind(&self) -> ApiKind {
        ApiKind::ChatCompletions
    }

    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<ProviderResponse, Self::Error>> + Send + 'static
    {
        let body = serde_json::to_value(proto::create_chat_completion_request(
            req,
            &self.config.model,
        ));
        let url = self.config.url_for("/chat/completions");
        let client = self.client.clone();
        let config = Arc::clone(&self.config);

        async move {
            let body = body.map_err(Error::from_encoding)?;
            let completion: ChatCompletion =
                post_json(&client, &config, &url, &body).await?;
            Ok(ProviderResponse::ChatCompletion(completion))
        }
        .instrument(debug_span!("chat completion request"))
    }
}

/// Posts the body and decodes the response, retrying transient failures
/// if the config asks for it.
async fn post_json<R: DeserializeOwned>(
    client: &Client,
    config: &OpenAIConfig,
    url: &str,
    body: &Value,
) -> Result<R, Error> {
    let Some(budget) = config.retry_budget else {
        return post_json_once(client, config, url, body).await;
    };

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(200))
        .with_max_elapsed_time(Some(budget))
        .build();
    backoff::future::retry(policy, move || async move {
        post_json_once(client, config, url, body).await.map_err(|err| {
            if err.is_retryable() {
                warn!("request failed, will retry: {err}");
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            }
        })
    })
    .await
}

async fn post_json_once<R: DeserializeOwned>(
    client: &Client,
    config: &OpenAIConfig,
    url: &str,
    body: &Value,
) -> Result<R, Error> {
    trace!("posting to {url}");
    let mut builder = client.post(url).bearer_auth(&config.api_key).json(body);
    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    let resp = builder.send().await.map_err(Error::from_reqwest)?;
    let status = resp.status();
    let text = resp.text().await.map_err(Error::from_reqwest)?;
    if !status.is_success() {
        error!("provider responded with {status}");
        return Err(Error::from_status(status, text));
    }

    serde_json::from_str(&text).map_err(|err| {
        error!("cannot decode the response: {err}");
        Error {
            message: format!("cannot decode the response: {err}"),
            kind: ErrorKind::InvalidResponse,
            status: Some(status.as_u16()),
            body: Some(text.clone()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors() {
        let err = Error::from_status(
            StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_owned(),
        );
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.body(), Some("slow down"));
        assert!(err.is_retryable());

        let err = Error::from_status(StatusCode::BAD_GATEWAY, String::new());
        assert_eq!(err.kind(), ErrorKind::Status);
        assert!(err.is_retryable());

        let body = r#"{"error":"bad key"}"#;
        let err = Error::from_status(StatusCode::UNAUTHORIZED, body.to_owned());
        assert_eq!(err.kind(), ErrorKind::Status);
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            format!("provider responded with 401 Unauthorized: {body}")
        );
    }
}
