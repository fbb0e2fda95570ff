use std::error::Error;

use serde_json::Value;

use crate::api::ApiKind;
use crate::error::ErrorKind;
use crate::response::ProviderResponse;

/// The error type for a transport.
///
/// Provider error bodies must be kept unmodified, so that callers can
/// diagnose what went wrong on the provider side.
pub trait TransportError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the HTTP status code, if the provider answered.
    fn status(&self) -> Option<u16> {
        None
    }

    /// Returns the raw body the provider answered with, if any.
    fn body(&self) -> Option<&str> {
        None
    }
}

/// A request to be sent through a transport.
///
/// Both fields are already in the wire shape of the transport's API, as
/// formatted by the matching adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportRequest {
    /// The conversation history.
    pub input: Vec<Value>,
    /// Tools that are available to the model.
    pub tools: Vec<Value>,
}

/// A type that carries a conversation to the model provider and brings
/// the response back.
///
/// Once the transport is created, it should behave like a stateless
/// object. It can still have internal state (connection pools, etc.), but
/// callers should not rely on it. Timeout and retry policies belong to
/// the transport, the agent loop never retries on its own.
pub trait Transport: Send + Sync {
    /// The error type that may be returned by the transport.
    type Error: TransportError;

    /// Returns the API kind this transport speaks.
    fn api_kind(&self) -> ApiKind;

    /// Sends a request to the model.
    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<ProviderResponse, Self::Error>> + Send + 'static;
}
