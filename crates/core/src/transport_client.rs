use std::pin::Pin;
use std::sync::Arc;

use chatkit_model::{
    ApiKind, ProviderResponse, Transport, TransportError, TransportRequest,
};
use tracing::Instrument;

type SendResult = Result<ProviderResponse, Box<dyn TransportError>>;
type BoxedSendFuture = Pin<Box<dyn Future<Output = SendResult> + Send>>;
type HandlerFn = Arc<dyn Fn(TransportRequest) -> BoxedSendFuture + Send + Sync>;

/// A wrapper around a transport that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct TransportClient {
    api_kind: ApiKind,
    handler_fn: HandlerFn,
}

impl TransportClient {
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        let api_kind = transport.api_kind();
        // Erase `T`, so that the agent doesn't need a generic parameter.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = transport.send(&req);
            Box::pin(
                async move {
                    trace!(
                        "sending {} input items and {} tools",
                        req.input.len(),
                        req.tools.len()
                    );
                    match fut.await {
                        Ok(resp) => {
                            trace!("got a response: {resp:?}");
                            Ok(resp)
                        }
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(Box::new(err) as Box<dyn TransportError>)
                        }
                    }
                }
                .instrument(trace_span!("transport request", api = %api_kind)),
            )
        });
        Self {
            api_kind,
            handler_fn,
        }
    }

    #[inline]
    pub fn api_kind(&self) -> ApiKind {
        self.api_kind
    }

    /// Sends a request and returns the decoded response.
    #[inline]
    pub async fn send(&self, req: TransportRequest) -> SendResult {
        (self.handler_fn)(req).await
    }
}
