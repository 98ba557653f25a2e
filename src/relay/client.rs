//! Renderer-side request issuer

use super::envelope::{response_error, Payload, Request};
use super::RelayError;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The cross-process messaging primitive as seen from the renderer
pub trait Transport: Send + Sync {
    /// Register a one-shot listener for the response emitted on `correlation_id`
    fn once(&self, correlation_id: &str) -> oneshot::Receiver<Payload>;

    /// Send a request across the boundary
    fn dispatch(&self, request: Request) -> Result<(), RelayError>;

    /// Drop a listener that will never be answered
    fn forget(&self, _correlation_id: &str) {}
}

type Connector = Box<dyn Fn() -> Option<Arc<dyn Transport>> + Send + Sync>;

/// Issues named requests and pairs them with their responses.
///
/// The transport is obtained lazily on first use; if it cannot be obtained,
/// [`RelayClient::send`] fails immediately with [`RelayError::TransportUnavailable`].
/// There is no timeout: a request nobody answers stays pending.
pub struct RelayClient {
    transport: OnceLock<Arc<dyn Transport>>,
    connect: Connector,
}

impl RelayClient {
    /// Client bound to an already available transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let client = Self::detached();
        let _ = client.transport.set(transport);
        client
    }

    /// Client that obtains its transport on first use
    pub fn lazy<F>(connect: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn Transport>> + Send + Sync + 'static,
    {
        Self {
            transport: OnceLock::new(),
            connect: Box::new(connect),
        }
    }

    /// Client outside any host context; every send fails
    pub fn detached() -> Self {
        Self::lazy(|| None)
    }

    fn transport(&self) -> Result<Arc<dyn Transport>, RelayError> {
        if let Some(transport) = self.transport.get() {
            return Ok(transport.clone());
        }

        let transport = (self.connect)().ok_or(RelayError::TransportUnavailable)?;
        Ok(self.transport.get_or_init(|| transport).clone())
    }

    /// Send `payload` on `channel`.
    ///
    /// Returns synchronously with an error when the transport is unavailable;
    /// otherwise returns a future resolving to the correlated response, or to
    /// [`RelayError::Rejected`] when the response carries an `error` field.
    pub fn send(&self, channel: &str, payload: Payload) -> Result<PendingResponse, RelayError> {
        let transport = self.transport()?;
        let request = Request::from_wire(channel, payload);
        let correlation_id = request.correlation_id.clone();

        // Listen before dispatching so a fast response cannot be missed
        let receiver = transport.once(&correlation_id);
        if let Err(e) = transport.dispatch(request) {
            transport.forget(&correlation_id);
            return Err(e);
        }

        log::debug!("relay: sent {} as {}", channel, correlation_id);
        Ok(PendingResponse {
            correlation_id,
            receiver,
            transport,
            settled: false,
        })
    }

    /// `send` followed by awaiting the response
    pub async fn request(&self, channel: &str, payload: Payload) -> Result<Payload, RelayError> {
        self.send(channel, payload)?.await
    }
}

/// A response that has not arrived yet.
///
/// Dropping it before the response arrives unregisters its listener.
pub struct PendingResponse {
    correlation_id: String,
    receiver: oneshot::Receiver<Payload>,
    transport: Arc<dyn Transport>,
    settled: bool,
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("correlation_id", &self.correlation_id)
            .field("settled", &self.settled)
            .finish()
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        if !self.settled {
            self.transport.forget(&self.correlation_id);
        }
    }
}

impl Future for PendingResponse {
    type Output = Result<Payload, RelayError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let outcome = match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        self.settled = true;

        Poll::Ready(match outcome {
            Err(_) => Err(RelayError::Dropped),
            Ok(payload) => match response_error(&payload) {
                Some(error) => Err(RelayError::Rejected(error.clone())),
                None => Ok(payload),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::envelope::into_payload;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every request immediately with a canned payload
    struct CannedTransport {
        reply: Payload,
        listeners: Mutex<HashMap<String, oneshot::Sender<Payload>>>,
    }

    impl CannedTransport {
        fn new(reply: serde_json::Value) -> Arc<Self> {
            Arc::new(Self {
                reply: into_payload(reply),
                listeners: Mutex::new(HashMap::new()),
            })
        }
    }

    impl Transport for CannedTransport {
        fn once(&self, correlation_id: &str) -> oneshot::Receiver<Payload> {
            let (tx, rx) = oneshot::channel();
            self.listeners
                .lock()
                .unwrap()
                .insert(correlation_id.to_string(), tx);
            rx
        }

        fn dispatch(&self, request: Request) -> Result<(), RelayError> {
            if let Some(tx) = self.listeners.lock().unwrap().remove(&request.correlation_id) {
                let _ = tx.send(self.reply.clone());
            }
            Ok(())
        }
    }

    #[test]
    fn test_detached_client_fails_synchronously() {
        let client = RelayClient::detached();
        let result = client.send("connect", Payload::new());
        assert!(matches!(result, Err(RelayError::TransportUnavailable)));
    }

    #[test]
    fn test_lazy_transport_is_obtained_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let transport = CannedTransport::new(json!({}));
        let client = RelayClient::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(transport.clone() as Arc<dyn Transport>)
        });

        client.send("a", Payload::new()).unwrap();
        client.send("b", Payload::new()).unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_error_field_rejects_with_its_value() {
        let client = RelayClient::new(CannedTransport::new(json!({ "error": { "code": 3 } })));
        let err = client.request("log_in", Payload::new()).await.unwrap_err();
        assert_eq!(err.rejection(), Some(&json!({ "code": 3 })));
    }

    #[tokio::test]
    async fn test_plain_response_resolves() {
        let client = RelayClient::new(CannedTransport::new(json!({ "chiaRoot": "/root/.chia" })));
        let response = client.request("get_chia_root", Payload::new()).await.unwrap();
        assert_eq!(response["chiaRoot"], json!("/root/.chia"));
    }

    #[tokio::test]
    async fn test_dropped_listener_reports_dropped() {
        struct SilentTransport;
        impl Transport for SilentTransport {
            fn once(&self, _: &str) -> oneshot::Receiver<Payload> {
                let (_tx, rx) = oneshot::channel();
                rx
            }
            fn dispatch(&self, _: Request) -> Result<(), RelayError> {
                Ok(())
            }
        }

        let client = RelayClient::new(Arc::new(SilentTransport));
        let err = client.request("connect", Payload::new()).await.unwrap_err();
        assert!(matches!(err, RelayError::Dropped));
    }

    #[tokio::test]
    async fn test_dropping_pending_response_unregisters_listener() {
        let (bus, _requests) = crate::relay::LocalBus::new();
        let client = RelayClient::new(bus.clone());

        let pending: Vec<PendingResponse> = (0..100)
            .map(|_| client.send("connect", Payload::new()).unwrap())
            .collect();
        assert_eq!(bus.pending(), 100);

        drop(pending);
        assert_eq!(bus.pending(), 0);
    }

    #[tokio::test]
    async fn test_answered_response_leaves_no_listener() {
        let transport = CannedTransport::new(json!({ "ok": true }));
        let client = RelayClient::new(transport.clone());

        client.request("get_collections", Payload::new()).await.unwrap();
        assert!(transport.listeners.lock().unwrap().is_empty());
    }

    #[test]
    fn test_webview_bridge_listens_before_sending() {
        let page = include_str!("../../dist/index.html");
        let listen = page.find("await once(responseChannel").unwrap();
        let send = page.find("await invoke('relay_send'").unwrap();
        assert!(listen < send);
    }
}
