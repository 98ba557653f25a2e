//! Main-side request handling: channel name → handler

use super::envelope::{error_payload, Payload, Request};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Emits a response on a correlation id (the main side of the transport)
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, correlation_id: &str, payload: Payload);
}

type Handler<C> = Arc<dyn Fn(Arc<C>, Payload) -> BoxFuture<'static, Result<Payload, String>> + Send + Sync>;

/// Registry of named handlers sharing a context `C`.
///
/// Each request runs as its own task; requests on the same channel are not
/// serialised against each other. A handler that fails or panics still produces
/// exactly one response, carrying an `error` field.
pub struct Dispatcher<C> {
    context: Arc<C>,
    handlers: HashMap<String, Handler<C>>,
}

impl<C: Send + Sync + 'static> Dispatcher<C> {
    pub fn new(context: Arc<C>) -> Self {
        Self {
            context,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `channel`, replacing any previous one
    pub fn register<F, Fut, E>(&mut self, channel: &str, handler: F) -> &mut Self
    where
        F: Fn(Arc<C>, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let handler = Arc::new(handler);
        let boxed: Handler<C> = Arc::new(move |ctx, payload| {
            let handler = handler.clone();
            async move { handler(ctx, payload).await.map_err(|e| e.to_string()) }.boxed()
        });
        self.handlers.insert(channel.to_string(), boxed);
        self
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.handlers.contains_key(channel)
    }

    /// Registered channel names, sorted
    pub fn channels(&self) -> Vec<&str> {
        let mut channels: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        channels.sort_unstable();
        channels
    }

    /// Run the handler for `request` and build its response.
    ///
    /// Returns `None` when no handler is registered for the channel; such a
    /// request is never answered.
    pub async fn handle(&self, request: Request) -> Option<Payload> {
        let Some(handler) = self.handlers.get(&request.channel).cloned() else {
            log::warn!("No handler registered for channel '{}'", request.channel);
            return None;
        };

        log::debug!(
            "Handling {} ({})",
            request.channel,
            request.correlation_id
        );

        let context = self.context.clone();
        let payload = request.payload;
        let outcome = AssertUnwindSafe(async move { handler(context, payload).await })
            .catch_unwind()
            .await;

        let response = match outcome {
            Ok(Ok(payload)) => payload,
            Ok(Err(message)) => {
                log::warn!("{} failed: {}", request.channel, message);
                error_payload(message)
            }
            Err(_) => {
                log::error!("{} handler panicked", request.channel);
                error_payload(format!("{} handler panicked", request.channel))
            }
        };

        Some(response)
    }

    /// Handle `request` on its own task and emit the response through `responder`
    pub fn spawn(
        self: &Arc<Self>,
        request: Request,
        responder: Arc<dyn Responder>,
    ) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let correlation_id = request.correlation_id.clone();
            if let Some(response) = dispatcher.handle(request).await {
                responder.respond(&correlation_id, response);
            }
        })
    }

    /// Serve requests until the sending side is dropped
    pub async fn serve(
        self: Arc<Self>,
        mut requests: mpsc::UnboundedReceiver<Request>,
        responder: Arc<dyn Responder>,
    ) {
        while let Some(request) = requests.recv().await {
            self.spawn(request, responder.clone());
        }
        log::debug!("Request queue closed, dispatcher stopping");
    }
}
