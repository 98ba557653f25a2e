//! In-process transport: a request queue plus correlation-id keyed listeners

use super::client::Transport;
use super::dispatcher::{Dispatcher, Responder};
use super::envelope::{Payload, Request};
use super::RelayError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

type Listeners = Arc<Mutex<HashMap<String, oneshot::Sender<Payload>>>>;

/// Connects a [`super::RelayClient`] to a [`Dispatcher`] living in the same process
pub struct LocalBus {
    requests: mpsc::UnboundedSender<Request>,
    listeners: Listeners,
}

impl LocalBus {
    /// Create a bus and the receiving end of its request queue
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Request>) {
        let (requests, rx) = mpsc::unbounded_channel();
        let bus = Arc::new(Self {
            requests,
            listeners: Arc::new(Mutex::new(HashMap::new())),
        });
        (bus, rx)
    }

    /// Create a bus whose requests are served by `dispatcher` on a background task
    pub fn spawn_with<C: Send + Sync + 'static>(dispatcher: Arc<Dispatcher<C>>) -> Arc<Self> {
        let (bus, rx) = Self::new();
        tokio::spawn(dispatcher.serve(rx, bus.responder()));
        bus
    }

    /// Main-side handle emitting responses onto this bus
    pub fn responder(&self) -> Arc<dyn Responder> {
        Arc::new(BusResponder {
            listeners: self.listeners.clone(),
        })
    }

    /// Number of requests still waiting for a response
    pub fn pending(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl Transport for LocalBus {
    fn once(&self, correlation_id: &str) -> oneshot::Receiver<Payload> {
        let (tx, rx) = oneshot::channel();
        self.listeners
            .lock()
            .unwrap()
            .insert(correlation_id.to_string(), tx);
        rx
    }

    fn dispatch(&self, request: Request) -> Result<(), RelayError> {
        self.requests
            .send(request)
            .map_err(|e| RelayError::Closed(format!("request queue closed ({})", e.0.channel)))
    }

    fn forget(&self, correlation_id: &str) {
        self.listeners.lock().unwrap().remove(correlation_id);
    }
}

struct BusResponder {
    listeners: Listeners,
}

impl Responder for BusResponder {
    fn respond(&self, correlation_id: &str, payload: Payload) {
        let listener = self.listeners.lock().unwrap().remove(correlation_id);
        match listener {
            Some(tx) => {
                if tx.send(payload).is_err() {
                    log::debug!("Listener for {} went away", correlation_id);
                }
            }
            None => log::debug!("No listener for {}", correlation_id),
        }
    }
}
