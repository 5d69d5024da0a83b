//! Request/response plumbing over the browser WebSocket.
//!
//! One socket carries the browser connection and every attached page
//! session. Responses are routed back to callers by request id; events are
//! routed to the page session they belong to.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use crate::error::CdpError;
use crate::protocol::{CdpRequest, CdpResponse};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Shared sender half of the socket. Cheap to clone.
#[derive(Clone)]
pub(crate) struct Transport {
    ws_tx: Arc<tokio::sync::Mutex<WsSink>>,
    request_id: Arc<AtomicU64>,
    pending: Pending,
    events: Arc<EventRouter>,
    call_timeout: Duration,
}

impl Transport {
    /// Open the socket and spawn its receive loop.
    pub(crate) async fn connect(
        ws_url: &str,
        call_timeout: Duration,
    ) -> Result<(Self, tokio::task::JoinHandle<()>), CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let transport = Self {
            ws_tx: Arc::new(tokio::sync::Mutex::new(ws_sink)),
            request_id: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(EventRouter::default()),
            call_timeout,
        };

        let recv_task = {
            let pending = transport.pending.clone();
            let events = transport.events.clone();
            tokio::spawn(async move {
                receive_loop(ws_source, pending.clone(), events).await;
                // Dropping the senders fails every waiting call with SessionClosed.
                pending.lock().clear();
            })
        };

        Ok((transport, recv_task))
    }

    /// Send a command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) fn events(&self) -> &EventRouter {
        &self.events
    }
}

/// Page-session events by session id. Events for sessions nobody
/// subscribed to are dropped.
#[derive(Default)]
pub(crate) struct EventRouter {
    routes: Mutex<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>,
}

impl EventRouter {
    /// Route events for `session_id` to a fresh channel. The receiver must
    /// be drained until [`unsubscribe`](Self::unsubscribe) closes it.
    pub(crate) fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpResponse> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.lock().insert(session_id.to_string(), tx);
        rx
    }

    /// Stop routing events for `session_id` and close its channel.
    pub(crate) fn unsubscribe(&self, session_id: &str) {
        self.routes.lock().remove(session_id);
    }

    /// Deliver an event to its session. Returns whether anyone took it.
    pub(crate) fn route(&self, event: CdpResponse) -> bool {
        let session_id = event.session_id.clone().unwrap_or_default();
        let mut routes = self.routes.lock();
        match routes.get(&session_id) {
            Some(tx) if tx.send(event).is_ok() => true,
            Some(_) => {
                routes.remove(&session_id);
                false
            }
            None => false,
        }
    }
}

async fn receive_loop(mut ws_source: WsSource, pending: Pending, events: Arc<EventRouter>) {
    while let Some(msg) = ws_source.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                trace!("CDP recv: {}", text);
                let resp = match serde_json::from_str::<CdpResponse>(&text) {
                    Ok(resp) => resp,
                    Err(e) => {
                        warn!("Failed to parse CDP message: {}", e);
                        continue;
                    }
                };

                if let Some(id) = resp.id {
                    let waiting = pending.lock().remove(&id);
                    if let Some(tx) = waiting {
                        let result = match resp.error {
                            Some(error) => Err(CdpError::Protocol {
                                code: error.code,
                                message: error.message,
                            }),
                            None => Ok(resp.result.unwrap_or(Value::Null)),
                        };
                        let _ = tx.send(result);
                    }
                } else if resp.method.is_some() {
                    events.route(resp);
                }
            }
            Ok(Message::Close(_)) => {
                debug!("WebSocket closed");
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
}
