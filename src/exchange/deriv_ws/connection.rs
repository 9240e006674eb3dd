// src/exchange/deriv_ws/connection.rs

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, trace, warn};

use crate::exchange::deriv_ws::protocol::match_reply;
use crate::exchange::deriv_ws::{WsSink, WsStream};
use crate::exchange::types::BrokerError;

/// One short-lived websocket: open, a few request/reply exchanges, close.
pub(crate) struct Session {
    sink: WsSink,
    stream: WsStream,
    response_timeout: Duration,
    next_req_id: u64,
}

impl Session {
    pub(crate) async fn open(
        url: &str,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, BrokerError> {
        debug!(url = %url, "Opening Deriv WS connection...");
        match timeout(connect_timeout, connect_async(url)).await {
            Ok(Ok((ws_stream, response))) => {
                debug!(status = %response.status(), "Deriv WS connection established.");
                let (sink, stream) = ws_stream.split();
                Ok(Self { sink, stream, response_timeout, next_req_id: 1 })
            }
            Ok(Err(e)) => {
                error!("Deriv WS connection error: {}", e);
                Err(BrokerError::Connect(e.to_string()))
            }
            Err(_) => {
                error!("Deriv WS connection timed out after {:?}.", connect_timeout);
                Err(BrokerError::Connect(format!("timed out after {} seconds", connect_timeout.as_secs())))
            }
        }
    }

    /// Sends `payload` tagged with a fresh `req_id` and waits for the reply to it.
    /// Frames that belong to something else are skipped.
    pub(crate) async fn request(&mut self, mut payload: Value, msg_type: &str) -> Result<Value, BrokerError> {
        let req_id = self.next_req_id;
        self.next_req_id += 1;
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("req_id".into(), req_id.into());
        }

        let text = payload.to_string();
        trace!("Sending Deriv request: {}", text);
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| BrokerError::Protocol(format!("send {} failed: {}", msg_type, e)))?;

        let deadline = Instant::now() + self.response_timeout;
        loop {
            let frame = match timeout_at(deadline, self.stream.next()).await {
                Ok(frame) => frame,
                Err(_) => {
                    warn!(msg_type, req_id, "Deriv reply timed out.");
                    return Err(BrokerError::Timeout(self.response_timeout.as_secs()));
                }
            };

            match frame {
                None => return Err(BrokerError::Closed),
                Some(Err(e)) => return Err(BrokerError::Protocol(e.to_string())),
                Some(Ok(Message::Text(text))) => {
                    trace!("Received Deriv WS text: {}", text);
                    if let Some(reply) = match_reply(text.as_str(), req_id, msg_type)? {
                        return Ok(reply);
                    }
                    debug!(msg_type, req_id, "Skipping unrelated Deriv frame.");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!("Deriv WS closed by remote: {:?}", frame);
                    return Err(BrokerError::Closed);
                }
                Some(Ok(Message::Binary(data))) => {
                    warn!("Unexpected binary frame from Deriv ({} bytes)", data.len());
                }
                Some(Ok(_)) => {}
            }
        }
    }

    /// Best effort; a failed close is only logged.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            debug!("Deriv WS close frame not sent: {}", e);
        }
        let _ = self.sink.close().await;
    }
}
