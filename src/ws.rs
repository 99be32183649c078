use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use anyhow::{bail, Result};
use embedded_svc::ws::FrameType;
use esp_idf_svc::io::EspIOError;
use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, WebSocketEvent, WebSocketEventType,
};
use log::{debug, warn};

use crate::connectivity::{SessionEvent, SessionTransport};

/// How long a send may block the caller waiting for the client task.
/// A frame that misses it is dropped.
const SEND_TIMEOUT: Duration = Duration::from_millis(50);

/// WebSocket client whose callbacks are queued until the next poll.
///
/// The IDF client runs on its own task. Its automatic reconnect is disabled,
/// retries are left to the connectivity state machine.
pub struct EspSession {
    client: Option<EspWebSocketClient<'static>>,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl EspSession {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            client: None,
            events_tx,
            events_rx,
        }
    }
}

impl Default for EspSession {
    fn default() -> Self {
        Self::new()
    }
}

fn translate(event: &Result<WebSocketEvent<'_>, EspIOError>) -> Option<SessionEvent> {
    let event = match event {
        Ok(event) => event,
        Err(e) => {
            warn!("WebSocket error: {:?}", e);
            return None;
        }
    };

    match event.event_type {
        WebSocketEventType::Connected => Some(SessionEvent::Opened),
        WebSocketEventType::Disconnected
        | WebSocketEventType::Close(_)
        | WebSocketEventType::Closed => Some(SessionEvent::Closed),
        WebSocketEventType::Text(text) => Some(SessionEvent::Message(text.to_string())),
        WebSocketEventType::Ping => Some(SessionEvent::Ping),
        WebSocketEventType::Pong => Some(SessionEvent::Pong),
        _ => None,
    }
}

impl SessionTransport for EspSession {
    fn connect(&mut self, url: &str) -> Result<()> {
        self.close();
        // Leftovers from the previous client must not be read as news about this one
        while self.events_rx.try_recv().is_ok() {}

        let config = EspWebSocketClientConfig {
            disable_auto_reconnect: true,
            ..Default::default()
        };
        let events = self.events_tx.clone();
        let client = EspWebSocketClient::new(url, &config, SEND_TIMEOUT, move |event| {
            if let Some(event) = translate(event) {
                // Only fails once the session itself is gone
                let _ = events.send(event);
            }
        })?;

        self.client = Some(client);
        Ok(())
    }

    fn send_text(&mut self, payload: &str) -> Result<()> {
        let Some(client) = self.client.as_mut() else {
            bail!("WebSocket not connected");
        };
        if let Err(e) = client.send(FrameType::Text(false), payload.as_bytes()) {
            warn!("WS dropped {} bytes after {:?}: {:?}", payload.len(), SEND_TIMEOUT, e);
            return Err(e.into());
        }
        debug!("WS sent {} bytes", payload.len());
        Ok(())
    }

    fn poll(&mut self) -> Vec<SessionEvent> {
        self.events_rx.try_iter().collect()
    }

    fn close(&mut self) {
        if self.client.take().is_some() {
            debug!("WebSocket client dropped");
        }
    }
}
