//! Link and session reconnect handling
//!
//! [`Connectivity::tick`] is called from the main loop and never blocks for
//! longer than one non-blocking poll of the session transport. Each tick looks
//! at the layers in a fixed order:
//!
//! 1. link not up: close any session, maybe start a link attempt, done
//! 2. session not open: maybe start a session attempt
//! 3. poll the transport once and handle whatever it buffered
//!
//! Attempts on each layer are spaced by that layer's backoff interval. A stalled
//! attempt is simply superseded by the next one once the interval has passed.

use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info, warn};

use crate::codec::{self, InboundCommand};
use crate::config::{Config, Credentials};

pub mod types;
pub use types::*;

/// Network association underneath the session (Wi-Fi on the device)
pub trait Link {
    fn status(&self) -> LinkStatus;

    /// Start connecting without waiting for the result
    fn begin_connect(&mut self, credentials: &Credentials) -> Result<()>;
}

/// Messaging session carried over the link (a WebSocket on the device)
pub trait SessionTransport {
    /// Start opening a session to `url`. Success is reported later as
    /// [`SessionEvent::Opened`].
    fn connect(&mut self, url: &str) -> Result<()>;

    fn send_text(&mut self, payload: &str) -> Result<()>;

    /// Events buffered since the last poll, without waiting for more
    fn poll(&mut self) -> Vec<SessionEvent>;

    /// Drop the current session, if any
    fn close(&mut self);
}

type Dispatch = Box<dyn FnMut(InboundCommand)>;

pub struct Connectivity<L, T> {
    link: L,
    transport: T,
    credentials: Credentials,
    url: String,
    hello: Option<String>,
    link_backoff: Duration,
    session_backoff: Duration,
    link_status: LinkStatus,
    session: SessionState,
    last_link_attempt: Option<Instant>,
    last_session_attempt: Option<Instant>,
    dispatch: Option<Dispatch>,
}

/// `true` when no attempt was made yet or `interval` has passed since the last one
fn attempt_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last.map_or(true, |last| now.saturating_duration_since(last) >= interval)
}

impl<L: Link, T: SessionTransport> Connectivity<L, T> {
    pub fn new(link: L, transport: T, config: &Config) -> Self {
        let hello = match codec::encode_hello(&config.identity) {
            Ok(hello) => Some(hello),
            Err(e) => {
                warn!("Failed to encode greeting: {}", e);
                None
            }
        };

        Self {
            link,
            transport,
            credentials: config.network.credentials,
            url: config.network.endpoint.url(),
            hello,
            link_backoff: config.network.link_backoff,
            session_backoff: config.network.session_backoff,
            link_status: LinkStatus::Down,
            session: SessionState::Closed,
            last_link_attempt: None,
            last_session_attempt: None,
            dispatch: None,
        }
    }

    /// Register the callback for decoded inbound commands, replacing any earlier one
    pub fn set_dispatch(&mut self, dispatch: impl FnMut(InboundCommand) + 'static) {
        self.dispatch = Some(Box::new(dispatch));
    }

    /// Link status seen by the last tick
    pub fn link_status(&self) -> LinkStatus {
        self.link_status
    }

    pub fn session_state(&self) -> SessionState {
        self.session
    }

    pub fn is_session_open(&self) -> bool {
        self.session == SessionState::Open
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn tick(&mut self, now: Instant) {
        let status = self.link.status();
        if status != self.link_status {
            info!("WiFi {}", status);
            self.link_status = status;
        }

        if status != LinkStatus::Up {
            if self.session != SessionState::Closed {
                info!("WiFi lost, dropping WebSocket");
                self.transport.close();
                self.session = SessionState::Closed;
            }
            self.connect_link_if_due(now);
            return;
        }

        if self.session != SessionState::Open {
            self.connect_session_if_due(now);
        }

        for event in self.transport.poll() {
            self.handle_event(event);
        }
    }

    fn connect_link_if_due(&mut self, now: Instant) {
        if !attempt_due(self.last_link_attempt, now, self.link_backoff) {
            return;
        }
        self.last_link_attempt = Some(now);

        info!("Connecting to WiFi {}...", self.credentials.ssid);
        if let Err(e) = self.link.begin_connect(&self.credentials) {
            warn!("WiFi connection attempt failed: {:?}", e);
        }
    }

    fn connect_session_if_due(&mut self, now: Instant) {
        if !attempt_due(self.last_session_attempt, now, self.session_backoff) {
            return;
        }
        self.last_session_attempt = Some(now);

        info!("Connecting WS: {}", self.url);
        match self.transport.connect(&self.url) {
            Ok(()) => self.session = SessionState::Opening,
            Err(e) => {
                warn!("WebSocket connection attempt failed: {:?}", e);
                self.session = SessionState::Closed;
            }
        }
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Opened => {
                info!("WebSocket connected");
                self.session = SessionState::Open;
                self.send_hello();
            }
            SessionEvent::Closed => {
                if self.session != SessionState::Closed {
                    info!("WebSocket disconnected");
                }
                self.session = SessionState::Closed;
            }
            SessionEvent::Message(payload) => self.handle_message(&payload),
            SessionEvent::Ping => debug!("WebSocket ping"),
            SessionEvent::Pong => debug!("WebSocket pong"),
        }
    }

    fn send_hello(&mut self) {
        let Some(hello) = self.hello.as_deref() else {
            return;
        };
        if let Err(e) = self.transport.send_text(hello) {
            warn!("Failed to send greeting: {:?}", e);
        }
    }

    fn handle_message(&mut self, payload: &str) {
        let command = match codec::decode_command(payload) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                return;
            }
        };

        match self.dispatch.as_mut() {
            Some(dispatch) => dispatch(command),
            None => debug!("No handler registered, dropping {:?}", command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceIdentity, Endpoint};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeLink {
        status: LinkStatus,
        attempts: usize,
    }

    impl Link for FakeLink {
        fn status(&self) -> LinkStatus {
            self.status
        }

        fn begin_connect(&mut self, _credentials: &Credentials) -> Result<()> {
            self.attempts += 1;
            if self.status == LinkStatus::Down {
                self.status = LinkStatus::Connecting;
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        connects: Vec<String>,
        sent: Vec<String>,
        pending: VecDeque<SessionEvent>,
        opened_delivered: usize,
        closes: usize,
        fail_connect: bool,
        fail_send: bool,
    }

    impl SessionTransport for FakeTransport {
        fn connect(&mut self, url: &str) -> Result<()> {
            self.connects.push(url.to_string());
            if self.fail_connect {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }

        fn send_text(&mut self, payload: &str) -> Result<()> {
            if self.fail_send {
                anyhow::bail!("send timed out");
            }
            self.sent.push(payload.to_string());
            Ok(())
        }

        fn poll(&mut self) -> Vec<SessionEvent> {
            let events: Vec<_> = self.pending.drain(..).collect();
            self.opened_delivered += events.iter().filter(|e| **e == SessionEvent::Opened).count();
            events
        }

        fn close(&mut self) {
            self.closes += 1;
            self.pending.clear();
        }
    }

    type TestConnectivity = Connectivity<FakeLink, FakeTransport>;

    /// Defaults with the build time overrides pinned
    fn test_config() -> Config {
        let mut config = Config::default();
        config.network.endpoint = Endpoint {
            host: "192.168.1.100",
            port: 8765,
            path: "/ws",
        };
        config.identity = DeviceIdentity {
            device_id: "nobu-kitchen",
            location: "kitchen",
        };
        config
    }

    fn setup() -> (TestConnectivity, Rc<RefCell<Vec<InboundCommand>>>) {
        let mut conn = Connectivity::new(
            FakeLink::default(),
            FakeTransport::default(),
            &test_config(),
        );
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = received.clone();
        conn.set_dispatch(move |command| sink.borrow_mut().push(command));
        (conn, received)
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    /// Link up and session open at `t0 + 0`
    fn open_session(conn: &mut TestConnectivity, t0: Instant) {
        conn.link_mut().status = LinkStatus::Up;
        conn.tick(t0);
        conn.transport_mut().pending.push_back(SessionEvent::Opened);
        conn.tick(t0);
        assert!(conn.is_session_open());
    }

    #[test]
    fn test_link_attempts_respect_backoff() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();

        conn.tick(t0);
        assert_eq!(conn.link().attempts, 1);
        conn.tick(ms(t0, 100));
        conn.tick(ms(t0, 4999));
        assert_eq!(conn.link().attempts, 1);
        conn.tick(ms(t0, 5000));
        assert_eq!(conn.link().attempts, 2);
        assert!(conn.transport().connects.is_empty());
    }

    #[test]
    fn test_no_session_attempt_while_link_down() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        for i in 0..20 {
            conn.tick(ms(t0, i * 1000));
        }
        assert!(conn.transport().connects.is_empty());
        assert_eq!(conn.session_state(), SessionState::Closed);
        assert_eq!(conn.link_status(), LinkStatus::Connecting);
    }

    #[test]
    fn test_session_attempts_respect_backoff() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        conn.link_mut().status = LinkStatus::Up;

        conn.tick(t0);
        assert_eq!(conn.transport().connects, vec!["ws://192.168.1.100:8765/ws".to_string()]);
        assert_eq!(conn.session_state(), SessionState::Opening);

        // Stalled attempt is retried only once the interval has passed
        conn.tick(ms(t0, 2999));
        assert_eq!(conn.transport().connects.len(), 1);
        conn.tick(ms(t0, 3000));
        assert_eq!(conn.transport().connects.len(), 2);
        assert_eq!(conn.link().attempts, 0);
    }

    #[test]
    fn test_greeting_sent_once_per_open() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        assert_eq!(
            conn.transport().sent,
            vec![r#"{"type":"hello","device_id":"nobu-kitchen","location":"kitchen"}"#.to_string()]
        );

        // No further attempts or greetings while open
        conn.tick(ms(t0, 10_000));
        assert_eq!(conn.transport().connects.len(), 1);
        assert_eq!(conn.transport().sent.len(), 1);
    }

    #[test]
    fn test_dropped_greeting_keeps_session() {
        let (mut conn, received) = setup();
        let t0 = Instant::now();
        conn.transport_mut().fail_send = true;
        open_session(&mut conn, t0);
        assert!(conn.transport().sent.is_empty());

        // Not resent and not treated as a broken session
        conn.transport_mut().fail_send = false;
        conn.tick(ms(t0, 10_000));
        assert!(conn.is_session_open());
        assert!(conn.transport().sent.is_empty());
        assert_eq!(conn.transport().connects.len(), 1);
        assert_eq!(conn.transport().closes, 0);

        conn.transport_mut()
            .pending
            .push_back(SessionEvent::Message(r#"{"mood":"sad"}"#.into()));
        conn.tick(ms(t0, 10_010));
        assert_eq!(*received.borrow(), vec![InboundCommand::new(Some("sad"), None)]);
    }

    #[test]
    fn test_dispatches_decoded_commands() {
        let (mut conn, received) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        let pending = &mut conn.transport_mut().pending;
        pending.push_back(SessionEvent::Message("not json".into()));
        pending.push_back(SessionEvent::Ping);
        pending.push_back(SessionEvent::Message(r#"{"mood":"sad"}"#.into()));
        pending.push_back(SessionEvent::Message(r#"{"mood":"happy","text":"hello"}"#.into()));
        conn.tick(ms(t0, 10));

        assert_eq!(
            *received.borrow(),
            vec![
                InboundCommand::new(Some("sad"), None),
                InboundCommand::new(Some("happy"), Some("hello")),
            ]
        );
    }

    #[test]
    fn test_malformed_payload_never_dispatches() {
        let (mut conn, received) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        for payload in ["", "{", "{mood: sad}"] {
            conn.transport_mut().pending.push_back(SessionEvent::Message(payload.into()));
        }
        conn.tick(ms(t0, 10));
        assert!(received.borrow().is_empty());
        assert!(conn.is_session_open());
    }

    #[test]
    fn test_dispatch_is_replaceable() {
        let (mut conn, first) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        let second = Rc::new(RefCell::new(Vec::new()));
        let sink = second.clone();
        conn.set_dispatch(move |command| sink.borrow_mut().push(command));

        conn.transport_mut().pending.push_back(SessionEvent::Message(r#"{"text":"hi"}"#.into()));
        conn.tick(ms(t0, 10));
        assert!(first.borrow().is_empty());
        assert_eq!(*second.borrow(), vec![InboundCommand::new(None, Some("hi"))]);
    }

    #[test]
    fn test_link_drop_closes_session() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        conn.link_mut().status = LinkStatus::Down;
        conn.tick(ms(t0, 100));
        assert_eq!(conn.session_state(), SessionState::Closed);
        assert_eq!(conn.transport().closes, 1);
        // First link attempt since boot was never made, so reconnect starts now
        assert_eq!(conn.link().attempts, 1);

        conn.link_mut().status = LinkStatus::Up;
        conn.tick(ms(t0, 200));
        assert_eq!(conn.session_state(), SessionState::Closed);
        conn.tick(ms(t0, 3000));
        assert_eq!(conn.session_state(), SessionState::Opening);
        assert_eq!(conn.transport().connects.len(), 2);
    }

    #[test]
    fn test_session_closed_event() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        open_session(&mut conn, t0);

        conn.transport_mut().pending.push_back(SessionEvent::Closed);
        conn.tick(ms(t0, 1000));
        assert_eq!(conn.session_state(), SessionState::Closed);

        conn.tick(ms(t0, 2000));
        assert_eq!(conn.transport().connects.len(), 1);
        conn.tick(ms(t0, 3000));
        assert_eq!(conn.transport().connects.len(), 2);
    }

    #[test]
    fn test_failed_connect_stays_closed() {
        let (mut conn, _) = setup();
        let t0 = Instant::now();
        conn.link_mut().status = LinkStatus::Up;
        conn.transport_mut().fail_connect = true;

        conn.tick(t0);
        assert_eq!(conn.session_state(), SessionState::Closed);
        conn.tick(ms(t0, 1000));
        assert_eq!(conn.transport().connects.len(), 1);
        conn.tick(ms(t0, 3000));
        assert_eq!(conn.transport().connects.len(), 2);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Advance(u64),
        SetLink(LinkStatus),
        Push(SessionEvent),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            4 => (0u64..7000).prop_map(Step::Advance),
            1 => prop_oneof![
                Just(LinkStatus::Down),
                Just(LinkStatus::Connecting),
                Just(LinkStatus::Up)
            ]
            .prop_map(Step::SetLink),
            2 => prop_oneof![
                Just(SessionEvent::Opened),
                Just(SessionEvent::Closed),
                Just(SessionEvent::Ping),
                Just(SessionEvent::Message(r#"{"mood":"sleepy"}"#.to_string())),
                Just(SessionEvent::Message("garbage".to_string())),
            ]
            .prop_map(Step::Push),
        ]
    }

    proptest! {
        #[test]
        fn prop_layer_invariants(steps in prop::collection::vec(step(), 1..200)) {
            let (mut conn, received) = setup();
            let t0 = Instant::now();
            let mut now = t0;
            let mut link_attempts: Vec<Instant> = Vec::new();
            let mut session_attempts: Vec<Instant> = Vec::new();
            let mut messages_delivered = 0;

            for step in steps {
                match step {
                    Step::Advance(millis) => now += Duration::from_millis(millis),
                    Step::SetLink(status) => conn.link_mut().status = status,
                    Step::Push(event) => conn.transport_mut().pending.push_back(event),
                }

                let link_before = conn.link().attempts;
                let session_before = conn.transport().connects.len();
                let sleepy_pending = conn
                    .transport()
                    .pending
                    .iter()
                    .filter(|e| matches!(e, SessionEvent::Message(m) if m.contains("sleepy")))
                    .count();

                conn.tick(now);

                if conn.link().attempts > link_before {
                    link_attempts.push(now);
                }
                if conn.transport().connects.len() > session_before {
                    session_attempts.push(now);
                }
                if conn.transport().pending.is_empty() && conn.link_status() == LinkStatus::Up {
                    messages_delivered += sleepy_pending;
                }

                // Session is only ever open on top of an up link
                if conn.is_session_open() {
                    prop_assert_eq!(conn.link_status(), LinkStatus::Up);
                }
                // One greeting per delivered open event
                prop_assert_eq!(conn.transport().sent.len(), conn.transport().opened_delivered);
            }

            for pair in link_attempts.windows(2) {
                prop_assert!(pair[1] - pair[0] >= Duration::from_millis(5000));
            }
            for pair in session_attempts.windows(2) {
                prop_assert!(pair[1] - pair[0] >= Duration::from_millis(3000));
            }
            // Garbage never reaches the handler
            prop_assert_eq!(received.borrow().len(), messages_delivered);
        }
    }
}
