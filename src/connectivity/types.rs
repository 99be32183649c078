//! Types shared by the connectivity state machine and its transports

use std::fmt;
use std::time::Duration;

/// Network link (Wi-Fi station) state as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Down,
    Connecting,
    Up,
}

impl LinkStatus {
    /// Status of a Wi-Fi station from what the driver reports.
    ///
    /// An unassociated station counts as connecting only while the last
    /// association attempt is younger than `window`. After that, or once an
    /// established link drops, it is down.
    pub fn from_station(
        associated: bool,
        netif_up: bool,
        since_attempt: Option<Duration>,
        window: Duration,
    ) -> Self {
        match (associated, netif_up) {
            (true, true) => LinkStatus::Up,
            (true, false) => LinkStatus::Connecting,
            (false, _) if since_attempt.is_some_and(|age| age < window) => LinkStatus::Connecting,
            (false, _) => LinkStatus::Down,
        }
    }
}

/// Messaging session state, owned by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Opening,
    Open,
}

/// Something the session transport noticed since it was last polled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened,
    Closed,
    Message(String),
    Ping,
    Pong,
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkStatus::Down => write!(f, "down"),
            LinkStatus::Connecting => write!(f, "connecting"),
            LinkStatus::Up => write!(f, "up"),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Closed => write!(f, "closed"),
            SessionState::Opening => write!(f, "opening"),
            SessionState::Open => write!(f, "open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(4);

    #[test]
    fn test_station_up_needs_netif() {
        assert_eq!(LinkStatus::from_station(true, true, None, WINDOW), LinkStatus::Up);
        assert_eq!(
            LinkStatus::from_station(true, false, Some(Duration::from_secs(60)), WINDOW),
            LinkStatus::Connecting
        );
    }

    #[test]
    fn test_station_attempt_window() {
        let unassociated = |millis: Option<u64>| {
            LinkStatus::from_station(false, false, millis.map(Duration::from_millis), WINDOW)
        };
        assert_eq!(unassociated(None), LinkStatus::Down);
        assert_eq!(unassociated(Some(0)), LinkStatus::Connecting);
        assert_eq!(unassociated(Some(3999)), LinkStatus::Connecting);
        assert_eq!(unassociated(Some(4000)), LinkStatus::Down);
    }

    #[test]
    fn test_dropped_link_reports_down() {
        // Associated long after the attempt, then the access point goes away
        let since = Some(Duration::from_secs(600));
        assert_eq!(LinkStatus::from_station(true, true, since, WINDOW), LinkStatus::Up);
        assert_eq!(LinkStatus::from_station(false, true, since, WINDOW), LinkStatus::Down);
    }
}
