//! What the panel should show, driven by inbound commands and the demo cycle

use std::time::{Duration, Instant};

use log::info;

use crate::codec::InboundCommand;
use crate::config::DemoConfig;
use crate::face::{Expression, RenderRequest};

/// Steps through every expression while nobody is talking to the device
#[derive(Debug, Clone)]
pub struct DemoCycle {
    enabled: bool,
    interval: Duration,
    index: usize,
    last_step: Instant,
}

impl DemoCycle {
    /// Starts on the first expression, the next one is due after one interval
    pub fn new(config: DemoConfig, now: Instant) -> Self {
        Self {
            enabled: config.enabled,
            interval: config.interval,
            index: 0,
            last_step: now,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn the cycle off for the rest of the run
    pub fn stop(&mut self) {
        if self.enabled {
            info!("Demo mode off");
        }
        self.enabled = false;
    }

    /// Next expression if one is due. Paused while a session is open.
    pub fn step(&mut self, now: Instant, session_open: bool) -> Option<Expression> {
        if !self.enabled || session_open {
            return None;
        }
        if now.saturating_duration_since(self.last_step) < self.interval {
            return None;
        }

        self.last_step = now;
        self.index = (self.index + 1) % Expression::ALL.len();
        Some(Expression::ALL[self.index])
    }
}

/// The expression currently on the panel
pub struct Face {
    expression: String,
    label: Option<String>,
    demo: DemoCycle,
}

impl Face {
    pub fn new(demo: DemoConfig, now: Instant) -> Self {
        Self {
            expression: Expression::Happy.name().to_string(),
            label: None,
            demo: DemoCycle::new(demo, now),
        }
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn demo(&self) -> &DemoCycle {
        &self.demo
    }

    /// What to paint right now
    pub fn current(&self) -> RenderRequest {
        RenderRequest {
            expression: self.expression.clone(),
            label: self.label.clone(),
        }
    }

    /// Turn a command from the bridge into a render request.
    ///
    /// A mood replaces the expression and the label and ends the demo. Text on
    /// its own only relabels the current expression. Empty commands are ignored.
    pub fn apply(&mut self, command: InboundCommand) -> Option<RenderRequest> {
        if command.is_empty() {
            return None;
        }

        match command.mood {
            Some(mood) => {
                self.demo.stop();
                self.expression = mood;
                self.label = command.text;
            }
            None => self.label = command.text,
        }
        Some(self.current())
    }

    pub fn demo_step(&mut self, now: Instant, session_open: bool) -> Option<RenderRequest> {
        let expression = self.demo.step(now, session_open)?;
        self.expression = expression.name().to_string();
        self.label = None;
        Some(self.current())
    }
}
