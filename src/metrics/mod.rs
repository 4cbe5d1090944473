use serde_json::json;

use crate::logging::{LogEvent, LogFields, LogLevel};

/// Counters describing how a flow has been driven so far.
#[derive(Debug, Default, Clone)]
pub struct FlowMetrics {
    advances: u64,
    retreats: u64,
    attaches: u64,
    collapses: u64,
    completions: u64,
    screens_created: u64,
}

impl FlowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_advance(&mut self) {
        self.advances = self.advances.saturating_add(1);
    }

    pub fn record_retreat(&mut self) {
        self.retreats = self.retreats.saturating_add(1);
    }

    pub fn record_attach(&mut self) {
        self.attaches = self.attaches.saturating_add(1);
    }

    pub fn record_collapse(&mut self) {
        self.collapses = self.collapses.saturating_add(1);
    }

    pub fn record_completion(&mut self) {
        self.completions = self.completions.saturating_add(1);
    }

    pub fn record_screen_created(&mut self) {
        self.screens_created = self.screens_created.saturating_add(1);
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        FlowSnapshot {
            advances: self.advances,
            retreats: self.retreats,
            attaches: self.attaches,
            collapses: self.collapses,
            completions: self.completions,
            screens_created: self.screens_created,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSnapshot {
    pub advances: u64,
    pub retreats: u64,
    pub attaches: u64,
    pub collapses: u64,
    pub completions: u64,
    pub screens_created: u64,
}

impl FlowSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("advances".to_string(), json!(self.advances));
        map.insert("retreats".to_string(), json!(self.retreats));
        map.insert("attaches".to_string(), json!(self.attaches));
        map.insert("collapses".to_string(), json!(self.collapses));
        map.insert("completions".to_string(), json!(self.completions));
        map.insert(
            "screens_created".to_string(),
            json!(self.screens_created),
        );
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "flow_metrics", self.as_fields())
    }
}
