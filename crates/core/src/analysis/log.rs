use shelfsight_domain::LogEvent;

/// Ordered append-only job log. Holds no statistics of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogAggregator {
    events: Vec<LogEvent>,
}

impl LogAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = LogEvent>) {
        self.events.extend(events);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
