use std::fmt;

/// The per-device channel a message travels on: `<prefix>/<device_id>/<kind>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Periodic seat telemetry
    State,
    /// Card swipe
    Card,
    /// Free-text alarm raised by the seat
    Alert,
    /// Free-text diagnostics, including boot and sync markers
    Debug,
    /// Command channel, shared by device-originated text and server commands
    Cmd,
}

impl TopicKind {
    pub const INBOUND: [TopicKind; 5] = [
        TopicKind::State,
        TopicKind::Card,
        TopicKind::Alert,
        TopicKind::Debug,
        TopicKind::Cmd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TopicKind::State => "state",
            TopicKind::Card => "card",
            TopicKind::Alert => "alert",
            TopicKind::Debug => "debug",
            TopicKind::Cmd => "cmd",
        }
    }

    pub fn from_segment(segment: &str) -> Option<Self> {
        TopicKind::INBOUND
            .into_iter()
            .find(|kind| kind.as_str() == segment)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    pub device_id: String,
    pub kind: TopicKind,
}

impl Topic {
    pub fn new(device_id: impl Into<String>, kind: TopicKind) -> Self {
        Self {
            device_id: device_id.into(),
            kind,
        }
    }

    pub fn parse(prefix: &str, topic: &str) -> Option<Self> {
        let mut parts = topic.split('/');

        let (Some(head), Some(device_id), Some(kind), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };

        if head != prefix || device_id.is_empty() || device_id.contains(['+', '#']) {
            return None;
        }

        Some(Self::new(device_id, TopicKind::from_segment(kind)?))
    }

    pub fn render(&self, prefix: &str) -> String {
        format!("{prefix}/{}/{}", self.device_id, self.kind.as_str())
    }

    /// Wildcard filters the server subscribes to.
    pub fn subscriptions(prefix: &str) -> Vec<String> {
        TopicKind::INBOUND
            .iter()
            .map(|kind| format!("{prefix}/+/{}", kind.as_str()))
            .collect()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.device_id, self.kind.as_str())
    }
}
