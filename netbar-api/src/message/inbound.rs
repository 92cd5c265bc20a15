use crate::codec::{self, Fields};
use crate::message::Command;
use crate::{Money, TopicKind};

/// Seat state report published on the `state` topic.
///
/// Every field defaults to zero/off when missing or malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Telemetry {
    /// Seat believes a session is in progress (`iu`)
    pub in_use: bool,
    /// Smoke concentration in percent (`sm`)
    pub smoke_percent: u8,
    /// Device-side elapsed seconds of the current session (`sec`)
    pub elapsed_sec: u64,
    /// Occupancy alarm raised by the seat (`al` or `occ`)
    pub occupancy_alarm: bool,
    /// Computer power (`pc`)
    pub pc_on: bool,
    /// Seat light (`lt`)
    pub light_on: bool,
    /// Radar presence (`hm`)
    pub human_present: bool,
    /// Running fee shown on the seat display (`fee`)
    pub fee: Money,
}

impl Telemetry {
    pub fn from_fields(fields: &Fields) -> Self {
        Self {
            in_use: fields.flag("iu"),
            smoke_percent: fields.number::<u32>("sm").map_or(0, |v| v.min(100) as u8),
            elapsed_sec: fields.number_or("sec", 0),
            occupancy_alarm: fields.flag("al") || fields.flag("occ"),
            pc_on: fields.flag("pc"),
            light_on: fields.flag("lt"),
            human_present: fields.flag("hm"),
            fee: fields
                .get("fee")
                .and_then(|v| v.parse::<Money>().ok())
                .filter(|fee| !fee.is_negative())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSwipe {
    /// Card uid, upper-cased hex
    pub card_uid: String,
}

impl CardSwipe {
    /// `None` when the payload carries no card id.
    pub fn from_fields(fields: &Fields) -> Option<Self> {
        let card_uid = fields.first(&["uid", "card"])?.trim().to_ascii_uppercase();

        (!card_uid.is_empty()).then_some(Self { card_uid })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub text: String,
}

impl Alert {
    pub fn is_occupancy(&self) -> bool {
        self.text.to_ascii_lowercase().contains("occupy")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugNote {
    pub text: String,
}

impl DebugNote {
    /// The seat rebooted or asked to be brought back in sync.
    pub fn requests_restore(&self) -> bool {
        let text = self.text.to_ascii_lowercase();
        text.contains("sync") || text.contains("boot")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCommand {
    pub text: String,
}

impl DeviceCommand {
    /// Leading `;` segment, lower-cased.
    pub fn action(&self) -> String {
        self.text.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
    }

    /// The seat's own end-of-use request: a bare `checkout` with none of
    /// the fields the server attaches to its checkout command.
    pub fn requests_checkout(&self) -> bool {
        self.action() == "checkout" && codec::parse(&self.text).get("code").is_none()
    }

    /// The server publishes on the same `cmd` topic it listens on, so every
    /// one of its commands comes back here.
    pub fn is_server_echo(&self) -> bool {
        !self.requests_checkout() && Command::ACTIONS.contains(&self.action().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Telemetry(Telemetry),
    CardSwipe(CardSwipe),
    Alert(Alert),
    Debug(DebugNote),
    Command(DeviceCommand),
}

impl Inbound {
    /// Decodes a raw bus payload for the given topic kind. Undecodable
    /// bytes are replaced rather than rejected; only a card swipe without a
    /// card id and empty free-text messages yield `None`.
    pub fn decode(kind: TopicKind, payload: &[u8]) -> Option<Self> {
        let text = String::from_utf8_lossy(payload).trim().to_string();

        match kind {
            TopicKind::State => Some(Inbound::Telemetry(Telemetry::from_fields(&codec::parse(&text)))),
            TopicKind::Card => CardSwipe::from_fields(&codec::parse(&text)).map(Inbound::CardSwipe),
            _ if text.is_empty() => None,
            TopicKind::Alert => Some(Inbound::Alert(Alert { text })),
            TopicKind::Debug => Some(Inbound::Debug(DebugNote { text })),
            TopicKind::Cmd => Some(Inbound::Command(DeviceCommand { text })),
        }
    }

    pub fn kind(&self) -> TopicKind {
        match self {
            Inbound::Telemetry(_) => TopicKind::State,
            Inbound::CardSwipe(_) => TopicKind::Card,
            Inbound::Alert(_) => TopicKind::Alert,
            Inbound::Debug(_) => TopicKind::Debug,
            Inbound::Command(_) => TopicKind::Cmd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_telemetry() {
        let payload = b"s=1;iu=1;pc=1;lt=1;hm=0;sm=65;sec=300;fee=5;al=0";
        let Some(Inbound::Telemetry(telemetry)) = Inbound::decode(TopicKind::State, payload) else {
            panic!("expected telemetry");
        };

        assert!(telemetry.in_use);
        assert!(telemetry.pc_on);
        assert!(telemetry.light_on);
        assert!(!telemetry.human_present);
        assert!(!telemetry.occupancy_alarm);
        assert_eq!(telemetry.smoke_percent, 65);
        assert_eq!(telemetry.elapsed_sec, 300);
        assert_eq!(telemetry.fee, Money::from_cents(500));
    }

    #[test]
    fn test_telemetry_defaults() {
        let telemetry = Telemetry::from_fields(&codec::parse("sm=250;sec=-3;fee=oops;occ=1"));

        assert_eq!(telemetry.smoke_percent, 100);
        assert_eq!(telemetry.elapsed_sec, 0);
        assert_eq!(telemetry.fee, Money::ZERO);
        assert!(telemetry.occupancy_alarm);
        assert!(!telemetry.in_use);
    }

    #[test]
    fn test_card_swipe_normalizes_uid() {
        let swipe = Inbound::decode(TopicKind::Card, b"uid=031368fc");
        assert_eq!(
            swipe,
            Some(Inbound::CardSwipe(CardSwipe {
                card_uid: "031368FC".to_string()
            }))
        );

        assert_eq!(Inbound::decode(TopicKind::Card, b"uid="), None);
        assert_eq!(Inbound::decode(TopicKind::Card, b"hello"), None);
    }

    #[test]
    fn test_free_text_markers() {
        let alert = Alert { text: "occupy_over_120s".to_string() };
        assert!(alert.is_occupancy());

        let note = DebugNote { text: "ESP boot ok".to_string() };
        assert!(note.requests_restore());
        assert!(!DebugNote { text: "rssi=-60".to_string() }.requests_restore());
    }

    #[test]
    fn test_checkout_ignores_server_echo() {
        assert!(DeviceCommand { text: "checkout".to_string() }.requests_checkout());
        assert!(!DeviceCommand { text: "checkout;code=no_balance;msg=balance_empty".to_string() }.requests_checkout());
        assert!(!DeviceCommand { text: "pc_on".to_string() }.requests_checkout());
    }

    #[test]
    fn test_echo_classified_by_leading_action() {
        let echoes = [
            "card_ok;uid=CHECKOUT1;name=user_checkout1;balance=10.00;sec=0",
            "restore_session;name=checkout_fan;balance=1.00;sec=30",
            "checkout;code=admin_stop;msg=admin_checkout",
            "card_err;code=busy;msg=seat_in_use",
            "set_rate;val=1.50",
            "maint_on",
            "reset",
        ];

        for text in echoes {
            let command = DeviceCommand { text: text.to_string() };
            assert!(command.is_server_echo(), "{text}");
            assert!(!command.requests_checkout(), "{text}");
        }

        let checkout = DeviceCommand { text: " Checkout ".to_string() };
        assert!(checkout.requests_checkout());
        assert!(!checkout.is_server_echo());

        assert!(!DeviceCommand { text: "auto_checkout_nohuman".to_string() }.requests_checkout());
    }

    #[test]
    fn test_empty_free_text_is_dropped() {
        assert_eq!(Inbound::decode(TopicKind::Alert, b"   "), None);
        assert_eq!(
            Inbound::decode(TopicKind::Alert, b"smoke").map(|m| m.kind()),
            Some(TopicKind::Alert)
        );
    }
}
