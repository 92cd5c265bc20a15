use std::fmt;

use crate::Money;
use crate::codec::Encoder;

/// Outbound command published on `<prefix>/<device_id>/cmd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PcOn,
    PcOff,
    LightOn,
    LightOff,
    /// Tell the seat to drop its local session and resynchronize
    Reset,
    MaintOn,
    MaintOff,
    /// Card accepted, or re-display of the running session
    CardOk {
        uid: String,
        name: String,
        balance: Money,
        sec: u64,
    },
    /// Card rejected
    CardErr { code: String, msg: String },
    /// Server-initiated end of session
    Checkout { code: String, msg: String },
    /// Authoritative session state pushed back to a seat that drifted
    RestoreSession { name: String, balance: Money, sec: u64 },
    SetRate { rate: Money },
}

impl Command {
    /// Every leading token the server publishes.
    pub const ACTIONS: [&'static str; 12] = [
        "pc_on",
        "pc_off",
        "light_on",
        "light_off",
        "reset",
        "maint_on",
        "maint_off",
        "card_ok",
        "card_err",
        "checkout",
        "restore_session",
        "set_rate",
    ];

    /// Bare action tokens an operator may send directly.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "pc_on" => Some(Command::PcOn),
            "pc_off" => Some(Command::PcOff),
            "light_on" => Some(Command::LightOn),
            "light_off" => Some(Command::LightOff),
            "reset" => Some(Command::Reset),
            _ => None,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::PcOn => "pc_on",
            Command::PcOff => "pc_off",
            Command::LightOn => "light_on",
            Command::LightOff => "light_off",
            Command::Reset => "reset",
            Command::MaintOn => "maint_on",
            Command::MaintOff => "maint_off",
            Command::CardOk { .. } => "card_ok",
            Command::CardErr { .. } => "card_err",
            Command::Checkout { .. } => "checkout",
            Command::RestoreSession { .. } => "restore_session",
            Command::SetRate { .. } => "set_rate",
        }
    }

    pub fn encode(&self) -> String {
        let encoder = Encoder::new(self.action());

        let encoder = match self {
            Command::CardOk { uid, name, balance, sec } => encoder
                .field("uid", uid)
                .field("name", name)
                .field("balance", balance)
                .field("sec", sec),
            Command::CardErr { code, msg } | Command::Checkout { code, msg } => {
                encoder.field("code", code).field("msg", msg)
            }
            Command::RestoreSession { name, balance, sec } => encoder
                .field("name", name)
                .field("balance", balance)
                .field("sec", sec),
            Command::SetRate { rate } => encoder.field("val", rate),
            _ => encoder,
        };

        encoder.finish()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_actions() {
        for action in ["pc_on", "pc_off", "light_on", "light_off", "reset"] {
            let command = Command::from_action(action).unwrap();
            assert_eq!(command.encode(), action);
        }
        assert!(Command::from_action("checkout").is_none());
        assert_eq!(Command::MaintOn.encode(), "maint_on");
    }

    #[test]
    fn test_actions_cover_every_command() {
        let commands = [
            Command::PcOn,
            Command::PcOff,
            Command::LightOn,
            Command::LightOff,
            Command::Reset,
            Command::MaintOn,
            Command::MaintOff,
            Command::CardOk {
                uid: String::new(),
                name: String::new(),
                balance: Money::ZERO,
                sec: 0,
            },
            Command::CardErr { code: String::new(), msg: String::new() },
            Command::Checkout { code: String::new(), msg: String::new() },
            Command::RestoreSession { name: String::new(), balance: Money::ZERO, sec: 0 },
            Command::SetRate { rate: Money::ZERO },
        ];

        for command in commands {
            assert!(Command::ACTIONS.contains(&command.action()), "{}", command.action());
        }
    }

    #[test]
    fn test_structured_commands() {
        let card_ok = Command::CardOk {
            uid: "031368FC".to_string(),
            name: "alice".to_string(),
            balance: Money::from_cents(1000),
            sec: 0,
        };
        assert_eq!(card_ok.encode(), "card_ok;uid=031368FC;name=alice;balance=10.00;sec=0");

        let card_err = Command::CardErr {
            code: "busy".to_string(),
            msg: "seat_in_use".to_string(),
        };
        assert_eq!(card_err.to_string(), "card_err;code=busy;msg=seat_in_use");

        let restore = Command::RestoreSession {
            name: "alice".to_string(),
            balance: Money::from_cents(505),
            sec: 120,
        };
        assert_eq!(restore.encode(), "restore_session;name=alice;balance=5.05;sec=120");

        let rate = Command::SetRate { rate: Money::from_cents(150) };
        assert_eq!(rate.encode(), "set_rate;val=1.50");
    }
}
