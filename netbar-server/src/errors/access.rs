/// Reasons a card swipe is turned away. Each maps to a short ASCII code the
/// seat firmware displays as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("Unknown card")]
    InvalidCard,

    #[error("Account disabled")]
    DisabledAccount,

    #[error("User under age")]
    UnderageUser,

    #[error("Balance below minimum")]
    InsufficientBalance,

    #[error("Seat occupied by another card")]
    DeviceBusy,

    #[error("Seat under maintenance")]
    DeviceInMaintenance,
}

impl AccessError {
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::InvalidCard => "invalid",
            AccessError::DisabledAccount => "disabled",
            AccessError::UnderageUser => "underage",
            AccessError::InsufficientBalance => "balance_low",
            AccessError::DeviceBusy => "busy",
            AccessError::DeviceInMaintenance => "maintenance",
        }
    }

    pub fn msg(&self) -> &'static str {
        match self {
            AccessError::InvalidCard => "card_not_registered",
            AccessError::DisabledAccount => "account_disabled",
            AccessError::UnderageUser => "minor_not_allowed",
            AccessError::InsufficientBalance => "please_recharge",
            AccessError::DeviceBusy => "seat_in_use",
            AccessError::DeviceInMaintenance => "seat_in_maintenance",
        }
    }
}
