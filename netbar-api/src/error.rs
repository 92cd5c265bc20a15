#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount out of range")]
    AmountOverflow,
}
