pub mod codec;
pub mod message;
mod error;
mod money;
mod topic;

pub use error::CodecError;
pub use money::Money;
pub use topic::{Topic, TopicKind};
