mod rate_handle;
mod seat_handle;
mod user_handle;

pub use rate_handle::*;
pub use seat_handle::*;
pub use user_handle::*;
