mod access_service;
mod alarm_service;
mod billing_service;
mod device_service;
mod dispatcher;
mod gateway_service;
mod publisher;
mod seat_engine;
mod session_service;

pub use access_service::*;
pub use alarm_service::*;
pub use billing_service::*;
pub use device_service::*;
pub use dispatcher::*;
pub use gateway_service::*;
pub use publisher::*;
pub use seat_engine::*;
pub use session_service::*;
