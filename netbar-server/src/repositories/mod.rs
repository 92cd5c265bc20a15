mod alarm;
mod device;
mod ledger;
mod log;
mod rate;
mod session;
mod user;

pub use alarm::AlarmRepository;
pub use device::{DeviceRepository, DeviceSnapshot};
pub use ledger::LedgerRepository;
pub use log::LogRepository;
pub use rate::RateRepository;
pub use session::{SessionRepository, SettleRecord};
pub use user::UserRepository;
