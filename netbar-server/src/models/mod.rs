mod alarm_log;
mod consume_log;
mod device;
mod device_state_log;
mod recharge_log;
mod session;
mod setting;
mod system_log;
mod user;

pub use alarm_log::{AlarmKind, AlarmLog, AlarmLogTable};
pub use consume_log::{ConsumeLog, ConsumeLogTable};
pub use device::{Device, DeviceStatus, DeviceTable, SeatStatus};
pub use device_state_log::{DeviceStateLog, DeviceStateLogTable};
pub use recharge_log::{RechargeLog, RechargeLogTable};
pub use session::{EndReason, Session, SessionTable};
pub use setting::{Setting, SettingTable};
pub use system_log::{SystemLog, SystemLogKind, SystemLogTable};
pub use user::{User, UserTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
