mod command_id;
mod command_status;
mod data_coding;
mod interface_version;
mod message_state;
mod numeric_plan_indicator;
pub mod tlv;
mod type_of_number;
mod validity;

pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::DataCoding;
pub use interface_version::InterfaceVersion;
pub use message_state::MessageState;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use validity::RelativeTime;
