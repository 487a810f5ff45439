pub mod global;
pub mod notifier;
pub mod receiver;

pub use global::{RelayGlobalConfig, global, initiate};
pub use notifier::NotifierConfig;
pub use receiver::ReceiverConfig;
