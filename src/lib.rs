pub mod config;
pub mod core;
pub mod observability;
pub mod services;
pub mod timefmt;

pub use config::{NotifierConfig, ReceiverConfig, RelayGlobalConfig, global, initiate};

pub use crate::core::{
    DispatchError, DispatchOutcome, IncidentField, IncidentPayload, RecordEvent, RecordSnapshot,
};

pub use services::{
    AutomationJob, AutomationRunner, CommandRunner, DirectoryError, LogRunner, Notifier,
    NullDirectory, RelayMetrics, StaticDirectory, UserDirectory,
};
