pub mod directory;
pub mod http;
pub mod notifier;
pub mod receiver;
pub mod runner;

pub use directory::{DirectoryError, NullDirectory, StaticDirectory, UserDirectory};
pub use http::RelayMetrics;
pub use notifier::Notifier;
pub use receiver::{ReceiverState, routes, serve};
pub use runner::{AutomationJob, AutomationRunner, CommandRunner, LogRunner, RunnerError};
