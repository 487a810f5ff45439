pub mod outcome;
pub mod payload;
pub mod record;

pub use outcome::{DispatchError, DispatchOutcome};
pub use payload::IncidentPayload;
pub use record::{IncidentField, RecordEvent, RecordSnapshot};
