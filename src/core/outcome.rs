use thiserror::Error;

/// Terminal state of one dispatch. The notifier logs every branch itself and
/// always returns normally, so callers never see a panic or an Err; a
/// non-2xx answer from the webhook still counts as Delivered.
#[derive(Debug)]
pub enum DispatchOutcome {
    Delivered { status: u16, body: String },
    Failed { error: DispatchError },
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }

    /// Metrics label for this outcome.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Delivered { .. } => "delivered",
            DispatchOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The record carries no `number`, so there is no endpoint to call.
    #[error("record has no number; refusing to build an endpoint")]
    MissingNumber,

    #[error("cannot build endpoint: {0}")]
    Endpoint(String),

    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("webhook transport failed: {0}")]
    Transport(#[from] reqwest::Error),
}
