// bagworks/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy for every storefront operation.
///
/// Collaborator traits (stores, role directory, webhook) report failures as
/// `anyhow::Error`; those arrive here as [`BagworksError::Collaborator`].
#[derive(Debug, Error)]
pub enum BagworksError {
  /// Malformed or out-of-range input. Nothing was written.
  #[error("Validation failed: {0}")]
  Validation(String),

  /// A business gate is not met; the message is a remediation hint.
  #[error("Precondition not met: {0}")]
  Precondition(String),

  /// The actor lacks the required role. Never says which role.
  #[error("Not permitted")]
  Authorization,

  #[error("Not found: {0}")]
  NotFound(String),

  /// A store, storage or webhook call failed.
  #[error("Collaborator failure: {source}")]
  Collaborator {
    #[source]
    source: AnyhowError,
  },

  /// The order row exists but a later checkout write failed.
  #[error("Order {order_id} was placed but checkout did not finish: {source}")]
  PartialCheckout {
    order_id: Uuid,
    #[source]
    source: AnyhowError,
  },

  #[error("Required step '{step_name}' has no handlers")]
  StepHandlerMissing { step_name: String },

  #[error("Configuration error: {0}")]
  Configuration(String),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl BagworksError {
  /// Whether the caller should offer a retry for this failure.
  pub fn is_retryable(&self) -> bool {
    matches!(self, BagworksError::Collaborator { .. } | BagworksError::PartialCheckout { .. })
  }
}

impl From<AnyhowError> for BagworksError {
  fn from(err: AnyhowError) -> Self {
    // A BagworksError that travelled through anyhow keeps its own meaning.
    match err.downcast::<BagworksError>() {
      Ok(inner) => inner,
      Err(source) => BagworksError::Collaborator { source },
    }
  }
}

pub type BagworksResult<T, E = BagworksError> = std::result::Result<T, E>;
