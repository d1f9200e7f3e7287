pub mod context;
pub mod orchestrator;
pub mod propagation;
pub mod recency;
pub mod resolver;
pub mod resources;

use crate::probe::ProbeError;
use thiserror::Error;

pub use context::{CheckContext, Clock, SystemClock};
pub use orchestrator::{AvailabilityChecker, CheckOutcome, CheckReport};
pub use propagation::{Propagation, PropagationDispatcher, PropagationMode};
pub use recency::{checked_recently, RECENT_CHECK_THRESHOLD};
pub use resolver::{
    ConnectivityResolver, AUTHENTICATION_NOT_FOUND, ENDPOINT_OR_APPLICATION_NOT_FOUND,
};
pub use resources::{ResolvedResources, ResourceAccessor};

/// Failures that escape a check instead of being folded into its outcome.
#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("source `{source_id}`: {source}")]
    Probe {
        source_id: String,
        #[source]
        source: ProbeError,
    },
}
