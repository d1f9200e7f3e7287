#![allow(clippy::result_large_err)]

pub mod availability;
pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod identity;
pub mod logging;
pub mod metrics;
pub mod probe;
pub mod sources_api;
pub mod telemetry;
pub mod transport;

pub use availability::{AvailabilityChecker, CheckOutcome, CheckReport, Propagation};
pub use domain::{AvailabilityStatus, CheckRequest, CheckResult};
