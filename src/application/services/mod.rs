//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on the [`ClinicStore`](crate::infrastructure::traits::ClinicStore)
//! boundary trait but are themselves concrete structs, not traits.

mod patient;
mod provider;
mod upload;

pub use patient::PatientService;
pub use provider::ProviderService;
pub use upload::{UploadService, UploadSummary};
