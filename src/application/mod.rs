//! Application layer: services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod dto;
pub mod error;
pub mod error_ext;
pub mod exporters;
pub mod services;
pub mod upload;

pub use dto::{PatientDto, ProviderDto, TreatmentDetailsDto, TreatmentDto};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::StoreResultExt;
pub use exporters::{TreatmentDtoExporter, TreeDisplayExporter};
pub use upload::UploadDocument;
