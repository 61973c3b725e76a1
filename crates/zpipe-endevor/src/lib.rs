//! Endevor element sync and package promotion for the pipeline.

pub mod element;
pub mod error;
pub mod package;

pub use element::{element_name, generation_clean, ElementSync};
pub use error::EndevorError;
pub use package::PackagePromoter;
