// Common types and utilities shared across the application

pub mod payload;
pub mod pending;

pub use payload::{decode_image, decode_pdf};
pub use pending::{PendingRecord, PendingRecords};
