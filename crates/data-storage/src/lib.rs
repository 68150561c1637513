//! Per-patient, time-ordered store of clinical measurement records,
//! plus the bulk file reader that feeds it.

pub mod error;
pub mod patient;
pub mod reader;
pub mod storage;

pub use error::IngestError;
pub use patient::Patient;
pub use reader::{DataReader, FileDataReader, IngestSummary};
pub use storage::DataStorage;
