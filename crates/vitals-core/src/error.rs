use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VitalsError {
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),

    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),
}
