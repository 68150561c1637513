use vitals_core::{PatientRecord, RecordType};

/// A patient's history split into the sub-sequences the rules read.
///
/// Every sequence is ascending by timestamp; readings sharing a timestamp
/// keep their relative order from the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPartition {
    pub blood_pressure: Vec<PatientRecord>,
    pub saturation: Vec<PatientRecord>,
    pub ecg: Vec<PatientRecord>,
    /// Manually raised `Alert` records
    pub manual: Vec<PatientRecord>,
}

impl RecordPartition {
    pub fn from_records(mut records: Vec<PatientRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);

        let mut partition = Self::default();
        for record in records {
            match record.record_type {
                RecordType::BloodPressure => partition.blood_pressure.push(record),
                RecordType::Saturation => partition.saturation.push(record),
                RecordType::Ecg => partition.ecg.push(record),
                RecordType::Alert => partition.manual.push(record),
                _ => {}
            }
        }
        partition
    }

    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_empty()
            && self.saturation.is_empty()
            && self.ecg.is_empty()
            && self.manual.is_empty()
    }
}
