use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::directory::Employee;

/// Format used for the `time` column, close to a browser's `toLocaleString()`
pub const TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// Whether an attendance event marks arriving at or leaving the office
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceKind {
    #[serde(rename = "datang", alias = "arrival")]
    Arrival,
    #[serde(rename = "pulang", alias = "departure")]
    Departure,
}

impl AttendanceKind {
    /// Label written into the log and the export
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceKind::Arrival => "datang",
            AttendanceKind::Departure => "pulang",
        }
    }
}

impl fmt::Display for AttendanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AttendanceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "datang" | "arrival" => Ok(AttendanceKind::Arrival),
            "pulang" | "departure" => Ok(AttendanceKind::Departure),
            other => Err(format!("Unknown attendance type: {}", other)),
        }
    }
}

/// One row of the attendance log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub name: String,
    pub time: String,
    pub kind: AttendanceKind,
}

/// Append-only in-memory attendance log.
///
/// Records keep insertion order; nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct AttendanceLog {
    records: Vec<AttendanceRecord>,
}

impl AttendanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for `employee`
    ///
    /// # Arguments
    /// * `employee` - The employee resolved from the scanned code
    /// * `kind` - Arrival or departure
    /// * `at` - Wall-clock time of the scan
    ///
    /// # Returns
    /// * `&AttendanceRecord` - The record that was appended
    pub fn record(
        &mut self,
        employee: &Employee,
        kind: AttendanceKind,
        at: DateTime<Local>,
    ) -> &AttendanceRecord {
        self.records.push(AttendanceRecord {
            employee_id: employee.employee_id.clone(),
            name: employee.name.clone(),
            time: at.format(TIME_FORMAT).to_string(),
            kind,
        });
        // Just pushed, so the log is non-empty.
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn john() -> Employee {
        Employee {
            employee_id: "12345".to_string(),
            name: "John Doe".to_string(),
        }
    }

    #[test]
    fn records_keep_order_and_fields() {
        let mut log = AttendanceLog::new();
        assert!(log.is_empty());

        let morning = Local.with_ymd_and_hms(2024, 3, 1, 8, 0, 5).unwrap();
        let evening = Local.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap();

        let first = log.record(&john(), AttendanceKind::Arrival, morning).clone();
        log.record(&john(), AttendanceKind::Departure, evening);

        assert_eq!(log.len(), 2);
        assert_eq!(first.time, "01/03/2024, 08:00:05");
        assert_eq!(log.records()[0], first);
        assert_eq!(log.records()[1].kind, AttendanceKind::Departure);
        assert_eq!(log.records()[1].name, "John Doe");
    }

    #[test]
    fn kind_parses_both_vocabularies() {
        assert_eq!("datang".parse::<AttendanceKind>(), Ok(AttendanceKind::Arrival));
        assert_eq!("Departure".parse::<AttendanceKind>(), Ok(AttendanceKind::Departure));
        assert!("lunch".parse::<AttendanceKind>().is_err());
        assert_eq!(AttendanceKind::Arrival.to_string(), "datang");
    }

    #[test]
    fn kind_serializes_as_label() {
        let json = serde_json::to_string(&AttendanceKind::Departure).unwrap();
        assert_eq!(json, "\"pulang\"");
        let kind: AttendanceKind = serde_json::from_str("\"arrival\"").unwrap();
        assert_eq!(kind, AttendanceKind::Arrival);
    }
}
