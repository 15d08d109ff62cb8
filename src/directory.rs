use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// An employee known to the attendance service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Employee {
    /// Identifier typed at login and encoded in the QR badge
    #[serde(alias = "id_karyawan")]
    pub employee_id: String,

    /// Display name
    #[serde(alias = "nama")]
    pub name: String,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Failed to read employee file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse employee data: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate employee id {0}")]
    Duplicate(String),

    #[error("Employee id cannot be empty")]
    EmptyId,
}

/// Read-only lookup table of employees.
///
/// The directory is fixed for the lifetime of the process; nothing writes
/// back to the file it was loaded from.
#[derive(Debug, Clone)]
pub struct EmployeeDirectory {
    employees: Vec<Employee>,
}

impl Default for EmployeeDirectory {
    fn default() -> Self {
        EmployeeDirectory {
            employees: vec![
                Employee {
                    employee_id: "12345".to_string(),
                    name: "John Doe".to_string(),
                },
                Employee {
                    employee_id: "67890".to_string(),
                    name: "Jane Smith".to_string(),
                },
            ],
        }
    }
}

impl EmployeeDirectory {
    /// Build a directory from a list of employees
    ///
    /// # Errors
    /// * Returns an error if an id is empty or appears twice
    pub fn new(employees: Vec<Employee>) -> Result<Self, DirectoryError> {
        for (i, employee) in employees.iter().enumerate() {
            if employee.employee_id.trim().is_empty() {
                return Err(DirectoryError::EmptyId);
            }
            if employees[..i]
                .iter()
                .any(|e| e.employee_id == employee.employee_id)
            {
                return Err(DirectoryError::Duplicate(employee.employee_id.clone()));
            }
        }
        Ok(EmployeeDirectory { employees })
    }

    /// Load a directory from a JSON array of employees
    ///
    /// Both `{"employee_id", "name"}` and the `{"id_karyawan", "nama"}`
    /// field names are accepted.
    ///
    /// # Arguments
    /// * `path` - Path to the JSON file
    ///
    /// # Returns
    /// * `Result<EmployeeDirectory, DirectoryError>` - The directory or an error
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let contents = fs::read_to_string(path)?;
        let employees: Vec<Employee> = serde_json::from_str(&contents)?;
        Self::new(employees)
    }

    /// Find an employee by exact id match
    pub fn find(&self, employee_id: &str) -> Option<&Employee> {
        self.employees.iter().find(|e| e.employee_id == employee_id)
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter()
    }
}
