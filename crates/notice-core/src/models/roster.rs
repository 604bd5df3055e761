//! Vehicle roster used to resolve plates to registered users.

use serde::{Deserialize, Serialize};

use crate::error::RosterError;

/// Accepted header names per column, in preference order.
const PLATE_COLUMNS: &[&str] = &["차량번호", "plate_number", "plate"];
const NAME_COLUMNS: &[&str] = &["성명", "name", "사용자", "user"];
const DEPARTMENT_COLUMNS: &[&str] = &["부서", "department"];

/// A registered vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub plate_number: String,
    pub name: String,
    pub department: String,
}

impl RosterEntry {
    pub fn new(
        plate_number: impl Into<String>,
        name: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            plate_number: plate_number.into(),
            name: name.into(),
            department: department.into(),
        }
    }
}

/// Ordered, read-only list of registered vehicles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    /// Build a roster from a header row and data rows.
    ///
    /// Requires plate, name and department columns. A `사용자` column stands
    /// in for a missing `성명` column.
    pub fn from_table<H, I>(headers: &[H], rows: I) -> Result<Self, RosterError>
    where
        H: AsRef<str>,
        I: IntoIterator<Item = Vec<String>>,
    {
        let find = |candidates: &[&str]| {
            candidates.iter().find_map(|name| {
                headers.iter().position(|h| h.as_ref().trim() == *name)
            })
        };

        let plate = find(PLATE_COLUMNS);
        let name = find(NAME_COLUMNS);
        let department = find(DEPARTMENT_COLUMNS);

        let missing: Vec<String> = [
            (plate, PLATE_COLUMNS[0]),
            (name, NAME_COLUMNS[0]),
            (department, DEPARTMENT_COLUMNS[0]),
        ]
        .iter()
        .filter(|(index, _)| index.is_none())
        .map(|(_, label)| label.to_string())
        .collect();

        let (Some(plate), Some(name), Some(department)) = (plate, name, department) else {
            return Err(RosterError::MissingColumns(missing));
        };

        let mut entries = Vec::new();
        for (row_index, row) in rows.into_iter().enumerate() {
            let cell = |index: usize, column: &str| {
                row.get(index)
                    .map(|value| value.trim().to_string())
                    .ok_or_else(|| RosterError::ShortRow {
                        row: row_index + 1,
                        column: column.to_string(),
                    })
            };

            entries.push(RosterEntry {
                plate_number: cell(plate, PLATE_COLUMNS[0])?,
                name: cell(name, NAME_COLUMNS[0])?,
                department: cell(department, DEPARTMENT_COLUMNS[0])?,
            });
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
