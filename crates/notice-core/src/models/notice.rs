//! Notice data models: fields, per-page extraction results and records.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel written to the department and user columns when no roster
/// entry matches the extracted plate.
pub const MATCH_FAILED: &str = "매칭 실패";

/// A field printed on a violation notice.
///
/// Variants are declared in capture order; templates are acquired and
/// extracted in exactly this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Vehicle registration plate.
    PlateNumber,
    /// Date of the violation.
    Date,
    /// Where the violation happened.
    Location,
    /// Fine amount.
    Fine,
    /// Payment due date.
    DueDate,
    /// Violation description.
    Description,
}

impl Field {
    /// All fields in capture order.
    pub const ALL: [Field; 6] = [
        Field::PlateNumber,
        Field::Date,
        Field::Location,
        Field::Fine,
        Field::DueDate,
        Field::Description,
    ];

    /// Label as printed on the notice.
    pub fn label(&self) -> &'static str {
        match self {
            Field::PlateNumber => "차량번호",
            Field::Date => "일자",
            Field::Location => "장소",
            Field::Fine => "과태료",
            Field::DueDate => "납기일",
            Field::Description => "내용",
        }
    }

    /// Operator hint shown while capturing the field's region.
    pub fn hint(&self) -> &'static str {
        match self {
            Field::PlateNumber => "plate looks like '000가0000' or '00가0000'",
            Field::Date => "violation date, any common date notation",
            Field::Location => "road or place name, often with 'CCTV' or 'IC'",
            Field::Fine => "amount between 10,000 and 500,000 won",
            Field::DueDate => "payment deadline date",
            Field::Description => "violation type such as parking, speed or signal",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which extraction strategy a page is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Authority notice with a fixed layout; uses template regions.
    FixedLayout,
    /// Any other notice; uses keyword cascades over the page text.
    Generic,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::FixedLayout => "fixed_layout",
            Classification::Generic => "generic",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of extracting a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FieldOutcome {
    /// A non-empty value was found.
    Extracted(String),
    /// The strategy ran but found nothing.
    Empty,
    /// The field has no region in the template.
    Absent,
    /// Cropping or OCR failed for this field only.
    Failed(String),
}

/// Raw per-field values for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Strategy that produced the values.
    pub classification: Classification,
    /// Outcome for every field.
    pub fields: BTreeMap<Field, FieldOutcome>,
}

impl ExtractionResult {
    /// Create a result with every field marked absent.
    pub fn new(classification: Classification) -> Self {
        Self {
            classification,
            fields: Field::ALL.iter().map(|f| (*f, FieldOutcome::Absent)).collect(),
        }
    }

    /// Store a strategy value; empty strings become [`FieldOutcome::Empty`].
    pub fn record(&mut self, field: Field, value: String) {
        let outcome = if value.is_empty() {
            FieldOutcome::Empty
        } else {
            FieldOutcome::Extracted(value)
        };
        self.fields.insert(field, outcome);
    }

    /// Mark a field as failed.
    pub fn fail(&mut self, field: Field, reason: impl Into<String>) {
        self.fields.insert(field, FieldOutcome::Failed(reason.into()));
    }

    pub fn outcome(&self, field: Field) -> &FieldOutcome {
        self.fields.get(&field).unwrap_or(&FieldOutcome::Absent)
    }

    /// The extracted value, if any.
    pub fn value(&self, field: Field) -> Option<&str> {
        match self.outcome(field) {
            FieldOutcome::Extracted(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// The extracted value, or the empty string for any other outcome.
    pub fn raw(&self, field: Field) -> &str {
        self.value(field).unwrap_or("")
    }

    /// Fields whose extraction failed, with the failure reason.
    pub fn failures(&self) -> impl Iterator<Item = (Field, &str)> {
        self.fields.iter().filter_map(|(field, outcome)| match outcome {
            FieldOutcome::Failed(reason) => Some((*field, reason.as_str())),
            _ => None,
        })
    }
}

/// Roster data attached to a record after a successful plate match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedUser {
    pub department: String,
    pub name: String,
    pub plate_number: String,
}

/// Canonical record for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Source file of the page.
    pub file_name: String,

    /// Strategy used for the page.
    pub classification: Classification,

    /// Roster plate when matched, otherwise the extracted plate text.
    pub plate_number: String,

    /// Violation date as `YYYY/MM/DD`, `00` marking unknown segments.
    pub date: String,

    pub location: String,

    /// Fine as extracted, e.g. `50,000원`.
    pub fine: String,

    /// Due date as `YYYY/MM/DD`, `00` marking unknown segments.
    pub due_date: String,

    pub description: String,

    /// Fine after the early-payment reduction; absent when the fine has no digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_fine: Option<String>,

    /// Roster entry the plate resolved to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_user: Option<MatchedUser>,
}

/// One row of the tabular batch output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeRow {
    pub department: String,
    pub user: String,
    pub plate: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub fine: String,
    pub due_date: String,
    pub discounted_fine: String,
    pub file_name: String,
    pub classification: String,
    pub error: String,
}

impl NoticeRow {
    /// Row for a successfully processed page.
    pub fn from_record(record: &NormalizedRecord) -> Self {
        let (department, user) = match &record.matched_user {
            Some(user) => (user.department.clone(), user.name.clone()),
            None => (MATCH_FAILED.to_string(), MATCH_FAILED.to_string()),
        };

        Self {
            department,
            user,
            plate: record.plate_number.clone(),
            date: record.date.clone(),
            location: record.location.clone(),
            description: record.description.clone(),
            fine: record.fine.clone(),
            due_date: record.due_date.clone(),
            discounted_fine: record.discounted_fine.clone().unwrap_or_default(),
            file_name: record.file_name.clone(),
            classification: record.classification.to_string(),
            error: String::new(),
        }
    }

    /// Row for a page that stopped before producing a record.
    pub fn failed(
        file_name: &str,
        classification: Option<Classification>,
        reason: &str,
    ) -> Self {
        Self {
            department: String::new(),
            user: String::new(),
            plate: String::new(),
            date: String::new(),
            location: String::new(),
            description: String::new(),
            fine: String::new(),
            due_date: String::new(),
            discounted_fine: String::new(),
            file_name: file_name.to_string(),
            classification: classification.map(|c| c.to_string()).unwrap_or_default(),
            error: reason.to_string(),
        }
    }
}
