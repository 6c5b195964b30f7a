//! Project record types
//!
//! A project moves through two shapes:
//! - `ApiProject`: one entry of the `data` array returned by the TABS search API,
//!   with the agency's PascalCase field names
//! - `StoredProject`: one row of the `projects` table, including the row id and
//!   the local ingestion timestamp

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A project entry as returned by the search API.
///
/// Every field is optional; the API omits or nulls fields freely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiProject {
    #[serde(rename = "ProjectId", default, deserialize_with = "string_or_number")]
    pub project_id: Option<String>,
    #[serde(rename = "ProjectNumber", default, deserialize_with = "string_or_number")]
    pub project_number: Option<String>,
    #[serde(rename = "ProjectName", default)]
    pub project_name: Option<String>,
    #[serde(rename = "ProjectCreatedOn", default)]
    pub project_created_on: Option<String>,
    #[serde(rename = "ProjectStatus", default)]
    pub project_status: Option<i64>,
    #[serde(rename = "FacilityName", default)]
    pub facility_name: Option<String>,
    #[serde(rename = "City", default)]
    pub city: Option<i64>,
    #[serde(rename = "County", default)]
    pub county: Option<i64>,
    #[serde(rename = "TypeOfWork", default)]
    pub type_of_work: Option<i64>,
    #[serde(rename = "EstimatedCost", default)]
    pub estimated_cost: Option<f64>,
    #[serde(rename = "DataVersionId", default)]
    pub data_version_id: Option<i64>,
    #[serde(rename = "EstimatedStartDate", default)]
    pub estimated_start_date: Option<String>,
    #[serde(rename = "EstimatedEndDate", default)]
    pub estimated_end_date: Option<String>,
}

impl ApiProject {
    /// Create a project carrying only a project number and name
    pub fn new(project_number: impl Into<String>, project_name: impl Into<String>) -> Self {
        Self {
            project_number: Some(project_number.into()),
            project_name: Some(project_name.into()),
            ..Self::default()
        }
    }

    /// Identifier this project is stored under.
    ///
    /// Random when neither `ProjectId` nor `ProjectNumber` is present, so such
    /// records are never merged with each other.
    pub fn project_id(&self) -> ProjectId {
        ProjectId::derive(self.project_id.as_deref(), self.project_number.as_deref())
    }

    /// Label used in log lines
    pub fn label(&self) -> &str {
        self.project_number.as_deref().unwrap_or("<no project number>")
    }
}

/// Unique key of a stored project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectId(String);

impl ProjectId {
    /// Pick the provided id, else derive from the project number, else random.
    /// Empty strings count as absent.
    pub fn derive(provided: Option<&str>, project_number: Option<&str>) -> Self {
        match (non_empty(provided), non_empty(project_number)) {
            (Some(id), _) => Self(id.to_string()),
            (None, Some(number)) => Self::from_project_number(number),
            (None, None) => Self::random(),
        }
    }

    /// UUID v5 (DNS namespace) over the project number
    pub fn from_project_number(project_number: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_DNS, project_number.as_bytes()).to_string())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Accepts a JSON string, number, or null for text identifiers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

/// A row of the `projects` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredProject {
    pub id: i64,
    pub project_id: String,
    pub project_number: Option<String>,
    pub project_name: Option<String>,
    pub project_created_on: Option<String>,
    pub project_status: Option<i64>,
    pub facility_name: Option<String>,
    pub city: Option<i64>,
    pub county: Option<i64>,
    pub type_of_work: Option<i64>,
    pub estimated_cost: Option<f64>,
    pub data_version_id: Option<i64>,
    pub estimated_start_date: Option<String>,
    pub estimated_end_date: Option<String>,
    /// Local ingestion time, set by the store on every write
    pub date_scraped: Option<String>,
}
