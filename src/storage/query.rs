//! Typed search query builder
//!
//! Column names come only from `SearchField`; the search term is always a
//! bound parameter.

use std::str::FromStr;
use rusqlite::types::Value;
use crate::{Error, Result};
use super::schema::{PROJECTS_TABLE, PROJECT_COLUMNS};

/// Maximum rows a search returns unless overridden
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Text columns a search may match against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    ProjectNumber,
    ProjectName,
    FacilityName,
}

impl SearchField {
    /// Column backing this field
    pub fn column(&self) -> &'static str {
        match self {
            SearchField::ProjectNumber => "project_number",
            SearchField::ProjectName => "project_name",
            SearchField::FacilityName => "facility_name",
        }
    }

    /// Get all searchable fields
    pub fn all() -> &'static [SearchField] {
        &[
            SearchField::ProjectNumber,
            SearchField::ProjectName,
            SearchField::FacilityName,
        ]
    }
}

impl FromStr for SearchField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "project_number" | "number" => Ok(SearchField::ProjectNumber),
            "project_name" | "name" => Ok(SearchField::ProjectName),
            "facility_name" | "facility" => Ok(SearchField::FacilityName),
            _ => Err(Error::UnknownField(s.to_string())),
        }
    }
}

impl std::fmt::Display for SearchField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A substring search over one or more `SearchField`s.
///
/// Each field contributes an exact pattern (`field LIKE term`) and a contains
/// pattern (`field LIKE %term%`); all of them are OR-ed together. Results are
/// newest first.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    term: String,
    fields: Vec<SearchField>,
    limit: usize,
}

impl SearchQuery {
    /// Search all fields, capped at `DEFAULT_SEARCH_LIMIT`
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            fields: SearchField::all().to_vec(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Restrict the search to `fields`. An empty list keeps all fields.
    pub fn fields(mut self, fields: &[SearchField]) -> Self {
        let mut chosen: Vec<SearchField> = Vec::new();
        for field in fields {
            if !chosen.contains(field) {
                chosen.push(*field);
            }
        }
        if !chosen.is_empty() {
            self.fields = chosen;
        }
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn searched_fields(&self) -> &[SearchField] {
        &self.fields
    }

    /// Build the SQL text and its positional parameters
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let contains = format!("%{}%", self.term);
        let mut conditions = Vec::with_capacity(self.fields.len() * 2);
        let mut params = Vec::with_capacity(self.fields.len() * 2 + 1);

        for field in &self.fields {
            for pattern in [&self.term, &contains] {
                conditions.push(format!("{} LIKE ?", field.column()));
                params.push(Value::Text(pattern.clone()));
            }
        }
        params.push(Value::Integer(self.limit as i64));

        let sql = format!(
            "SELECT {} FROM {} WHERE {} ORDER BY date_scraped DESC, id DESC LIMIT ?",
            PROJECT_COLUMNS,
            PROJECTS_TABLE,
            conditions.join(" OR ")
        );
        (sql, params)
    }
}
