//! SQLite storage implementation

use std::path::{Path, PathBuf};
use rusqlite::{Connection, params, params_from_iter, OptionalExtension};
use crate::{Result, Error};
use crate::project::{ApiProject, StoredProject};
use super::query::SearchQuery;
use super::schema;

/// SQLite-backed storage for scraped projects
#[derive(Debug, Clone)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    /// Point at a database file. Nothing is opened until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Point at a database file that must already exist
    pub fn open_existing(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        if !store.exists() {
            return Err(Error::StoreNotFound(store.path));
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    // ========== Schema ==========

    /// Create the table and indexes if they are missing. Existing rows are kept.
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        tracing::debug!("Schema ensured at {}", self.path.display());
        Ok(())
    }

    /// Drop the table and recreate it empty
    pub fn reset_schema(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(schema::DROP_PROJECTS_TABLE, [])?;
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        tracing::info!("Database reset at {}", self.path.display());
        Ok(())
    }

    // ========== Writes ==========

    /// Insert or replace each project keyed by its derived identifier.
    ///
    /// A record that fails to write is logged and skipped; the returned count
    /// covers only the records that were written.
    pub fn upsert(&self, projects: &[ApiProject]) -> Result<usize> {
        if projects.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let mut saved = 0;
        {
            let mut stmt = tx.prepare_cached(
                r#"
                INSERT OR REPLACE INTO projects
                (project_id, project_number, project_name, project_created_on,
                 project_status, facility_name, city, county, type_of_work,
                 estimated_cost, data_version_id, estimated_start_date, estimated_end_date,
                 date_scraped)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )?;

            for project in projects {
                let project_id = project.project_id();
                let result = stmt.execute(params![
                    project_id.as_str(),
                    project.project_number,
                    project.project_name,
                    project.project_created_on,
                    project.project_status,
                    project.facility_name,
                    project.city,
                    project.county,
                    project.type_of_work,
                    project.estimated_cost,
                    project.data_version_id,
                    project.estimated_start_date,
                    project.estimated_end_date,
                    scrape_timestamp(),
                ]);

                match result {
                    Ok(_) => saved += 1,
                    Err(e) => {
                        tracing::error!("Database error saving project {}: {}", project.label(), e);
                    }
                }
            }
        }
        tx.commit()?;

        Ok(saved)
    }

    // ========== Reads ==========

    /// Run a search. Failures are logged and yield empty results.
    pub fn search(&self, query: &SearchQuery) -> SearchResults {
        match self.try_search(query) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Search for '{}' failed: {}", query.term(), e);
                SearchResults::default()
            }
        }
    }

    /// Run a search, surfacing failures
    pub fn try_search(&self, query: &SearchQuery) -> Result<SearchResults> {
        let conn = self.connect()?;
        let (sql, params) = query.to_sql();
        let mut stmt = conn.prepare(&sql)?;

        let columns = stmt.column_names().into_iter().map(String::from).collect();
        let rows = stmt
            .query_map(params_from_iter(params), row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(SearchResults { columns, rows })
    }

    /// Get a project by its identifier
    pub fn get(&self, project_id: &str) -> Result<Option<StoredProject>> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {} FROM projects WHERE project_id = ?1", schema::PROJECT_COLUMNS),
            [project_id],
            row_to_project,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Count all projects
    pub fn count(&self) -> Result<usize> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// The first `limit` projects in row order
    pub fn sample(&self, limit: usize) -> Result<Vec<StoredProject>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projects ORDER BY id LIMIT ?1",
            schema::PROJECT_COLUMNS
        ))?;

        let projects = stmt
            .query_map([limit as i64], row_to_project)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(projects)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let conn = self.connect()?;
        let (projects, last_scraped): (i64, Option<String>) = conn.query_row(
            "SELECT COUNT(*), MAX(date_scraped) FROM projects",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(DbStats {
            projects: projects as usize,
            last_scraped,
        })
    }
}

/// Ingestion time with microseconds so consecutive writes sort in order
fn scrape_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Helper to convert a row selected with `PROJECT_COLUMNS` to a StoredProject
fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<StoredProject> {
    Ok(StoredProject {
        id: row.get(0)?,
        project_id: row.get(1)?,
        project_number: row.get(2)?,
        project_name: row.get(3)?,
        project_created_on: row.get(4)?,
        project_status: row.get(5)?,
        facility_name: row.get(6)?,
        city: row.get(7)?,
        county: row.get(8)?,
        type_of_work: row.get(9)?,
        estimated_cost: row.get(10)?,
        data_version_id: row.get(11)?,
        estimated_start_date: row.get(12)?,
        estimated_end_date: row.get(13)?,
        date_scraped: row.get(14)?,
    })
}

/// Column names and rows returned by a search
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub columns: Vec<String>,
    pub rows: Vec<StoredProject>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DbStats {
    pub projects: usize,
    pub last_scraped: Option<String>,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Projects: {}", self.projects)?;
        write!(f, "  Last scraped: {}", self.last_scraped.as_deref().unwrap_or("never"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SearchField;
    use crate::ProjectId;

    fn temp_store() -> (tempfile::TempDir, ProjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("projects.db"));
        store.ensure_schema().unwrap();
        (dir, store)
    }

    fn sample_project(number: &str, name: &str, facility: &str) -> ApiProject {
        ApiProject {
            facility_name: Some(facility.to_string()),
            ..ApiProject::new(number, name)
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let (_dir, store) = temp_store();
        let project = ApiProject {
            project_id: Some("p-1".to_string()),
            estimated_cost: Some(99.5),
            project_status: Some(2),
            ..sample_project("TABS1", "Austin Tower", "Tower One")
        };

        assert_eq!(store.upsert(&[project]).unwrap(), 1);

        let stored = store.get("p-1").unwrap().unwrap();
        assert_eq!(stored.project_number.as_deref(), Some("TABS1"));
        assert_eq!(stored.estimated_cost, Some(99.5));
        assert_eq!(stored.project_status, Some(2));
        assert!(stored.date_scraped.is_some());
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_by_identifier() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("TABS1", "Old Name", "Old Facility")]).unwrap();
        store.upsert(&[sample_project("TABS1", "New Name", "New Facility")]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let id = ProjectId::from_project_number("TABS1");
        let stored = store.get(id.as_str()).unwrap().unwrap();
        assert_eq!(stored.project_name.as_deref(), Some("New Name"));
        assert_eq!(stored.facility_name.as_deref(), Some("New Facility"));
    }

    #[test]
    fn test_records_without_keys_never_merge() {
        let (_dir, store) = temp_store();
        let anonymous = ApiProject {
            project_name: Some("Nameless".to_string()),
            ..ApiProject::default()
        };
        store.upsert(&[anonymous.clone(), anonymous]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_failed_record_is_skipped() {
        let (_dir, store) = temp_store();
        let conn = Connection::open(store.path()).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_bad BEFORE INSERT ON projects
             WHEN NEW.project_number = 'BAD'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
        drop(conn);

        let saved = store
            .upsert(&[
                sample_project("TABS1", "One", "F1"),
                sample_project("BAD", "Broken", "F2"),
                sample_project("TABS3", "Three", "F3"),
            ])
            .unwrap();

        assert_eq!(saved, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_ensure_schema_keeps_rows() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("TABS1", "One", "F1")]).unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_reset_schema_empties_table() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("TABS1", "One", "F1")]).unwrap();
        store.reset_schema().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_search_contains_and_exact() {
        let (_dir, store) = temp_store();
        store
            .upsert(&[
                sample_project("TABS1", "Austin Tower", "Tower One"),
                sample_project("TABS2", "Dallas Depot", "Depot"),
            ])
            .unwrap();

        let contains = store.search(&SearchQuery::new("Austin"));
        assert_eq!(contains.len(), 1);
        assert_eq!(contains.rows[0].project_name.as_deref(), Some("Austin Tower"));

        let exact = store.search(&SearchQuery::new("Austin Tower"));
        assert_eq!(exact.len(), 1);

        let by_number = store.search(&SearchQuery::new("TABS2"));
        assert_eq!(by_number.rows[0].project_name.as_deref(), Some("Dallas Depot"));

        let by_facility = store.search(&SearchQuery::new("Tower One"));
        assert_eq!(by_facility.len(), 1);

        assert!(store.search(&SearchQuery::new("Houston")).is_empty());
    }

    #[test]
    fn test_search_respects_fields() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("TABS1", "Austin Tower", "Tower One")]).unwrap();

        let query = SearchQuery::new("Austin").fields(&[SearchField::FacilityName]);
        assert!(store.search(&query).is_empty());

        let query = SearchQuery::new("Austin").fields(&[SearchField::ProjectName]);
        assert_eq!(store.search(&query).len(), 1);
    }

    #[test]
    fn test_search_orders_newest_first() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("A1", "Austin Alpha", "F")]).unwrap();
        store.upsert(&[sample_project("B1", "Austin Beta", "F")]).unwrap();

        let results = store.search(&SearchQuery::new("Austin"));
        let names: Vec<_> = results
            .rows
            .iter()
            .map(|r| r.project_name.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(names, vec!["Austin Beta", "Austin Alpha"]);
        assert_eq!(results.columns.first().map(String::as_str), Some("id"));
        assert_eq!(results.columns.last().map(String::as_str), Some("date_scraped"));
    }

    #[test]
    fn test_search_limit() {
        let (_dir, store) = temp_store();
        let projects: Vec<_> = (0..120)
            .map(|i| sample_project(&format!("TABS{i}"), "Austin", "F"))
            .collect();
        assert_eq!(store.upsert(&projects).unwrap(), 120);

        assert_eq!(store.search(&SearchQuery::new("Austin")).len(), 100);
        assert_eq!(store.search(&SearchQuery::new("Austin").limit(7)).len(), 7);
    }

    #[test]
    fn test_search_without_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("empty.db"));
        assert!(store.try_search(&SearchQuery::new("Austin")).is_err());
        assert!(store.search(&SearchQuery::new("Austin")).is_empty());
    }

    #[test]
    fn test_open_existing_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.db");
        assert!(matches!(
            ProjectStore::open_existing(&missing),
            Err(Error::StoreNotFound(_))
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_stats_and_sample() {
        let (_dir, store) = temp_store();
        assert_eq!(store.stats().unwrap().projects, 0);
        assert!(store.stats().unwrap().last_scraped.is_none());

        let projects: Vec<_> = (0..8)
            .map(|i| sample_project(&format!("TABS{i}"), "Name", "F"))
            .collect();
        store.upsert(&projects).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.projects, 8);
        assert!(stats.last_scraped.is_some());
        assert_eq!(store.sample(5).unwrap().len(), 5);
    }

    #[test]
    fn test_sample_reports_unreadable_rows() {
        let (_dir, store) = temp_store();
        store.upsert(&[sample_project("TABS1", "Name", "F")]).unwrap();
        store
            .connect()
            .unwrap()
            .execute("UPDATE projects SET project_status = 'pending'", [])
            .unwrap();

        assert!(store.sample(5).is_err());
    }
}
