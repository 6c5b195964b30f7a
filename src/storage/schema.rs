//! Database schema definitions

/// Name of the only table
pub const PROJECTS_TABLE: &str = "projects";

/// SQL to create the projects table
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id TEXT UNIQUE,
    project_number TEXT,
    project_name TEXT,
    project_created_on TEXT,
    project_status INTEGER,
    facility_name TEXT,
    city INTEGER,
    county INTEGER,
    type_of_work INTEGER,
    estimated_cost REAL,
    data_version_id INTEGER,
    estimated_start_date TEXT,
    estimated_end_date TEXT,
    date_scraped TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)
"#;

/// SQL to drop the projects table
pub const DROP_PROJECTS_TABLE: &str = "DROP TABLE IF EXISTS projects";

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_projects_number ON projects(project_number)",
    "CREATE INDEX IF NOT EXISTS idx_projects_scraped ON projects(date_scraped)",
];

/// Column list shared by every SELECT, in `StoredProject` field order
pub const PROJECT_COLUMNS: &str = "id, project_id, project_number, project_name, project_created_on, \
     project_status, facility_name, city, county, type_of_work, estimated_cost, data_version_id, \
     estimated_start_date, estimated_end_date, date_scraped";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_PROJECTS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
