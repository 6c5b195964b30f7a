use crate::project::StoredProject;
use tabled::{settings::Style, Table, Tabled};

/// Rows printed for a search; the rest are summarized
pub const DISPLAY_LIMIT: usize = 20;

#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "Project ID")]
    pub project_id: String,
    #[tabled(rename = "Project Number")]
    pub project_number: String,
    #[tabled(rename = "Facility Name")]
    pub facility_name: String,
    #[tabled(rename = "Project Name")]
    pub project_name: String,
}

impl ProjectRow {
    pub fn from_project(project: &StoredProject) -> Self {
        Self {
            project_id: clip(Some(&project.project_id), 35),
            project_number: clip(project.project_number.as_deref(), 14),
            facility_name: clip(project.facility_name.as_deref(), 19),
            project_name: clip(project.project_name.as_deref(), 19),
        }
    }
}

/// Keep at most `width` characters
fn clip(value: Option<&str>, width: usize) -> String {
    value.unwrap_or("").chars().take(width).collect()
}

/// Render up to `DISPLAY_LIMIT` projects, plus a trailing count of the rest
pub fn results_table(projects: &[StoredProject]) -> String {
    if projects.is_empty() {
        return String::new();
    }

    let rows: Vec<ProjectRow> = projects
        .iter()
        .take(DISPLAY_LIMIT)
        .map(ProjectRow::from_project)
        .collect();
    let mut out = Table::new(&rows).with(Style::psql()).to_string();

    if projects.len() > DISPLAY_LIMIT {
        out.push_str(&format!("\n... and {} more results", projects.len() - DISPLAY_LIMIT));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(i: usize) -> StoredProject {
        StoredProject {
            id: i as i64,
            project_id: format!("{:08}-aaaa-bbbb-cccc-dddddddddddd", i),
            project_number: Some(format!("TABS2024{:06}", i)),
            project_name: Some("A Very Long Project Name Indeed".to_string()),
            project_created_on: None,
            project_status: None,
            facility_name: None,
            city: None,
            county: None,
            type_of_work: None,
            estimated_cost: None,
            data_version_id: None,
            estimated_start_date: None,
            estimated_end_date: None,
            date_scraped: None,
        }
    }

    #[test]
    fn test_clip() {
        assert_eq!(clip(Some("Austin Tower"), 6), "Austin");
        assert_eq!(clip(None, 6), "");
    }

    #[test]
    fn test_table_truncates_cells() {
        let out = results_table(&[project(1)]);
        assert!(out.contains("Project Number"));
        assert!(out.contains("A Very Long Project"));
        assert!(!out.contains("A Very Long Project Name"));
        assert!(!out.contains("more results"));
    }

    #[test]
    fn test_table_summarizes_overflow() {
        let projects: Vec<_> = (0..25).map(project).collect();
        let out = results_table(&projects);
        assert!(out.contains("TABS2024000019"));
        assert!(!out.contains("TABS2024000020"));
        assert!(out.ends_with("... and 5 more results"));
    }

    #[test]
    fn test_empty_table() {
        assert!(results_table(&[]).is_empty());
    }
}
