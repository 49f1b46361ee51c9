use crate::error::{ExportError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Point-in-time copy of a dashboard, used for one export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Dashboard identifier
    #[serde(default)]
    pub id: String,

    /// Display name
    pub name: String,

    /// Optional description (an empty string counts as absent)
    #[serde(default)]
    pub description: Option<String>,

    /// Identifier of the owner
    #[serde(default)]
    pub owner_id: Option<String>,

    /// Identifier of the last modifier
    #[serde(default)]
    pub modified_by: Option<String>,

    #[serde(default)]
    pub last_accessed_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub modified_date: Option<DateTime<Utc>>,

    /// Widgets in dashboard order
    #[serde(default)]
    pub widgets: Vec<WidgetSummary>,
}

/// A widget placed on the dashboard grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSummary {
    #[serde(default)]
    pub id: String,

    pub name: String,

    /// Contribution (widget type) identifier
    #[serde(default)]
    pub contribution_id: String,

    #[serde(default)]
    pub position: GridPosition,

    #[serde(default)]
    pub size: GridSize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub column: u32,
    pub row: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSize {
    pub column_span: u32,
    pub row_span: u32,
}

impl DashboardSnapshot {
    /// Create a snapshot with just a name and widgets
    pub fn new(id: &str, name: &str, widgets: Vec<WidgetSummary>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            widgets,
            ..Self::default()
        }
    }

    /// Description, treating blank text as missing
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Most relevant "last modified" timestamp
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.modified_date.or(self.last_accessed_date)
    }

    /// Parse a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| ExportError::SnapshotUnavailable(format!("invalid snapshot JSON: {}", e)))?;

        if snapshot.name.trim().is_empty() {
            return Err(ExportError::SnapshotUnavailable(
                "snapshot has no dashboard name".to_string(),
            ));
        }
        Ok(snapshot)
    }
}

impl WidgetSummary {
    pub fn new(name: &str, column: u32, row: u32, column_span: u32, row_span: u32) -> Self {
        Self {
            id: String::new(),
            name: name.to_string(),
            contribution_id: String::new(),
            position: GridPosition { column, row },
            size: GridSize {
                column_span,
                row_span,
            },
        }
    }
}

/// Anything that can hand the exporter a dashboard snapshot
#[allow(async_fn_in_trait)]
pub trait SnapshotSource {
    async fn fetch(&self) -> Result<DashboardSnapshot>;
}

/// Reads a snapshot previously saved as JSON
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SnapshotSource for JsonSnapshotSource {
    async fn fetch(&self) -> Result<DashboardSnapshot> {
        ::log::debug!("Reading dashboard snapshot from {}", self.path.display());
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            ExportError::SnapshotUnavailable(format!("{}: {}", self.path.display(), e))
        })?;
        DashboardSnapshot::from_json(&contents)
    }
}

/// A snapshot already held in memory
impl SnapshotSource for DashboardSnapshot {
    async fn fetch(&self) -> Result<DashboardSnapshot> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devops_shape() {
        let json = r#"{
            "id": "d1",
            "name": "Sprint Health",
            "description": "",
            "ownerId": "o1",
            "modifiedDate": "2024-03-01T10:00:00Z",
            "widgets": [
                {"id": "w1", "name": "Burndown", "contributionId": "ms.burndown",
                 "position": {"column": 1, "row": 2}, "size": {"columnSpan": 2, "rowSpan": 1}}
            ]
        }"#;
        let snapshot = DashboardSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.name, "Sprint Health");
        assert_eq!(snapshot.description(), None);
        assert_eq!(snapshot.widgets.len(), 1);
        assert_eq!(snapshot.widgets[0].size.column_span, 2);
        assert_eq!(snapshot.widgets[0].position.row, 2);
        assert!(snapshot.last_modified().is_some());
    }

    #[test]
    fn test_missing_name_is_unavailable() {
        let result = DashboardSnapshot::from_json(r#"{"id": "d1", "name": "  "}"#);
        assert!(matches!(result, Err(ExportError::SnapshotUnavailable(_))));

        let result = DashboardSnapshot::from_json("not json");
        assert!(matches!(result, Err(ExportError::SnapshotUnavailable(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = JsonSnapshotSource::new("/nonexistent/snapshot.json");
        let result = source.fetch().await;
        assert!(matches!(result, Err(ExportError::SnapshotUnavailable(_))));
    }

    #[test]
    fn test_last_modified_falls_back_to_last_accessed() {
        let mut snapshot = DashboardSnapshot::new("d", "Ops", Vec::new());
        let accessed = "2024-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        snapshot.last_accessed_date = Some(accessed);
        assert_eq!(snapshot.last_modified(), Some(accessed));
    }
}
