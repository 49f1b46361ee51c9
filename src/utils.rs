use crate::error::{ExportError, Result};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9]").expect("static pattern"));

/// Replace every character outside `[A-Za-z0-9]` with `_`
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

/// File name for a document with a captured image, e.g. `Sprint_Health_20240314.pdf`
pub fn export_filename(dashboard_name: &str, date: NaiveDate) -> String {
    format!(
        "{}_{}.pdf",
        sanitize_filename(dashboard_name),
        date.format("%Y%m%d")
    )
}

/// File name for a metadata-only document
pub fn metadata_filename(dashboard_name: &str) -> String {
    format!("{}_metadata.pdf", sanitize_filename(dashboard_name))
}

/// URL of a dashboard page inside an Azure DevOps organization
pub fn build_dashboard_url(base_url: &str, project: &str, dashboard_id: &str) -> Result<Url> {
    let invalid = |reason: String| ExportError::Config(format!("organization URL {:?}: {}", base_url, reason));

    let mut url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("cannot hold a path".to_string()))?
        .pop_if_empty()
        .push(project)
        .push("_dashboards")
        .push("dashboard")
        .push(dashboard_id);
    Ok(url)
}
