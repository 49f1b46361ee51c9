/// Supplies host context shown in document headers
pub trait ContextProvider {
    /// Display name of the current project or organization
    fn project_name(&self) -> &str;
}

/// Context taken from configuration or the command line
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    project: String,
}

impl StaticContext {
    pub fn new(project: &str) -> Self {
        Self {
            project: project.to_string(),
        }
    }
}

impl ContextProvider for StaticContext {
    fn project_name(&self) -> &str {
        &self.project
    }
}
