use serde::{Deserialize, Serialize};

/// Proposed project layout emitted instead of file content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub title: String,
    pub description: String,
    pub structure: PlanStructure,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStructure {
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
}

impl Plan {
    /// Every planned path, frontend entries first.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.structure
            .frontend
            .iter()
            .chain(self.structure.backend.iter())
            .map(String::as_str)
    }
}
