mod artifact;
mod plan;

pub use artifact::{ArtifactMap, Snapshot};
pub use plan::{Plan, PlanStructure};
