pub mod artifact;
pub mod config;
pub mod logging;
pub mod patch;
pub mod plan;
pub mod stream;
pub mod types;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use artifact::{parse, parse_settled, sanitize, BlockParser, ParserOptions};
pub use patch::{apply_patch, is_patch, PatchEngine, PatchOptions, PatchReport};
pub use plan::{detect_plan, extract_plan, PlanError};
pub use stream::{drive, Reconciled, SessionOutcome, StreamDriver, StreamUpdate};
pub use types::{ArtifactMap, Plan, PlanStructure, Snapshot};
