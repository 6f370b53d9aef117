use crate::artifact::{find_continuation, BlockParser, ParserOptions};
use crate::patch::{is_patch, PatchEngine, PatchOptions, PatchReport};
use crate::plan::extract_plan;
use crate::types::{ArtifactMap, Plan, Snapshot};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionOptions {
    pub parser: ParserOptions,
    pub patch: PatchOptions,
}

/// Artifacts of a finished session with patches resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    pub files: BTreeMap<String, String>,
    /// Reports for artifacts that arrived as patches.
    pub patches: BTreeMap<String, PatchReport>,
    pub latest: Option<String>,
    /// Continuation target announced with `<!-- NEXT: path -->`.
    pub next: Option<String>,
}

impl Reconciled {
    pub fn merge_into(&self, working_set: &mut BTreeMap<String, String>) {
        for (path, content) in &self.files {
            working_set.insert(path.clone(), content.clone());
        }
    }

    /// Number of patch operations that could not be located.
    pub fn failed_operations(&self) -> usize {
        self.patches
            .values()
            .map(|report| report.failures().count())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The response proposed a plan instead of writing files.
    Plan { plan: Plan },
    Artifacts(Reconciled),
    /// No artifact markers: the response is conversational text.
    Conversation { text: String },
}

/// Resolves extracted artifacts against the pre-session snapshot.
///
/// Patch-formatted artifacts are applied to the snapshot's content for the
/// same path (empty when the snapshot lacks it); anything else replaces the
/// file wholesale.
pub fn reconcile_artifacts(
    artifacts: &ArtifactMap,
    snapshot: &Snapshot,
    options: PatchOptions,
) -> Reconciled {
    let engine = PatchEngine::new(options);
    let mut reconciled = Reconciled {
        latest: artifacts.latest().map(str::to_string),
        ..Reconciled::default()
    };

    for (path, content) in artifacts.iter() {
        if !is_patch(content) {
            reconciled.files.insert(path.to_string(), content.to_string());
            continue;
        }

        let report = engine.reconcile(snapshot.original_for(path), content);
        debug!(
            path,
            operations = report.operations.len(),
            applied = report.all_applied(),
            "patch reconciled"
        );
        reconciled
            .files
            .insert(path.to_string(), report.content.clone());
        reconciled.patches.insert(path.to_string(), report);
    }

    reconciled
}

pub(crate) fn conclude(
    text: &str,
    parser: &BlockParser,
    snapshot: &Snapshot,
    options: SessionOptions,
) -> SessionOutcome {
    if let Some(plan) = extract_plan(text) {
        info!(title = %plan.title, "response carries a plan");
        return SessionOutcome::Plan { plan };
    }

    let artifacts = parser.parse_settled(text);
    if artifacts.is_empty() {
        debug!("no artifact markers in response");
        return SessionOutcome::Conversation {
            text: text.to_string(),
        };
    }

    let mut reconciled = reconcile_artifacts(&artifacts, snapshot, options.patch);
    reconciled.next = find_continuation(text);
    info!(
        files = reconciled.files.len(),
        patched = reconciled.patches.len(),
        failed_operations = reconciled.failed_operations(),
        "session reconciled"
    );
    SessionOutcome::Artifacts(reconciled)
}
