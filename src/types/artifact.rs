use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Artifacts extracted from one parse pass, keyed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMap {
    files: BTreeMap<String, String>,
    /// Path of the last marker in the buffer that produced content.
    latest: Option<String>,
}

impl ArtifactMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later inserts for the same path replace earlier ones.
    pub(crate) fn insert(&mut self, path: String, content: String) {
        self.latest = Some(path.clone());
        self.files.insert(path, content);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn latest(&self) -> Option<&str> {
        self.latest.as_deref()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .map(|(path, content)| (path.as_str(), content.as_str()))
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    pub fn into_files(self) -> BTreeMap<String, String> {
        self.files
    }

    /// Copies every artifact into a caller-held working set, overwriting
    /// entries with the same path.
    pub fn merge_into(&self, working_set: &mut BTreeMap<String, String>) {
        for (path, content) in &self.files {
            working_set.insert(path.clone(), content.clone());
        }
    }

    /// Paths whose content differs from `previous`, including new paths.
    pub fn changed_since(&self, previous: &ArtifactMap) -> Vec<String> {
        self.files
            .iter()
            .filter(|(path, content)| previous.get(path) != Some(content.as_str()))
            .map(|(path, _)| path.clone())
            .collect()
    }
}

/// Artifact contents captured before a generation session started.
///
/// The engine only ever reads from a snapshot; it is built once by the
/// caller and dropped when reconciliation for the session is done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, String>);

impl Snapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn capture(working_set: &BTreeMap<String, String>) -> Self {
        Self(working_set.clone())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Content a patch for `path` applies against; unknown paths start empty.
    pub fn original_for(&self, path: &str) -> &str {
        self.get(path).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Snapshot
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(path, content)| (path.into(), content.into()))
                .collect(),
        )
    }
}
