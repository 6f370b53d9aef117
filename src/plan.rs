use crate::types::Plan;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static JSON_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json\b\s*(.*?)\s*```").expect("json fence regex should be valid")
});

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("no json fence in text")]
    NotPresent,
    #[error("json fence does not describe a plan: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodes the first `json`-tagged fence of `text` as a [`Plan`].
pub fn detect_plan(text: &str) -> Result<Plan, PlanError> {
    let body = JSON_FENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .ok_or(PlanError::NotPresent)?;
    Ok(serde_json::from_str(body.as_str())?)
}

/// Like [`detect_plan`], collapsing "no plan" and "bad plan" into `None`.
pub fn extract_plan(text: &str) -> Option<Plan> {
    match detect_plan(text) {
        Ok(plan) => Some(plan),
        Err(PlanError::NotPresent) => None,
        Err(err) => {
            debug!(%err, "ignoring malformed plan");
            None
        }
    }
}
