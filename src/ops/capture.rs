use serde::Serialize;

use crate::model::fragment::Fragment;
use crate::ops::store::{Store, StoreError};
use crate::parse::{Grammar, NoMatch, parse_fragments, parse_with};

/// Error type for capture: either the input did not parse or the store
/// refused it. Neither changes the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    NoMatch(#[from] NoMatch),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a captured task landed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "placement", rename_all = "lowercase")]
pub enum Captured {
    Bed {
        bed_id: String,
        bed_label: String,
        task_id: String,
    },
    Unassigned {
        task_id: String,
    },
}

impl Captured {
    pub fn task_id(&self) -> &str {
        match self {
            Captured::Bed { task_id, .. } | Captured::Unassigned { task_id } => task_id,
        }
    }
}

/// Parse one line of shorthand and add the task to its bed.
pub fn capture_line(
    store: &mut Store,
    raw: &str,
    grammar: Grammar,
) -> Result<Captured, CaptureError> {
    let parsed = parse_with(raw, grammar)?;
    let task_id = store.add_task(&parsed.bed_label, &parsed.task_text)?;
    placed_on_bed(store, &parsed.bed_label, task_id)
}

/// Resolve a fragment sequence and add the task to its bed, or to the
/// unassigned bucket when no bed capsule is present.
pub fn capture_fragments(
    store: &mut Store,
    fragments: &[Fragment],
) -> Result<Captured, CaptureError> {
    let capture = parse_fragments(fragments)?;
    match capture.bed_label {
        Some(label) => {
            let task_id = store.add_task(&label, &capture.task_text)?;
            placed_on_bed(store, &label, task_id)
        }
        None => {
            let task_id = store.add_unassigned(&capture.task_text)?;
            Ok(Captured::Unassigned { task_id })
        }
    }
}

fn placed_on_bed(store: &Store, label: &str, task_id: String) -> Result<Captured, CaptureError> {
    let bed = store
        .bed_by_label(label)
        .ok_or_else(|| StoreError::NotFound(format!("bed {}", label)))?;
    Ok(Captured::Bed {
        bed_id: bed.id.clone(),
        bed_label: bed.label.clone(),
        task_id,
    })
}
