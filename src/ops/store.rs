use std::collections::HashSet;
use std::fmt;

use log::warn;

use crate::model::bed::Bed;
use crate::model::task::Task;
use crate::parse::normalize_label;

const BED_PREFIX: &str = "B-";
const TASK_PREFIX: &str = "T-";
/// Largest ID number accepted from a snapshot
const MAX_ID_NUMBER: usize = u32::MAX as usize;

/// Error type for store operations. A failed operation leaves the store
/// exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task content is empty")]
    InvalidContent,
    #[error("bed label is empty")]
    InvalidLabel,
    #[error("not found: {0}")]
    NotFound(String),
}

/// Board-wide counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardStats {
    pub beds: usize,
    pub pending: usize,
    pub done: usize,
    pub unassigned: usize,
}

/// The authoritative bed/task collection.
///
/// Beds are kept sorted by label and labels are unique. Tasks captured
/// without a bed live in a separate unassigned bucket. `revision` moves
/// once per committed mutation so readers can tell when to re-read.
#[derive(Debug, Clone)]
pub struct Store {
    name: String,
    beds: Vec<Bed>,
    unassigned: Vec<Task>,
    next_bed: usize,
    next_task: usize,
    revision: u64,
}

impl Store {
    pub fn new(name: impl Into<String>) -> Self {
        Store {
            name: name.into(),
            beds: Vec::new(),
            unassigned: Vec::new(),
            next_bed: 1,
            next_task: 1,
            revision: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All beds, sorted by label
    pub fn beds(&self) -> &[Bed] {
        &self.beds
    }

    pub fn unassigned(&self) -> &[Task] {
        &self.unassigned
    }

    pub fn bed(&self, bed_id: &str) -> Option<&Bed> {
        self.beds.iter().find(|b| b.id == bed_id)
    }

    /// Look up a bed by label; the label is normalized first.
    pub fn bed_by_label(&self, label: &str) -> Option<&Bed> {
        let label = normalize_label(label);
        self.beds.iter().find(|b| b.label == label)
    }

    /// Accept either a bed ID (`B-002`) or a label (`5a01`, `05A-01`).
    pub fn resolve_bed(&self, id_or_label: &str) -> Option<&Bed> {
        self.bed(id_or_label.trim())
            .or_else(|| self.bed_by_label(id_or_label))
    }

    /// Counters the next bed and task IDs will be drawn from
    pub fn next_ids(&self) -> (usize, usize) {
        (self.next_bed, self.next_task)
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            beds: self.beds.len(),
            pending: self.beds.iter().map(Bed::pending_count).sum(),
            done: self.beds.iter().map(Bed::done_count).sum(),
            unassigned: self.unassigned.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Return the bed with this label, creating an empty one if needed.
    pub fn upsert_bed(&mut self, label: &str) -> Result<&Bed, StoreError> {
        let label = normalize_label(label);
        if label.is_empty() {
            return Err(StoreError::InvalidLabel);
        }
        let (idx, created) = self.upsert_index(label);
        if created {
            self.revision += 1;
        }
        Ok(&self.beds[idx])
    }

    /// Append a pending task to the bed with this label, creating the bed
    /// on first reference. Returns the new task ID.
    pub fn add_task(&mut self, bed_label: &str, content: &str) -> Result<String, StoreError> {
        let content = checked_content(content)?;
        let label = normalize_label(bed_label);
        if label.is_empty() {
            return Err(StoreError::InvalidLabel);
        }
        let id = self.take_task_id();
        let (idx, _) = self.upsert_index(label);
        self.beds[idx].tasks.push(Task::new(id.clone(), content));
        self.revision += 1;
        Ok(id)
    }

    /// Append a task with no bed association.
    pub fn add_unassigned(&mut self, content: &str) -> Result<String, StoreError> {
        let content = checked_content(content)?;
        let id = self.take_task_id();
        self.unassigned.push(Task::new(id.clone(), content));
        self.revision += 1;
        Ok(id)
    }

    /// Flip a task's done flag. Returns the new flag.
    pub fn toggle_task(&mut self, bed_id: &str, task_id: &str) -> Result<bool, StoreError> {
        let Some(bed) = self.beds.iter_mut().find(|b| b.id == bed_id) else {
            return Err(not_found(format!("bed {}", bed_id)));
        };
        let Some(task) = bed.task_mut(task_id) else {
            return Err(not_found(format!("task {} in bed {}", task_id, bed_id)));
        };
        task.toggle();
        let done = task.is_done;
        self.revision += 1;
        Ok(done)
    }

    pub fn toggle_unassigned(&mut self, task_id: &str) -> Result<bool, StoreError> {
        let Some(task) = self.unassigned.iter_mut().find(|t| t.id == task_id) else {
            return Err(not_found(format!("unassigned task {}", task_id)));
        };
        task.toggle();
        let done = task.is_done;
        self.revision += 1;
        Ok(done)
    }

    /// Remove done tasks from a bed, keeping the order of the rest.
    /// Returns how many were removed.
    pub fn clear_completed(&mut self, bed_id: &str) -> Result<usize, StoreError> {
        let Some(bed) = self.beds.iter_mut().find(|b| b.id == bed_id) else {
            return Err(not_found(format!("bed {}", bed_id)));
        };
        let removed = prune_done(&mut bed.tasks);
        if removed > 0 {
            self.revision += 1;
        }
        Ok(removed)
    }

    pub fn clear_unassigned_completed(&mut self) -> usize {
        let removed = prune_done(&mut self.unassigned);
        if removed > 0 {
            self.revision += 1;
        }
        removed
    }

    /// Move an unassigned task onto a bed (created on demand). ID, flag and
    /// timestamp are kept. Returns the bed ID.
    pub fn assign(&mut self, task_id: &str, bed_label: &str) -> Result<String, StoreError> {
        let label = normalize_label(bed_label);
        if label.is_empty() {
            return Err(StoreError::InvalidLabel);
        }
        let Some(pos) = self.unassigned.iter().position(|t| t.id == task_id) else {
            return Err(not_found(format!("unassigned task {}", task_id)));
        };
        let task = self.unassigned.remove(pos);
        let (idx, _) = self.upsert_index(label);
        self.beds[idx].tasks.push(task);
        self.revision += 1;
        Ok(self.beds[idx].id.clone())
    }

    // -----------------------------------------------------------------------
    // Rehydration
    // -----------------------------------------------------------------------

    /// Rebuild a store from persisted parts, restoring every invariant the
    /// live store keeps: normalized unique labels, sorted beds, non-empty
    /// trimmed content, unique IDs. Each fix is reported.
    pub fn rehydrate(
        name: impl Into<String>,
        beds: Vec<Bed>,
        unassigned: Vec<Task>,
        next_ids: (usize, usize),
    ) -> (Store, Vec<Repair>) {
        let mut repairs = Vec::new();
        let mut store = Store::new(name);

        // Counters never move backwards, and never below what is in use.
        // Out-of-range IDs are not counted; they get fresh IDs below.
        let max_bed = max_id_number(beds.iter().map(|b| b.id.as_str()), BED_PREFIX);
        store.next_bed = next_ids.0.min(MAX_ID_NUMBER + 1).max(max_bed + 1);
        let all_task_ids = beds
            .iter()
            .flat_map(|b| b.tasks.iter())
            .chain(unassigned.iter())
            .map(|t| t.id.as_str());
        let max_task = max_id_number(all_task_ids, TASK_PREFIX);
        store.next_task = next_ids.1.min(MAX_ID_NUMBER + 1).max(max_task + 1);

        let mut seen_tasks = HashSet::new();
        let mut seen_beds = HashSet::new();

        for bed in beds {
            let label = normalize_label(&bed.label);
            let tasks =
                store.repair_tasks(bed.tasks, Some(label.as_str()), &mut seen_tasks, &mut repairs);
            if label.is_empty() {
                repairs.push(Repair::UnlabeledBed {
                    bed_id: bed.id,
                    moved: tasks.len(),
                });
                store.unassigned.extend(tasks);
                continue;
            }
            if label != bed.label {
                repairs.push(Repair::RelabeledBed {
                    from: bed.label.clone(),
                    to: label.clone(),
                });
            }
            if let Some(existing) = store.beds.iter_mut().find(|b| b.label == label) {
                repairs.push(Repair::MergedBed {
                    label,
                    from_id: bed.id,
                    into_id: existing.id.clone(),
                });
                existing.tasks.extend(tasks);
                continue;
            }
            let mut id = bed.id;
            if id.trim().is_empty()
                || id_out_of_range(&id, BED_PREFIX)
                || !seen_beds.insert(id.clone())
            {
                let fresh = store.take_bed_id();
                repairs.push(Repair::ReassignedId {
                    from: id,
                    to: fresh.clone(),
                });
                seen_beds.insert(fresh.clone());
                id = fresh;
            }
            store.beds.push(Bed { id, label, tasks });
        }

        let loose = store.repair_tasks(unassigned, None, &mut seen_tasks, &mut repairs);
        store.unassigned.extend(loose);
        store.beds.sort_by(|a, b| a.label.cmp(&b.label));

        (store, repairs)
    }

    fn repair_tasks(
        &mut self,
        tasks: Vec<Task>,
        bed_label: Option<&str>,
        seen: &mut HashSet<String>,
        repairs: &mut Vec<Repair>,
    ) -> Vec<Task> {
        let mut kept = Vec::with_capacity(tasks.len());
        for mut task in tasks {
            let content = task.content.trim();
            if content.is_empty() {
                repairs.push(Repair::DroppedEmptyTask {
                    task_id: task.id,
                    bed_label: bed_label.map(str::to_string),
                });
                continue;
            }
            if content.len() != task.content.len() {
                task.content = content.to_string();
            }
            if task.id.trim().is_empty()
                || id_out_of_range(&task.id, TASK_PREFIX)
                || !seen.insert(task.id.clone())
            {
                let fresh = self.take_task_id();
                repairs.push(Repair::ReassignedId {
                    from: task.id.clone(),
                    to: fresh.clone(),
                });
                seen.insert(fresh.clone());
                task.id = fresh;
            }
            kept.push(task);
        }
        kept
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Index of the bed with this (already normalized) label, inserting a new
    /// bed in sorted position when missing.
    fn upsert_index(&mut self, label: String) -> (usize, bool) {
        match self.beds.binary_search_by(|b| b.label.as_str().cmp(&label)) {
            Ok(idx) => (idx, false),
            Err(idx) => {
                let id = self.take_bed_id();
                self.beds.insert(idx, Bed::new(id, label));
                (idx, true)
            }
        }
    }

    fn take_bed_id(&mut self) -> String {
        let id = format!("{}{:03}", BED_PREFIX, self.next_bed);
        self.next_bed += 1;
        id
    }

    fn take_task_id(&mut self) -> String {
        let id = format!("{}{:04}", TASK_PREFIX, self.next_task);
        self.next_task += 1;
        id
    }
}

/// A fix applied while rehydrating a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Repair {
    RelabeledBed { from: String, to: String },
    MergedBed { label: String, from_id: String, into_id: String },
    UnlabeledBed { bed_id: String, moved: usize },
    DroppedEmptyTask { task_id: String, bed_label: Option<String> },
    ReassignedId { from: String, to: String },
}

impl fmt::Display for Repair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repair::RelabeledBed { from, to } => write!(f, "relabeled bed {:?} as {}", from, to),
            Repair::MergedBed {
                label,
                from_id,
                into_id,
            } => write!(f, "merged bed {} into {} (duplicate label {})", from_id, into_id, label),
            Repair::UnlabeledBed { bed_id, moved } => {
                write!(f, "bed {} had no label; {} task(s) moved to unassigned", bed_id, moved)
            }
            Repair::DroppedEmptyTask { task_id, bed_label } => match bed_label {
                Some(label) => write!(f, "dropped empty task {:?} from {}", task_id, label),
                None => write!(f, "dropped empty unassigned task {:?}", task_id),
            },
            Repair::ReassignedId { from, to } => {
                write!(f, "reassigned id {:?} to {}", from, to)
            }
        }
    }
}

fn checked_content(content: &str) -> Result<String, StoreError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(StoreError::InvalidContent);
    }
    Ok(content.to_string())
}

fn not_found(what: String) -> StoreError {
    warn!("not found: {}", what);
    StoreError::NotFound(what)
}

fn prune_done(tasks: &mut Vec<Task>) -> usize {
    let before = tasks.len();
    tasks.retain(|t| !t.is_done);
    before - tasks.len()
}

/// Highest in-range numeric suffix among IDs like `B-007` (0 if none).
fn max_id_number<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> usize {
    ids.filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|n| n.parse::<usize>().ok())
        .filter(|&n| n <= MAX_ID_NUMBER)
        .max()
        .unwrap_or(0)
}

/// An ID in our own format whose number is too large to count past
fn id_out_of_range(id: &str, prefix: &str) -> bool {
    let Some(digits) = id.strip_prefix(prefix) else {
        return false;
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    !matches!(digits.parse::<usize>(), Ok(n) if n <= MAX_ID_NUMBER)
}
