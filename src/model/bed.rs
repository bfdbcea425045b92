use serde::{Deserialize, Serialize};

use super::task::Task;

/// A bed on the board, keyed by its canonical label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    /// Store-assigned surrogate ID like `B-003`
    pub id: String,
    /// Canonical label like `05A-01`, unique within a store
    pub label: String,
    /// Tasks in capture order
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Bed {
    pub fn new(id: String, label: String) -> Self {
        Bed {
            id,
            label,
            tasks: Vec::new(),
        }
    }

    /// Ward part of the label (`05A` for `05A-01`)
    pub fn ward(&self) -> &str {
        self.label
            .split_once('-')
            .map(|(ward, _)| ward)
            .unwrap_or(&self.label)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_done).count()
    }

    pub fn done_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_done).count()
    }

    /// True when the bed has tasks and every one of them is done
    pub fn all_done(&self) -> bool {
        !self.tasks.is_empty() && self.pending_count() == 0
    }
}
