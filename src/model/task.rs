use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of a task. `Done` tasks are the only ones
/// `clear_completed` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Done,
}

impl TaskState {
    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            TaskState::Pending => ' ',
            TaskState::Done => 'x',
        }
    }

    /// Pending → Done → Pending
    pub fn toggled(self) -> TaskState {
        match self {
            TaskState::Pending => TaskState::Done,
            TaskState::Done => TaskState::Pending,
        }
    }
}

/// A unit of clinical work owned by one bed (or by the unassigned bucket)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned ID like `T-0007`
    pub id: String,
    /// What to do, trimmed and never empty
    pub content: String,
    /// Completion flag
    #[serde(default)]
    pub is_done: bool,
    /// When the task was captured
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task stamped with the current time.
    pub fn new(id: String, content: String) -> Self {
        Task {
            id,
            content,
            is_done: false,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> TaskState {
        if self.is_done {
            TaskState::Done
        } else {
            TaskState::Pending
        }
    }

    /// Flip the completion flag.
    pub fn toggle(&mut self) {
        self.is_done = self.state().toggled() == TaskState::Done;
    }
}
