use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::bed::Bed;
use crate::model::task::Task;
use crate::ops::store::{BoardStats, Store};
use crate::util::unicode::{display_width, pad_to_width, truncate_to_width};

/// Task text wider than this is cut in list views
const MAX_TASK_CELLS: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct BedSummaryJson<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub pending: usize,
    pub done: usize,
}

#[derive(Serialize)]
pub struct BedJson<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub tasks: &'a [Task],
}

#[derive(Serialize)]
pub struct StatsJson {
    pub board: String,
    pub beds: usize,
    pub pending: usize,
    pub done: usize,
    pub unassigned: usize,
}

#[derive(Serialize)]
pub struct ToggleJson<'a> {
    pub task_id: &'a str,
    pub is_done: bool,
}

#[derive(Serialize)]
pub struct ClearJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bed_id: Option<&'a str>,
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn bed_summaries(store: &Store) -> Vec<BedSummaryJson<'_>> {
    store
        .beds()
        .iter()
        .map(|b| BedSummaryJson {
            id: &b.id,
            label: &b.label,
            pending: b.pending_count(),
            done: b.done_count(),
        })
        .collect()
}

pub fn bed_to_json(bed: &Bed) -> BedJson<'_> {
    BedJson {
        id: &bed.id,
        label: &bed.label,
        tasks: &bed.tasks,
    }
}

pub fn stats_to_json(name: &str, stats: BoardStats) -> StatsJson {
    StatsJson {
        board: name.to_string(),
        beds: stats.beds,
        pending: stats.pending,
        done: stats.done,
        unassigned: stats.unassigned,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// One line per bed: label, ID, counts. Labels are padded to a common width
/// and wards are separated by a blank line.
pub fn format_beds(store: &Store) -> String {
    if store.beds().is_empty() {
        return "no beds yet (try `wb add 5a01 check K+`)".to_string();
    }
    let width = store
        .beds()
        .iter()
        .map(|b| display_width(&b.label))
        .max()
        .unwrap_or(0);
    let mut out = Vec::new();
    let mut ward = None;
    for bed in store.beds() {
        if ward.is_some_and(|w| w != bed.ward()) {
            out.push(String::new());
        }
        ward = Some(bed.ward());
        let status = if bed.all_done() {
            " (all done)".to_string()
        } else {
            String::new()
        };
        out.push(format!(
            "{}  {}  {} pending, {} done{}",
            pad_to_width(&bed.label, width),
            bed.id,
            bed.pending_count(),
            bed.done_count(),
            status
        ));
    }
    if !store.unassigned().is_empty() {
        out.push(format!("({} unassigned)", store.unassigned().len()));
    }
    out.join("\n")
}

/// `[x] T-0001 content`, one per task
pub fn format_tasks(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(|t| {
            format!(
                "[{}] {} {}",
                t.state().checkbox_char(),
                t.id,
                truncate_to_width(&t.content, MAX_TASK_CELLS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_bed(bed: &Bed) -> String {
    let header = format!("{} ({})", bed.label, bed.id);
    if bed.tasks.is_empty() {
        return format!("{}\n  no tasks", header);
    }
    let body = format_tasks(&bed.tasks)
        .lines()
        .map(|l| format!("  {}", l))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\n{}", header, body)
}

pub fn format_stats(name: &str, stats: BoardStats) -> String {
    format!(
        "{}\n  beds: {}\n  pending: {}\n  done: {}\n  unassigned: {}",
        name, stats.beds, stats.pending, stats.done, stats.unassigned
    )
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> String {
    let mut out = format!(
        "{} [{}] {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.description
    );
    for (key, value) in &entry.fields {
        out.push_str(&format!("\n  {}: {}", key, value));
    }
    for line in entry.body.lines() {
        out.push_str(&format!("\n    {}", line));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> Store {
        let mut store = Store::new("test");
        let t = store.add_task("5a01", "check K+").unwrap();
        store.add_task("5a01", "NPO after midnight").unwrap();
        store.add_task("12b3", "動脈血氣分析 ABG").unwrap();
        store.toggle_task("B-001", &t).unwrap();
        store
    }

    #[test]
    fn beds_are_aligned() {
        let out = format_beds(&sample_store());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "05A-01  B-001  1 pending, 1 done");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "12B-03  B-002  1 pending, 0 done");
    }

    #[test]
    fn same_ward_stays_together() {
        let mut store = Store::new("test");
        store.add_task("5a1b", "x").unwrap();
        store.add_task("5a01", "y").unwrap();
        let t = store.add_task("5a2", "z").unwrap();
        store.toggle_task("B-003", &t).unwrap();
        assert_eq!(
            format_beds(&store),
            "05A-01   B-002  1 pending, 0 done\n\
             05A-01B  B-001  1 pending, 0 done\n\
             05A-02   B-003  0 pending, 1 done (all done)"
        );
    }

    #[test]
    fn empty_board_hint() {
        assert!(format_beds(&Store::new("x")).contains("wb add"));
    }

    #[test]
    fn unassigned_count_is_shown() {
        let mut store = sample_store();
        store.add_unassigned("give [furosemide]").unwrap();
        assert!(format_beds(&store).ends_with("(1 unassigned)"));
    }

    #[test]
    fn bed_lists_tasks_with_checkboxes() {
        let store = sample_store();
        let out = format_bed(&store.beds()[0]);
        assert_eq!(
            out,
            "05A-01 (B-001)\n  [x] T-0001 check K+\n  [ ] T-0002 NPO after midnight"
        );
    }

    #[test]
    fn summaries_serialize() {
        let store = sample_store();
        let json = serde_json::to_value(bed_summaries(&store)).unwrap();
        assert_eq!(json[0]["label"], "05A-01");
        assert_eq!(json[0]["pending"], 1);
        assert_eq!(json[1]["done"], 0);
    }
}
