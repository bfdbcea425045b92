mod init;
pub use init::cmd_init;

use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;

/// Global override for board directory (set by -C flag)
static BOARD_DIR_OVERRIDE: Mutex<Option<PathBuf>> = Mutex::new(None);

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::BoardLock;
use crate::io::recovery;
use crate::io::snapshot_io::{self, BoardError, DATA_DIR};
use crate::model::board::Board;
use crate::model::fragment::{CapsuleTag, Fragment};
use crate::ops::capture::{Captured, capture_fragments, capture_line};
use crate::parse::{Grammar, parse_with};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    // Store -C override for board_root()
    if let Some(ref dir) = cli.board_dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        BOARD_DIR_OVERRIDE
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(abs);
    }

    match cli.command {
        // Bare `wb` lists beds
        None => cmd_beds(json),
        Some(cmd) => match cmd {
            Commands::Init(args) => cmd_init(args),

            // Read commands
            Commands::Parse(args) => cmd_parse(args, json),
            Commands::Beds => cmd_beds(json),
            Commands::Show(args) => cmd_show(args, json),
            Commands::Stats => cmd_stats(json),
            Commands::Recovery(args) => cmd_recovery(args, json),

            // Write commands
            Commands::Add(args) => cmd_add(args, json),
            Commands::Capture(args) => cmd_capture(args, json),
            Commands::Toggle(args) => cmd_toggle(args, json),
            Commands::Clear(args) => cmd_clear(args, json),
            Commands::Unassigned(args) => cmd_unassigned(args, json),
            Commands::Assign(args) => cmd_assign(args, json),
            Commands::Grammar(args) => cmd_grammar(args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn board_root() -> Result<PathBuf, BoardError> {
    let start = match BOARD_DIR_OVERRIDE
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .as_ref()
    {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(BoardError::IoError)?,
    };
    snapshot_io::discover_board(&start)
}

fn load_board_cwd() -> Result<Board, BoardError> {
    snapshot_io::load_board(&board_root()?)
}

/// Discover, lock, then load. The lock is held until the returned guard
/// drops, which must be after `save_board`.
fn load_board_locked() -> Result<(BoardLock, Board), Box<dyn std::error::Error>> {
    let root = board_root()?;
    let lock = BoardLock::acquire_default(&root.join(DATA_DIR))?;
    let board = snapshot_io::load_board(&root)?;
    Ok((lock, board))
}

fn resolve_grammar(name: &str) -> Result<Grammar, String> {
    Grammar::parse_grammar(name).ok_or_else(|| {
        format!(
            "unknown grammar '{}' (expected prefix, anywhere or unpadded)",
            name
        )
    })
}

/// Map a bed argument (ID or label) to a bed ID. Unknown input is passed
/// through so the store reports it as not found.
fn resolve_bed_id(board: &Board, bed: &str) -> String {
    board
        .store
        .resolve_bed(bed)
        .map(|b| b.id.clone())
        .unwrap_or_else(|| bed.to_string())
}

/// Turn one command-line word into a fragment: `@tag:value` becomes a
/// capsule, anything else is text.
fn parse_fragment_arg(arg: &str) -> Fragment {
    if let Some(rest) = arg.strip_prefix('@')
        && let Some((tag, value)) = rest.split_once(':')
        && let Some(tag) = CapsuleTag::parse_tag(tag)
    {
        return Fragment::capsule(tag, value);
    }
    Fragment::text(arg)
}

fn print_captured(captured: &Captured, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(captured)?);
        return Ok(());
    }
    match captured {
        Captured::Bed {
            bed_label, task_id, ..
        } => println!("{} {}", task_id, bed_label),
        Captured::Unassigned { task_id } => println!("{} (unassigned)", task_id),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_parse(args: ParseArgs, json: bool) -> CmdResult {
    let grammar = match args.grammar {
        Some(ref g) => resolve_grammar(g)?,
        // Only the config is read; outside a board the canonical grammar applies
        None => match board_root() {
            Ok(root) => config_io::read_config(&root.join(DATA_DIR))?.0.parser.grammar,
            Err(BoardError::NotABoard) => Grammar::default(),
            Err(e) => return Err(e.into()),
        },
    };
    let parsed = parse_with(&args.text.join(" "), grammar)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("bed:  {}", parsed.bed_label);
        println!("task: {}", parsed.task_text);
    }
    Ok(())
}

fn cmd_beds(json: bool) -> CmdResult {
    let board = load_board_cwd()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&bed_summaries(&board.store))?
        );
    } else {
        println!("{}", format_beds(&board.store));
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, json: bool) -> CmdResult {
    let board = load_board_cwd()?;
    let bed = board
        .store
        .resolve_bed(&args.bed)
        .ok_or_else(|| format!("bed not found: {}", args.bed))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&bed_to_json(bed))?);
    } else {
        println!("{}", format_bed(bed));
    }
    Ok(())
}

fn cmd_stats(json: bool) -> CmdResult {
    let board = load_board_cwd()?;
    let stats = board.store.stats();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats_to_json(board.store.name(), stats))?
        );
    } else {
        println!("{}", format_stats(board.store.name(), stats));
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryArgs, json: bool) -> CmdResult {
    let root = board_root()?;
    let data_dir = root.join(DATA_DIR);

    if args.clear {
        let _lock = BoardLock::acquire_default(&data_dir)?;
        let removed = recovery::clear_recovery(&data_dir)?;
        println!("cleared {} recovery entr{}", removed, plural_y(removed));
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&data_dir, Some(args.limit.unwrap_or(10)));
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("(recovery log is empty)");
    } else {
        let rendered: Vec<String> = entries.iter().map(format_recovery_entry).collect();
        println!("{}", rendered.join("\n\n"));
    }
    Ok(())
}

fn plural_y(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, json: bool) -> CmdResult {
    let (_lock, mut board) = load_board_locked()?;
    let grammar = match args.grammar {
        Some(ref g) => resolve_grammar(g)?,
        None => board.config.parser.grammar,
    };
    let captured = capture_line(&mut board.store, &args.text.join(" "), grammar)?;
    snapshot_io::save_board(&mut board)?;
    print_captured(&captured, json)
}

fn cmd_capture(args: CaptureArgs, json: bool) -> CmdResult {
    let fragments: Vec<Fragment> = if args.stdin {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        serde_json::from_str(&input)
            .map_err(|e| format!("stdin is not a JSON fragment array: {}", e))?
    } else {
        args.fragments.iter().map(|a| parse_fragment_arg(a)).collect()
    };
    if fragments.is_empty() {
        return Err("nothing to capture".into());
    }

    let (_lock, mut board) = load_board_locked()?;
    let captured = capture_fragments(&mut board.store, &fragments)?;
    snapshot_io::save_board(&mut board)?;
    print_captured(&captured, json)
}

fn cmd_toggle(args: ToggleArgs, json: bool) -> CmdResult {
    let (_lock, mut board) = load_board_locked()?;
    let bed_id = resolve_bed_id(&board, &args.bed);
    let is_done = board.store.toggle_task(&bed_id, &args.task)?;
    snapshot_io::save_board(&mut board)?;
    print_toggled(&args.task, is_done, json)
}

fn print_toggled(task_id: &str, is_done: bool, json: bool) -> CmdResult {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ToggleJson { task_id, is_done })?
        );
    } else {
        println!("{} {}", task_id, if is_done { "done" } else { "pending" });
    }
    Ok(())
}

fn cmd_clear(args: ClearArgs, json: bool) -> CmdResult {
    let (_lock, mut board) = load_board_locked()?;
    let bed_id = resolve_bed_id(&board, &args.bed);
    let removed = board.store.clear_completed(&bed_id)?;
    if removed > 0 {
        snapshot_io::save_board(&mut board)?;
    }
    print_cleared(Some(bed_id.as_str()), removed, json)
}

fn print_cleared(bed_id: Option<&str>, removed: usize, json: bool) -> CmdResult {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&ClearJson { bed_id, removed })?
        );
    } else {
        println!(
            "removed {} done task{}",
            removed,
            if removed == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

fn cmd_unassigned(args: UnassignedCmd, json: bool) -> CmdResult {
    match args.action {
        None => {
            let board = load_board_cwd()?;
            let tasks = board.store.unassigned();
            if json {
                println!("{}", serde_json::to_string_pretty(tasks)?);
            } else if tasks.is_empty() {
                println!("(no unassigned tasks)");
            } else {
                println!("{}", format_tasks(tasks));
            }
            Ok(())
        }
        Some(UnassignedAction::Toggle { task }) => {
            let (_lock, mut board) = load_board_locked()?;
            let is_done = board.store.toggle_unassigned(&task)?;
            snapshot_io::save_board(&mut board)?;
            print_toggled(&task, is_done, json)
        }
        Some(UnassignedAction::Clear) => {
            let (_lock, mut board) = load_board_locked()?;
            let removed = board.store.clear_unassigned_completed();
            if removed > 0 {
                snapshot_io::save_board(&mut board)?;
            }
            print_cleared(None, removed, json)
        }
    }
}

fn cmd_assign(args: AssignArgs, json: bool) -> CmdResult {
    let (_lock, mut board) = load_board_locked()?;
    let bed_id = board.store.assign(&args.task, &args.bed)?;
    snapshot_io::save_board(&mut board)?;
    let bed_label = board
        .store
        .bed(&bed_id)
        .map(|b| b.label.clone())
        .unwrap_or_default();
    print_captured(
        &Captured::Bed {
            bed_id,
            bed_label,
            task_id: args.task,
        },
        json,
    )
}

fn cmd_grammar(args: GrammarArgs, json: bool) -> CmdResult {
    let root = board_root()?;
    let data_dir = root.join(DATA_DIR);

    let grammar = match args.grammar {
        None => config_io::read_config(&data_dir)?.0.parser.grammar,
        Some(ref g) => {
            let grammar = resolve_grammar(g)?;
            let _lock = BoardLock::acquire_default(&data_dir)?;
            let (_, mut doc) = config_io::read_config(&data_dir)?;
            config_io::set_grammar(&mut doc, grammar);
            config_io::write_config(&data_dir, &doc)?;
            grammar
        }
    };
    if json {
        println!("{}", serde_json::json!({ "grammar": grammar }));
    } else {
        println!("{}", grammar);
    }
    Ok(())
}
