use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wb", about = concat!("wardboard v", env!("CARGO_PKG_VERSION"), " - bedside shorthand to task board"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a board in a different directory
    #[arg(short = 'C', long = "board-dir", global = true)]
    pub board_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board in the current directory
    Init(InitArgs),
    /// Capture a shorthand line, e.g. `wb add 5a01 check K+`
    Add(AddArgs),
    /// Capture tagged fragments, e.g. `wb capture give @bed:3A04C furosemide`
    Capture(CaptureArgs),
    /// Show how a line would parse, without changing the board
    Parse(ParseArgs),
    /// List beds with pending/done counts (default when no command is given)
    Beds,
    /// Show one bed's tasks
    Show(ShowArgs),
    /// Flip a task between pending and done
    Toggle(ToggleArgs),
    /// Remove done tasks from a bed
    Clear(ClearArgs),
    /// List, toggle or clear tasks captured without a bed
    Unassigned(UnassignedCmd),
    /// Move an unassigned task onto a bed
    Assign(AssignArgs),
    /// Show board totals
    Stats,
    /// Show or set the shorthand grammar
    Grammar(GrammarArgs),
    /// View or clear the recovery log
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Board name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Shorthand grammar: prefix, anywhere or unpadded
    #[arg(long)]
    pub grammar: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    /// Shorthand words; joined with spaces
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    /// Override the board's grammar for this line
    #[arg(long)]
    pub grammar: Option<String>,
}

#[derive(Args)]
pub struct CaptureArgs {
    /// Fragments in order; `@bed:`, `@drug:` or `@test:` prefixes make capsules
    #[arg(num_args = 0..)]
    pub fragments: Vec<String>,
    /// Read a JSON fragment array from stdin instead
    #[arg(long, conflicts_with = "fragments")]
    pub stdin: bool,
}

#[derive(Args)]
pub struct ParseArgs {
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
    #[arg(long)]
    pub grammar: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Bed ID or label
    pub bed: String,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Bed ID or label
    pub bed: String,
    /// Task ID
    pub task: String,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Bed ID or label
    pub bed: String,
}

#[derive(Args)]
pub struct UnassignedCmd {
    #[command(subcommand)]
    pub action: Option<UnassignedAction>,
}

#[derive(Subcommand)]
pub enum UnassignedAction {
    /// Flip an unassigned task between pending and done
    Toggle {
        /// Task ID
        task: String,
    },
    /// Remove done unassigned tasks
    Clear,
}

#[derive(Args)]
pub struct AssignArgs {
    /// Unassigned task ID
    pub task: String,
    /// Bed label (created if missing)
    pub bed: String,
}

#[derive(Args)]
pub struct GrammarArgs {
    /// New grammar (omit to show the current one)
    pub grammar: Option<String>,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Delete the recovery log
    #[arg(long)]
    pub clear: bool,
}
