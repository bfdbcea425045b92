use std::fs;

use crate::cli::commands::InitArgs;
use crate::io::snapshot_io::{self, CONFIG_FILE, DATA_DIR};
use crate::parse::Grammar;

const BOARD_TOML_TEMPLATE: &str = r##"[board]
name = "{name}"

[parser]
# How shorthand lines are read:
#   prefix   - `5a01 check K+`; the bed token leads the line
#   anywhere - `check K+ 5a01`; the bed token may appear anywhere
#   unpadded - `5A01A check K+`; no zero padding, task text required
grammar = "{grammar}"

[persist]
# Snapshot file, relative to this directory
snapshot = "board.json"
"##;

/// Infer a board name from a directory name: hyphens and underscores become
/// spaces, each word is title-cased.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + &chars.collect::<String>()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_board_toml(name: &str, grammar: Grammar) -> String {
    BOARD_TOML_TEMPLATE
        .replace("{name}", &name.replace('\\', "\\\\").replace('"', "\\\""))
        .replace("{grammar}", &grammar.to_string())
}

pub fn cmd_init(args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let data_dir = cwd.join(DATA_DIR);

    if data_dir.join(CONFIG_FILE).is_file() {
        return Err("a ward board already exists in ./wardboard/".into());
    }

    // Boards can nest, but say so
    if let Some(parent) = cwd.parent()
        && let Ok(parent_root) = snapshot_io::discover_board(parent)
    {
        eprintln!(
            "Note: parent board found at {}/",
            parent_root.join(DATA_DIR).display()
        );
        eprintln!("Creating new board in ./wardboard/");
    }

    let grammar = match args.grammar {
        Some(ref g) => Grammar::parse_grammar(g).ok_or_else(|| {
            format!(
                "unknown grammar '{}' (expected prefix, anywhere or unpadded)",
                g
            )
        })?,
        None => Grammar::default(),
    };

    let name = args.name.unwrap_or_else(|| {
        cwd.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Ward".to_string())
    });

    fs::create_dir_all(&data_dir)?;
    fs::write(data_dir.join(CONFIG_FILE), render_board_toml(&name, grammar))?;

    println!("Initialized ward board: {} ({} grammar)", name, grammar);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::BoardConfig;

    #[test]
    fn test_infer_name() {
        assert_eq!(infer_name("7-west"), "7 West");
        assert_eq!(infer_name("cardiac_icu"), "Cardiac Icu");
        assert_eq!(infer_name("ward"), "Ward");
        assert_eq!(infer_name("--"), "");
    }

    #[test]
    fn test_render_board_toml_parses() {
        let text = render_board_toml("7 West", Grammar::Anywhere);
        let config: BoardConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.board.name, "7 West");
        assert_eq!(config.parser.grammar, Grammar::Anywhere);
        assert_eq!(config.persist.snapshot, "board.json");
    }

    #[test]
    fn test_render_board_toml_escapes_quotes() {
        let text = render_board_toml("Dr \"K\" ward", Grammar::Prefix);
        let config: BoardConfig = toml::from_str(&text).unwrap();
        assert_eq!(config.board.name, "Dr \"K\" ward");
    }
}
