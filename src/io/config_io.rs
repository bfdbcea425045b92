use std::fs;
use std::path::Path;

use crate::io::snapshot_io::{BoardError, CONFIG_FILE};
use crate::model::config::BoardConfig;
use crate::parse::Grammar;

/// Read board.toml, returning both the parsed config and the raw
/// toml_edit document for comment-preserving edits.
pub fn read_config(data_dir: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), BoardError> {
    let config_path = data_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| BoardError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(data_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), BoardError> {
    let config_path = data_dir.join(CONFIG_FILE);
    fs::write(&config_path, doc.to_string()).map_err(|e| BoardError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Set `[parser] grammar` in the config document
pub fn set_grammar(doc: &mut toml_edit::DocumentMut, grammar: Grammar) {
    if !doc.contains_key("parser") {
        doc["parser"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["parser"]["grammar"] = toml_edit::value(grammar.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"# ward board
[board]
name = "7 West"

[parser]
# prefix | anywhere | unpadded
grammar = "prefix"
"#;

    #[test]
    fn set_grammar_preserves_comments() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), SAMPLE).unwrap();

        let (config, mut doc) = read_config(tmp.path()).unwrap();
        assert_eq!(config.parser.grammar, Grammar::Prefix);

        set_grammar(&mut doc, Grammar::Anywhere);
        write_config(tmp.path(), &doc).unwrap();

        let text = fs::read_to_string(tmp.path().join(CONFIG_FILE)).unwrap();
        assert!(text.contains("# prefix | anywhere | unpadded"));
        let (config, _) = read_config(tmp.path()).unwrap();
        assert_eq!(config.parser.grammar, Grammar::Anywhere);
    }

    #[test]
    fn set_grammar_adds_missing_table() {
        let mut doc: toml_edit::DocumentMut = "[board]\nname = \"x\"\n".parse().unwrap();
        set_grammar(&mut doc, Grammar::Unpadded);
        let config: BoardConfig = toml::from_str(&doc.to_string()).unwrap();
        assert_eq!(config.parser.grammar, Grammar::Unpadded);
    }

    #[test]
    fn unwritable_config_is_write_error() {
        let tmp = TempDir::new().unwrap();
        let doc: toml_edit::DocumentMut = SAMPLE.parse().unwrap();
        let gone = tmp.path().join("nope");
        assert!(matches!(write_config(&gone, &doc), Err(BoardError::WriteError { .. })));
    }

    #[test]
    fn missing_config_is_read_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(read_config(tmp.path()), Err(BoardError::ReadError { .. })));
    }
}
