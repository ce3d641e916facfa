//! `fprintd.conf` parsing.
//!
//! The on-disk format is a single `[storage]` section with a single `type`
//! key; a general-purpose INI crate is unwarranted for that, so this is a
//! small hand-rolled reader.

use std::path::Path;

/// Parsed `fprintd.conf`. Currently only the storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_type: "file".to_string(),
        }
    }
}

impl Config {
    /// Missing file is not an error: callers fall back to [`Config::default`].
    pub fn load(path: &Path) -> std::io::Result<Config> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e),
        };
        Ok(Self::parse(&text))
    }

    fn parse(text: &str) -> Config {
        let mut config = Config::default();
        let mut section = String::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                section = name.trim().to_lowercase();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();
            if section == "storage" && key == "type" {
                config.storage_type = value;
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let config = Config::load(Path::new("/nonexistent/fprintd.conf")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_storage_type() {
        let config = Config::parse("[storage]\ntype = file\n");
        assert_eq!(config.storage_type, "file");
    }

    #[test]
    fn ignores_comments_and_unknown_sections() {
        let config = Config::parse("# comment\n[unknown]\nfoo = bar\n[storage]\ntype = file\n");
        assert_eq!(config.storage_type, "file");
    }

    #[test]
    fn defaults_when_key_absent() {
        let config = Config::parse("[storage]\n");
        assert_eq!(config.storage_type, "file");
    }
}
