//! Translation dictionary loading and key resolution.
//!
//! The dictionary is an external JSON object mapping normalized original
//! text to a translation key. It is loaded once per engine and treated as
//! an immutable snapshot for every file pass; a host watcher may rebuild
//! the engine with a fresh snapshot between passes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub type Dict = HashMap<String, String>;

/// Reads a dictionary file, treating every failure as an empty mapping.
///
/// Missing files and malformed JSON are expected during incremental
/// translation work; an empty dictionary makes every lookup miss, which
/// leaves the source untouched instead of failing the build.
pub fn load_dict(path: &Path) -> Dict {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// Maps a normalized translatable string to its translation key.
///
/// With no dictionary configured every string becomes its own key (raw
/// mode). With a dictionary, an absent or empty entry is a miss and the
/// caller leaves the span unrewritten.
pub fn resolve(core: &str, dict: Option<&Dict>) -> Option<String> {
    match dict {
        None => Some(core.to_string()),
        Some(dict) => dict.get(core).filter(|key| !key.is_empty()).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_resolve_raw_mode() {
        assert_eq!(resolve("你好", None), Some("你好".to_string()));
    }

    #[test]
    fn test_resolve_hit() {
        let mut dict = Dict::new();
        dict.insert("你好".to_string(), "greeting".to_string());
        assert_eq!(resolve("你好", Some(&dict)), Some("greeting".to_string()));
    }

    #[test]
    fn test_resolve_miss_is_none() {
        let dict = Dict::new();
        assert_eq!(resolve("你好", Some(&dict)), None);
    }

    #[test]
    fn test_resolve_empty_value_is_miss() {
        let mut dict = Dict::new();
        dict.insert("你好".to_string(), String::new());
        assert_eq!(resolve("你好", Some(&dict)), None);
    }

    #[test]
    fn test_load_dict() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"你好": "greeting"}}"#).unwrap();
        let dict = load_dict(file.path());
        assert_eq!(dict.get("你好"), Some(&"greeting".to_string()));
    }

    #[test]
    fn test_load_dict_malformed_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(load_dict(file.path()).is_empty());
    }

    #[test]
    fn test_load_dict_missing_is_empty() {
        assert!(load_dict(Path::new("/nonexistent/dict.json")).is_empty());
    }
}
