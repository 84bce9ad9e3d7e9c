use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::error::{Error, Result};
use crate::state::Turn;

/// Key every unknown lookup falls back to
pub const DEFAULT_KEY: &str = "example";

/// Key the `example` alias points at
pub const ALIAS_TARGET: &str = "template_one";

const BUILTIN: &[(&str, &str)] = &[
    ("template_one", include_str!("../templates/template_one.json")),
    ("template_two", include_str!("../templates/template_two.json")),
    ("template_three", include_str!("../templates/template_three.json")),
    ("template_four", include_str!("../templates/template_four.json")),
    ("template_five", include_str!("../templates/template_five.json")),
    ("template_six", include_str!("../templates/template_six.json")),
];

/// A pre-authored conversation plus the analysis that goes with it.
///
/// Every field is optional on disk: a script without `messages` loads as an
/// empty conversation rather than failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationScript {
    /// Overrides the theme's chat partner name when present
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub messages: Vec<Turn>,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
}

impl ConversationScript {
    pub fn from_turns(messages: Vec<Turn>) -> Self {
        Self {
            messages,
            ..Self::default()
        }
    }
}

/// Read-only catalogue of conversation scripts keyed by template name
pub struct TemplateStore {
    templates: BTreeMap<String, ConversationScript>,
    empty: ConversationScript,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
            empty: ConversationScript::default(),
        }
    }

    /// The templates compiled into the binary
    pub fn builtin() -> Self {
        let mut store = Self::new();

        for (key, source) in BUILTIN {
            match serde_json::from_str::<ConversationScript>(source) {
                Ok(script) => store.insert(*key, script),
                Err(e) => tracing::warn!(template = key, error = %e, "skipping built-in template"),
            }
        }

        tracing::debug!(count = store.templates.len(), "loaded built-in templates");
        store
    }

    pub fn insert(&mut self, key: impl Into<String>, script: ConversationScript) {
        self.templates.insert(key.into(), script);
    }

    /// Add every `*.json` file in `dir`, keyed by file stem.
    ///
    /// Files that can't be read or parsed are logged and skipped; only an
    /// unreadable directory is an error. Returns how many templates were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };

            match Self::read_script(&path) {
                Ok(script) => {
                    self.insert(key, script);
                    loaded += 1;
                }
                Err(e) => tracing::warn!(error = %e, "skipping template file"),
            }
        }

        tracing::info!(dir = %dir.display(), loaded, "loaded templates from directory");
        Ok(loaded)
    }

    fn read_script(path: &Path) -> Result<ConversationScript> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a script, falling back to the default template.
    ///
    /// If even the default is missing the empty script is returned.
    pub fn get(&self, key: &str) -> &ConversationScript {
        if let Some(script) = self.templates.get(key) {
            return script;
        }
        if key != DEFAULT_KEY {
            tracing::debug!(template = key, "unknown template, using default");
        }
        self.templates
            .get(DEFAULT_KEY)
            .or_else(|| self.templates.get(ALIAS_TARGET))
            .unwrap_or(&self.empty)
    }

    pub fn contains(&self, key: &str) -> bool {
        key == DEFAULT_KEY || self.templates.contains_key(key)
    }

    /// Selectable template keys, in sorted order
    pub fn keys(&self) -> Vec<&str> {
        self.templates
            .keys()
            .map(String::as_str)
            .filter(|k| *k != DEFAULT_KEY)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateStore {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Role;

    #[test]
    fn test_all_builtin_templates_parse() {
        let store = TemplateStore::builtin();
        assert_eq!(store.len(), BUILTIN.len());
        for key in store.keys() {
            assert!(!store.get(key).messages.is_empty(), "{key} has no messages");
        }
    }

    #[test]
    fn test_unknown_key_falls_back_to_alias_target() {
        let store = TemplateStore::builtin();
        assert_eq!(store.get("nope"), store.get(ALIAS_TARGET));
        assert_eq!(store.get(DEFAULT_KEY), store.get(ALIAS_TARGET));
    }

    #[test]
    fn test_keys_exclude_default_alias() {
        let mut store = TemplateStore::builtin();
        store.insert(DEFAULT_KEY, ConversationScript::default());
        assert!(!store.keys().contains(&DEFAULT_KEY));
        assert!(store.keys().contains(&"template_six"));
    }

    #[test]
    fn test_empty_store_yields_empty_script() {
        let store = TemplateStore::new();
        assert!(store.get("anything").messages.is_empty());
    }

    #[test]
    fn test_script_without_messages_is_empty() {
        let script: ConversationScript = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert!(script.messages.is_empty());
        assert!(script.analysis.is_none());
    }

    #[test]
    fn test_load_dir_skips_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{"messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut store = TemplateStore::new();
        let loaded = store.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(store.keys(), vec!["custom"]);
        assert_eq!(store.get("custom").messages[0].role, Role::User);
    }

    #[test]
    fn test_load_dir_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TemplateStore::new();
        let err = store.load_dir(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
