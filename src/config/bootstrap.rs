//! The bootstrap document: declared packages, taps, symlink rules, icons,
//! hook scripts and environment overrides.
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Glob patterns excluded from `missing` when the document does not say.
pub const DEFAULT_MISSING_IGNORE: &[&str] = &["pip-*"];

/// Prefix of the only dependency references that carry meaning.
const CASK_DEPENDENCY_PREFIX: &str = "casks/";

/// Desired machine state.
///
/// Every field defaults to empty so an absent or partial document reads
/// cleanly.  Sets and maps serialize in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bootstrap {
    /// Command-line packages.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub formulas: BTreeSet<String>,

    /// GUI application packages.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub casks: BTreeSet<String>,

    /// Third-party package repositories.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub taps: BTreeSet<String>,

    /// Hook command lines run before a restore, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_scripts: Vec<String>,

    /// Hook command lines run after a restore, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after_scripts: Vec<String>,

    /// Package-name globs never reported by `missing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_ignore: Option<BTreeSet<String>>,

    /// Formula -> `casks/<name>` references installed before it.
    #[serde(
        default,
        deserialize_with = "one_or_many_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dependencies: BTreeMap<String, Vec<String>>,

    /// Glob relative to the symlinks directory -> target template.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub symlinks: BTreeMap<String, String>,

    /// Application name -> icon path or URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub icons: BTreeMap<String, String>,

    /// Environment overrides for every external command.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Bootstrap {
    /// Sort and de-duplicate list-valued fields that cider itself edits.
    ///
    /// Documents read from disk are already in this form.  Hook scripts are
    /// left in declared order.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for deps in self.dependencies.values_mut() {
            deps.sort();
            deps.dedup();
        }
        self
    }

    /// Declared packages of one kind.
    #[must_use]
    pub const fn packages(&self, cask: bool) -> &BTreeSet<String> {
        if cask { &self.casks } else { &self.formulas }
    }

    /// Mutable access to the declared packages of one kind.
    pub const fn packages_mut(&mut self, cask: bool) -> &mut BTreeSet<String> {
        if cask {
            &mut self.casks
        } else {
            &mut self.formulas
        }
    }

    /// Cask names a formula depends on.  Other reference kinds are ignored.
    pub fn cask_dependencies<'a>(&'a self, formula: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.dependencies
            .get(formula)
            .into_iter()
            .flatten()
            .filter_map(|dep| dep.strip_prefix(CASK_DEPENDENCY_PREFIX))
    }

    /// Compiled `missing-ignore` patterns, or the default set when absent.
    ///
    /// Patterns that fail to compile are skipped with a warning.
    #[must_use]
    pub fn missing_ignore_patterns(&self) -> Vec<glob::Pattern> {
        let raw: Vec<&str> = self.missing_ignore.as_ref().map_or_else(
            || DEFAULT_MISSING_IGNORE.to_vec(),
            |set| set.iter().map(String::as_str).collect(),
        );
        raw.into_iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!("ignoring invalid missing-ignore pattern '{p}': {e}");
                    None
                }
            })
            .collect()
    }
}

/// Package name of a declared entry; entries may carry install flags after
/// the name (`"wget --with-iri"`).
#[must_use]
pub fn package_name(entry: &str) -> &str {
    entry.split_whitespace().next().unwrap_or(entry)
}

fn one_or_many_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    let raw = BTreeMap::<String, OneOrMany>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let mut list = match value {
                OneOrMany::One(dep) => vec![dep],
                OneOrMany::Many(deps) => deps,
            };
            list.sort();
            list.dedup();
            (key, list)
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_parses() {
        let doc: Bootstrap = toml::from_str("").unwrap();
        assert_eq!(doc, Bootstrap::default());
    }

    #[test]
    fn kebab_case_keys() {
        let doc: Bootstrap = toml::from_str(
            r#"
            before-scripts = ["echo one", "echo two"]
            missing-ignore = ["python-*"]
            "#,
        )
        .unwrap();
        assert_eq!(doc.before_scripts, vec!["echo one", "echo two"]);
        assert!(doc.missing_ignore.unwrap().contains("python-*"));
    }

    #[test]
    fn legacy_json_document_parses() {
        let doc: Bootstrap = serde_json::from_str(
            r#"{
                "formulas": ["wget", "git", "wget"],
                "casks": ["iterm2"],
                "symlinks": {"dotfiles/*.conf": "~/"},
                "dependencies": {"mpv": "casks/xquartz"}
            }"#,
        )
        .unwrap();
        assert_eq!(doc.formulas.iter().collect::<Vec<_>>(), ["git", "wget"]);
        assert_eq!(doc.symlinks["dotfiles/*.conf"], "~/");
        assert_eq!(doc.dependencies["mpv"], vec!["casks/xquartz"]);
    }

    #[test]
    fn cask_dependencies_ignore_other_kinds() {
        let mut doc = Bootstrap::default();
        doc.dependencies.insert(
            "mpv".to_string(),
            vec!["casks/xquartz".to_string(), "formulas/ffmpeg".to_string()],
        );
        assert_eq!(doc.cask_dependencies("mpv").collect::<Vec<_>>(), ["xquartz"]);
        assert_eq!(doc.cask_dependencies("git").count(), 0);
    }

    #[test]
    fn normalized_sorts_dependency_lists_but_not_scripts() {
        let mut doc = Bootstrap::default();
        doc.dependencies
            .insert("a".to_string(), vec!["casks/z".to_string(), "casks/b".to_string(), "casks/z".to_string()]);
        doc.after_scripts = vec!["second".to_string(), "first".to_string()];
        let doc = doc.normalized();
        assert_eq!(doc.dependencies["a"], vec!["casks/b", "casks/z"]);
        assert_eq!(doc.after_scripts, vec!["second", "first"]);
    }

    #[test]
    fn missing_ignore_defaults_to_pip() {
        let patterns = Bootstrap::default().missing_ignore_patterns();
        assert!(patterns.iter().any(|p| p.matches("pip-requests")));
        assert!(!patterns.iter().any(|p| p.matches("wget")));
    }

    #[test]
    fn explicit_empty_missing_ignore_disables_default() {
        let doc = Bootstrap {
            missing_ignore: Some(BTreeSet::new()),
            ..Bootstrap::default()
        };
        assert!(doc.missing_ignore_patterns().is_empty());
    }

    #[test]
    fn package_name_strips_flags() {
        assert_eq!(package_name("wget --with-iri"), "wget");
        assert_eq!(package_name("git"), "git");
    }

    #[test]
    fn toml_output_is_sorted() {
        let mut doc = Bootstrap::default();
        doc.formulas.insert("zsh".to_string());
        doc.formulas.insert("ack".to_string());
        doc.symlinks.insert("vim/*".to_string(), "~/.vim/".to_string());
        let out = toml::to_string_pretty(&doc).unwrap();
        assert!(out.find("ack").unwrap() < out.find("zsh").unwrap());
        let back: Bootstrap = toml::from_str(&out).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn dependency_lists_are_sorted_on_read() {
        let doc: Bootstrap =
            serde_json::from_str(r#"{"dependencies": {"mpv": ["casks/z", "casks/b", "casks/z"]}}"#)
                .unwrap();
        assert_eq!(doc.dependencies["mpv"], vec!["casks/b", "casks/z"]);
        assert_eq!(doc.clone().normalized(), doc);
    }
}
