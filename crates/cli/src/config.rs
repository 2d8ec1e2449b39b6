//! JSON run configuration.
//!
//! The file lists destination repositories plus one shared `Config`
//! block. Keys are PascalCase:
//!
//! ```json
//! {
//!   "Repos": [{"Name": "geomf", "ToType": "float64", "Recurse": true}],
//!   "Config": {"From": "src/geom", "To": "out", "Skip": {"*": ["id|field"]}}
//! }
//! ```
//!
//! Relative `From` and `To` paths resolve against the directory holding
//! the configuration file.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use typeshift_core::migrate::default_printf;
use typeshift_core::{Directive, SkipSet};

use crate::patch::Patch;

pub const FOOTER_BANNER: &str = "\n// Automatically appended by typeshift\n\n";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("config '{0}' is not set")]
    Missing(&'static str),
}

/// A destination repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Repository {
    pub name: String,
    #[serde(default = "default_to_type")]
    pub to_type: String,
    #[serde(default)]
    pub disabled: bool,
    /// Also migrate every non-hidden subdirectory
    #[serde(default)]
    pub recurse: bool,
}

fn default_to_type() -> String {
    "float64".to_owned()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ConfigData {
    from: String,
    to: String,
    from_type: String,
    from_import: String,
    to_import: String,
    footer: BTreeMap<String, Vec<String>>,
    header: Vec<String>,
    patches: BTreeMap<String, Vec<Patch>>,
    printf: BTreeMap<String, usize>,
    read_me: Vec<String>,
    skip: BTreeMap<String, Vec<String>>,
    format_func: BTreeMap<String, String>,
    format_var: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigFile {
    #[serde(default)]
    repos: Vec<Repository>,
    #[serde(default)]
    config: ConfigData,
}

/// Settings shared by every repository.
#[derive(Debug, Clone)]
pub struct Config {
    pub from: PathBuf,
    pub to: PathBuf,
    pub from_type: String,
    pub from_import: Option<String>,
    pub to_import: Option<String>,
    /// Rendered footer per file name, banner included
    pub footer: BTreeMap<String, String>,
    pub header: String,
    pub patches: BTreeMap<String, Vec<Patch>>,
    pub printf: BTreeMap<String, usize>,
    pub readme: String,
    pub skip: SkipSet,
    pub format_func: BTreeMap<String, String>,
    pub format_var: BTreeSet<String>,
}

impl Config {
    /// Migration directive for one repository.
    pub fn directive(&self, repo: &Repository) -> Directive {
        let mut imports = BTreeMap::new();
        if let Some(from) = &self.from_import {
            let base = self
                .to_import
                .clone()
                .unwrap_or_else(|| self.to.display().to_string());
            imports.insert(from.clone(), format!("{}/{}", base, repo.name));
        }
        Directive {
            from_type: self.from_type.clone(),
            to_type: repo.to_type.clone(),
            skip: self.skip.clone(),
            format_exempt: self.format_var.clone(),
            format_shims: self.format_func.clone(),
            printf: self.printf.clone(),
            imports,
        }
    }

    /// Root of the migrated tree for `repo`.
    pub fn target_root(&self, repo: &Repository) -> PathBuf {
        self.to.join(&repo.name)
    }
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}

/// Read and resolve a configuration file.
pub fn load(path: &Path) -> Result<(Vec<Repository>, Config), ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let base = path.parent().unwrap_or(Path::new(""));
    parse(&text, base).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.display().to_string(),
            source,
        },
        other => other,
    })
}

/// Parse configuration text, resolving relative paths against `base`.
pub fn parse(text: &str, base: &Path) -> Result<(Vec<Repository>, Config), ConfigError> {
    let file: ConfigFile = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: "<text>".to_owned(),
        source,
    })?;
    let data = file.config;
    if data.from.is_empty() {
        return Err(ConfigError::Missing("From"));
    }
    if data.to.is_empty() {
        return Err(ConfigError::Missing("To"));
    }
    let footer = data
        .footer
        .into_iter()
        .map(|(name, lines)| (name, format!("{}{}\n", FOOTER_BANNER, lines.join("\n"))))
        .collect();
    let config = Config {
        from: base.join(&data.from),
        to: base.join(&data.to),
        from_type: non_empty(data.from_type).unwrap_or_else(|| "int".to_owned()),
        from_import: non_empty(data.from_import),
        to_import: non_empty(data.to_import),
        footer,
        header: data.header.join("\n"),
        patches: data.patches,
        printf: if data.printf.is_empty() {
            default_printf()
        } else {
            data.printf
        },
        readme: data.read_me.join("\n"),
        skip: SkipSet::new(data.skip),
        format_func: data.format_func,
        format_var: data.format_var.into_iter().collect(),
    };
    Ok((file.repos, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_values() {
        let (repos, cfg) = parse(
            r#"{"Repos": [{"Name": "geomf"}], "Config": {"From": "src", "To": "out"}}"#,
            Path::new("/work"),
        )
        .unwrap();
        assert_eq!(repos[0].to_type, "float64");
        assert!(!repos[0].disabled && !repos[0].recurse);
        assert_eq!(cfg.from, PathBuf::from("/work/src"));
        assert_eq!(cfg.to, PathBuf::from("/work/out"));
        assert_eq!(cfg.from_type, "int");
        assert_eq!(cfg.printf["fprintf"], 1);
        assert!(cfg.skip.is_empty());
    }

    #[test]
    fn from_and_to_are_required() {
        let err = parse(r#"{"Config": {"To": "out"}}"#, Path::new("/")).unwrap_err();
        assert_eq!(err.to_string(), "config 'From' is not set");
        let err = parse(r#"{"Config": {"From": "src"}}"#, Path::new("/")).unwrap_err();
        assert_eq!(err.to_string(), "config 'To' is not set");
    }

    #[test]
    fn header_footer_and_readme_are_joined() {
        let (_, cfg) = parse(
            r#"{"Config": {"From": "a", "To": "b",
                "Header": ["// Copyright", ""],
                "Footer": {"geom.go": ["func extra() {}"]},
                "ReadMe": ["Migrated copy.", ""]}}"#,
            Path::new("/"),
        )
        .unwrap();
        assert_eq!(cfg.header, "// Copyright\n");
        assert_eq!(
            cfg.footer["geom.go"],
            "\n// Automatically appended by typeshift\n\nfunc extra() {}\n"
        );
        assert_eq!(cfg.readme, "Migrated copy.\n");
    }

    #[test]
    fn directive_carries_skip_format_and_imports() {
        let (repos, cfg) = parse(
            r#"{"Repos": [{"Name": "geomf", "ToType": "float32"}],
                "Config": {"From": "a", "To": "b",
                  "FromImport": "example.com/geom", "ToImport": "example.com/out",
                  "Skip": {"*": ["id|field"]},
                  "FormatFunc": {"draw": "toI"}, "FormatVar": ["table"]}}"#,
            Path::new("/"),
        )
        .unwrap();
        let d = cfg.directive(&repos[0]);
        assert_eq!(d.to_type, "float32");
        assert_eq!(d.imports["example.com/geom"], "example.com/out/geomf");
        assert_eq!(d.format_shims["draw"], "toI");
        assert!(d.format_exempt.contains("table"));
        assert!(d.skip.for_file(Path::new("x.go")).field("id"));
    }
}
