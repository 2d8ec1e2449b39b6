//! Batch runner for a configuration file.
//!
//! For every enabled repository, each source directory goes through:
//! empty the target, migrate (Convert, Fix, Format), header/patches/footer,
//! copy the non-source files. Output is provisional until the directory's
//! `OK` line.

use std::path::{Path, PathBuf};

use serde::Serialize;
use typeshift_core::{migrate_dir, Directive, FileSystemProvider, MigrateError, MigrateReport};
use walkdir::WalkDir;

use crate::config::{self, Config, ConfigError, Repository};
use crate::{files, patch, OutputFormat};

/// Options shared by every directory of a run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub output: OutputFormat,
    pub quiet: bool,
}

impl RunOptions {
    /// Progress line on stdout, text mode only.
    fn say(&self, line: impl AsRef<str>) {
        if self.output == OutputFormat::Text && !self.quiet {
            println!("{}", line.as_ref());
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Migrate(#[from] MigrateError),
}

impl RunError {
    fn io<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> RunError + 'a {
        move |source| RunError::Io {
            action,
            path: path.display().to_string(),
            source,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            RunError::Migrate(e) => e.to_json_value(),
            other => serde_json::json!({ "error": other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Skipped,
}

/// Result for one migrated directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirOutcome {
    pub source: String,
    pub target: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<MigrateReport>,
    pub patches: usize,
    pub copied: usize,
}

/// Run every enabled repository of the configuration at `path`.
pub fn run(path: &Path, opts: &RunOptions) -> Result<Vec<DirOutcome>, RunError> {
    opts.say(format!("Open {:?} ...", path.display().to_string()));
    let (repos, cfg) = config::load(path)?;
    let mut outcomes = Vec::new();
    for repo in &repos {
        if repo.disabled {
            tracing::info!(repo = %repo.name, "repository disabled");
            continue;
        }
        let directive = cfg.directive(repo);
        for dir in source_dirs(&cfg, repo)? {
            let rel = dir.strip_prefix(&cfg.from).unwrap_or(Path::new(""));
            let target = cfg.target_root(repo).join(rel);
            outcomes.push(migrate_one(&dir, &target, &cfg, &directive, opts)?);
        }
    }
    opts.say("Done without errors.");
    Ok(outcomes)
}

/// The source root, plus every non-hidden subdirectory when the
/// repository recurses. Parents come before their children.
fn source_dirs(cfg: &Config, repo: &Repository) -> Result<Vec<PathBuf>, RunError> {
    if !repo.recurse {
        return Ok(vec![cfg.from.clone()]);
    }
    let mut dirs = Vec::new();
    let walker = WalkDir::new(&cfg.from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(e.file_name().to_string_lossy().starts_with('.') || e.path() == cfg.to)
        });
    for entry in walker {
        let entry = entry.map_err(|e| RunError::Io {
            action: "cannot walk",
            path: cfg.from.display().to_string(),
            source: e.into(),
        })?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn migrate_one(
    src: &Path,
    target: &Path,
    cfg: &Config,
    directive: &Directive,
    opts: &RunOptions,
) -> Result<DirOutcome, RunError> {
    let shown = format!("{:?}", target.display().to_string());
    opts.say(format!("{} -> {}:", src.display(), target.display()));
    opts.say(format!("- Empty {} ...", shown));
    files::empty_dir(target).map_err(RunError::io("cannot empty", target))?;

    opts.say(format!(
        "- Migrate type from {:?} to {:?} ...",
        directive.from_type, directive.to_type
    ));
    let mut outcome = DirOutcome {
        source: src.display().to_string(),
        target: target.display().to_string(),
        status: Status::Ok,
        reason: None,
        report: None,
        patches: 0,
        copied: 0,
    };
    let report = match migrate_dir(&FileSystemProvider, src, target, directive) {
        Ok(report) => report,
        Err(e) if e.is_recoverable() => {
            opts.say(format!("  Please fix: {}\n- SKIP\n", e));
            tracing::warn!(dir = %src.display(), error = %e, "directory skipped");
            if let Err(err) = std::fs::remove_dir_all(target) {
                tracing::warn!(dir = %target.display(), error = %err, "cannot remove target");
            }
            outcome.status = Status::Skipped;
            outcome.reason = Some(e.to_string());
            return Ok(outcome);
        }
        Err(e) => return Err(e.into()),
    };
    if report.fixed == 0 {
        opts.say("  ... no type conflicts found.");
    } else {
        opts.say(format!("  ... fixed {} type conflicts.", report.fixed));
    }
    if report.formatted > 0 {
        opts.say(format!("  ... rewrote {} format calls.", report.formatted));
    }

    let patches = patch::patch_dir(target, &cfg.header, &cfg.patches, &cfg.footer)
        .map_err(RunError::io("cannot patch", target))?;
    match patches {
        0 => {}
        1 => opts.say(format!("- Applied one patch to {} ...", shown)),
        n => opts.say(format!("- Applied {} patches to {} ...", n, shown)),
    }

    opts.say(format!("- Copy non-go files of {} ...", shown));
    let copied =
        files::copy_files(src, target, &cfg.readme).map_err(RunError::io("cannot copy into", target))?;
    opts.say("- OK\n");

    outcome.report = Some(report);
    outcome.patches = patches;
    outcome.copied = copied;
    Ok(outcome)
}
