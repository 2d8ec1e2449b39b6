//! Migration driver: Convert, Fix to a fixpoint, then Format.
//!
//! Every phase reads what the previous one wrote, so the type information
//! each phase consults always matches the text on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::MigrateError;
use crate::frontend::{is_source_file, Frontend, GoFrontend};
use crate::pass1_convert::convert;
use crate::pass2_fix::{fix_collection, FixProgress, Step};
use crate::pass3_format::format_unit;
use crate::skip::SkipSet;
use crate::source::SourceProvider;

/// What to migrate and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Directive {
    pub from_type: String,
    pub to_type: String,
    pub skip: SkipSet,
    /// File keys whose format calls may use non-constant format strings
    pub format_exempt: BTreeSet<String>,
    /// Shim function per file key, used instead of rewriting the letter
    pub format_shims: BTreeMap<String, String>,
    /// Lower-case callee name to format argument index
    pub printf: BTreeMap<String, usize>,
    /// Import path rewrites
    pub imports: BTreeMap<String, String>,
}

/// Format-style functions checked when none are configured.
pub fn default_printf() -> BTreeMap<String, usize> {
    [
        ("errorf", 0),
        ("fatalf", 0),
        ("fprintf", 1),
        ("logf", 0),
        ("panicf", 0),
        ("printf", 0),
        ("sprintf", 0),
    ]
    .into_iter()
    .map(|(name, index)| (name.to_owned(), index))
    .collect()
}

impl Default for Directive {
    fn default() -> Self {
        Directive {
            from_type: "int".to_owned(),
            to_type: "float64".to_owned(),
            skip: SkipSet::default(),
            format_exempt: BTreeSet::new(),
            format_shims: BTreeMap::new(),
            printf: default_printf(),
            imports: BTreeMap::new(),
        }
    }
}

impl Directive {
    pub fn validate(&self) -> Result<(), MigrateError> {
        if self.from_type.is_empty() || self.to_type.is_empty() {
            return Err(MigrateError::Directive(
                "source and target types must be set".to_owned(),
            ));
        }
        if self.from_type == self.to_type {
            return Err(MigrateError::Directive(format!(
                "source and target type are both {}",
                self.from_type
            )));
        }
        Ok(())
    }
}

/// Counts collected while migrating one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrateReport {
    pub units: Vec<String>,
    pub converted: usize,
    pub fix_iterations: usize,
    pub fixed: usize,
    pub formatted: usize,
    pub snippets: Vec<String>,
}

/// Migrate the sources of `src_dir` into `dst_dir`.
///
/// Fails without touching `dst_dir` when the sources do not type-check.
/// A Fix failure leaves the edits made so far in `dst_dir`. A
/// non-constant format string removes the migrated sources again before
/// the error is returned.
pub fn migrate_dir(
    provider: &dyn SourceProvider,
    src_dir: &Path,
    dst_dir: &Path,
    directive: &Directive,
) -> Result<MigrateReport, MigrateError> {
    directive.validate()?;
    let frontend = GoFrontend::new(provider);
    let mut report = MigrateReport::default();
    let from = directive.from_type.as_str();
    let to = directive.to_type.as_str();

    tracing::info!(dir = %src_dir.display(), from, to, "convert");
    let mut coll = frontend.load(src_dir)?;
    coll.require_clean("convert")?;
    for unit in &mut coll.units {
        report.converted += convert(unit, from, to, &directive.skip, &directive.imports)?;
    }
    report.units = coll.units.iter().map(|u| u.name.clone()).collect();
    coll.save(provider, dst_dir)?;

    tracing::info!(dir = %dst_dir.display(), "fix");
    let mut progress = FixProgress::new();
    let mut carried = coll.snippets();
    loop {
        let mut coll = frontend.load(dst_dir)?;
        coll.merge_snippets(&carried);
        match progress.observe(coll.diagnostic_count()) {
            Step::Done => break,
            Step::Stalled => {
                let remaining: Vec<String> = coll.diagnostics().map(|d| d.to_string()).collect();
                return Err(MigrateError::NoProgress {
                    count: remaining.len(),
                    first: remaining.first().cloned().unwrap_or_default(),
                    remaining,
                });
            }
            Step::Fix => {}
        }
        let result = fix_collection(&mut coll, from, to);
        coll.save(provider, dst_dir)?;
        carried = coll.snippets();
        result?;
    }
    report.fix_iterations = progress.iterations();
    report.fixed = progress.fixed();
    if report.fixed == 0 {
        tracing::info!("no type conflicts found");
    } else {
        tracing::info!(fixed = report.fixed, iterations = report.fix_iterations, "fixed type conflicts");
    }

    tracing::info!(dir = %dst_dir.display(), "format");
    let mut coll = frontend.load(dst_dir)?;
    coll.merge_snippets(&carried);
    coll.require_clean("format")?;
    for unit in &mut coll.units {
        match format_unit(
            unit,
            from,
            &directive.format_exempt,
            &directive.format_shims,
            &directive.printf,
        ) {
            Ok(n) => report.formatted += n,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(unit = %unit.name, error = %e, "skipping directory");
                discard_sources(provider, dst_dir)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        }
    }
    coll.save(provider, dst_dir)?;
    report.snippets = coll
        .units
        .iter()
        .flat_map(|u| u.snippets.names().map(str::to_owned))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    Ok(report)
}

/// Remove every source file the migration wrote into `dir`.
fn discard_sources(provider: &dyn SourceProvider, dir: &Path) -> Result<(), MigrateError> {
    let written: Vec<PathBuf> = provider
        .list_dir(dir)
        .map_err(|e| MigrateError::io(dir, e))?
        .into_iter()
        .filter(|p| is_source_file(p))
        .collect();
    for path in written {
        provider
            .remove_file(&path)
            .map_err(|e| MigrateError::io(&path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_defaults() {
        let d: Directive = serde_json::from_str("{}").unwrap();
        assert_eq!(d.from_type, "int");
        assert_eq!(d.to_type, "float64");
        assert_eq!(d.printf["fprintf"], 1);
        assert_eq!(d.printf.len(), 7);
    }

    #[test]
    fn directive_rejects_identical_types() {
        let d = Directive {
            to_type: "int".into(),
            ..Directive::default()
        };
        assert_eq!(d.validate().unwrap_err().kind(), "directive");
    }

    #[test]
    fn directive_reads_skip_lists() {
        let d: Directive = serde_json::from_str(
            r#"{"to_type": "float32", "skip": {"geom": ["id|field"]}}"#,
        )
        .unwrap();
        assert_eq!(d.to_type, "float32");
        assert!(d.skip.for_file(Path::new("/p/geom.go")).field("id"));
    }
}
