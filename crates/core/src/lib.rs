#![allow(clippy::result_large_err)]
//! typeshift-core: scalar type migration for Go-subset source trees.
//!
//! Migrates every use of one integer type (usually `int`) in a directory
//! of Go source to a float type (usually `float64`) in three phases:
//!
//! - Convert ([`pass1_convert`]) renames the type in declarations,
//!   conversions and literals, ignoring type information;
//! - Fix ([`pass2_fix`]) re-checks the result and resolves each type
//!   conflict by the shape of its diagnostic, until none are left;
//! - Format ([`pass3_format`]) keeps printf-style directives in step with
//!   the new argument types.
//!
//! [`migrate_dir()`] runs all three against a [`SourceProvider`].

pub mod ast;
pub mod check;
pub mod classify;
pub mod error;
pub mod frontend;
pub mod lexer;
pub mod migrate;
pub mod parser;
pub mod pass1_convert;
pub mod pass2_fix;
pub mod pass3_format;
pub mod printer;
pub mod skip;
pub mod snippets;
pub mod source;
pub mod unit;
pub mod walk;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{Forest, NodeId, NodeKind, Span};
pub use classify::{classify, ConflictShape};
pub use error::{Location, MigrateError, SyntaxError};
pub use frontend::{Frontend, GoFrontend};
pub use migrate::{Directive, MigrateReport};
pub use skip::SkipSet;
pub use source::{FileSystemProvider, InMemoryProvider, SourceProvider};
pub use unit::{Collection, Diagnostic, Unit};

// ── Convenience re-exports: pipeline entry points ────────────────────

pub use migrate::migrate_dir;
pub use pass1_convert::convert;
pub use pass2_fix::{fix_collection, FixProgress};
pub use pass3_format::format_unit;
pub use printer::print_file;
