mod config;
mod dump;
mod files;
mod patch;
mod runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use typeshift_core::parser::parse_file;
use typeshift_core::{print_file, FileSystemProvider, Forest, Frontend, GoFrontend, MigrateError};

use runner::RunOptions;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Migrate Go-subset source trees from an integer type to a float type.
#[derive(Parser)]
#[command(
    name = "typeshift",
    version,
    about = "Migrate Go-subset source trees from an integer type to a float type"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log every type conflict as it is fixed
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate every enabled repository of a JSON configuration
    Run {
        /// Path to the configuration file
        config: PathBuf,
    },

    /// Parse and type-check a directory, printing its diagnostics
    Check {
        /// Directory holding the .go files
        dir: PathBuf,
    },

    /// Dump the syntax tree of one .go file
    Print {
        /// Path to the .go file
        file: PathBuf,
        /// Print the re-formatted source instead of the tree
        #[arg(long)]
        source: bool,
    },
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Run { config } => {
            cmd_run(&config, cli.output, cli.quiet);
        }
        Commands::Check { dir } => {
            cmd_check(&dir, cli.output, cli.quiet);
        }
        Commands::Print { file, source } => {
            cmd_print(&file, source, cli.output, cli.quiet);
        }
    }
}

fn cmd_run(config: &Path, output: OutputFormat, quiet: bool) {
    let opts = RunOptions { output, quiet };
    match runner::run(config, &opts) {
        Ok(outcomes) => {
            if output == OutputFormat::Json {
                let pretty = serde_json::to_string_pretty(&outcomes)
                    .unwrap_or_else(|e| format!("serialization error: {}", e));
                println!("{}", pretty);
            }
        }
        Err(e) => {
            match output {
                OutputFormat::Json => {
                    let err_json = serde_json::to_string_pretty(&e.to_json_value())
                        .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
                    eprintln!("{}", err_json);
                }
                OutputFormat::Text => {
                    if !quiet {
                        eprintln!("Error: {}", e);
                    }
                }
            }
            process::exit(1);
        }
    }
}

fn cmd_check(dir: &Path, output: OutputFormat, quiet: bool) {
    let coll = match GoFrontend::new(&FileSystemProvider).load(dir) {
        Ok(coll) => coll,
        Err(e) => {
            report_migrate_error(&e, output, quiet);
            process::exit(1);
        }
    };
    let count = coll.diagnostic_count();
    match output {
        OutputFormat::Json => {
            let diagnostics: Vec<serde_json::Value> = coll
                .units
                .iter()
                .flat_map(|u| {
                    u.diagnostics.iter().map(move |d| {
                        serde_json::json!({
                            "unit": u.name,
                            "position": d.position(),
                            "message": d.message,
                        })
                    })
                })
                .collect();
            let result = serde_json::json!({
                "units": coll.units.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
                "diagnostics": diagnostics,
            });
            let pretty = serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
        OutputFormat::Text => {
            for d in coll.diagnostics() {
                println!("{}", d);
            }
            if !quiet {
                match count {
                    0 => println!("{}: no type errors", dir.display()),
                    1 => println!("{}: 1 type error", dir.display()),
                    n => println!("{}: {} type errors", dir.display(), n),
                }
            }
        }
    }
    if count > 0 {
        process::exit(1);
    }
}

fn cmd_print(file: &Path, source: bool, output: OutputFormat, quiet: bool) {
    let src = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            report_migrate_error(&MigrateError::io(file, e), output, quiet);
            process::exit(1);
        }
    };
    let mut forest = Forest::new();
    let root = match parse_file(&src, &file.display().to_string(), &mut forest) {
        Ok(root) => root,
        Err(e) => {
            report_migrate_error(&MigrateError::Syntax(e), output, quiet);
            process::exit(1);
        }
    };
    if source {
        print!("{}", print_file(&forest, root));
        return;
    }
    match output {
        OutputFormat::Text => print!("{}", dump::dump_text(&forest, root)),
        OutputFormat::Json => {
            let pretty = serde_json::to_string_pretty(&dump::dump_json(&forest, root))
                .unwrap_or_else(|e| format!("serialization error: {}", e));
            println!("{}", pretty);
        }
    }
}

fn report_migrate_error(e: &MigrateError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("Error: {}", e);
            }
        }
    }
}
