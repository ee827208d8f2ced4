use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use revlint_lib::catalog::Catalog;
use revlint_lib::compiler::{compile_file, CompilerInvocation};
use revlint_lib::config::{create_default_config, Config, ConfigCache};
use revlint_lib::edit_applier::apply_fixes;
use revlint_lib::exit_codes;
use revlint_lib::output::OutputFormat;
use revlint_lib::project::{check_files, plan_project};

#[derive(Parser)]
#[command(name = "revlint", version, about = "Validator and ID auto-fixer for Re:VIEW book sources", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Catalog (manifest) path, overriding the configured one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Output format: text, concise or json
    #[arg(long, global = true, default_value = "text")]
    output_format: String,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Show detailed output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan sources for tags absent from the allowlist
    Check {
        /// Files to scan; defaults to every file in the catalog
        paths: Vec<PathBuf>,
    },
    /// Plan ID fixes for empty and duplicate IDs; apply them on request
    Fix {
        /// Files to fix; defaults to every file in the catalog
        paths: Vec<PathBuf>,

        /// Apply the planned edits (writes .bak backups first)
        #[arg(long)]
        apply: bool,

        /// Prefix for minted IDs, overriding config and the file stem
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Run the external compiler and report its warnings
    Compile {
        /// Files to compile; defaults to every file in the catalog
        paths: Vec<PathBuf>,

        /// Compiler command to invoke
        #[arg(long, default_value = "review-compile")]
        command: String,

        /// Extra argument for the compiler (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,
    },
    /// Create a default .revlint.toml in the current directory
    Init,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if cli.no_color || cli.output_format.eq_ignore_ascii_case("json") {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(exit_codes::TOOL_ERROR);
        }
    }
}

/// A path's on-disk identity, for comparing user-supplied paths against
/// catalog entries. Canonicalization collapses aliases (`./ch01.re`, absolute
/// paths, `..` segments); a path that does not exist falls back to the joined
/// form.
fn resolve_file(root: &Path, path: &Path) -> PathBuf {
    let joined = root.join(path);
    fs::canonicalize(&joined).unwrap_or(joined)
}

/// The plan scope plus the rest of the catalog, both relative to the root.
/// Explicit paths take precedence over the catalog; with no paths, the
/// catalog is required. A catalog entry naming the same file as an explicit
/// path (however spelled) belongs to the scope, not the rest.
fn resolve_scope(
    root: &Path,
    paths: &[PathBuf],
    catalog_path: &Path,
) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    if paths.is_empty() {
        let catalog = Catalog::load(&root.join(catalog_path))
            .with_context(|| "no paths given and the catalog could not be loaded")?;
        return Ok((catalog.files, Vec::new()));
    }

    let scope: Vec<PathBuf> = paths.to_vec();
    let resolved_scope: Vec<PathBuf> = scope.iter().map(|p| resolve_file(root, p)).collect();
    let rest = match Catalog::load(&root.join(catalog_path)) {
        Ok(catalog) => catalog
            .files
            .into_iter()
            .filter(|f| !resolved_scope.contains(&resolve_file(root, f)))
            .collect(),
        Err(e) => {
            log::debug!("no catalog for cross-file ID collection: {e}");
            Vec::new()
        }
    };
    Ok((scope, rest))
}

fn effective_catalog_path(cli_catalog: Option<&PathBuf>, config: &Config) -> PathBuf {
    cli_catalog
        .cloned()
        .unwrap_or_else(|| PathBuf::from(&config.global.catalog))
}

fn run(cli: Cli) -> Result<i32> {
    let root = env::current_dir().context("cannot determine working directory")?;
    let format = OutputFormat::from_str(&cli.output_format).map_err(anyhow::Error::msg)?;
    let formatter = format.create_formatter();

    let mut config_cache = ConfigCache::discover(&root, cli.config.as_deref());
    let config = config_cache.get()?.clone();

    match cli.command {
        Commands::Check { paths } => {
            let catalog_path = effective_catalog_path(cli.catalog.as_ref(), &config);
            let (scope, _) = resolve_scope(&root, &paths, &catalog_path)?;
            let allowlist = config.allowlist();
            let report = check_files(&root, &scope, &allowlist);
            if !cli.quiet || !report.is_clean() {
                print!("{}", formatter.format_violations(&report));
            }
            Ok(if report.is_clean() {
                exit_codes::SUCCESS
            } else {
                exit_codes::VIOLATIONS_FOUND
            })
        }
        Commands::Fix { paths, apply, prefix } => {
            let catalog_path = effective_catalog_path(cli.catalog.as_ref(), &config);
            let (scope, rest) = resolve_scope(&root, &paths, &catalog_path)?;
            let fixed_prefix = prefix
                .as_deref()
                .or(Some(config.global.id_prefix.as_str()).filter(|p| !p.is_empty()));
            let plan = plan_project(&root, &scope, &rest, fixed_prefix);

            if !apply {
                print!("{}", formatter.format_plan(&plan));
                return Ok(if plan.count == 0 {
                    exit_codes::SUCCESS
                } else {
                    exit_codes::VIOLATIONS_FOUND
                });
            }

            let report = apply_fixes(&root, &plan.fixes)?;
            print!("{}", formatter.format_apply(&report));
            Ok(exit_codes::SUCCESS)
        }
        Commands::Compile { paths, command, args } => {
            let catalog_path = effective_catalog_path(cli.catalog.as_ref(), &config);
            let (scope, _) = resolve_scope(&root, &paths, &catalog_path)?;
            let invocation = CompilerInvocation { command, args };

            let mut diagnostics = Vec::new();
            for file in &scope {
                let outcome = compile_file(&invocation, &root, file)?;
                diagnostics.extend(outcome.diagnostics);
            }
            print!("{}", formatter.format_diagnostics(&diagnostics));
            Ok(if diagnostics.is_empty() {
                exit_codes::SUCCESS
            } else {
                exit_codes::VIOLATIONS_FOUND
            })
        }
        Commands::Init => {
            let path = root.join(".revlint.toml");
            create_default_config(&path)?;
            println!("Created {}", path.display());
            Ok(exit_codes::SUCCESS)
        }
    }
}
