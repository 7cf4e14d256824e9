//! fix-type-imports: separate type-only imports from value imports.
//!
//! Rewrites TypeScript files so that bindings used only as types are imported
//! with `import type`, either from explicit `type` markers or, with
//! `--check-usage`, from how each binding is used in the file.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands};
use colored::Colorize;
use dialoguer::Confirm;
use fix_type_imports::{FixOptions, RunSummary, fix_type_imports_with, organize_imports, scanner};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match args.command {
        Commands::Fix {
            project,
            dir,
            check_usage,
            no_cache,
            exclude,
            no_default_excludes,
            dry_run,
            interactive,
            json,
        } => {
            let options = FixOptions {
                project_root: project_root(project)?,
                source_dir: dir,
                check_usage,
                no_cache,
                exclude,
                default_excludes: !no_default_excludes,
                dry_run,
            };
            cmd_fix(&options, interactive, json)
        }
        Commands::Format {
            file,
            stdin_filepath,
        } => cmd_format(file, stdin_filepath),
        Commands::Scan {
            project,
            dir,
            exclude,
            no_default_excludes,
        } => cmd_scan(project, &dir, &exclude, !no_default_excludes),
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn project_root(project: Option<PathBuf>) -> Result<PathBuf> {
    match project {
        Some(path) => Ok(path),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

fn cmd_fix(options: &FixOptions, interactive: bool, json_output: bool) -> Result<()> {
    if options.check_usage && !json_output {
        eprintln!(
            "{} Checking usage for implicit type imports",
            "info:".blue().bold()
        );
    }

    let summary = fix_type_imports_with(options, |file| {
        if !interactive {
            return Ok(true);
        }
        let apply = Confirm::new()
            .with_prompt(format!("Apply changes to {}?", file.display()))
            .default(true)
            .interact()?;
        Ok(apply)
    })?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, options.dry_run);
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    for file in &summary.changed_files {
        println!(
            "{} {}",
            if dry_run { "Would update:" } else { "Updated:" }
                .yellow()
                .bold(),
            file.display()
        );
    }

    if summary.failed_files > 0 {
        eprintln!(
            "{} {} file(s) could not be read or parsed and were left untouched",
            "warn:".yellow().bold(),
            summary.failed_files
        );
    }

    if summary.total_changes == 0 {
        println!("{} No changes to apply", "ok:".green().bold());
    } else {
        println!(
            "\n{} type imports in {} files.",
            if dry_run { "Would fix" } else { "Fixed" }.green().bold(),
            summary.total_changes
        );
    }
    if summary.skipped_files > 0 {
        println!("Skipped {} files (cached).", summary.skipped_files);
    }

    if dry_run && summary.total_changes > 0 {
        println!(
            "\n{} Run without --dry-run to apply changes",
            "hint:".cyan().bold()
        );
    }
}

fn cmd_format(file: Option<PathBuf>, stdin_filepath: Option<PathBuf>) -> Result<()> {
    let (code, path) = match file {
        Some(file) => {
            let code = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            (code, file)
        }
        None => {
            let mut code = String::new();
            std::io::stdin()
                .read_to_string(&mut code)
                .context("Failed to read stdin")?;
            (code, stdin_filepath.unwrap_or_else(|| PathBuf::from("stdin.ts")))
        }
    };

    let output = organize_imports(&code, &path)?;
    print!("{}", output);
    Ok(())
}

fn cmd_scan(
    project: Option<PathBuf>,
    dir: &Path,
    exclude: &[String],
    default_excludes: bool,
) -> Result<()> {
    let root = project_root(project)?.join(dir);
    let files = scanner::collect_source_files(&[root], exclude, default_excludes)?;

    println!("Would scan {} files:", files.len());
    for file in files {
        println!("  {}", file.display());
    }

    Ok(())
}
