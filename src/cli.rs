//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API:
//! fixing a project in place, formatting a single buffer for editor or
//! formatter integration, and listing the files a fix would process.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Separate type-only imports from value imports in TypeScript sources.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Print debug logging to stderr. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Rewrite imports in place so type-only bindings use `import type`.
    ///
    /// `import { A, type B } from './mod'` becomes
    /// `import { A } from './mod'` followed by `import type { B } from './mod'`.
    Fix {
        /// Project root. Defaults to the current directory.
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Directory to search for source files, relative to the project root.
        #[arg(short, long, default_value = "src")]
        dir: PathBuf,

        /// Also promote imports that are only ever used as types (slower).
        #[arg(short, long)]
        check_usage: bool,

        /// Process every file and leave the hash cache untouched.
        #[arg(long)]
        no_cache: bool,

        /// Glob patterns for directories/files to exclude (e.g., "generated", "*.d.ts").
        /// By default, hidden entries and `node_modules` are excluded.
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Disable default exclusion of hidden entries and `node_modules`.
        #[arg(long)]
        no_default_excludes: bool,

        /// Report files that would change without writing them.
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Interactively confirm each file's changes before writing.
        #[arg(short, long)]
        interactive: bool,

        /// Emit a JSON summary instead of human-readable output.
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a single file or stdin and print the result to stdout.
    ///
    /// Intended for formatter and editor integration: no project context,
    /// no cache, and usage checking is not available.
    Format {
        /// File to read. Reads stdin when omitted.
        file: Option<PathBuf>,

        /// Path used to pick the syntax (`.tsx` enables JSX) when reading stdin.
        #[arg(long)]
        stdin_filepath: Option<PathBuf>,
    },

    /// List files that `fix` would process.
    Scan {
        /// Project root. Defaults to the current directory.
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Directory to search for source files, relative to the project root.
        #[arg(short, long, default_value = "src")]
        dir: PathBuf,

        /// Glob patterns for directories/files to exclude.
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Disable default exclusion of hidden entries and `node_modules`.
        #[arg(long)]
        no_default_excludes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn fix_defaults() {
        let args = Args::parse_from(["fix-type-imports", "fix"]);
        match args.command {
            Commands::Fix {
                project,
                dir,
                check_usage,
                no_cache,
                dry_run,
                ..
            } => {
                assert!(project.is_none());
                assert_eq!(dir, PathBuf::from("src"));
                assert!(!check_usage && !no_cache && !dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn fix_short_flags() {
        let args = Args::parse_from([
            "fix-type-imports",
            "fix",
            "-p",
            "/repo",
            "-d",
            "lib",
            "-c",
            "--no-cache",
            "-e",
            "generated",
            "-v",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Fix {
                project,
                dir,
                check_usage,
                no_cache,
                exclude,
                ..
            } => {
                assert_eq!(project, Some(PathBuf::from("/repo")));
                assert_eq!(dir, PathBuf::from("lib"));
                assert!(check_usage && no_cache);
                assert_eq!(exclude, vec!["generated".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn format_reads_stdin_by_default() {
        let args = Args::parse_from(["fix-type-imports", "format", "--stdin-filepath", "a.tsx"]);
        match args.command {
            Commands::Format {
                file,
                stdin_filepath,
            } => {
                assert!(file.is_none());
                assert_eq!(stdin_filepath, Some(PathBuf::from("a.tsx")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
