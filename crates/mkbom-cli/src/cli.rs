use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use mkbom_types::{CompileMode, HashAlgorithm};

#[derive(Parser)]
#[command(
    name = "mkbom",
    about = "mkbom: dependency tracking and OmniBOR build provenance",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

impl Cli {
    /// Parse `argv`, keeping `--target` and `--quoted-target` in the order
    /// they were given.
    pub fn try_parse_ordered<I, T>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(argv)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        if let (Command::Record(args), Some(("record", sub))) =
            (&mut cli.command, matches.subcommand())
        {
            args.ordered_targets = ordered_targets(sub);
        }
        Ok(cli)
    }
}

/// Interleave the two target flags by their position on the command line.
fn ordered_targets(matches: &ArgMatches) -> Vec<(String, bool)> {
    let mut ordered = Vec::new();
    for (id, quote) in [("targets", false), ("quoted_targets", true)] {
        if let (Some(values), Some(indices)) =
            (matches.get_many::<String>(id), matches.indices_of(id))
        {
            ordered.extend(indices.zip(values).map(|(index, name)| (index, name.clone(), quote)));
        }
    }
    ordered.sort_by_key(|(index, ..)| *index);
    ordered.into_iter().map(|(_, name, quote)| (name, quote)).collect()
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the gitoid of each file
    Hash(HashArgs),
    /// Record one build step: Make rules, BOM documents, and metadata
    Record(RecordArgs),
    /// Check that a stored BOM document matches its name
    Verify(StoreArgs),
    /// Print a stored BOM document
    Show(StoreArgs),
}

#[derive(Args)]
pub struct HashArgs {
    #[arg(short, long, default_value = "sha1")]
    pub algorithm: HashAlgorithm,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct RecordArgs {
    /// Dependencies in discovery order; the first is the main input
    pub deps: Vec<String>,

    /// Target written as given (like -MT)
    #[arg(long = "target", value_name = "NAME")]
    pub targets: Vec<String>,

    /// Target with Make quoting applied (like -MQ)
    #[arg(long = "quoted-target", value_name = "NAME")]
    pub quoted_targets: Vec<String>,

    /// Colon-separated prefixes stripped from recorded names
    #[arg(long)]
    pub vpath: Vec<String>,

    /// BOM algorithm; repeat for several. Overrides the config file.
    #[arg(short, long = "algorithm")]
    pub algorithms: Vec<HashAlgorithm>,

    /// Store root
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Output artifact of the build step
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, default_value = "compile-only")]
    pub mode: CompileMode,

    /// Command line recorded in the metadata
    #[arg(long)]
    pub build_cmd: Option<String>,

    /// Write Make rules to this file
    #[arg(long, value_name = "FILE")]
    pub make_deps: Option<PathBuf>,

    /// Add an empty rule for every dependency but the first
    #[arg(long)]
    pub phony_targets: bool,

    #[arg(long)]
    pub column_width: Option<usize>,

    /// Replay dependencies saved by an earlier step
    #[arg(long, value_name = "FILE")]
    pub load_snapshot: Option<PathBuf>,

    /// Path to leave out when replaying a snapshot
    #[arg(long, value_name = "PATH", requires = "load_snapshot")]
    pub snapshot_self: Option<String>,

    /// Save this step's dependencies for a later step
    #[arg(long, value_name = "FILE")]
    pub save_snapshot: Option<PathBuf>,

    /// Write the .note.omnibor payload to this file
    #[arg(long, value_name = "FILE")]
    pub note: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Both target kinds in command-line order, with their quoting flag.
    #[arg(skip)]
    pub ordered_targets: Vec<(String, bool)>,
}

impl RecordArgs {
    /// Targets as `(name, quote)` in command-line order. Without position
    /// information, quoted targets come before plain ones.
    pub fn targets_in_order(&self) -> Vec<(String, bool)> {
        if !self.ordered_targets.is_empty() {
            return self.ordered_targets.clone();
        }
        self.quoted_targets
            .iter()
            .map(|name| (name.clone(), true))
            .chain(self.targets.iter().map(|name| (name.clone(), false)))
            .collect()
    }
}

#[derive(Args)]
pub struct StoreArgs {
    /// Document gitoid, as hex or a gitoid:blob URI
    pub gitoid: String,
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hash() {
        let cli = Cli::try_parse_from(["mkbom", "hash", "a.c", "b.h"]).unwrap();
        if let Command::Hash(args) = cli.command {
            assert_eq!(args.algorithm, HashAlgorithm::Sha1);
            assert_eq!(args.files, vec![PathBuf::from("a.c"), PathBuf::from("b.h")]);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_hash_sha256() {
        let cli = Cli::try_parse_from(["mkbom", "hash", "-a", "sha256", "a.c"]).unwrap();
        if let Command::Hash(args) = cli.command {
            assert_eq!(args.algorithm, HashAlgorithm::Sha256);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_hash_requires_files() {
        assert!(Cli::try_parse_from(["mkbom", "hash"]).is_err());
    }

    #[test]
    fn parse_record() {
        let cli = Cli::try_parse_from([
            "mkbom", "record", "main.c", "util.h",
            "--target", "$(OBJ)/main.o",
            "--quoted-target", "main.o",
            "-a", "sha1", "-a", "sha256",
            "--root", "bom",
            "-o", "main.o",
            "--mode", "assemble-only",
            "--make-deps", "main.d",
        ])
        .unwrap();
        if let Command::Record(args) = cli.command {
            assert_eq!(args.deps, vec!["main.c", "util.h"]);
            assert_eq!(args.targets, vec!["$(OBJ)/main.o"]);
            assert_eq!(args.quoted_targets, vec!["main.o"]);
            assert_eq!(args.algorithms, vec![HashAlgorithm::Sha1, HashAlgorithm::Sha256]);
            assert_eq!(args.root, Some(PathBuf::from("bom")));
            assert_eq!(args.mode, CompileMode::AssembleOnly);
            assert_eq!(args.make_deps, Some(PathBuf::from("main.d")));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn record_targets_keep_command_line_order() {
        let cli = Cli::try_parse_ordered([
            "mkbom", "record", "main.c",
            "--quoted-target", "a b.o",
            "--target", "$(OBJ)/main.o",
            "--quoted-target", "c.o",
            "--target", "d.o",
        ])
        .unwrap();
        if let Command::Record(args) = cli.command {
            assert_eq!(
                args.targets_in_order(),
                vec![
                    ("a b.o".to_string(), true),
                    ("$(OBJ)/main.o".to_string(), false),
                    ("c.o".to_string(), true),
                    ("d.o".to_string(), false),
                ]
            );
        } else { panic!("wrong command"); }
    }

    #[test]
    fn record_targets_without_positions_fall_back() {
        let cli = Cli::try_parse_from([
            "mkbom", "record", "main.c", "--target", "t.o", "--quoted-target", "q.o",
        ])
        .unwrap();
        if let Command::Record(args) = cli.command {
            assert_eq!(
                args.targets_in_order(),
                vec![("q.o".to_string(), true), ("t.o".to_string(), false)]
            );
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_record_defaults() {
        let cli = Cli::try_parse_from(["mkbom", "record", "main.c"]).unwrap();
        if let Command::Record(args) = cli.command {
            assert_eq!(args.mode, CompileMode::CompileOnly);
            assert!(args.algorithms.is_empty());
            assert!(args.config.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_snapshot_self_needs_snapshot() {
        assert!(Cli::try_parse_from(["mkbom", "record", "--snapshot-self", "pch.h"]).is_err());
        assert!(Cli::try_parse_from([
            "mkbom", "record", "--load-snapshot", "pch.deps", "--snapshot-self", "pch.h",
        ])
        .is_ok());
    }

    #[test]
    fn parse_verify() {
        let cli = Cli::try_parse_from(["mkbom", "verify", "--root", "bom", "5079f42d"]).unwrap();
        if let Command::Verify(args) = cli.command {
            assert_eq!(args.gitoid, "5079f42d");
            assert_eq!(args.root, PathBuf::from("bom"));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_show_default_root() {
        let cli = Cli::try_parse_from(["mkbom", "show", "abc"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.root, PathBuf::from("."));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["mkbom", "--verbose", "hash", "a"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["mkbom", "--format", "json", "show", "abc"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
