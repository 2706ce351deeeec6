use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use mkbom_crypto::GitoidHasher;
use mkbom_sdk::{BomConfig, BuildContext, Session, SessionReport};
use mkbom_store::{FsObjectStore, ObjectStore};
use mkbom_types::{DependencyRecord, Gitoid};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Hash(args) => cmd_hash(args, &cli.format),
        Command::Record(args) => cmd_record(args, &cli.format),
        Command::Verify(args) => cmd_verify(args, &cli.format),
        Command::Show(args) => cmd_show(args, &cli.format),
    }
}

fn cmd_hash(args: HashArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let hasher = GitoidHasher::new(args.algorithm);
    let records = args
        .files
        .iter()
        .map(|path| -> anyhow::Result<DependencyRecord> {
            let gitoid = hasher
                .hash_file(path)
                .with_context(|| format!("cannot hash {}", path.display()))?;
            Ok(DependencyRecord::new(path, gitoid))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Text => {
            for record in &records {
                println!("{}  {}", record.gitoid.to_hex().yellow(), record.path.display());
            }
        }
    }
    Ok(())
}

fn cmd_record(args: RecordArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => BomConfig::from_toml_file(path)?,
        None => BomConfig::default(),
    };
    if !args.algorithms.is_empty() {
        config.algorithms = args.algorithms.clone();
    }
    if let Some(root) = &args.root {
        config.root = root.clone();
    }
    config.vpath.extend(args.vpath.iter().cloned());
    config.make.phony_targets |= args.phony_targets;
    if let Some(width) = args.column_width {
        config.make.column_width = width;
    }

    let mut session = Session::new(config)?;
    let ledger = session.ledger_mut();
    for (target, quote) in args.targets_in_order() {
        ledger.add_target(&target, quote);
    }
    for dep in &args.deps {
        ledger.add_dependency(dep)?;
    }
    ledger.add_default_target(args.deps.first().map_or("", String::as_str));

    if let Some(path) = &args.load_snapshot {
        let file = File::open(path)
            .with_context(|| format!("cannot open snapshot {}", path.display()))?;
        let added = session.load_snapshot(BufReader::new(file), args.snapshot_self.as_deref())?;
        tracing::debug!(added, snapshot = %path.display(), "snapshot replayed");
    }

    if let Some(path) = &args.make_deps {
        write_file(path, |out| Ok(session.write_make_rules(out)?))?;
    }
    if let Some(path) = &args.save_snapshot {
        write_file(path, |out| Ok(session.save_snapshot(out)?))?;
    }

    let context = BuildContext {
        output: args.output.clone(),
        mode: args.mode,
        build_cmd: args.build_cmd.clone(),
    };
    let report = session.finish(&context);

    if let Some(path) = &args.note {
        fs::write(path, report.omnibor_note())
            .with_context(|| format!("cannot write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print_report(&report),
    }
    Ok(())
}

fn print_report(report: &SessionReport) {
    for entry in &report.algorithms {
        match (&entry.document, &entry.error) {
            (Some(id), _) => {
                println!(
                    "{} {} {} ({} entries)",
                    "✓".green().bold(),
                    entry.algorithm.to_string().cyan(),
                    id.to_hex().yellow(),
                    entry.entries
                );
                if let Some(path) = &entry.metadata_path {
                    println!("  Metadata: {}", path.display());
                }
            }
            (None, error) => {
                println!(
                    "{} {} no provenance recorded: {}",
                    "✗".red().bold(),
                    entry.algorithm.to_string().cyan(),
                    error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        for path in &entry.skipped {
            println!("  {} {}", "skipped:".yellow(), path.display());
        }
    }
}

fn cmd_verify(args: StoreArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = parse_gitoid(&args.gitoid)?;
    let store = FsObjectStore::new(&args.root);
    let document = store
        .verify(&id)
        .with_context(|| format!("verification failed for {}", id.to_uri()))?;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "gitoid": document.gitoid(),
                "entries": document.len(),
                "valid": true,
            })
        ),
        OutputFormat::Text => {
            println!("{} {} verified", "✓".green().bold(), id.to_hex().yellow());
            println!("  Path: {}", store.object_path(&id).display());
            println!("  Entries: {}", document.len());
        }
    }
    Ok(())
}

fn cmd_show(args: StoreArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let id = parse_gitoid(&args.gitoid)?;
    let store = FsObjectStore::new(&args.root);
    let bytes = store
        .read(&id)?
        .with_context(|| format!("no document {} under {}", id.to_hex(), args.root.display()))?;
    let text = String::from_utf8(bytes).context("document is not UTF-8")?;

    match format {
        OutputFormat::Json => {
            let entries: Vec<&str> = text.lines().skip(1).collect();
            println!(
                "{}",
                serde_json::json!({ "gitoid": id, "header": text.lines().next(), "entries": entries })
            );
        }
        OutputFormat::Text => print!("{text}"),
    }
    Ok(())
}

/// Accept a bare hex digest or a `gitoid:blob:` URI.
fn parse_gitoid(s: &str) -> anyhow::Result<Gitoid> {
    let id = if s.starts_with(Gitoid::URI_PREFIX) {
        Gitoid::from_uri(s)
    } else {
        Gitoid::parse_hex(&s.to_ascii_lowercase())
    };
    id.with_context(|| format!("not a gitoid: {s}"))
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write(&mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;

    #[test]
    fn parse_gitoid_forms() {
        let hex = "5079f42d94056d1789d1a39c853748c58186e7ca";
        let from_hex = parse_gitoid(hex).unwrap();
        let from_upper = parse_gitoid(&hex.to_uppercase()).unwrap();
        let from_uri = parse_gitoid(&format!("gitoid:blob:sha1:{hex}")).unwrap();
        assert_eq!(from_hex, from_uri);
        assert_eq!(from_hex, from_upper);
        assert!(parse_gitoid("xyz").is_err());
    }

    #[test]
    fn record_then_verify_and_show() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("a.c");
        let b = tmp.path().join("b.h");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        let root = tmp.path().join("bom");
        let deps_file = tmp.path().join("a.d");
        let note = tmp.path().join("note.bin");

        let argv: Vec<OsString> = vec![
            "mkbom".into(),
            "record".into(),
            a.clone().into(),
            b.clone().into(),
            "--root".into(),
            root.clone().into(),
            "--make-deps".into(),
            deps_file.clone().into(),
            "--note".into(),
            note.clone().into(),
            "--quoted-target".into(),
            "a.o".into(),
        ];
        let cli = Cli::try_parse_ordered(argv).unwrap();
        run_command(cli).unwrap();

        let rules = fs::read_to_string(&deps_file).unwrap();
        assert!(rules.starts_with("a.o: "));
        assert_eq!(fs::read(&note).unwrap().len(), 12 + 8 + 20);

        let hex = "5079f42d94056d1789d1a39c853748c58186e7ca";
        let root_arg = root.display().to_string();
        for sub in ["verify", "show"] {
            let cli = Cli::try_parse_from(["mkbom", sub, "--root", &root_arg, hex]).unwrap();
            run_command(cli).unwrap();
        }
    }

    #[test]
    fn record_writes_targets_in_command_line_order() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("m.c");
        fs::write(&src, b"a").unwrap();
        let deps_file = tmp.path().join("m.d");

        let argv: Vec<OsString> = vec![
            "mkbom".into(),
            "record".into(),
            src.clone().into(),
            "--root".into(),
            tmp.path().join("bom").into(),
            "--make-deps".into(),
            deps_file.clone().into(),
            "--quoted-target".into(),
            "$(OBJ)/q1.o".into(),
            "--target".into(),
            "t1.o".into(),
            "--quoted-target".into(),
            "q2.o".into(),
            "--target".into(),
            "t2.o".into(),
        ];
        run_command(Cli::try_parse_ordered(argv).unwrap()).unwrap();

        // Each plain target swaps into the first quoted slot.
        let rules = fs::read_to_string(&deps_file).unwrap();
        assert!(rules.starts_with("t1.o t2.o q2.o $$(OBJ)/q1.o: "), "{rules}");
    }

    #[test]
    fn verify_missing_document_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let root_arg = tmp.path().display().to_string();
        let cli = Cli::try_parse_from([
            "mkbom",
            "verify",
            "--root",
            &root_arg,
            "5079f42d94056d1789d1a39c853748c58186e7ca",
        ])
        .unwrap();
        assert!(run_command(cli).is_err());
    }
}
