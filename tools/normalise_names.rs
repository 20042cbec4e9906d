use std::env;
use std::path::PathBuf;

use library::{normalise_tree, NameRules, NormaliseMode};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: normalise_names <music-root> [--dry-run] [--rules <file.json>]";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut root: Option<PathBuf> = None;
    let mut mode = NormaliseMode::Apply;
    let mut rules_path: Option<PathBuf> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--dry-run" => mode = NormaliseMode::DryRun,
            "--rules" => {
                let value = args.next().ok_or(USAGE)?;
                rules_path = Some(PathBuf::from(value));
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ if root.is_none() => root = Some(PathBuf::from(arg)),
            _ => return Err(USAGE.into()),
        }
    }
    let root = root.ok_or(USAGE)?;

    let rules = match rules_path {
        Some(path) => NameRules::from_path(&path)?,
        None => NameRules::builtin()?,
    };

    let report = normalise_tree(&root, &rules, mode);
    let verb = match mode {
        NormaliseMode::Apply => "Rewrote",
        NormaliseMode::DryRun => "Would rewrite",
    };
    println!(
        "{} {} fields in {} of {} files ({} failures)",
        verb,
        report.changes.len(),
        if mode == NormaliseMode::Apply {
            report.files_written
        } else {
            count_files(&report)
        },
        report.files_scanned,
        report.failures.len()
    );

    Ok(())
}

fn count_files(report: &library::NormaliseReport) -> usize {
    let mut paths: Vec<&str> = report.changes.iter().map(|c| c.path.as_str()).collect();
    paths.dedup();
    paths.len()
}
