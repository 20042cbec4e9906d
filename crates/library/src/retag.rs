use std::path::Path;

use common::{path_to_slash_string, FileFailure};
use metadata::{Container, MetadataError, TagFile, TextField};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::names::NameRules;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormaliseMode {
    Apply,
    DryRun,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameChange {
    pub path: String,
    pub field: String,
    pub before: String,
    pub after: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NormaliseReport {
    pub files_scanned: usize,
    pub files_written: usize,
    pub changes: Vec<NameChange>,
    pub failures: Vec<FileFailure>,
}

pub fn normalise_tree(root: &Path, rules: &NameRules, mode: NormaliseMode) -> NormaliseReport {
    let mut report = NormaliseReport::default();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if Container::from_path(path).is_none() {
            continue;
        }

        report.files_scanned += 1;
        match normalise_file(path, rules, mode) {
            Ok((changes, written)) => {
                if written {
                    report.files_written += 1;
                }
                report.changes.extend(changes);
            }
            Err(err) => {
                warn!("Failed to normalise tags for {:?}: {}", path, err);
                report.failures.push(FileFailure::new(path, err));
            }
        }
    }

    info!(
        "Name pass over {:?}: {} files, {} changes, {} written",
        root,
        report.files_scanned,
        report.changes.len(),
        report.files_written
    );
    report
}

/// Normalises the artist fields of one file. Returns the changes found and
/// whether the file was saved; it is only saved in apply mode and only when
/// a field actually differs.
pub fn normalise_file(
    path: &Path,
    rules: &NameRules,
    mode: NormaliseMode,
) -> Result<(Vec<NameChange>, bool), MetadataError> {
    let mut file = TagFile::open(path)?;
    let display_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut changes = Vec::new();
    for field in TextField::ALL {
        let original = match file.text(field) {
            Some(value) => value,
            None => continue,
        };
        let normalised = rules.normalise(&original);
        if normalised == original {
            continue;
        }
        info!(
            "[Fix] {} | {}: '{}' -> '{}'",
            display_name,
            field.name(),
            original,
            normalised
        );
        if mode == NormaliseMode::Apply {
            file.set_text(field, normalised.clone())?;
        }
        changes.push(NameChange {
            path: path_to_slash_string(path),
            field: field.name().to_string(),
            before: original,
            after: normalised,
        });
    }

    let written = mode == NormaliseMode::Apply && !changes.is_empty();
    if written {
        file.save()?;
    }
    Ok((changes, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_file, write_silent_flac, write_silent_mp3};
    use std::fs;
    use tempfile::TempDir;

    fn tagged_mp3(path: &Path, artist: &str, album_artist: Option<&str>) {
        write_silent_mp3(path);
        let mut file = TagFile::open(path).unwrap();
        file.set_text(TextField::Artist, artist.to_string()).unwrap();
        if let Some(album_artist) = album_artist {
            file.set_text(TextField::AlbumArtist, album_artist.to_string())
                .unwrap();
        }
        file.save().unwrap();
    }

    #[test]
    fn apply_rewrites_artist_fields() {
        let dir = TempDir::new().unwrap();
        let track = dir.path().join("Beatles/Abbey Road/01.mp3");
        tagged_mp3(&track, "beatles, the", Some("BEATLES, THE"));

        let rules = NameRules::builtin().unwrap();
        let report = normalise_tree(dir.path(), &rules, NormaliseMode::Apply);

        assert_eq!(report.files_scanned, 1);
        assert_eq!(report.files_written, 1);
        assert_eq!(report.changes.len(), 2);
        let file = TagFile::open(&track).unwrap();
        assert_eq!(file.text(TextField::Artist).as_deref(), Some("The Beatles"));
        assert_eq!(
            file.text(TextField::AlbumArtist).as_deref(),
            Some("The Beatles")
        );
    }

    #[test]
    fn apply_rewrites_flac_vorbis_comments() {
        let dir = TempDir::new().unwrap();
        let track = dir.path().join("KLF/01.flac");
        write_silent_flac(&track, &[]);
        let mut file = TagFile::open(&track).unwrap();
        file.set_text(TextField::Artist, "klf, the".to_string()).unwrap();
        file.set_text(TextField::AlbumArtist, "the klf".to_string())
            .unwrap();
        file.save().unwrap();

        let rules = NameRules::builtin().unwrap();
        let report = normalise_tree(dir.path(), &rules, NormaliseMode::Apply);

        assert!(report.failures.is_empty(), "{:?}", report.failures);
        assert_eq!(report.files_written, 1);
        let file = TagFile::open(&track).unwrap();
        assert_eq!(file.text(TextField::Artist).as_deref(), Some("The KLF"));
        assert_eq!(file.text(TextField::AlbumArtist).as_deref(), Some("The KLF"));
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let track = dir.path().join("01.mp3");
        tagged_mp3(&track, "outkast", None);
        let before = fs::read(&track).unwrap();

        let rules = NameRules::builtin().unwrap();
        let report = normalise_tree(dir.path(), &rules, NormaliseMode::DryRun);

        assert_eq!(report.files_written, 0);
        assert_eq!(report.changes.len(), 1);
        assert_eq!(report.changes[0].field, "artist");
        assert_eq!(report.changes[0].after, "OutKast");
        assert_eq!(fs::read(&track).unwrap(), before);
    }

    #[test]
    fn already_normal_names_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let track = dir.path().join("01.mp3");
        tagged_mp3(&track, "U2 and the Edge", None);
        let before = fs::read(&track).unwrap();

        let rules = NameRules::builtin().unwrap();
        let report = normalise_tree(dir.path(), &rules, NormaliseMode::Apply);

        assert!(report.changes.is_empty());
        assert_eq!(report.files_written, 0);
        assert_eq!(fs::read(&track).unwrap(), before);
    }

    #[test]
    fn unreadable_files_are_reported_and_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("a/broken.flac"), b"nope");
        write_file(&dir.path().join("a/readme.txt"), b"hi");
        tagged_mp3(&dir.path().join("b/ok.mp3"), "mcdonald", None);

        let rules = NameRules::builtin().unwrap();
        let report = normalise_tree(dir.path(), &rules, NormaliseMode::Apply);

        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("broken.flac"));
        assert_eq!(report.changes[0].after, "McDonald");
    }
}
