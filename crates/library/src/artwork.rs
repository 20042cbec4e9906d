use std::fs;
use std::path::{Path, PathBuf};

use common::{is_cover_candidate, path_to_slash_string, FileFailure, CANONICAL_COVER_NAME};
use metadata::{Container, MetadataError, TagFile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{copy_preserving, direct_files};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArtReport {
    /// Source image that became the album's `folder.jpg`.
    pub cover: Option<String>,
    pub embedded: Vec<String>,
    pub already_present: Vec<String>,
    pub failures: Vec<FileFailure>,
}

/// Largest cover candidate directly inside `folder`. Candidates are visited
/// in file-name order and only a strictly larger file replaces the current
/// pick, so ties go to the first name.
pub fn select_cover(folder: &Path) -> Option<PathBuf> {
    let mut best: Option<(u64, PathBuf)> = None;
    for path in direct_files(folder) {
        if !is_cover_candidate(&path) {
            continue;
        }
        let size = match fs::metadata(&path) {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!("Failed to stat {:?}: {}", path, err);
                continue;
            }
        };
        match &best {
            Some((best_size, _)) if *best_size >= size => {}
            _ => best = Some((size, path)),
        }
    }
    best.map(|(_, path)| path)
}

pub fn select_and_embed_art(source: &Path, dest: &Path) -> ArtReport {
    let mut report = ArtReport::default();

    let cover = match select_cover(source) {
        Some(cover) => cover,
        None => {
            debug!("No album art in {:?}", source);
            return report;
        }
    };

    let target = dest.join(CANONICAL_COVER_NAME);
    if let Err(err) = fs::create_dir_all(dest).and_then(|_| copy_preserving(&cover, &target)) {
        warn!("Failed to copy album art from {:?}: {}", cover, err);
        report.failures.push(FileFailure::new(&cover, err));
        return report;
    }
    info!("Copied album art: {:?} -> {:?}", cover, target);
    report.cover = Some(path_to_slash_string(&cover));

    let image = match fs::read(&target) {
        Ok(image) => image,
        Err(err) => {
            warn!("Failed to read album art {:?}: {}", target, err);
            report.failures.push(FileFailure::new(&target, err));
            return report;
        }
    };

    for path in direct_files(dest) {
        if Container::from_path(&path).is_none() {
            continue;
        }
        match embed_if_missing(&path, &image) {
            Ok(true) => {
                info!("Embedded album art into {:?}", path);
                report.embedded.push(path_to_slash_string(&path));
            }
            Ok(false) => {
                debug!("Album art already present in {:?}", path);
                report.already_present.push(path_to_slash_string(&path));
            }
            Err(err) => {
                warn!("Failed to embed album art into {:?}: {}", path, err);
                report.failures.push(FileFailure::new(&path, err));
            }
        }
    }

    report
}

fn embed_if_missing(path: &Path, image: &[u8]) -> Result<bool, MetadataError> {
    let mut file = TagFile::open(path)?;
    if file.has_front_cover() {
        return Ok(false);
    }
    file.set_front_cover(image.to_vec())?;
    file.save()?;
    Ok(true)
}
