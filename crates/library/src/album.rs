use std::fs;
use std::path::Path;

use common::{
    classify_path, converted_name, is_cover_candidate, path_to_slash_string, FileFailure,
    FormatClass,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artwork::{select_and_embed_art, ArtReport};
use crate::transcode::Transcoder;
use crate::{copy_preserving, direct_files};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AlbumReport {
    pub source: String,
    pub dest: String,
    pub copied: Vec<String>,
    pub converted: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<FileFailure>,
    pub art: ArtReport,
}

/// Mirrors the files directly inside `source` into `dest`: native formats
/// are copied, convertible ones transcoded to FLAC, the rest skipped. Cover
/// art is handled afterwards. Per-file problems end up in the report.
pub fn sync_album(source: &Path, dest: &Path, transcoder: &dyn Transcoder) -> AlbumReport {
    let mut report = AlbumReport {
        source: path_to_slash_string(source),
        dest: path_to_slash_string(dest),
        ..AlbumReport::default()
    };

    if let Err(err) = fs::create_dir_all(dest) {
        warn!("Failed to create album folder {:?}: {}", dest, err);
        report.failures.push(FileFailure::new(dest, err));
        return report;
    }

    for file in direct_files(source) {
        if is_cover_candidate(&file) {
            continue;
        }
        let name = match file.file_name() {
            Some(name) => name.to_os_string(),
            None => continue,
        };

        match classify_path(&file) {
            FormatClass::Native => {
                let target = dest.join(&name);
                match copy_preserving(&file, &target) {
                    Ok(()) => {
                        info!("Copied: {:?} -> {:?}", file, target);
                        report.copied.push(path_to_slash_string(&target));
                    }
                    Err(err) => {
                        warn!("Failed to copy {:?}: {}", file, err);
                        report.failures.push(FileFailure::new(&file, err));
                    }
                }
            }
            FormatClass::Convertible => {
                let target = match converted_name(&file, dest) {
                    Some(target) => target,
                    None => continue,
                };
                match transcoder.transcode(&file, &target) {
                    Ok(()) => {
                        info!("Converted: {:?} -> {:?}", file, target);
                        report.converted.push(path_to_slash_string(&target));
                    }
                    Err(err) => {
                        warn!("Error converting {:?}: {}", file, err);
                        report.failures.push(FileFailure::new(&file, err));
                    }
                }
            }
            FormatClass::Unsupported => {
                info!("Skipping unsupported file {:?}", file);
                report.skipped.push(path_to_slash_string(&file));
            }
        }
    }

    report.art = select_and_embed_art(source, dest);
    report
}
