use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

mod album;
mod artwork;
mod names;
mod retag;
mod transcode;
mod walker;

#[cfg(test)]
mod test_support;

pub use album::{sync_album, AlbumReport};
pub use artwork::{select_and_embed_art, select_cover, ArtReport};
pub use names::{NameRules, RulesError};
pub use retag::{normalise_file, normalise_tree, NameChange, NormaliseMode, NormaliseReport};
pub use transcode::{FfmpegTranscoder, TranscodeError, Transcoder, DEFAULT_TIMEOUT};
pub use walker::{
    has_loose_tracks, sync_artist, ArtistReport, LibrarySync, NamePass, RunSummary, RunTotals,
    SyncContext,
};

/// Regular files directly inside `dir`, sorted by file name.
fn direct_files(dir: &Path) -> Vec<PathBuf> {
    direct_entries(dir, |entry| entry.file_type().is_file())
}

/// Subdirectories directly inside `dir`, sorted by file name.
fn direct_dirs(dir: &Path) -> Vec<PathBuf> {
    direct_entries(dir, |entry| entry.file_type().is_dir())
}

fn direct_entries(dir: &Path, keep: impl Fn(&walkdir::DirEntry) -> bool) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| keep(entry))
        .map(|entry| entry.into_path())
        .collect()
}

/// Byte copy that carries the source's access and modification times over.
fn copy_preserving(source: &Path, dest: &Path) -> std::io::Result<()> {
    fs::copy(source, dest)?;
    let meta = fs::metadata(source)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }
    let file = File::options().write(true).open(dest)?;
    file.set_times(times)?;
    Ok(())
}
