use std::path::{Path, PathBuf};

use common::{classify_path, LOOSE_ALBUM_NAME};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::album::{sync_album, AlbumReport};
use crate::names::NameRules;
use crate::retag::{normalise_tree, NormaliseMode, NormaliseReport};
use crate::transcode::Transcoder;
use crate::{direct_dirs, direct_files};

/// Everything a run needs, fixed at startup.
#[derive(Clone, Debug)]
pub struct SyncContext {
    pub source_root: PathBuf,
    pub dest_root: PathBuf,
    pub artists: Vec<String>,
    /// Name pass over the destination after syncing; `None` skips it.
    pub names: Option<NamePass>,
}

#[derive(Clone, Debug)]
pub struct NamePass {
    pub rules: NameRules,
    pub mode: NormaliseMode,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArtistReport {
    pub name: String,
    pub albums: Vec<AlbumReport>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub artists: Vec<ArtistReport>,
    pub missing_artists: Vec<String>,
    pub names: Option<NormaliseReport>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub albums: usize,
    pub copied: usize,
    pub converted: usize,
    pub skipped: usize,
    pub art_embedded: usize,
    pub failures: usize,
    pub names_changed: usize,
}

impl RunSummary {
    pub fn totals(&self) -> RunTotals {
        let mut totals = RunTotals::default();
        for album in self.artists.iter().flat_map(|artist| &artist.albums) {
            totals.albums += 1;
            totals.copied += album.copied.len();
            totals.converted += album.converted.len();
            totals.skipped += album.skipped.len();
            totals.art_embedded += album.art.embedded.len();
            totals.failures += album.failures.len() + album.art.failures.len();
        }
        if let Some(names) = &self.names {
            totals.names_changed = names.changes.len();
            totals.failures += names.failures.len();
        }
        totals
    }
}

pub struct LibrarySync<T> {
    context: SyncContext,
    transcoder: T,
}

impl<T: Transcoder> LibrarySync<T> {
    pub fn new(context: SyncContext, transcoder: T) -> Self {
        Self {
            context,
            transcoder,
        }
    }

    /// Syncs every configured artist in order, then runs the name pass over
    /// the whole destination tree. Nothing past this point aborts the run.
    pub fn run(&self) -> RunSummary {
        let context = &self.context;
        let mut summary = RunSummary::default();

        for artist in &context.artists {
            let source = context.source_root.join(artist);
            if !source.is_dir() {
                warn!("Artist folder not found: {:?}", source);
                summary.missing_artists.push(artist.clone());
                continue;
            }
            let dest = context.dest_root.join(artist);
            summary
                .artists
                .push(sync_artist(artist, &source, &dest, &self.transcoder));
        }

        if let Some(pass) = &context.names {
            summary.names = Some(normalise_tree(&context.dest_root, &pass.rules, pass.mode));
        }

        summary
    }
}

/// Loose tracks at the artist's top level become a `Loose` album; every
/// direct subdirectory is one album.
pub fn sync_artist(
    name: &str,
    source: &Path,
    dest: &Path,
    transcoder: &dyn Transcoder,
) -> ArtistReport {
    let mut report = ArtistReport {
        name: name.to_string(),
        albums: Vec::new(),
    };

    if has_loose_tracks(source) {
        info!("Processing: {} (root-level files)", name);
        report
            .albums
            .push(sync_album(source, &dest.join(LOOSE_ALBUM_NAME), transcoder));
    }

    for album in direct_dirs(source) {
        let album_name = match album.file_name() {
            Some(album_name) => album_name.to_os_string(),
            None => continue,
        };
        info!("Processing: {}/{}", name, album_name.to_string_lossy());
        report
            .albums
            .push(sync_album(&album, &dest.join(&album_name), transcoder));
    }

    report
}

pub fn has_loose_tracks(folder: &Path) -> bool {
    direct_files(folder)
        .iter()
        .any(|path| classify_path(path).is_audio())
}
