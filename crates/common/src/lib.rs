use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Extensions the target player handles without conversion.
pub const NATIVE_EXTENSIONS: &[&str] = &["mp3", "aac", "alac", "m4a", "flac", "wav"];

/// Legacy or lossy containers that are transcoded to [`LOSSLESS_EXTENSION`].
pub const CONVERTIBLE_EXTENSIONS: &[&str] = &[
    "wma", "wmv", "asf", "ogg", "oga", "opus", "ape", "wv", "mpc", "aif", "aiff",
];

pub const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

pub const LOSSLESS_EXTENSION: &str = "flac";
pub const CANONICAL_COVER_NAME: &str = "folder.jpg";
pub const LOOSE_ALBUM_NAME: &str = "Loose";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatClass {
    Native,
    Convertible,
    Unsupported,
}

impl FormatClass {
    pub fn is_audio(self) -> bool {
        !matches!(self, FormatClass::Unsupported)
    }
}

pub fn classify(extension: &str) -> FormatClass {
    let ext = normalize_extension(extension);
    if NATIVE_EXTENSIONS.contains(&ext.as_str()) {
        FormatClass::Native
    } else if CONVERTIBLE_EXTENSIONS.contains(&ext.as_str()) {
        FormatClass::Convertible
    } else {
        FormatClass::Unsupported
    }
}

pub fn classify_path(path: &Path) -> FormatClass {
    match path.extension() {
        Some(ext) => classify(&ext.to_string_lossy()),
        None => FormatClass::Unsupported,
    }
}

pub fn is_cover_candidate(path: &Path) -> bool {
    match path.extension() {
        Some(ext) => {
            let ext = normalize_extension(&ext.to_string_lossy());
            COVER_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// A file that could not be processed, with a human-readable reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub path: String,
    pub reason: String,
}

impl FileFailure {
    pub fn new(path: &Path, reason: impl ToString) -> Self {
        Self {
            path: path_to_slash_string(path),
            reason: reason.to_string(),
        }
    }
}

/// Forward-slash form of `path`; absolute paths keep a single leading `/`.
pub fn path_to_slash_string(path: &Path) -> String {
    let mut absolute = false;
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::RootDir => {
                absolute = true;
                None
            }
            other => Some(other.as_os_str().to_string_lossy().to_string()),
        })
        .collect();
    if absolute {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    }
}

/// `dest_dir/<stem>.flac` for a file that has to be transcoded. Only the
/// final extension is replaced; dots inside the stem survive.
pub fn converted_name(source: &Path, dest_dir: &Path) -> Option<PathBuf> {
    let mut name = source.file_stem()?.to_os_string();
    name.push(".");
    name.push(LOSSLESS_EXTENSION);
    Some(dest_dir.join(name))
}
