use std::path::{Path, PathBuf};

use lofty::config::WriteOptions;
use lofty::error::LoftyError;
use lofty::file::{TaggedFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::tag::{ItemKey, Tag, TagExt, TagType};

/// Tag containers that can carry embedded cover art and artist fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    /// FLAC: Vorbis comments plus PICTURE blocks.
    Flac,
    /// MP3 with an ID3v2 tag.
    Id3,
    /// MPEG-4 (`ilst` atoms, `covr` for artwork).
    Mp4,
}

impl Container {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_ascii_lowercase();
        match ext.as_str() {
            "flac" => Some(Container::Flac),
            "mp3" => Some(Container::Id3),
            "m4a" | "alac" => Some(Container::Mp4),
            _ => None,
        }
    }

    pub fn tag_type(self) -> TagType {
        match self {
            Container::Flac => TagType::VorbisComments,
            Container::Id3 => TagType::Id3v2,
            Container::Mp4 => TagType::Mp4Ilst,
        }
    }

    /// The picture that counts as this container's front cover. FLAC only
    /// accepts a front-cover picture block; ID3 APIC frames and MPEG-4 `covr`
    /// atoms are not reliably typed, so any picture counts there.
    pub fn front_cover(self, tag: &Tag) -> Option<&Picture> {
        let pictures = tag.pictures();
        let front = pictures
            .iter()
            .find(|picture| picture.pic_type() == PictureType::CoverFront);
        match self {
            Container::Flac => front,
            Container::Id3 | Container::Mp4 => front.or_else(|| pictures.first()),
        }
    }

    pub fn has_front_cover(self, tag: &Tag) -> bool {
        self.front_cover(tag).is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextField {
    Artist,
    AlbumArtist,
}

impl TextField {
    pub const ALL: [TextField; 2] = [TextField::Artist, TextField::AlbumArtist];

    pub fn item_key(self) -> ItemKey {
        match self {
            TextField::Artist => ItemKey::TrackArtist,
            TextField::AlbumArtist => ItemKey::AlbumArtist,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TextField::Artist => "artist",
            TextField::AlbumArtist => "albumartist",
        }
    }
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
    Unsupported(PathBuf),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
            MetadataError::Unsupported(path) => {
                write!(f, "unsupported tag container: {:?}", path)
            }
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// A parsed audio file whose container-specific tag can be probed and
/// rewritten. Nothing touches disk until [`TagFile::save`].
pub struct TagFile {
    path: PathBuf,
    container: Container,
    file: TaggedFile,
}

impl TagFile {
    pub fn open(path: &Path) -> Result<Self, MetadataError> {
        let container =
            Container::from_path(path).ok_or_else(|| MetadataError::Unsupported(path.into()))?;
        let file = lofty::read_from_path(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            container,
            file,
        })
    }

    pub fn front_cover(&self) -> Option<&Picture> {
        self.file
            .tag(self.container.tag_type())
            .and_then(|tag| self.container.front_cover(tag))
    }

    pub fn has_front_cover(&self) -> bool {
        self.front_cover().is_some()
    }

    /// Replaces every embedded picture with `data` as the single front cover.
    pub fn set_front_cover(&mut self, data: Vec<u8>) -> Result<(), MetadataError> {
        let picture = Picture::new_unchecked(PictureType::CoverFront, sniff_mime(&data), None, data);
        let tag = self.tag_mut()?;
        let existing: Vec<PictureType> = tag
            .pictures()
            .iter()
            .map(|picture| picture.pic_type())
            .collect();
        for pic_type in existing {
            tag.remove_picture_type(pic_type);
        }
        tag.push_picture(picture);
        Ok(())
    }

    pub fn text(&self, field: TextField) -> Option<String> {
        let key = field.item_key();
        self.file
            .tag(self.container.tag_type())
            .or_else(|| self.file.primary_tag())
            .or_else(|| self.file.first_tag())
            .and_then(|tag| tag.get_string(&key))
            .map(|value| value.to_string())
    }

    pub fn set_text(&mut self, field: TextField, value: String) -> Result<(), MetadataError> {
        let path = self.path.clone();
        let tag = self.tag_mut()?;
        if tag.insert_text(field.item_key(), value) {
            Ok(())
        } else {
            Err(MetadataError::Unsupported(path))
        }
    }

    pub fn save(&self) -> Result<(), MetadataError> {
        if let Some(tag) = self.file.tag(self.container.tag_type()) {
            tag.save_to_path(&self.path, WriteOptions::default())?;
        }
        Ok(())
    }

    fn tag_mut(&mut self) -> Result<&mut Tag, MetadataError> {
        let tag_type = self.container.tag_type();
        if self.file.tag(tag_type).is_none() {
            self.file.insert_tag(Tag::new(tag_type));
        }
        match self.file.tag_mut(tag_type) {
            Some(tag) => Ok(tag),
            None => Err(MetadataError::Unsupported(self.path.clone())),
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> Option<MimeType> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(MimeType::Jpeg)
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some(MimeType::Png)
    } else {
        None
    }
}
