use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::transcode::{TranscodeError, Transcoder};

pub const JPEG_MAGIC: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];

// MPEG-1 Layer III, 128 kbps, 44.1 kHz, joint stereo.
const FRAME_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x64];
const FRAME_LEN: usize = 417;
const FRAME_COUNT: usize = 24;

const FLAC_BLOCK_STREAMINFO: u8 = 0;
const FLAC_BLOCK_PADDING: u8 = 1;
const FLAC_BLOCK_PICTURE: u8 = 6;
pub const FLAC_COVER_BACK: u32 = 4;

pub fn write_file(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, bytes).unwrap();
}

/// JPEG-looking bytes padded to `len`.
pub fn jpeg(len: usize, fill: u8) -> Vec<u8> {
    let mut out = JPEG_MAGIC.to_vec();
    out.resize(len.max(JPEG_MAGIC.len()), fill);
    out
}

/// Untagged, silent MP3 made of identical CBR frames.
pub fn write_silent_mp3(path: &Path) {
    let mut out = Vec::with_capacity(FRAME_LEN * FRAME_COUNT);
    for _ in 0..FRAME_COUNT {
        out.extend_from_slice(&FRAME_HEADER);
        out.resize(out.len() + FRAME_LEN - FRAME_HEADER.len(), 0);
    }
    write_file(path, &out);
}

/// Untagged FLAC stream: STREAMINFO (44.1 kHz, 16-bit stereo, 4096 samples),
/// one PICTURE block per `(picture type, jpeg)` entry and trailing padding,
/// as encoders lay it out, then a stub frame. Audio bytes past the metadata
/// are never decoded.
pub fn write_silent_flac(path: &Path, pictures: &[(u32, &[u8])]) {
    let mut out = b"fLaC".to_vec();

    let mut info = Vec::with_capacity(34);
    info.extend_from_slice(&4096u16.to_be_bytes());
    info.extend_from_slice(&4096u16.to_be_bytes());
    info.extend_from_slice(&[0; 6]);
    let packed: u32 = (44_100 << 12) | (1 << 9) | (15 << 4);
    info.extend_from_slice(&packed.to_be_bytes());
    info.extend_from_slice(&4096u32.to_be_bytes());
    info.extend_from_slice(&[0; 16]);
    push_flac_block(&mut out, FLAC_BLOCK_STREAMINFO, false, &info);

    for (pic_type, data) in pictures {
        let mime = b"image/jpeg";
        let mut block = Vec::new();
        block.extend_from_slice(&pic_type.to_be_bytes());
        block.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        block.extend_from_slice(mime);
        // description, width, height, depth, colours
        for _ in 0..5 {
            block.extend_from_slice(&0u32.to_be_bytes());
        }
        block.extend_from_slice(&(data.len() as u32).to_be_bytes());
        block.extend_from_slice(data);
        push_flac_block(&mut out, FLAC_BLOCK_PICTURE, false, &block);
    }
    push_flac_block(&mut out, FLAC_BLOCK_PADDING, true, &[0; 64]);

    out.extend_from_slice(&[0xFF, 0xF8, 0x69, 0x08, 0x00, 0x0F, 0xFF]);
    out.resize(out.len() + 64, 0);
    write_file(path, &out);
}

fn push_flac_block(out: &mut Vec<u8>, block_type: u8, last: bool, body: &[u8]) {
    let flag = if last { 0x80 } else { 0 };
    out.push(flag | block_type);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes()[1..]);
    out.extend_from_slice(body);
}

/// Writes `fLaC` plus the source bytes; fails for sources with "broken" in
/// their name.
#[derive(Default)]
pub struct FakeTranscoder {
    pub calls: RefCell<Vec<PathBuf>>,
}

impl Transcoder for FakeTranscoder {
    fn transcode(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        self.calls.borrow_mut().push(source.to_path_buf());
        let name = source.to_string_lossy();
        if name.contains("broken") {
            return Err(TranscodeError::MissingOutput(dest.to_path_buf()));
        }
        let mut out = b"fLaC".to_vec();
        out.extend(fs::read(source)?);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, out)?;
        Ok(())
    }
}
