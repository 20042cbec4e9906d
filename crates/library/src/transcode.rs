use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Converts one input file into a lossless file at `dest`.
pub trait Transcoder {
    fn transcode(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError>;
}

#[derive(Debug)]
pub enum TranscodeError {
    Io(std::io::Error),
    Spawn { program: String, err: std::io::Error },
    Failed(ExitStatus),
    Timeout(Duration),
    MissingOutput(PathBuf),
}

impl std::fmt::Display for TranscodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscodeError::Io(err) => write!(f, "io error: {}", err),
            TranscodeError::Spawn { program, err } => {
                write!(f, "failed to start {}: {}", program, err)
            }
            TranscodeError::Failed(status) => write!(f, "transcoder exited with {}", status),
            TranscodeError::Timeout(limit) => {
                write!(f, "transcoder killed after {}s", limit.as_secs())
            }
            TranscodeError::MissingOutput(path) => {
                write!(f, "transcoder produced no output at {:?}", path)
            }
        }
    }
}

impl std::error::Error for TranscodeError {}

impl From<std::io::Error> for TranscodeError {
    fn from(err: std::io::Error) -> Self {
        TranscodeError::Io(err)
    }
}

/// Runs `<program> -y -i <source> -c:a flac <dest>` and waits for it.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    program: String,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, source: &Path, dest: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("-y")
            .arg("-i")
            .arg(source)
            .args(["-c:a", "flac"])
            .arg(dest)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", DEFAULT_TIMEOUT)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(&self, source: &Path, dest: &Path) -> Result<(), TranscodeError> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut child = self
            .command(source, dest)
            .spawn()
            .map_err(|err| TranscodeError::Spawn {
                program: self.program.clone(),
                err,
            })?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                let _ = fs::remove_file(dest);
                return Err(TranscodeError::Timeout(self.timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        if !status.success() {
            let _ = fs::remove_file(dest);
            return Err(TranscodeError::Failed(status));
        }
        if !dest.is_file() {
            return Err(TranscodeError::MissingOutput(dest.to_path_buf()));
        }
        debug!(
            "Transcoded {:?} -> {:?} in {}ms",
            source,
            dest,
            started.elapsed().as_millis()
        );
        Ok(())
    }
}
