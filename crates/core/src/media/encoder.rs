//! External encoder runner shared by the video and audio converters.
//!
//! Every run writes the input to a fresh temp file, lets the encoder write a
//! second temp file, and reads it back. Both files are owned by
//! [`tempfile::NamedTempFile`] guards, so they are removed on every exit
//! path, including timeouts. The child process is spawned with
//! `kill_on_drop`, so dropping the timed-out future kills it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::error::ConversionError;

/// Default encoder program.
pub const DEFAULT_ENCODER: &str = "ffmpeg";

/// Only the tail of encoder stderr is kept in errors.
const STDERR_TAIL: usize = 4096;

/// Handle to an external audio/video encoder binary.
#[derive(Debug, Clone)]
pub struct Encoder {
    program: String,
    temp_dir: Option<PathBuf>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODER)
    }
}

impl Encoder {
    /// Use `program`, either a bare name looked up on `PATH` or a path.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            temp_dir: None,
        }
    }

    /// Place temp files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Configured program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Resolve the program to an executable path.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::EncoderNotFound`] when nothing matches.
    pub fn locate(&self) -> Result<PathBuf, ConversionError> {
        find_program(&self.program)
            .ok_or_else(|| ConversionError::encoder_not_found(&self.program))
    }

    /// Run the encoder over `input`, bytes in and bytes out.
    ///
    /// `build_args` receives the input and output temp paths. `input_ext` and
    /// `output_ext` (with leading dot) become the temp file suffixes, which
    /// the encoder uses to pick containers.
    ///
    /// # Errors
    ///
    /// Fails if the encoder is missing, exits non-zero (stderr attached),
    /// runs past `timeout`, or temp file I/O fails.
    pub async fn transcode<F>(
        &self,
        input: &[u8],
        input_ext: &str,
        output_ext: &str,
        timeout: Duration,
        build_args: F,
    ) -> Result<Vec<u8>, ConversionError>
    where
        F: FnOnce(&Path, &Path) -> Vec<OsString>,
    {
        let program = self.locate()?;

        let input_file = self.temp_file("stowage-in-", input_ext)?;
        let output_file = self.temp_file("stowage-out-", output_ext)?;
        tokio::fs::write(input_file.path(), input).await?;

        let mut cmd = Command::new(&program);
        cmd.args(build_args(input_file.path(), output_file.path()))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(
            program = %program.display(),
            timeout_secs = timeout.as_secs(),
            "running encoder"
        );

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| ConversionError::Timeout {
                secs: timeout.as_secs(),
            })??;

        if !output.status.success() {
            return Err(ConversionError::EncoderFailed {
                status: output.status,
                stderr: stderr_tail(&output.stderr),
            });
        }

        Ok(tokio::fs::read(output_file.path()).await?)
    }

    fn temp_file(
        &self,
        prefix: &str,
        suffix: &str,
    ) -> Result<tempfile::NamedTempFile, ConversionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix).suffix(suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() <= STDERR_TAIL {
        return text.to_string();
    }
    let mut start = text.len() - STDERR_TAIL;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

/// Look `program` up on `PATH`, or check it directly when it is a path.
fn find_program(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        let with_suffix = dir.join(format!("{program}{}", std::env::consts::EXE_SUFFIX));
        with_suffix.is_file().then_some(with_suffix)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn remaining_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_locate_missing_program() {
        let err = Encoder::new("stowage-no-such-encoder").locate().unwrap_err();
        assert!(matches!(err, ConversionError::EncoderNotFound { .. }));
        assert!(err.to_string().contains("encoder not found"));
    }

    #[test]
    fn test_locate_empty_program() {
        assert!(Encoder::new("").locate().is_err());
    }

    #[test]
    fn test_stderr_tail_keeps_end() {
        let long = "x".repeat(STDERR_TAIL) + "END";
        let tail = stderr_tail(long.as_bytes());
        assert_eq!(tail.len(), STDERR_TAIL);
        assert!(tail.ends_with("END"));
    }

    #[tokio::test]
    async fn test_missing_encoder_creates_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let encoder = Encoder::new("stowage-no-such-encoder").with_temp_dir(dir.path());
        let err = encoder
            .transcode(b"data", ".mp4", ".webm", Duration::from_secs(1), |_, _| Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::EncoderNotFound { .. }));
        assert_eq!(remaining_files(&dir), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcode_success_cleans_up() {
        let dir = TempDir::new().unwrap();
        let encoder = Encoder::new("cp").with_temp_dir(dir.path());
        let output = encoder
            .transcode(b"payload", ".in", ".out", Duration::from_secs(10), |input, output| {
                vec![input.into(), output.into()]
            })
            .await
            .expect("cp should succeed");
        assert_eq!(output, b"payload");
        assert_eq!(remaining_files(&dir), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcode_failure_captures_stderr() {
        let dir = TempDir::new().unwrap();
        let encoder = Encoder::new("sh").with_temp_dir(dir.path());
        let err = encoder
            .transcode(b"payload", ".in", ".out", Duration::from_secs(10), |_, _| {
                vec!["-c".into(), "echo broken input >&2; exit 3".into()]
            })
            .await
            .unwrap_err();
        match err {
            ConversionError::EncoderFailed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "broken input");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(remaining_files(&dir), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transcode_timeout_cleans_up() {
        let dir = TempDir::new().unwrap();
        let encoder = Encoder::new("sleep").with_temp_dir(dir.path());
        let err = encoder
            .transcode(b"payload", ".in", ".out", Duration::from_millis(200), |_, _| {
                vec!["5".into()]
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Timeout { .. }));
        assert_eq!(remaining_files(&dir), 0);
    }
}
