//! Fingerprinted transcript cache.
//!
//! One JSON file per fingerprint, shaped `{"segments": [{"start", "end", "text"}, ..]}`.
//! Entries are never invalidated: a changed input produces a new fingerprint and
//! the old file is simply orphaned.

use super::TranscriptSegment;
use crate::error::{GlimtError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};

/// Deterministic identity of a transcription request.
///
/// Hashes the video path, file size, modification time, model, language and
/// chunk length. The audio content itself is not hashed, so a file replaced in
/// place with identical size and mtime keeps its old transcript.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint a transcription of `video_path`.
    ///
    /// When the file cannot be stat'ed the size and mtime are left out.
    pub fn compute(
        video_path: &Path,
        model: &str,
        language: Option<&str>,
        chunk_seconds: u32,
    ) -> Self {
        let path = video_path.to_string_lossy();
        let language = language.unwrap_or("auto");

        let key = match file_identity(video_path) {
            Some((size, mtime_ns)) => {
                format!("{path}|{size}|{mtime_ns}|{model}|{language}|{chunk_seconds}")
            }
            None => format!("{path}|{model}|{language}|{chunk_seconds}"),
        };

        Self(format!("{:x}", Sha256::digest(key.as_bytes())))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn file_identity(path: &Path) -> Option<(u64, u128)> {
    let meta = std::fs::metadata(path).ok()?;
    let mtime = meta.modified().ok()?.duration_since(UNIX_EPOCH).ok()?;
    Some((meta.len(), mtime.as_nanos()))
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    #[serde(default)]
    segments: Vec<TranscriptSegment>,
}

/// Directory-backed transcript cache.
#[derive(Debug, Clone)]
pub struct TranscriptCache {
    dir: PathBuf,
}

impl TranscriptCache {
    /// Open a cache rooted at `dir`. The directory is created lazily on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the entry for `fingerprint`.
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint.as_str()))
    }

    /// Look up cached segments. A missing, unreadable or corrupt entry is a miss.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<TranscriptSegment>> {
        match self.read(fingerprint) {
            Ok(Some(segments)) => {
                info!("Transcript cache hit ({} segments)", segments.len());
                Some(segments)
            }
            Ok(None) => {
                debug!("Transcript cache miss for {}", fingerprint);
                None
            }
            Err(e) => {
                warn!("Ignoring unusable cache entry: {}", e);
                None
            }
        }
    }

    /// Store segments for `fingerprint`.
    ///
    /// Returns whether the entry was written. Failures are logged here and never
    /// reach the caller: the cache only saves work.
    pub fn put(&self, fingerprint: &Fingerprint, segments: &[TranscriptSegment]) -> bool {
        match self.write(fingerprint, segments) {
            Ok(()) => {
                debug!("Cached {} segments under {}", segments.len(), fingerprint);
                true
            }
            Err(e) => {
                warn!("Failed to write transcript cache: {}", e);
                false
            }
        }
    }

    fn read(&self, fingerprint: &Fingerprint) -> Result<Option<Vec<TranscriptSegment>>> {
        let path = self.entry_path(fingerprint);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| cache_error(&path, e))?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|e| cache_error(&path, e))?;
        Ok(Some(file.segments))
    }

    fn write(&self, fingerprint: &Fingerprint, segments: &[TranscriptSegment]) -> Result<()> {
        let path = self.entry_path(fingerprint);
        std::fs::create_dir_all(&self.dir).map_err(|e| cache_error(&self.dir, e))?;

        let payload = serde_json::to_vec(&CacheFile {
            segments: segments.to_vec(),
        })
        .map_err(|e| cache_error(&path, e))?;

        // Write then rename so readers never see a half-written entry.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, payload).map_err(|e| cache_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| cache_error(&path, e))?;
        Ok(())
    }
}

fn cache_error(path: &Path, err: impl std::fmt::Display) -> GlimtError {
    GlimtError::CacheIo {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
