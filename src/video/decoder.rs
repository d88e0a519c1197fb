//! ffmpeg-backed video decoding.

use super::{FrameReader, VideoDecoder, VideoInfo};
use crate::error::{GlimtError, Result};
use crate::ffmpeg;
use async_trait::async_trait;
use image::RgbImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, instrument};

/// Decodes video with `ffprobe` and a raw RGB pipe from `ffmpeg`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegDecoder;

impl FfmpegDecoder {
    pub fn new() -> Self {
        Self
    }
}

/// Output path of the fallback transcode for `path`: `<stem>_h264.mp4` alongside it.
pub fn transcoded_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    path.with_file_name(format!("{stem}_h264.mp4"))
}

fn parse_video_info(doc: &serde_json::Value) -> Option<VideoInfo> {
    let stream = doc["streams"].as_array()?.first()?;

    let width = stream["width"].as_u64()? as u32;
    let height = stream["height"].as_u64()? as u32;
    let fps = stream["avg_frame_rate"]
        .as_str()
        .and_then(ffmpeg::parse_rational)
        .filter(|f| *f > 0.0)
        .or_else(|| stream["r_frame_rate"].as_str().and_then(ffmpeg::parse_rational))?;
    let duration_seconds = doc["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok());

    Some(VideoInfo {
        fps,
        width,
        height,
        duration_seconds,
    })
}

#[async_trait]
impl VideoDecoder for FfmpegDecoder {
    #[instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let doc = ffmpeg::probe_json(
            path,
            &["-select_streams", "v:0", "-show_streams", "-show_format"],
        )
        .await?;

        let info = parse_video_info(&doc)
            .ok_or_else(|| GlimtError::InvalidInput("no decodable video stream".into()))?;
        debug!(
            "Probed {}x{} @ {:.3} fps",
            info.width, info.height, info.fps
        );
        Ok(info)
    }

    async fn open(&self, path: &Path, info: &VideoInfo, step: u64) -> Result<Box<dyn FrameReader>> {
        let filter = format!("select=not(mod(n\\,{}))", step.max(1));

        let mut child = Command::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-noautorotate", "-i"])
            .arg(path)
            .args(["-vf", &filter, "-vsync", "0"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => GlimtError::ToolNotFound("ffmpeg".into()),
                _ => GlimtError::ToolFailed(format!("ffmpeg error: {e}")),
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GlimtError::ToolFailed("ffmpeg stdout unavailable".into()))?;

        Ok(Box::new(RawFrameReader {
            _child: child,
            stdout,
            width: info.width,
            height: info.height,
        }))
    }

    #[instrument(skip(self), fields(path = %path.display()))]
    async fn transcode(&self, path: &Path) -> Result<PathBuf> {
        let output = transcoded_path_for(path);
        info!("Transcoding to {}", output.display());

        let args: Vec<OsString> = vec![
            "-i".into(),
            path.into(),
            "-c:v".into(),
            "libx264".into(),
            "-c:a".into(),
            "copy".into(),
            output.as_os_str().into(),
        ];
        ffmpeg::run(args).await?;
        Ok(output)
    }
}

/// Reads fixed-size rgb24 frames from a running ffmpeg.
struct RawFrameReader {
    _child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
}

#[async_trait]
impl FrameReader for RawFrameReader {
    async fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let frame_len = self.width as usize * self.height as usize * 3;
        let mut buf = vec![0u8; frame_len];

        match self.stdout.read_exact(&mut buf).await {
            Ok(_) => {}
            // A truncated trailing frame ends the stream.
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        RgbImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| GlimtError::ToolFailed("frame buffer size mismatch".into()))
    }
}
