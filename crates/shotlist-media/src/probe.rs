//! FFprobe video information.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::command::{check_ffprobe, run_tool};
use crate::error::{MediaError, MediaResult};

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Source of duration metadata.
///
/// Implementations never fail: any probing problem is reported as `None`.
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Duration of the media at `path` in seconds, if it can be determined.
    async fn probe(&self, path: &Path) -> Option<f64>;
}

/// [`MediaProber`] backed by the `ffprobe` binary.
#[derive(Debug, Clone, Default)]
pub struct FfprobeProber {
    timeout_secs: Option<u64>,
}

impl FfprobeProber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Option<f64> {
        match probe_video_with_timeout(path, self.timeout_secs).await {
            Ok(info) if info.duration.is_finite() && info.duration > 0.0 => {
                debug!(path = %path.display(), duration = info.duration, "Probed video duration");
                Some(info.duration)
            }
            Ok(info) => {
                warn!(
                    path = %path.display(),
                    duration = info.duration,
                    "FFprobe reported no usable duration"
                );
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "FFprobe failed, duration unknown");
                None
            }
        }
    }
}

/// Probe a video file for information.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    probe_video_with_timeout(path.as_ref(), None).await
}

async fn probe_video_with_timeout(path: &Path, timeout_secs: Option<u64>) -> MediaResult<VideoInfo> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let args: Vec<String> = [
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]
    .iter()
    .map(|s| s.to_string())
    .chain(std::iter::once(path.to_string_lossy().to_string()))
    .collect();

    let output = run_tool("ffprobe", &args, timeout_secs).await?;

    if !output.success {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(output.stderr_tail()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Parse FFprobe's JSON output into [`VideoInfo`].
fn parse_probe_output(stdout: &[u8]) -> MediaResult<VideoInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    // Find video stream
    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    // Container duration first, stream duration as a fallback
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            video_stream
                .duration
                .as_deref()
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    let fps = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn test_parse_probe_output_format_duration() {
        let json = br#"{
            "format": {"duration": "60.040000"},
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "avg_frame_rate": "24000/1001"}
            ]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 60.04).abs() < 1e-9);
        assert_eq!(info.width, 1920);
        assert_eq!(info.codec, "h264");
        assert!((info.fps - 23.976).abs() < 0.01);
    }

    #[test]
    fn test_parse_probe_output_stream_duration_fallback() {
        let json = br#"{
            "format": {},
            "streams": [{"codec_type": "video", "duration": "12.5"}]
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert_eq!(info.duration, 12.5);
    }

    #[test]
    fn test_parse_probe_output_without_video_stream() {
        let json = br#"{"format": {"duration": "3.0"}, "streams": [{"codec_type": "audio"}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::InvalidVideo(_))
        ));
    }

    #[tokio::test]
    async fn test_prober_absorbs_missing_file() {
        let prober = FfprobeProber::new();
        let duration = prober.probe(Path::new("/nonexistent/clip.mp4")).await;
        assert!(duration.is_none());
    }
}
