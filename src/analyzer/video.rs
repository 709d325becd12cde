//! Video frame sampling
//!
//! Frames are decoded sequentially from a [`FrameSource`]; every Nth frame is
//! written as `frame_NNNN.png` into a scratch directory owned by a
//! [`FrameScratch`] guard. Dropping the guard removes the frames and the
//! directory, whichever way the caller exits.

use super::error::AnalyzerError;
use image::{ImageFormat, RgbaImage};
use serde::Deserialize;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::ffi::OsString;
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use tracing::{debug, warn};
use uuid::Uuid;

/// File extensions treated as video input
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

/// Default sampling stride
pub const DEFAULT_FRAME_INTERVAL: usize = 30;

pub fn is_video(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sequential source of decoded frames
pub trait FrameSource: Send {
    /// Next frame, or `None` once the stream is exhausted
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, AnalyzerError>;
}

/// Decodes a video by streaming raw RGBA frames out of `ffmpeg`
pub struct FfmpegFrameSource {
    path: PathBuf,
    width: u32,
    height: u32,
    child: Child,
    stdout: ChildStdout,
    decoded: usize,
    finished: bool,
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

impl FfmpegFrameSource {
    /// Probes the video dimensions and starts the decoder
    pub fn open(path: &Path) -> Result<Self, AnalyzerError> {
        let (width, height) = probe_dimensions(path)?;
        debug!(path = %path.display(), width, height, "Starting frame decoder");

        let mut child = Command::new("ffmpeg")
            .args(decoder_args(path, width, height))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnalyzerError::decode(path, format!("failed to run ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AnalyzerError::decode(path, "ffmpeg stdout unavailable"))?;

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            child,
            stdout,
            decoded: 0,
            finished: false,
        })
    }

    /// Reaps the decoder once its output is exhausted
    fn finish(&mut self) -> Result<(), AnalyzerError> {
        self.finished = true;

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            let _ = pipe.read_to_string(&mut stderr);
        }
        let status = self
            .child
            .wait()
            .map_err(|e| AnalyzerError::decode(&self.path, e.to_string()))?;

        check_exit(&self.path, status, &stderr, self.decoded)
    }

    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl FrameSource for FfmpegFrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbaImage>, AnalyzerError> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_len()];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                self.finish()?;
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                let _ = self.child.kill();
                let _ = self.child.wait();
                return Err(AnalyzerError::decode(&self.path, e.to_string()));
            }
        }

        self.decoded += 1;
        RgbaImage::from_raw(self.width, self.height, buf)
            .map(Some)
            .ok_or_else(|| AnalyzerError::decode(&self.path, "frame buffer size mismatch"))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Decoder invocation producing `width`x`height` RGBA frames on stdout
///
/// Autorotation is disabled and the output size pinned, so every frame has
/// exactly the stride ffprobe reported.
fn decoder_args(path: &Path, width: u32, height: u32) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-noautorotate", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args.extend(
        [
            "-vf".to_string(),
            format!("scale={width}:{height}"),
            "-f".to_string(),
            "rawvideo".to_string(),
            "-pix_fmt".to_string(),
            "rgba".to_string(),
            "pipe:1".to_string(),
        ]
        .into_iter()
        .map(OsString::from),
    );
    args
}

/// Maps the decoder exit status to an error, whatever was decoded before
fn check_exit(
    path: &Path,
    status: ExitStatus,
    stderr: &str,
    decoded: usize,
) -> Result<(), AnalyzerError> {
    if status.success() {
        return Ok(());
    }
    let stderr = stderr.trim();
    let message = if stderr.is_empty() {
        format!("ffmpeg exited with {status} after {decoded} frames")
    } else {
        format!("ffmpeg exited with {status} after {decoded} frames: {stderr}")
    };
    Err(AnalyzerError::decode(path, message))
}

fn probe_dimensions(path: &Path) -> Result<(u32, u32), AnalyzerError> {
    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| AnalyzerError::decode(path, format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(AnalyzerError::decode(
            path,
            format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&out.stdout)
        .map_err(|e| AnalyzerError::decode(path, format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| AnalyzerError::decode(path, "no video stream found"))?;

    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(AnalyzerError::decode(path, "invalid video dimensions")),
    }
}

/// Scratch directory holding extracted frames for one video
#[derive(Debug)]
pub struct FrameScratch {
    dir: PathBuf,
    frames: Vec<PathBuf>,
}

impl FrameScratch {
    /// Creates `<root>/feature-gen-frames-<stem>-<uuid>`
    pub fn create(root: &Path, video: &Path) -> Result<Self, AnalyzerError> {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let dir = root.join(format!("feature-gen-frames-{}-{}", stem, Uuid::new_v4()));

        fs::create_dir_all(&dir).map_err(|e| AnalyzerError::FrameWrite {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        debug!(dir = %dir.display(), "Created frame scratch directory");

        Ok(Self {
            dir,
            frames: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.frames
    }

    /// Writes `frame` as `frame_<index>.png`
    pub fn save(&mut self, index: usize, frame: &RgbaImage) -> Result<&Path, AnalyzerError> {
        let path = self.dir.join(format!("frame_{:04}.png", index));
        frame
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| AnalyzerError::FrameWrite {
                path: path.clone(),
                message: e.to_string(),
            })?;
        self.frames.push(path);
        Ok(&self.frames[self.frames.len() - 1])
    }
}

impl Drop for FrameScratch {
    fn drop(&mut self) {
        for frame in &self.frames {
            if let Err(e) = fs::remove_file(frame) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove frame {}: {}", frame.display(), e);
                }
            }
        }
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", self.dir.display(), e);
            }
        }
    }
}

/// Drains `source`, saving frames at indices 0, I, 2I, ...
///
/// Returns the number of frames decoded.
pub fn extract_frames(
    source: &mut dyn FrameSource,
    interval: usize,
    scratch: &mut FrameScratch,
) -> Result<usize, AnalyzerError> {
    if interval == 0 {
        return Err(AnalyzerError::InvalidFrameInterval { interval });
    }

    let mut decoded = 0;
    while let Some(frame) = source.next_frame()? {
        if decoded % interval == 0 {
            let saved = scratch.frames().len();
            scratch.save(saved, &frame)?;
        }
        decoded += 1;
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Solid {
        remaining: usize,
    }

    impl FrameSource for Solid {
        fn next_frame(&mut self) -> Result<Option<RgbaImage>, AnalyzerError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))))
        }
    }

    struct Broken;

    impl FrameSource for Broken {
        fn next_frame(&mut self) -> Result<Option<RgbaImage>, AnalyzerError> {
            Err(AnalyzerError::decode("broken.mp4", "corrupt stream"))
        }
    }

    #[test]
    fn test_is_video() {
        assert!(is_video(Path::new("demo.MP4")));
        assert!(is_video(Path::new("flow.webm")));
        assert!(!is_video(Path::new("mock.png")));
        assert!(!is_video(Path::new("README")));
    }

    #[test]
    fn test_extract_every_nth_frame() {
        let root = TempDir::new().unwrap();
        let mut scratch = FrameScratch::create(root.path(), Path::new("demo.mp4")).unwrap();

        let decoded = extract_frames(&mut Solid { remaining: 10 }, 4, &mut scratch).unwrap();

        assert_eq!(decoded, 10);
        let names: Vec<_> = scratch
            .frames()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["frame_0000.png", "frame_0001.png", "frame_0002.png"]
        );
        assert!(scratch.frames().iter().all(|p| p.exists()));
    }

    #[test]
    fn test_scratch_dir_name_and_cleanup() {
        let root = TempDir::new().unwrap();
        let dir = {
            let video = Path::new("/videos/onboarding.mov");
            let mut scratch = FrameScratch::create(root.path(), video).unwrap();
            extract_frames(&mut Solid { remaining: 3 }, 1, &mut scratch).unwrap();
            let name = scratch.path().file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("feature-gen-frames-onboarding-"));
            scratch.path().to_path_buf()
        };

        assert!(!dir.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_cleanup_after_decode_error() {
        let root = TempDir::new().unwrap();
        {
            let mut scratch = FrameScratch::create(root.path(), Path::new("broken.mp4")).unwrap();
            assert!(matches!(
                extract_frames(&mut Broken, 2, &mut scratch),
                Err(AnalyzerError::FrameDecode { .. })
            ));
        }
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let root = TempDir::new().unwrap();
        let mut scratch = FrameScratch::create(root.path(), Path::new("demo.mp4")).unwrap();
        assert!(matches!(
            extract_frames(&mut Solid { remaining: 1 }, 0, &mut scratch),
            Err(AnalyzerError::InvalidFrameInterval { interval: 0 })
        ));
    }

    #[test]
    fn test_decoder_args_pin_frame_geometry() {
        let args: Vec<String> = decoder_args(Path::new("clip.mov"), 1920, 1080)
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let input = args.iter().position(|a| a == "-i").unwrap();
        let noautorotate = args.iter().position(|a| a == "-noautorotate").unwrap();
        assert!(noautorotate < input);
        assert_eq!(args[input + 1], "clip.mov");

        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(vf > input);
        assert_eq!(args[vf + 1], "scale=1920:1080");
        assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_exit_is_an_error_after_frames() {
        use std::os::unix::process::ExitStatusExt;

        let ok = ExitStatus::from_raw(0);
        assert!(check_exit(Path::new("clip.mp4"), ok, "", 12).is_ok());

        let failed = ExitStatus::from_raw(256);
        let err = check_exit(
            Path::new("clip.mp4"),
            failed,
            "Invalid NAL unit size\n",
            12,
        )
        .unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AnalyzerError::FrameDecode { .. }));
        assert!(message.contains("after 12 frames"));
        assert!(message.contains("Invalid NAL unit size"));
    }
}
