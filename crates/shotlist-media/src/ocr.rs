//! On-screen text recognition with the Tesseract CLI.
//!
//! An [`OcrEngine`] hands out one [`OcrSession`] per pipeline run. The
//! session is the run's scoped OCR resource: it is opened before the first
//! keyframe and closed after the last one whatever happened in between, so
//! no recognizer state is shared across runs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

use shotlist_models::Keyframe;

use crate::command::{check_tesseract, run_tool};
use crate::error::{MediaError, MediaResult};

/// Lines shorter than this many characters are discarded.
pub const DEFAULT_MIN_LINE_LEN: usize = 3;
/// Maximum lines kept per frame.
pub const DEFAULT_MAX_LINES: usize = 8;
/// Default Tesseract language.
pub const DEFAULT_LANGUAGE: &str = "eng";
/// Default Tesseract page segmentation mode (single uniform block of text).
pub const DEFAULT_PAGE_SEG_MODE: u8 = 6;

/// Factory for per-run OCR sessions.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Acquire a session for one run.
    async fn open_session(&self) -> MediaResult<Box<dyn OcrSession>>;
}

/// A scoped OCR resource owned by a single run.
#[async_trait]
pub trait OcrSession: Send + Sync {
    /// Recognize the raw text in an image.
    async fn recognize_text(&self, image: &Path) -> MediaResult<String>;

    /// Release the session.
    async fn close(&self);
}

/// [`OcrEngine`] backed by the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    language: String,
    page_seg_mode: u8,
    timeout_secs: Option<u64>,
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            page_seg_mode: DEFAULT_PAGE_SEG_MODE,
            timeout_secs: None,
        }
    }
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recognition language (e.g. `eng`, `eng+fra`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the page segmentation mode.
    pub fn with_page_seg_mode(mut self, psm: u8) -> Self {
        self.page_seg_mode = psm;
        self
    }

    /// Set the per-frame timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn open_session(&self) -> MediaResult<Box<dyn OcrSession>> {
        let binary = check_tesseract()?;
        debug!(binary = %binary.display(), language = %self.language, "Opened OCR session");
        Ok(Box::new(TesseractSession {
            binary,
            language: self.language.clone(),
            page_seg_mode: self.page_seg_mode,
            timeout_secs: self.timeout_secs,
            frames: AtomicUsize::new(0),
        }))
    }
}

struct TesseractSession {
    binary: PathBuf,
    language: String,
    page_seg_mode: u8,
    timeout_secs: Option<u64>,
    frames: AtomicUsize,
}

impl TesseractSession {
    fn build_args(&self, image: &Path) -> Vec<String> {
        vec![
            image.to_string_lossy().to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.language.clone(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
        ]
    }
}

#[async_trait]
impl OcrSession for TesseractSession {
    async fn recognize_text(&self, image: &Path) -> MediaResult<String> {
        self.frames.fetch_add(1, Ordering::Relaxed);

        let program = self.binary.to_string_lossy();
        let output = run_tool(&program, &self.build_args(image), self.timeout_secs).await?;
        if !output.success {
            return Err(MediaError::ocr_failed(
                format!("tesseract exited with {:?}", output.exit_code),
                Some(output.stderr_tail()),
            ));
        }
        Ok(output.stdout_text())
    }

    async fn close(&self) {
        debug!(frames = self.frames.load(Ordering::Relaxed), "Closed OCR session");
    }
}

/// Limits applied while recognizing a run's keyframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrLimits {
    /// Minimum characters per kept line
    pub min_line_len: usize,
    /// Maximum lines kept per frame
    pub max_lines: usize,
    /// Maximum frames processed per run
    pub max_frames: usize,
}

impl Default for OcrLimits {
    fn default() -> Self {
        Self {
            min_line_len: DEFAULT_MIN_LINE_LEN,
            max_lines: DEFAULT_MAX_LINES,
            max_frames: shotlist_models::MAX_SHOTS,
        }
    }
}

/// Collapse internal whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split raw OCR output into cleaned lines.
pub fn split_ocr_lines(raw: &str, min_len: usize, max_lines: usize) -> Vec<String> {
    raw.lines()
        .map(normalize_whitespace)
        .filter(|line| line.chars().count() >= min_len)
        .take(max_lines)
        .collect()
}

/// Text recognized across a run's keyframes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizedText {
    /// One line list per keyframe, in input order
    pub lines: Vec<Vec<String>>,
    /// Frames with a still whose recognition errored
    pub failed_frames: usize,
}

impl RecognizedText {
    fn empty(frames: usize, failed_frames: usize) -> Self {
        Self {
            lines: vec![Vec::new(); frames],
            failed_frames,
        }
    }
}

fn is_recognizable(index: usize, keyframe: &Keyframe, limits: OcrLimits) -> bool {
    keyframe.path.is_some() && index < limits.max_frames
}

/// Recognize text for each keyframe, sequentially, using an open session.
///
/// Missing stills, frames past `limits.max_frames` and per-frame failures
/// yield an empty line list; failures are also counted.
pub async fn recognize_keyframes(
    session: &dyn OcrSession,
    keyframes: &[Keyframe],
    limits: OcrLimits,
) -> RecognizedText {
    let mut recognized = RecognizedText {
        lines: Vec::with_capacity(keyframes.len()),
        failed_frames: 0,
    };

    for (i, keyframe) in keyframes.iter().enumerate() {
        let path = match &keyframe.path {
            Some(path) if is_recognizable(i, keyframe, limits) => path,
            _ => {
                recognized.lines.push(Vec::new());
                continue;
            }
        };

        let lines = match session.recognize_text(path).await {
            Ok(raw) => split_ocr_lines(&raw, limits.min_line_len, limits.max_lines),
            Err(e) => {
                warn!(shot = keyframe.shot_index, error = %e, "OCR failed for keyframe");
                recognized.failed_frames += 1;
                Vec::new()
            }
        };
        recognized.lines.push(lines);
    }

    recognized
}

/// Open a session on `engine`, recognize every keyframe and close the
/// session.
///
/// If no session can be opened every shot gets an empty line list and every
/// frame that had a still counts as failed.
pub async fn recognize_with_engine(
    engine: &dyn OcrEngine,
    keyframes: &[Keyframe],
    limits: OcrLimits,
) -> RecognizedText {
    let session = match engine.open_session().await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Could not open OCR session, skipping text recognition");
            let attempted = keyframes
                .iter()
                .enumerate()
                .filter(|(i, k)| is_recognizable(*i, k, limits))
                .count();
            return RecognizedText::empty(keyframes.len(), attempted);
        }
    };

    let recognized = recognize_keyframes(session.as_ref(), keyframes, limits).await;
    session.close().await;

    let with_text = recognized.lines.iter().filter(|lines| !lines.is_empty()).count();
    info!(
        frames = keyframes.len(),
        with_text,
        failed = recognized.failed_frames,
        "Text recognition finished"
    );

    recognized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    struct FakeSession {
        texts: HashMap<PathBuf, MediaResult<String>>,
        closed: Arc<AtomicBool>,
    }

    #[async_trait]
    impl OcrSession for FakeSession {
        async fn recognize_text(&self, image: &Path) -> MediaResult<String> {
            match self.texts.get(image) {
                Some(Ok(text)) => Ok(text.clone()),
                Some(Err(_)) | None => Err(MediaError::ocr_failed("unreadable", None)),
            }
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct FakeEngine {
        texts: Vec<(PathBuf, String)>,
        closed: Arc<AtomicBool>,
        available: bool,
    }

    #[async_trait]
    impl OcrEngine for FakeEngine {
        async fn open_session(&self) -> MediaResult<Box<dyn OcrSession>> {
            if !self.available {
                return Err(MediaError::TesseractNotFound);
            }
            Ok(Box::new(FakeSession {
                texts: self
                    .texts
                    .iter()
                    .map(|(p, t)| (p.clone(), Ok(t.clone())))
                    .collect(),
                closed: self.closed.clone(),
            }))
        }
    }

    fn keyframe(index: usize, path: Option<&str>) -> Keyframe {
        Keyframe {
            shot_index: index,
            image: path.map(|_| b"jpg".to_vec()),
            path: path.map(PathBuf::from),
        }
    }

    #[test]
    fn test_split_ocr_lines() {
        let raw = "  WARNER   BROS.\n\nok\n  PRESENTS  \n\x0c";
        assert_eq!(split_ocr_lines(raw, 3, 8), vec!["WARNER BROS.", "PRESENTS"]);
    }

    #[test]
    fn test_split_ocr_lines_caps_line_count() {
        let raw = (0..20).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let lines = split_ocr_lines(&raw, 3, 8);
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[7], "line 7");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("\tLOS   ANGELES,  CA "), "LOS ANGELES, CA");
    }

    #[test]
    fn test_tesseract_args() {
        let session = TesseractSession {
            binary: PathBuf::from("/usr/bin/tesseract"),
            language: "eng".to_string(),
            page_seg_mode: 6,
            timeout_secs: None,
            frames: AtomicUsize::new(0),
        };
        let args = session.build_args(Path::new("/s/shot_0001.jpg"));
        assert_eq!(args, vec!["/s/shot_0001.jpg", "stdout", "-l", "eng", "--psm", "6"]);
    }

    #[tokio::test]
    async fn test_recognize_keyframes_isolates_failures() {
        let closed = Arc::new(AtomicBool::new(false));
        let session = FakeSession {
            texts: HashMap::from([
                (PathBuf::from("a.jpg"), Ok("A FILM BY\nx".to_string())),
                (PathBuf::from("b.jpg"), Err(MediaError::ocr_failed("bad", None))),
            ]),
            closed,
        };
        let keyframes = vec![
            keyframe(1, Some("a.jpg")),
            keyframe(2, Some("b.jpg")),
            keyframe(3, None),
        ];

        let recognized = recognize_keyframes(&session, &keyframes, OcrLimits::default()).await;

        assert_eq!(
            recognized.lines,
            vec![vec!["A FILM BY".to_string()], vec![], vec![]]
        );
        // The missing still is not a recognition failure
        assert_eq!(recognized.failed_frames, 1);
    }

    #[tokio::test]
    async fn test_recognize_keyframes_respects_frame_cap() {
        let session = FakeSession {
            texts: HashMap::from([
                (PathBuf::from("a.jpg"), Ok("first".to_string())),
                (PathBuf::from("b.jpg"), Ok("second".to_string())),
            ]),
            closed: Arc::new(AtomicBool::new(false)),
        };
        let keyframes = vec![keyframe(1, Some("a.jpg")), keyframe(2, Some("b.jpg"))];
        let limits = OcrLimits {
            max_frames: 1,
            ..OcrLimits::default()
        };

        let recognized = recognize_keyframes(&session, &keyframes, limits).await;

        assert_eq!(recognized.lines, vec![vec!["first".to_string()], vec![]]);
        assert_eq!(recognized.failed_frames, 0);
    }

    #[tokio::test]
    async fn test_recognize_with_engine_closes_session() {
        let closed = Arc::new(AtomicBool::new(false));
        let engine = FakeEngine {
            texts: vec![(PathBuf::from("a.jpg"), "JANE DOE".to_string())],
            closed: closed.clone(),
            available: true,
        };

        let recognized =
            recognize_with_engine(&engine, &[keyframe(1, Some("a.jpg"))], OcrLimits::default())
                .await;

        assert_eq!(recognized.lines, vec![vec!["JANE DOE".to_string()]]);
        assert_eq!(recognized.failed_frames, 0);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_recognize_with_unavailable_engine_yields_empty_lists() {
        let engine = FakeEngine {
            texts: vec![],
            closed: Arc::new(AtomicBool::new(false)),
            available: false,
        };
        let keyframes = vec![keyframe(1, Some("a.jpg")), keyframe(2, None)];

        let recognized = recognize_with_engine(&engine, &keyframes, OcrLimits::default()).await;

        assert_eq!(recognized.lines, vec![Vec::<String>::new(), Vec::new()]);
        assert_eq!(recognized.failed_frames, 1);
    }
}
