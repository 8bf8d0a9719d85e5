//! Shotlist pipeline orchestration.
//!
//! One run walks a fixed sequence of stages:
//!
//! 1. verify the input and create the run's scratch directory
//! 2. probe the duration
//! 3. adaptive scene-cut detection
//! 4. shot interval construction
//! 5. keyframe extraction
//! 6. OCR over the keyframes with a session scoped to the run
//! 7. text bucketing and result assembly
//! 8. the caller's post-filter
//!
//! Only a missing input or unusable scratch storage aborts a run; every
//! later stage degrades instead. The scratch directory is removed on every
//! exit path.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn, Instrument};
use uuid::Uuid;

use shotlist_media::keyframe::{extract_keyframes, FfmpegFrameExtractor, FrameExtractor, FrameOptions};
use shotlist_media::ocr::{recognize_with_engine, OcrEngine, OcrLimits, TesseractEngine};
use shotlist_media::probe::{FfprobeProber, MediaProber};
use shotlist_media::scene::{FfmpegSceneDetector, SceneDetector};
use shotlist_media::ScratchDir;
use shotlist_models::{
    to_timecode, Keyframe, ShotEntry, ShotInterval, ShotlistFilter, ShotlistResult, VideoAsset,
};

use crate::adaptive::{AdaptiveDetector, ThresholdLadder};
use crate::classify::{classify_line_with, TextBucketer};
use crate::config::ShotlistConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::intervals::build_shot_intervals;
use crate::logging::RunLogger;
use crate::metrics;

/// A single extraction request.
#[derive(Debug, Clone)]
pub struct ShotlistRequest {
    /// Local path of the video
    pub input_path: PathBuf,
    /// Detection sensitivity; the configured default when `None`
    pub sensitivity: Option<f64>,
    /// Post-filter applied to the assembled result
    pub filter: ShotlistFilter,
    /// Whether to embed base64 stills in the result
    pub include_stills: bool,
}

impl ShotlistRequest {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            sensitivity: None,
            filter: ShotlistFilter::default(),
            include_stills: true,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = Some(sensitivity);
        self
    }

    pub fn with_filter(mut self, filter: ShotlistFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn without_stills(mut self) -> Self {
        self.include_stills = false;
        self
    }
}

/// External tool backends used by the pipeline.
#[derive(Clone)]
pub struct ShotlistBackends {
    pub prober: Arc<dyn MediaProber>,
    pub detector: Arc<dyn SceneDetector>,
    pub extractor: Arc<dyn FrameExtractor>,
    pub ocr: Arc<dyn OcrEngine>,
}

impl ShotlistBackends {
    /// FFmpeg, FFprobe and Tesseract backends with the configured timeouts.
    pub fn ffmpeg(config: &ShotlistConfig) -> Self {
        Self {
            prober: Arc::new(FfprobeProber::new().with_timeout(config.probe_timeout_secs)),
            detector: Arc::new(FfmpegSceneDetector::new().with_timeout(config.detect_timeout_secs)),
            extractor: Arc::new(
                FfmpegFrameExtractor::new().with_timeout(config.extract_timeout_secs),
            ),
            ocr: Arc::new(
                TesseractEngine::new()
                    .with_language(config.ocr_language.clone())
                    .with_page_seg_mode(config.ocr_page_seg_mode)
                    .with_timeout(config.ocr_timeout_secs),
            ),
        }
    }
}

/// Runs shotlist extraction end to end.
#[derive(Clone)]
pub struct ShotlistPipeline {
    config: ShotlistConfig,
    backends: ShotlistBackends,
    adaptive: AdaptiveDetector,
}

impl ShotlistPipeline {
    pub fn new(config: ShotlistConfig, backends: ShotlistBackends) -> Self {
        let adaptive = AdaptiveDetector::new(backends.detector.clone(), config.min_cuts);
        Self {
            config,
            backends,
            adaptive,
        }
    }

    pub fn config(&self) -> &ShotlistConfig {
        &self.config
    }

    /// Run the pipeline for one request.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::InputNotFound`] if the input is missing and
    /// [`WorkerError::ScratchStorage`] if the scratch directory cannot be
    /// created.
    pub async fn run(&self, request: ShotlistRequest) -> WorkerResult<ShotlistResult> {
        let run_id = Uuid::new_v4().simple().to_string();
        let logger = RunLogger::new(&run_id, "shotlist");
        let span = logger.create_span();

        async move {
            let started = Instant::now();
            logger.log_start(&format!("input={}", request.input_path.display()));

            match self.run_inner(&run_id, &request, &logger).await {
                Ok(result) => {
                    let elapsed = started.elapsed().as_secs_f64();
                    metrics::record_run_completed(elapsed, result.shot_count());
                    logger.log_completion(&format!(
                        "{} shots in {:.2}s at threshold {:.4}",
                        result.shot_count(),
                        elapsed,
                        result.used_threshold
                    ));
                    Ok(result)
                }
                Err(e) => {
                    metrics::record_run_failed(failure_reason(&e));
                    logger.log_error(&e.to_string());
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run_inner(
        &self,
        run_id: &str,
        request: &ShotlistRequest,
        logger: &RunLogger,
    ) -> WorkerResult<ShotlistResult> {
        let input = &request.input_path;
        match tokio::fs::metadata(input).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(WorkerError::InputNotFound(input.clone())),
        }

        let scratch = ScratchDir::create(&self.config.work_dir, run_id)
            .await
            .map_err(|e| WorkerError::scratch_storage(e.to_string()))?;

        let result = self.process(request, &scratch, logger).await;

        if let Err(e) = scratch.close() {
            warn!(error = %e, "Failed to remove scratch directory");
        }

        let title_max_len = self.config.title_max_len;
        Ok(request
            .filter
            .apply(result, |line| classify_line_with(line, title_max_len)))
    }

    /// Stages that run inside the scratch directory. Nothing here fails the
    /// run.
    async fn process(
        &self,
        request: &ShotlistRequest,
        scratch: &ScratchDir,
        logger: &RunLogger,
    ) -> ShotlistResult {
        let input = request.input_path.as_path();
        let asset = VideoAsset::new(input, self.backends.prober.probe(input).await);
        let duration = asset.duration_or_zero();

        let requested = request
            .sensitivity
            .unwrap_or(self.config.default_sensitivity);
        let ladder = ThresholdLadder::build(
            requested,
            &self.config.fallback_thresholds,
            self.config.max_attempts,
        );

        // Without a duration no cut can be placed, so detection is skipped
        let (used_threshold, cuts) = if duration > 0.0 {
            let outcome = self.adaptive.detect(input, &ladder, scratch).await;
            metrics::record_detection_attempts(outcome.attempts);
            (outcome.used_threshold, outcome.cuts)
        } else {
            logger.log_warning("duration unknown, treating the video as a single shot");
            (ladder.first(), Vec::new())
        };

        let intervals = build_shot_intervals(duration, &cuts, self.config.max_shots);
        logger.log_progress(&format!(
            "{} cut candidates, {} shots",
            cuts.len(),
            intervals.len()
        ));

        let keyframes = extract_keyframes(
            self.backends.extractor.as_ref(),
            input,
            &intervals,
            scratch,
            FrameOptions {
                width: self.config.still_width,
            },
            self.config.extract_parallelism,
        )
        .await;
        let missing = keyframes.iter().filter(|k| !k.is_present()).count();
        metrics::record_extraction_failures(missing);
        if missing > 0 {
            logger.log_warning(&format!("{} of {} keyframes missing", missing, keyframes.len()));
        }

        let limits = OcrLimits {
            min_line_len: self.config.min_line_len,
            max_lines: self.config.max_ocr_lines,
            max_frames: self.config.max_shots,
        };
        let recognized =
            recognize_with_engine(self.backends.ocr.as_ref(), &keyframes, limits).await;
        metrics::record_ocr_failures(recognized.failed_frames);
        if recognized.failed_frames > 0 {
            logger.log_warning(&format!(
                "text recognition failed for {} keyframes",
                recognized.failed_frames
            ));
        }
        let texts = recognized.lines;
        metrics::record_text_lines(texts.iter().map(Vec::len).sum());

        let mut bucketer = TextBucketer::new(
            self.config.bucket_cap,
            self.config.min_line_len,
            self.config.title_max_len,
        );
        bucketer.add_shots(&texts);

        let shots = assemble_shots(
            &intervals,
            keyframes,
            texts,
            self.config.fps,
            request.include_stills,
        );
        debug!(shots = shots.len(), "Assembled shotlist");

        ShotlistResult {
            duration_seconds: duration,
            used_threshold,
            shots,
            text_buckets: bucketer.into_buckets(),
        }
    }
}

/// Zip intervals, keyframes and recognized text into shot entries.
fn assemble_shots(
    intervals: &[ShotInterval],
    keyframes: Vec<Keyframe>,
    texts: Vec<Vec<String>>,
    fps: u32,
    include_stills: bool,
) -> Vec<ShotEntry> {
    intervals
        .iter()
        .zip(keyframes)
        .zip(texts)
        .map(|((interval, keyframe), text)| ShotEntry {
            index: interval.index,
            tc_in: to_timecode(interval.start_sec, fps),
            tc_out: to_timecode(interval.end_sec, fps),
            text,
            still: keyframe
                .image
                .filter(|_| include_stills)
                .map(|bytes| STANDARD.encode(bytes)),
        })
        .collect()
}

fn failure_reason(error: &WorkerError) -> &'static str {
    match error {
        WorkerError::InputNotFound(_) => "input_not_found",
        WorkerError::ScratchStorage(_) => "scratch_storage",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_shots() {
        let intervals = vec![
            ShotInterval::new(1, 0.0, 10.0),
            ShotInterval::new(2, 10.0, 12.5),
        ];
        let keyframes = vec![
            Keyframe {
                shot_index: 1,
                image: Some(b"jpeg".to_vec()),
                path: None,
            },
            Keyframe::missing(2),
        ];
        let texts = vec![vec!["Jane Doe".to_string()], vec![]];

        let shots = assemble_shots(&intervals, keyframes.clone(), texts.clone(), 30, true);

        assert_eq!(shots[0].tc_in, "00:00:00:00");
        assert_eq!(shots[0].tc_out, "00:00:10:00");
        assert_eq!(shots[0].still.as_deref(), Some("anBlZw=="));
        assert_eq!(shots[0].text, vec!["Jane Doe"]);
        assert_eq!(shots[1].tc_out, "00:00:12:15");
        assert!(shots[1].still.is_none());

        let shots = assemble_shots(&intervals, keyframes, texts, 30, false);
        assert!(shots.iter().all(|s| s.still.is_none()));
    }

    #[test]
    fn test_request_builder() {
        let request = ShotlistRequest::new("/videos/a.mp4")
            .with_sensitivity(0.5)
            .without_stills();
        assert_eq!(request.sensitivity, Some(0.5));
        assert!(!request.include_stills);
        assert!(request.filter.is_noop());
    }
}
