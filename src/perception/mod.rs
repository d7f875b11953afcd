//! Hand-landmark perception.
//!
//! The landmark engine itself is a black box behind [`HandLandmarker`]. The
//! crate ships two engines: [`NoHandLandmarker`], which never sees a hand,
//! and [`ScriptedLandmarker`], which replays prepared hands. A native engine
//! is plugged in through a [`LandmarkerFactory`] at startup.

pub mod adapter;

pub use adapter::{Detection, PerceptionAdapter};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbImage;

use crate::config::LandmarkerConfig;
use crate::error::PerceptionError;
use crate::landmarks::{HandLandmarks, Point3};

/// A decoded frame at engine input size.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Arrival order within the session.
    pub seq: u64,
    /// Milliseconds since the session started when the frame arrived.
    pub ts_ms: u64,
    pub image: RgbImage,
}

/// Joint list for one hand as reported by an engine, before validation.
pub type RawHand = Vec<Point3>;

/// A video-mode hand-landmark engine.
///
/// Engines are not shared: each session creates one and drives it from a
/// single worker thread. Timestamps passed to `detect` are strictly
/// increasing for the engine's lifetime.
pub trait HandLandmarker: Send {
    /// Engine name for logs and errors.
    fn name(&self) -> &str;

    fn detect(&mut self, frame: &Frame, ts_ms: u64) -> Result<Vec<RawHand>, PerceptionError>;

    /// Release engine resources. Called once, on the owning thread.
    fn close(&mut self) {}
}

/// Creates one engine per session.
pub type LandmarkerFactory =
    Arc<dyn Fn(&LandmarkerConfig) -> Result<Box<dyn HandLandmarker>, PerceptionError> + Send + Sync>;

/// Fail early when a model asset is configured but absent.
///
/// Engines that load no model ignore `model_path`, so an unset path passes.
pub fn check_model_asset(config: &LandmarkerConfig) -> Result<(), PerceptionError> {
    match &config.model_path {
        Some(path) if !path.is_file() => Err(PerceptionError::ModelNotFound {
            path: path.display().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Factory for [`NoHandLandmarker`].
pub fn no_hand_factory() -> LandmarkerFactory {
    Arc::new(|_config| Ok(Box::new(NoHandLandmarker) as Box<dyn HandLandmarker>))
}

/// Engine used when no native landmark model is linked: reports no hands.
#[derive(Debug, Default)]
pub struct NoHandLandmarker;

impl HandLandmarker for NoHandLandmarker {
    fn name(&self) -> &str {
        "none"
    }

    fn detect(&mut self, _frame: &Frame, _ts_ms: u64) -> Result<Vec<RawHand>, PerceptionError> {
        Ok(Vec::new())
    }
}

/// Replays a fixed sequence of detections, one entry per `detect` call.
///
/// Once the script runs out the last entry repeats. Used to drive the
/// pipeline end to end without a camera or a model.
#[derive(Debug)]
pub struct ScriptedLandmarker {
    script: Vec<Vec<HandLandmarks>>,
    cursor: usize,
    closed: Arc<AtomicBool>,
    fail_at: Option<usize>,
}

impl ScriptedLandmarker {
    pub fn new(script: Vec<Vec<HandLandmarks>>) -> Self {
        Self {
            script,
            cursor: 0,
            closed: Arc::new(AtomicBool::new(false)),
            fail_at: None,
        }
    }

    /// The same hands on every frame.
    pub fn repeating(hands: Vec<HandLandmarks>) -> Self {
        Self::new(vec![hands])
    }

    /// Fail the `call`-th detection (zero-based).
    pub fn failing_at(mut self, call: usize) -> Self {
        self.fail_at = Some(call);
        self
    }

    /// Report `close` through an existing flag.
    pub fn with_closed_flag(mut self, closed: Arc<AtomicBool>) -> Self {
        self.closed = closed;
        self
    }

    /// Flag that flips to true once the engine is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    /// Wrap a script in a factory that hands each session a fresh copy.
    pub fn factory(script: Vec<Vec<HandLandmarks>>, closed: Arc<AtomicBool>) -> LandmarkerFactory {
        Arc::new(move |_config| {
            let engine = ScriptedLandmarker::new(script.clone()).with_closed_flag(Arc::clone(&closed));
            Ok(Box::new(engine) as Box<dyn HandLandmarker>)
        })
    }
}

impl HandLandmarker for ScriptedLandmarker {
    fn name(&self) -> &str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame, _ts_ms: u64) -> Result<Vec<RawHand>, PerceptionError> {
        let call = self.cursor;
        self.cursor += 1;
        if self.fail_at == Some(call) {
            return Err(PerceptionError::DetectFailed {
                engine: self.name().to_string(),
                reason: format!("scripted failure at call {}", call),
            });
        }

        let Some(last) = self.script.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        let hands = &self.script[call.min(last)];
        Ok(hands.iter().map(|h| h.points().to_vec()).collect())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
