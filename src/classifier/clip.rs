//! Clip backend: a neural model over a sliding window of frames.
//!
//! The model is a black box that maps a `1 × C × T × H × W` tensor to one
//! logit per class. Labels come from a class list file with one
//! `<index>\t<label>` pair per line.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::classifier::{Classification, Classifier, ClassifierInput};
use crate::config::ClipConfig;
use crate::error::ClassifierError;
use crate::perception::Frame;

/// Model outputs that mean "nothing recognized".
const IGNORED_LABELS: [&str; 3] = ["", "no", "---"];

// ── Class list ─────────────────────────────────────────────

/// Index → label table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassList {
    labels: BTreeMap<usize, String>,
}

impl ClassList {
    /// Parse `<index>\t<label>` lines. Blank lines are skipped.
    pub fn parse(text: &str) -> Result<Self, ClassifierError> {
        let mut labels = BTreeMap::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (index, label) = line.split_once('\t').ok_or_else(|| ClassifierError::ClassList {
                line: n + 1,
                reason: "expected <index>\\t<label>".to_string(),
            })?;
            let index = index.trim().parse::<usize>().map_err(|e| ClassifierError::ClassList {
                line: n + 1,
                reason: format!("bad index {:?}: {}", index, e),
            })?;
            labels.insert(index, label.trim().to_string());
        }
        Ok(Self { labels })
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

// ── Model contract ─────────────────────────────────────────

/// Clip tensor, channel-major: `[1, C, T, H, W]`, values in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ClipTensor {
    pub shape: [usize; 5],
    pub data: Vec<f32>,
}

impl ClipTensor {
    /// Stack frames (all the same size) into a clip.
    pub fn from_frames<'a>(frames: impl ExactSizeIterator<Item = &'a Frame>) -> Self {
        let frames: Vec<&Frame> = frames.collect();
        let (w, h) = frames
            .first()
            .map(|f| f.image.dimensions())
            .unwrap_or((0, 0));
        let (w, h, t) = (w as usize, h as usize, frames.len());

        let mut data = vec![0.0; 3 * t * h * w];
        for (ti, frame) in frames.iter().enumerate() {
            for (x, y, px) in frame.image.enumerate_pixels() {
                let (x, y) = (x as usize, y as usize);
                if x >= w || y >= h {
                    continue;
                }
                for c in 0..3 {
                    data[((c * t + ti) * h + y) * w + x] = f32::from(px.0[c]) / 255.0;
                }
            }
        }
        Self {
            shape: [1, 3, t, h, w],
            data,
        }
    }
}

/// A clip → logits model.
pub trait ClipModel: Send {
    fn infer(&mut self, clip: &ClipTensor) -> Result<Vec<f32>, ClassifierError>;

    fn close(&mut self) {}
}

/// Creates one model instance per session, on the session's worker thread.
pub type ClipModelFactory =
    Arc<dyn Fn() -> Result<Box<dyn ClipModel>, ClassifierError> + Send + Sync>;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.into_iter().map(|e| e / sum).collect()
}

/// Indices of the `k` largest probabilities, best first.
pub fn top_k(probs: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..probs.len()).collect();
    idx.sort_by(|&a, &b| probs[b].total_cmp(&probs[a]));
    idx.truncate(k);
    idx
}

// ── Classifier ─────────────────────────────────────────────

pub struct ClipClassifier {
    model: Box<dyn ClipModel>,
    classes: Arc<ClassList>,
    window: VecDeque<Frame>,
    config: ClipConfig,
}

impl ClipClassifier {
    pub fn new(model: Box<dyn ClipModel>, classes: Arc<ClassList>, config: ClipConfig) -> Self {
        Self {
            model,
            classes,
            window: VecDeque::with_capacity(config.window),
            config,
        }
    }

    fn push(&mut self, frame: Frame) {
        if self.window.len() == self.config.window {
            self.window.pop_front();
        }
        self.window.push_back(frame);
    }

    fn infer(&mut self) -> Result<Classification, ClassifierError> {
        let clip = ClipTensor::from_frames(self.window.iter());
        let logits = self.model.infer(&clip)?;
        if logits.len() < self.classes.len() {
            return Err(ClassifierError::LogitShape {
                got: logits.len(),
                expected: self.classes.len(),
            });
        }

        let probs = softmax(&logits);
        let ranked = top_k(&probs, self.config.top_k);
        let Some(&best) = ranked.first() else {
            return Ok(Classification::none());
        };
        let confidence = probs[best];
        if confidence < self.config.threshold {
            debug!(confidence, "below threshold");
            return Ok(Classification::none());
        }

        let word = self.classes.label(best).unwrap_or_default().to_string();
        let stable = (!IGNORED_LABELS.contains(&word.as_str())).then(|| word.clone());
        Ok(Classification {
            raw: Some(word),
            stable,
            confidence,
        })
    }
}

impl Classifier for ClipClassifier {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn classify(&mut self, input: ClassifierInput) -> Result<Classification, ClassifierError> {
        let frame = match input {
            ClassifierInput::Frame(frame) => frame,
            ClassifierInput::Landmarks { .. } => {
                return Err(ClassifierError::UnsupportedInput {
                    classifier: self.name().to_string(),
                    input: "landmarks".to_string(),
                });
            }
        };
        self.push(frame);
        if self.window.len() < self.config.window {
            return Ok(Classification::none());
        }
        self.infer()
    }

    fn observe(&mut self, frame: Frame) {
        self.push(frame);
    }

    /// A recognized sign is done; start collecting the next one from scratch.
    fn on_emitted(&mut self, _label: &str) {
        self.window.clear();
    }

    fn close(&mut self) {
        self.model.close();
    }
}
