//! Classifier strategies.
//!
//! Supports:
//! - **Rule**: hand landmarks → geometric engine → temporal stabilizer
//! - **Clip**: sliding frame window → neural clip model → softmax/top-k
//!
//! Both sit behind the [`Classifier`] trait. A session builds exactly one
//! instance through [`ClassifierFactory`], on its worker thread.

pub mod clip;
pub mod rule;
pub mod stabilizer;
pub mod worker;

pub use clip::{ClassList, ClipClassifier, ClipModel, ClipModelFactory, ClipTensor};
pub use rule::RuleClassifier;
pub use stabilizer::{Stabilizer, Vote};
pub use worker::ClassifierWorker;

use std::sync::Arc;

use crate::config::{ClassifierBackend, StreamConfig};
use crate::error::ClassifierError;
use crate::landmarks::HandLandmarks;
use crate::perception::{self, Frame, LandmarkerFactory, PerceptionAdapter};

/// What a classifier is asked to look at.
#[derive(Debug, Clone)]
pub enum ClassifierInput {
    Frame(Frame),
    /// Hands already extracted by an upstream detector.
    Landmarks {
        hands: Vec<HandLandmarks>,
        ts_ms: u64,
    },
}

/// Result of classifying one input.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Per-input label before smoothing.
    pub raw: Option<String>,
    /// Label fit for emission, if any.
    pub stable: Option<String>,
    pub confidence: f32,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            raw: None,
            stable: None,
            confidence: 0.0,
        }
    }
}

/// A per-session sign classifier. Lives on one worker thread.
pub trait Classifier: Send {
    fn name(&self) -> &'static str;

    fn classify(&mut self, input: ClassifierInput) -> Result<Classification, ClassifierError>;

    /// A frame that arrived but was not admitted for classification.
    fn observe(&mut self, _frame: Frame) {}

    /// The session emitted `label` downstream.
    fn on_emitted(&mut self, _label: &str) {}

    /// Release engine or model resources.
    fn close(&mut self) {}
}

/// Builds the configured classifier for each new session.
#[derive(Clone)]
pub struct ClassifierFactory {
    config: Arc<StreamConfig>,
    landmarker: LandmarkerFactory,
    clip: Option<(ClipModelFactory, Arc<ClassList>)>,
}

impl ClassifierFactory {
    pub fn new(config: Arc<StreamConfig>, landmarker: LandmarkerFactory) -> Self {
        Self {
            config,
            landmarker,
            clip: None,
        }
    }

    /// Register the model and class list used by the clip backend.
    pub fn with_clip_model(mut self, model: ClipModelFactory, classes: ClassList) -> Self {
        self.clip = Some((model, Arc::new(classes)));
        self
    }

    pub fn backend(&self) -> ClassifierBackend {
        self.config.backend
    }

    /// Fail fast at startup if the configured backend cannot be built.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        match self.config.backend {
            ClassifierBackend::Rule => perception::check_model_asset(&self.config.landmarker)
                .map_err(ClassifierError::from),
            ClassifierBackend::Clip if self.clip.is_none() => Err(ClassifierError::ModelMissing),
            ClassifierBackend::Clip => Ok(()),
        }
    }

    /// Create a classifier. Engines and models are constructed here, so call
    /// this on the thread that will own them.
    pub fn create(&self) -> Result<Box<dyn Classifier>, ClassifierError> {
        match self.config.backend {
            ClassifierBackend::Rule => {
                let options = &self.config.landmarker;
                let adapter = PerceptionAdapter::new((self.landmarker)(options)?)
                    .with_max_hands(options.max_hands);
                tracing::debug!(
                    engine = adapter.engine_name(),
                    max_hands = options.max_hands,
                    min_detection_confidence = options.min_detection_confidence,
                    min_presence_confidence = options.min_presence_confidence,
                    min_tracking_confidence = options.min_tracking_confidence,
                    "landmark engine ready"
                );
                Ok(Box::new(RuleClassifier::new(
                    adapter,
                    self.config.engine.clone(),
                    &self.config.stabilizer,
                )))
            }
            ClassifierBackend::Clip => {
                let (model, classes) = self.clip.as_ref().ok_or(ClassifierError::ModelMissing)?;
                Ok(Box::new(ClipClassifier::new(
                    model()?,
                    Arc::clone(classes),
                    self.config.clip.clone(),
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerceptionError;
    use crate::perception::no_hand_factory;

    fn factory(backend: ClassifierBackend) -> ClassifierFactory {
        let config = StreamConfig {
            backend,
            ..StreamConfig::default()
        };
        ClassifierFactory::new(Arc::new(config), no_hand_factory())
    }

    struct Silent;

    impl ClipModel for Silent {
        fn infer(&mut self, _clip: &ClipTensor) -> Result<Vec<f32>, ClassifierError> {
            Ok(vec![0.0])
        }
    }

    #[test]
    fn rule_backend_builds_without_extras() {
        let f = factory(ClassifierBackend::Rule);
        assert!(f.validate().is_ok());
        assert_eq!(f.create().unwrap().name(), "rule");
    }

    #[test]
    fn rule_backend_checks_the_model_asset() {
        let config = StreamConfig {
            landmarker: crate::config::LandmarkerConfig {
                model_path: Some("/nonexistent/hand_landmarker.task".into()),
                ..Default::default()
            },
            ..StreamConfig::default()
        };
        let f = ClassifierFactory::new(Arc::new(config), no_hand_factory());
        assert!(matches!(
            f.validate(),
            Err(ClassifierError::Perception(PerceptionError::ModelNotFound { .. }))
        ));
    }

    #[test]
    fn clip_backend_requires_a_model() {
        let f = factory(ClassifierBackend::Clip);
        assert!(matches!(f.validate(), Err(ClassifierError::ModelMissing)));
        assert!(f.create().is_err());

        let model: ClipModelFactory = Arc::new(|| Ok(Box::new(Silent) as Box<dyn ClipModel>));
        let f = f.with_clip_model(model, ClassList::parse("0\tx").unwrap());
        assert!(f.validate().is_ok());
        assert_eq!(f.create().unwrap().name(), "clip");
    }
}
