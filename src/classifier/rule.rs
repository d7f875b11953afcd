use tracing::trace;

use crate::classifier::stabilizer::Stabilizer;
use crate::classifier::{Classification, Classifier, ClassifierInput};
use crate::config::StabilizerConfig;
use crate::error::ClassifierError;
use crate::geometry::{EngineConfig, GestureEngine};
use crate::perception::PerceptionAdapter;

/// Landmark detection, geometric rules, and temporal voting.
pub struct RuleClassifier {
    perception: PerceptionAdapter,
    engine: GestureEngine,
    stabilizer: Stabilizer,
}

impl RuleClassifier {
    pub fn new(
        perception: PerceptionAdapter,
        engine: EngineConfig,
        stabilizer: &StabilizerConfig,
    ) -> Self {
        Self {
            perception,
            engine: GestureEngine::new(engine),
            stabilizer: Stabilizer::new(stabilizer),
        }
    }
}

impl Classifier for RuleClassifier {
    fn name(&self) -> &'static str {
        "rule"
    }

    fn classify(&mut self, input: ClassifierInput) -> Result<Classification, ClassifierError> {
        let (hands, ts_ms) = match input {
            ClassifierInput::Frame(frame) => {
                let detection = self.perception.detect(&frame)?;
                (detection.hands, detection.ts_ms)
            }
            ClassifierInput::Landmarks { hands, ts_ms } => {
                (hands, self.perception.next_timestamp(ts_ms))
            }
        };

        let raw = self.engine.classify(&hands, ts_ms).map(|s| s.as_str().to_string());
        let vote = self.stabilizer.push(raw.clone());
        trace!(
            hands = hands.len(),
            raw = raw.as_deref().unwrap_or("-"),
            stable = vote.stable.as_deref().unwrap_or("-"),
            "rule classification"
        );

        Ok(Classification {
            raw,
            stable: vote.stable,
            confidence: vote.confidence,
        })
    }

    fn close(&mut self) {
        self.perception.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use image::RgbImage;

    use super::*;
    use crate::geometry::testing;
    use crate::perception::{Frame, NoHandLandmarker, ScriptedLandmarker};

    fn frame(seq: u64) -> Frame {
        Frame {
            seq,
            ts_ms: seq * 33,
            image: RgbImage::new(2, 2),
        }
    }

    fn rule(engine: ScriptedLandmarker) -> RuleClassifier {
        RuleClassifier::new(
            PerceptionAdapter::new(Box::new(engine)),
            EngineConfig::default(),
            &StabilizerConfig::default(),
        )
    }

    #[test]
    fn steady_palm_becomes_stable_after_enough_votes() {
        let mut c = rule(ScriptedLandmarker::repeating(vec![testing::open_palm()]));
        let outputs: Vec<Classification> = (0..4)
            .map(|i| c.classify(ClassifierInput::Frame(frame(i))).unwrap())
            .collect();

        assert!(outputs.iter().all(|o| o.raw.as_deref() == Some("5")));
        assert_eq!(outputs[2].stable, None);
        assert_eq!(outputs[3].stable.as_deref(), Some("5"));
        assert_eq!(outputs[3].confidence, 1.0);
    }

    #[test]
    fn empty_frames_never_stabilize() {
        let mut c = RuleClassifier::new(
            PerceptionAdapter::new(Box::new(NoHandLandmarker)),
            EngineConfig::default(),
            &StabilizerConfig::default(),
        );
        for i in 0..10 {
            let out = c.classify(ClassifierInput::Frame(frame(i))).unwrap();
            assert_eq!(out, Classification::none());
        }
    }

    #[test]
    fn accepts_precomputed_landmarks() {
        let mut c = rule(ScriptedLandmarker::new(vec![]));
        let out = c
            .classify(ClassifierInput::Landmarks {
                hands: vec![testing::fist()],
                ts_ms: 0,
            })
            .unwrap();
        assert_eq!(out.raw.as_deref(), Some("А"));
    }

    #[test]
    fn engine_failure_propagates() {
        let mut c = rule(ScriptedLandmarker::new(vec![]).failing_at(0));
        assert!(matches!(
            c.classify(ClassifierInput::Frame(frame(0))),
            Err(ClassifierError::Perception(_))
        ));
    }

    #[test]
    fn close_reaches_the_engine() {
        let engine = ScriptedLandmarker::new(vec![]);
        let closed = engine.closed_flag();
        let mut c = rule(engine);
        c.close();
        assert!(closed.load(Ordering::SeqCst));
    }
}
