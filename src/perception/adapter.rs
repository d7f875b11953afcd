use tracing::trace;

use crate::error::PerceptionError;
use crate::landmarks::HandLandmarks;
use crate::perception::{Frame, HandLandmarker};

/// Hands found in one frame, stamped with the engine timestamp used.
#[derive(Debug, Clone)]
pub struct Detection {
    pub hands: Vec<HandLandmarks>,
    pub ts_ms: u64,
}

/// Owns a landmark engine and enforces its timestamp contract.
///
/// Video-mode engines reject non-increasing timestamps, so any caller
/// timestamp at or below the previous one is bumped to previous + 1.
/// Hands past `max_hands` are dropped in engine order.
pub struct PerceptionAdapter {
    engine: Box<dyn HandLandmarker>,
    max_hands: usize,
    last_ts_ms: Option<u64>,
    closed: bool,
}

impl PerceptionAdapter {
    pub fn new(engine: Box<dyn HandLandmarker>) -> Self {
        Self {
            engine,
            max_hands: usize::MAX,
            last_ts_ms: None,
            closed: false,
        }
    }

    pub fn with_max_hands(mut self, max_hands: usize) -> Self {
        self.max_hands = max_hands;
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Next strictly increasing engine timestamp for a caller timestamp.
    pub fn next_timestamp(&mut self, ts_ms: u64) -> u64 {
        let ts = match self.last_ts_ms {
            Some(last) if ts_ms <= last => last + 1,
            _ => ts_ms,
        };
        self.last_ts_ms = Some(ts);
        ts
    }

    /// Run the engine on a frame and validate its output.
    pub fn detect(&mut self, frame: &Frame) -> Result<Detection, PerceptionError> {
        let ts_ms = self.next_timestamp(frame.ts_ms);
        let raw = self.engine.detect(frame, ts_ms)?;

        let hands = raw
            .iter()
            .take(self.max_hands)
            .map(|points| {
                HandLandmarks::from_slice(points).ok_or_else(|| PerceptionError::MalformedHand {
                    engine: self.engine.name().to_string(),
                    count: points.len(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        trace!(seq = frame.seq, ts_ms, hands = hands.len(), "landmarks");
        Ok(Detection { hands, ts_ms })
    }

    /// Close the engine. Later calls are no-ops.
    pub fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.engine.close();
        }
    }
}

impl Drop for PerceptionAdapter {
    fn drop(&mut self) {
        self.close();
    }
}
