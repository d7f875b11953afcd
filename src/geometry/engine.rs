//! Per-frame gesture decision.
//!
//! Tiers are tried in order and the first match wins: two-hand composites,
//! trajectory gestures on the first hand, static letters, finger count.

use tracing::trace;

use crate::geometry::poses;
use crate::geometry::symbol::Symbol;
use crate::geometry::trajectory::{
    PinchFlick, PinchParams, Rotation, RotationParams, Spin, SpinParams, Stroke, StrokeParams,
    Tracker,
};
use crate::geometry::two_hand;
use crate::landmarks::HandLandmarks;

/// Resolution order for the static-letter tier.
///
/// The first symbol of `order` whose predicate holds is chosen; any matching
/// symbol in `overrides` then replaces it, later overrides winning.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticPriority {
    pub order: Vec<Symbol>,
    pub overrides: Vec<Symbol>,
}

impl Default for StaticPriority {
    fn default() -> Self {
        Self {
            order: vec![Symbol::Ge, Symbol::Ve, Symbol::Be, Symbol::A, Symbol::Ye],
            overrides: vec![Symbol::Zhe],
        }
    }
}

impl StaticPriority {
    /// Pick the tier's answer given which symbols matched.
    pub fn resolve(&self, matched: &[Symbol]) -> Option<Symbol> {
        let mut chosen = self.order.iter().find(|s| matched.contains(s)).copied();
        for symbol in &self.overrides {
            if matched.contains(symbol) {
                chosen = Some(*symbol);
            }
        }
        chosen
    }

    fn candidates(&self) -> impl Iterator<Item = &Symbol> {
        self.order.iter().chain(self.overrides.iter())
    }
}

/// Tunables for the geometric engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub rotation: RotationParams,
    pub spin: SpinParams,
    pub stroke: StrokeParams,
    pub pinch: PinchParams,
    /// Fingertip-to-palm distance, in palm scales, that counts as touching.
    pub touch_threshold: f32,
    /// How strongly the palm normal must point at the camera.
    pub palm_face_ratio: f32,
    pub static_priority: StaticPriority,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotation: RotationParams::default(),
            spin: SpinParams::default(),
            stroke: StrokeParams::default(),
            pinch: PinchParams::default(),
            touch_threshold: 0.55,
            palm_face_ratio: 1.15,
            static_priority: StaticPriority::default(),
        }
    }
}

/// Stateful classifier turning landmark frames into raw symbols.
///
/// Holds the trajectory histories and cooldowns of one session.
#[derive(Debug)]
pub struct GestureEngine {
    config: EngineConfig,
    pinch: Tracker<PinchFlick>,
    rotation: Tracker<Rotation>,
    spin: Tracker<Spin>,
    stroke: Tracker<Stroke>,
    hand_count: usize,
}

impl GestureEngine {
    pub fn new(config: EngineConfig) -> Self {
        let pinch = Tracker::new(
            PinchFlick {
                params: config.pinch.clone(),
            },
            config.pinch.capacity,
            config.pinch.miss_tolerance,
            config.pinch.cooldown_ms,
        );
        let rotation = Tracker::new(
            Rotation {
                params: config.rotation.clone(),
            },
            config.rotation.capacity,
            0,
            config.rotation.cooldown_ms,
        );
        let spin = Tracker::new(
            Spin {
                params: config.spin.clone(),
            },
            config.spin.capacity,
            0,
            config.spin.cooldown_ms,
        );
        let stroke = Tracker::new(
            Stroke {
                params: config.stroke.clone(),
            },
            config.stroke.capacity,
            0,
            config.stroke.cooldown_ms,
        );
        Self {
            config,
            pinch,
            rotation,
            spin,
            stroke,
            hand_count: 0,
        }
    }

    /// Classify one frame of detected hands at engine time `now_ms`.
    ///
    /// Only the first two hands are considered. A change in hand count
    /// restarts every trajectory.
    pub fn classify(&mut self, hands: &[HandLandmarks], now_ms: u64) -> Option<Symbol> {
        let hands = &hands[..hands.len().min(2)];
        if hands.len() != self.hand_count {
            self.reset();
            self.hand_count = hands.len();
        }

        let primary = hands.first()?;

        if let [a, b] = hands {
            let composite = two_hand::classify_pair(
                a,
                b,
                self.config.touch_threshold,
                self.config.palm_face_ratio,
            );
            if composite.is_some() {
                return composite;
            }
        }

        if let Some(symbol) = self.dynamic(primary, hands.len(), now_ms) {
            trace!(symbol = %symbol, "trajectory gesture");
            return Some(symbol);
        }

        let matched: Vec<Symbol> = self
            .config
            .static_priority
            .candidates()
            .copied()
            .filter(|s| poses::static_predicate(*s).is_some_and(|holds| holds(primary)))
            .collect();
        if let Some(symbol) = self.config.static_priority.resolve(&matched) {
            return Some(symbol);
        }

        poses::finger_count_symbol(primary)
    }

    fn dynamic(&mut self, hand: &HandLandmarks, hand_count: usize, now_ms: u64) -> Option<Symbol> {
        if hand_count == 1 {
            if let Some(symbol) = self.pinch.observe(hand, now_ms) {
                return Some(symbol);
            }
        } else {
            self.pinch.reset();
        }

        let pinch_in_progress = self.pinch.len() >= self.config.pinch.in_progress_points;
        if !pinch_in_progress && poses::ring_pose(hand) {
            return Some(Symbol::Zero);
        }

        if let Some(symbol) = self.rotation.observe(hand, now_ms) {
            return Some(symbol);
        }
        if let Some(symbol) = self.spin.observe(hand, now_ms) {
            return Some(symbol);
        }
        self.stroke.observe(hand, now_ms)
    }

    /// Clear every trajectory history and miss counter.
    pub fn reset(&mut self) {
        self.pinch.reset();
        self.rotation.reset();
        self.spin.reset();
        self.stroke.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing::{self, HandBuilder, palm_toucher};
    use crate::landmarks::Finger;
    use std::f32::consts::TAU;

    fn engine() -> GestureEngine {
        GestureEngine::new(EngineConfig::default())
    }

    #[test]
    fn static_priority_prefers_order_then_override() {
        let p = StaticPriority::default();
        assert_eq!(p.resolve(&[Symbol::A, Symbol::Ye]), Some(Symbol::A));
        assert_eq!(p.resolve(&[Symbol::Ye, Symbol::Ge]), Some(Symbol::Ge));
        assert_eq!(p.resolve(&[Symbol::A, Symbol::Zhe]), Some(Symbol::Zhe));
        assert_eq!(p.resolve(&[Symbol::Zhe]), Some(Symbol::Zhe));
        assert_eq!(p.resolve(&[]), None);

        let no_override = StaticPriority {
            overrides: Vec::new(),
            ..StaticPriority::default()
        };
        assert_eq!(no_override.resolve(&[Symbol::A, Symbol::Zhe]), Some(Symbol::A));
    }

    #[test]
    fn static_frames() {
        let mut e = engine();
        assert_eq!(e.classify(&[testing::open_palm()], 0), Some(Symbol::Five));
        assert_eq!(e.classify(&[testing::fist()], 33), Some(Symbol::A));
        assert_eq!(e.classify(&[testing::beak_pose().build()], 66), Some(Symbol::Zhe));
        assert_eq!(
            e.classify(&[testing::four_fingers_pose().rotate_y(75.0).build()], 99),
            Some(Symbol::Ve)
        );
    }

    #[test]
    fn no_hands_is_no_symbol() {
        let mut e = engine();
        assert_eq!(e.classify(&[], 0), None);
    }

    #[test]
    fn composite_either_order() {
        let mut e = engine();
        let palm = testing::open_palm();
        let toucher = palm_toucher(&[Finger::Index, Finger::Middle]);
        assert_eq!(e.classify(&[palm.clone(), toucher.clone()], 0), Some(Symbol::Seven));
        assert_eq!(e.classify(&[toucher, palm], 33), Some(Symbol::Seven));
    }

    #[test]
    fn extra_hands_are_ignored() {
        let mut e = engine();
        let palm = testing::open_palm();
        let toucher = palm_toucher(&[Finger::Thumb]);
        let stray = HandBuilder::new().shift(0.6, 0.0, 0.0).build();
        assert_eq!(e.classify(&[palm, toucher, stray], 0), Some(Symbol::Six));
    }

    #[test]
    fn circling_two_fingers_draws_de_once() {
        let mut e = engine();
        let mut out = Vec::new();
        for k in 0..60u64 {
            let a = TAU * 2.0 * k as f32 / 48.0;
            let hand = testing::two_finger_pose()
                .shift(0.05 * a.cos(), 0.05 * a.sin(), 0.0)
                .build();
            out.push(e.classify(&[hand], 1000 + 33 * k));
        }
        let de: Vec<usize> = out
            .iter()
            .enumerate()
            .filter(|(_, s)| **s == Some(Symbol::De))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(de, vec![43]);
        assert_eq!(out[0], Some(Symbol::Two));
    }

    #[test]
    fn pinch_flick_draws_cat() {
        let mut e = engine();
        let mut out = Vec::new();
        for k in 0..7u64 {
            let hand = testing::pinch_pose().shift(0.01 * k as f32, 0.0, 0.0).build();
            out.push(e.classify(&[hand], 1000 + 33 * k));
        }
        assert!(out[..6].iter().all(|s| *s == Some(Symbol::A)), "{out:?}");
        assert_eq!(out[6], Some(Symbol::Cat));
    }

    #[test]
    fn pinch_needs_a_single_hand() {
        let mut e = engine();
        let stray = HandBuilder::new().shift(0.6, 0.0, 0.0).build();
        for k in 0..10u64 {
            let hand = testing::pinch_pose().shift(0.01 * k as f32, 0.0, 0.0).build();
            let symbol = e.classify(&[hand, stray.clone()], 1000 + 33 * k);
            assert_ne!(symbol, Some(Symbol::Cat));
        }
    }

    #[test]
    fn zigzag_with_index_draws_ze() {
        let mut e = engine();
        let mut fired = Vec::new();
        for k in 0..50u64 {
            let t = k as f32 / 49.0;
            let hand = testing::pointing_pose()
                .shift(0.1 * (TAU * t).sin().abs(), 0.3 * t - 0.15, 0.0)
                .build();
            if e.classify(&[hand], 1000 + 33 * k) == Some(Symbol::Ze) {
                fired.push(k);
            }
        }
        assert_eq!(fired.len(), 1, "{fired:?}");
    }

    #[test]
    fn losing_hands_clears_trajectories() {
        let mut e = engine();
        let mut ts = 1000;
        // 43 frames sweep 1.77 turns, just short of firing.
        for k in 0..43u64 {
            let a = TAU * 2.0 * k as f32 / 48.0;
            let hand = testing::two_finger_pose()
                .shift(0.05 * a.cos(), 0.05 * a.sin(), 0.0)
                .build();
            assert_ne!(e.classify(&[hand], ts), Some(Symbol::De));
            ts += 33;
        }
        assert_eq!(e.classify(&[], ts), None);
        assert!(e.rotation.is_empty());
    }
}
