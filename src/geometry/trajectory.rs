//! Trajectory (dynamic) gestures.
//!
//! Each gesture pairs a static pose precondition with a tracked sample and a
//! firing test over the bounded sample history. `Tracker` owns the history,
//! the miss tolerance, and the per-gesture cooldown.

use std::collections::VecDeque;
use std::f32::consts::{PI, TAU};

use crate::geometry::poses;
use crate::geometry::symbol::Symbol;
use crate::landmarks::{HandLandmarks, Joint};

// ── Bounded history ────────────────────────────────────────

/// FIFO of samples that evicts the oldest entry once full.
#[derive(Debug, Clone)]
pub struct TrajectoryBuffer<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T> TrajectoryBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples oldest first.
    pub fn as_slice(&mut self) -> &[T] {
        self.samples.make_contiguous()
    }
}

// ── Gesture contract ───────────────────────────────────────

/// A gesture recognized from motion while a pose is held.
pub trait TrajectoryGesture {
    type Sample: std::fmt::Debug;

    fn symbol(&self) -> Symbol;

    /// Static pose that must hold for a frame to be tracked.
    fn precondition(&self, hand: &HandLandmarks) -> bool;

    fn sample(&self, hand: &HandLandmarks) -> Self::Sample;

    /// Whether the tracked history completes the gesture.
    fn fires(&self, history: &[Self::Sample]) -> bool;
}

/// Buffering, miss tolerance, and cooldown around one gesture.
#[derive(Debug)]
pub struct Tracker<G: TrajectoryGesture> {
    gesture: G,
    buffer: TrajectoryBuffer<G::Sample>,
    miss_tolerance: u32,
    misses: u32,
    cooldown_ms: u64,
    cooldown_until_ms: u64,
}

impl<G: TrajectoryGesture> Tracker<G> {
    pub fn new(gesture: G, capacity: usize, miss_tolerance: u32, cooldown_ms: u64) -> Self {
        Self {
            gesture,
            buffer: TrajectoryBuffer::new(capacity),
            miss_tolerance,
            misses: 0,
            cooldown_ms,
            cooldown_until_ms: 0,
        }
    }

    /// Feed one frame. Returns the gesture's symbol when it fires.
    ///
    /// While cooling down the frame is ignored entirely. A firing clears the
    /// history and starts the cooldown.
    pub fn observe(&mut self, hand: &HandLandmarks, now_ms: u64) -> Option<Symbol> {
        if now_ms < self.cooldown_until_ms {
            return None;
        }

        if !self.gesture.precondition(hand) {
            self.misses += 1;
            if self.misses > self.miss_tolerance {
                self.reset();
            }
            return None;
        }

        self.misses = 0;
        self.buffer.push(self.gesture.sample(hand));
        if !self.gesture.fires(self.buffer.as_slice()) {
            return None;
        }

        self.reset();
        self.cooldown_until_ms = now_ms + self.cooldown_ms;
        Some(self.gesture.symbol())
    }

    /// Drop the history and miss count. The cooldown is kept.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

// ── Shared math ────────────────────────────────────────────

/// Wrap an angle difference into (-π, π].
fn unwrap_delta(mut da: f32) -> f32 {
    if da > PI {
        da -= TAU;
    } else if da < -PI {
        da += TAU;
    }
    da
}

/// Floor under any configured `min_points` for the shape matchers, which
/// index both ends of the path.
const MIN_SHAPE_POINTS: usize = 2;

fn seg_len(a: [f32; 2], b: [f32; 2]) -> f32 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Signed number of turns a path sweeps around the mean of its points.
pub fn winding_turns(points: &[[f32; 2]]) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len() as f32;
    let cx = points.iter().map(|p| p[0]).sum::<f32>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f32>() / n;

    let total: f32 = points
        .windows(2)
        .map(|w| {
            let a0 = (w[0][1] - cy).atan2(w[0][0] - cx);
            let a1 = (w[1][1] - cy).atan2(w[1][0] - cx);
            unwrap_delta(a1 - a0)
        })
        .sum();
    total / TAU
}

/// Sum of absolute unwrapped angle changes.
pub fn total_spin(angles: &[f32]) -> f32 {
    angles
        .windows(2)
        .map(|w| unwrap_delta(w[1] - w[0]).abs())
        .sum()
}

/// Resample a polyline to `n` points evenly spaced by arc length.
pub fn resample_by_arc_length(points: &[[f32; 2]], n: usize) -> Vec<[f32; 2]> {
    if points.len() < 2 || n < 2 {
        return points.to_vec();
    }
    let total: f32 = points.windows(2).map(|w| seg_len(w[0], w[1])).sum();
    if total < 1e-9 {
        return vec![points[0]; n];
    }

    let step = total / (n - 1) as f32;
    let mut out = Vec::with_capacity(n);
    out.push(points[0]);
    let mut travelled = 0.0;
    let mut target = step;

    for w in points.windows(2) {
        if out.len() >= n {
            break;
        }
        let (prev, next) = (w[0], w[1]);
        let d = seg_len(prev, next);
        if d < 1e-9 {
            continue;
        }
        while travelled + d >= target && out.len() < n {
            let t = (target - travelled) / d;
            out.push([
                prev[0] + t * (next[0] - prev[0]),
                prev[1] + t * (next[1] - prev[1]),
            ]);
            target += step;
        }
        travelled += d;
    }

    let last = points[points.len() - 1];
    out.resize(n, last);
    out
}

/// Three-point moving average; endpoints are kept.
pub fn smooth3(points: &[[f32; 2]]) -> Vec<[f32; 2]> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let mut out = Vec::with_capacity(points.len());
    out.push(points[0]);
    for w in points.windows(3) {
        out.push([
            (w[0][0] + w[1][0] + w[2][0]) / 3.0,
            (w[0][1] + w[1][1] + w[2][1]) / 3.0,
        ]);
    }
    out.push(points[points.len() - 1]);
    out
}

// ── Rotation: "Д" ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RotationParams {
    pub capacity: usize,
    pub min_points: usize,
    pub min_turns: f32,
    pub cooldown_ms: u64,
}

impl Default for RotationParams {
    fn default() -> Self {
        Self {
            capacity: 120,
            min_points: 40,
            min_turns: 1.8,
            cooldown_ms: 800,
        }
    }
}

/// Two raised fingers circled repeatedly.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub params: RotationParams,
}

impl TrajectoryGesture for Rotation {
    type Sample = [f32; 2];

    fn symbol(&self) -> Symbol {
        Symbol::De
    }

    fn precondition(&self, hand: &HandLandmarks) -> bool {
        poses::two_finger_pose(hand)
    }

    fn sample(&self, hand: &HandLandmarks) -> [f32; 2] {
        hand[Joint::MiddleMcp].xy()
    }

    fn fires(&self, history: &[[f32; 2]]) -> bool {
        history.len() >= self.params.min_points
            && winding_turns(history).abs() >= self.params.min_turns
    }
}

// ── Spin: "Ё" ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SpinParams {
    pub capacity: usize,
    pub min_points: usize,
    pub min_total_rad: f32,
    pub cooldown_ms: u64,
}

impl Default for SpinParams {
    fn default() -> Self {
        Self {
            capacity: 120,
            min_points: 28,
            min_total_rad: PI * 1.2,
            cooldown_ms: 800,
        }
    }
}

/// Tunnel hand twisted about the forearm.
#[derive(Debug, Clone)]
pub struct Spin {
    pub params: SpinParams,
}

impl TrajectoryGesture for Spin {
    type Sample = f32;

    fn symbol(&self) -> Symbol {
        Symbol::Yo
    }

    fn precondition(&self, hand: &HandLandmarks) -> bool {
        poses::tunnel_pose(hand)
    }

    /// Angle of the knuckle line, which turns as the wrist rolls.
    fn sample(&self, hand: &HandLandmarks) -> f32 {
        let a = hand[Joint::IndexMcp];
        let b = hand[Joint::PinkyMcp];
        (b.y - a.y).atan2(b.x - a.x)
    }

    fn fires(&self, history: &[f32]) -> bool {
        history.len() >= self.params.min_points
            && total_spin(history) >= self.params.min_total_rad
    }
}

// ── Stroke: "З" ────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StrokeParams {
    pub capacity: usize,
    pub min_points: usize,
    pub resample_points: usize,
    pub min_span: f32,
    pub min_descent: f32,
    pub peak_margin: f32,
    pub min_peak_gap: usize,
    pub min_valley_depth: f32,
    pub sharp_turn_deg: f32,
    pub max_sharp_turns: usize,
    pub cooldown_ms: u64,
}

impl Default for StrokeParams {
    fn default() -> Self {
        Self {
            capacity: 220,
            min_points: 30,
            resample_points: 72,
            min_span: 0.30,
            min_descent: 0.35,
            peak_margin: 0.10,
            min_peak_gap: 12,
            min_valley_depth: 0.14,
            sharp_turn_deg: 85.0,
            max_sharp_turns: 2,
            cooldown_ms: 800,
        }
    }
}

/// Index fingertip tracing a "3"-like double bulge downward.
#[derive(Debug, Clone)]
pub struct Stroke {
    pub params: StrokeParams,
}

impl Stroke {
    /// The path shape test, independent of how the points were gathered.
    pub fn matches(&self, path: &[[f32; 2]]) -> bool {
        let p = &self.params;
        if path.len() < p.min_points.max(MIN_SHAPE_POINTS) {
            return false;
        }

        // Normalize by the larger bbox side so amplitude does not matter.
        let (mut min_x, mut max_x, mut min_y, mut max_y) =
            (f32::MAX, f32::MIN, f32::MAX, f32::MIN);
        for q in path {
            min_x = min_x.min(q[0]);
            max_x = max_x.max(q[0]);
            min_y = min_y.min(q[1]);
            max_y = max_y.max(q[1]);
        }
        let w = max_x - min_x + 1e-9;
        let h = max_y - min_y + 1e-9;
        let s = w.max(h);
        if w / s < p.min_span || h / s < p.min_span {
            return false;
        }

        let normalized: Vec<[f32; 2]> = path
            .iter()
            .map(|q| [(q[0] - min_x) / s, (q[1] - min_y) / s])
            .collect();
        let pts = smooth3(&resample_by_arc_length(&normalized, p.resample_points));
        let xs: Vec<f32> = pts.iter().map(|q| q[0]).collect();

        // Drawn top to bottom.
        if pts[pts.len() - 1][1] - pts[0][1] <= p.min_descent {
            return false;
        }

        let mut maxima = Vec::new();
        let mut minima = Vec::new();
        for i in 1..xs.len() - 1 {
            if xs[i - 1] < xs[i] && xs[i] > xs[i + 1] {
                maxima.push(i);
            }
            if xs[i - 1] > xs[i] && xs[i] < xs[i + 1] {
                minima.push(i);
            }
        }
        if maxima.len() < 2 || minima.is_empty() {
            return false;
        }

        let mean_x = xs.iter().sum::<f32>() / xs.len() as f32;
        let mut peaks: Vec<usize> = maxima
            .into_iter()
            .filter(|&i| xs[i] > mean_x + p.peak_margin)
            .collect();
        if peaks.len() < 2 {
            return false;
        }

        // Rightmost peak, then the next rightmost far enough along the path.
        peaks.sort_by(|&a, &b| xs[b].total_cmp(&xs[a]));
        let first = peaks[0];
        let Some(second) = peaks[1..]
            .iter()
            .copied()
            .find(|&i| i.abs_diff(first) >= p.min_peak_gap)
        else {
            return false;
        };
        let (p1, p2) = (first.min(second), first.max(second));

        let Some(valley) = minima
            .into_iter()
            .filter(|&i| p1 < i && i < p2)
            .min_by(|&a, &b| xs[a].total_cmp(&xs[b]))
        else {
            return false;
        };
        if xs[p1].min(xs[p2]) - xs[valley] <= p.min_valley_depth {
            return false;
        }

        // A Latin "Z" is a three-segment polyline with hard corners.
        let headings: Vec<f32> = pts
            .windows(2)
            .filter(|w| seg_len(w[0], w[1]) >= 1e-6)
            .map(|w| (w[1][1] - w[0][1]).atan2(w[1][0] - w[0][0]).to_degrees())
            .collect();
        let sharp = headings
            .windows(2)
            .filter(|w| {
                let mut da = w[1] - w[0];
                while da > 180.0 {
                    da -= 360.0;
                }
                while da < -180.0 {
                    da += 360.0;
                }
                da.abs() > p.sharp_turn_deg
            })
            .count();

        sharp <= p.max_sharp_turns
    }
}

impl TrajectoryGesture for Stroke {
    type Sample = [f32; 2];

    fn symbol(&self) -> Symbol {
        Symbol::Ze
    }

    fn precondition(&self, hand: &HandLandmarks) -> bool {
        poses::pointing_pose(hand)
    }

    fn sample(&self, hand: &HandLandmarks) -> [f32; 2] {
        hand[Joint::IndexTip].xy()
    }

    fn fires(&self, history: &[[f32; 2]]) -> bool {
        self.matches(history)
    }
}

// ── Pinch flick: "КОШКА" ───────────────────────────────────

#[derive(Debug, Clone)]
pub struct PinchParams {
    pub capacity: usize,
    pub min_points: usize,
    /// Consecutive precondition failures tolerated before the history clears.
    pub miss_tolerance: u32,
    /// History length at which a pinch counts as in progress and blocks "0".
    pub in_progress_points: usize,
    pub min_shift: f32,
    pub min_range: f32,
    pub max_vertical_ratio: f32,
    pub vertical_slack: f32,
    pub min_direction_ratio: f32,
    pub min_straightness: f32,
    pub cooldown_ms: u64,
}

impl Default for PinchParams {
    fn default() -> Self {
        Self {
            capacity: 35,
            min_points: 6,
            miss_tolerance: 3,
            in_progress_points: 3,
            min_shift: 0.22,
            min_range: 0.28,
            max_vertical_ratio: 0.60,
            vertical_slack: 0.02,
            min_direction_ratio: 0.62,
            min_straightness: 0.55,
            cooldown_ms: 600,
        }
    }
}

/// Pinch midpoint with the hand's 2D scale at that frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchSample {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

/// Short horizontal flick of a thumb–index pinch (a whisker stroke).
#[derive(Debug, Clone)]
pub struct PinchFlick {
    pub params: PinchParams,
}

impl PinchFlick {
    pub fn matches(&self, samples: &[PinchSample]) -> bool {
        let p = &self.params;
        let n = samples.len();
        if n < p.min_points.max(MIN_SHAPE_POINTS) {
            return false;
        }

        // Averaged endpoints.
        let k = (n / 3).clamp(2, 5);
        let mean = |s: &[PinchSample]| {
            let len = s.len() as f32;
            (
                s.iter().map(|q| q.x).sum::<f32>() / len,
                s.iter().map(|q| q.y).sum::<f32>() / len,
            )
        };
        let (x0, y0) = mean(&samples[..k]);
        let (x1, y1) = mean(&samples[n - k..]);

        let mut scales: Vec<f32> = samples.iter().map(|q| q.scale).collect();
        scales.sort_by(f32::total_cmp);
        let s = scales[n / 2];

        let dx = x1 - x0;
        let dy = y1 - y0;
        if dx.abs() < 1e-6 {
            return false;
        }
        let direction = dx.signum();

        let range = |f: fn(&PinchSample) -> f32| {
            let (lo, hi) = samples
                .iter()
                .map(f)
                .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
            (hi - lo) / s
        };
        let x_range = range(|q| q.x);
        let y_range = range(|q| q.y);

        let moved = dx.abs() / s > p.min_shift || x_range > p.min_range;
        let horizontal = y_range < p.max_vertical_ratio * x_range + p.vertical_slack;

        let (mut forward, mut travel) = (0.0, 0.0);
        let mut path = 0.0;
        for w in samples.windows(2) {
            let step = w[1].x - w[0].x;
            travel += step.abs();
            if step * direction > 0.0 {
                forward += step.abs();
            }
            path += step.hypot(w[1].y - w[0].y);
        }
        let steady = forward / (travel + 1e-9) > p.min_direction_ratio;
        let clean = dx.hypot(dy) / (path + 1e-9) > p.min_straightness;

        moved && horizontal && steady && clean
    }
}

impl TrajectoryGesture for PinchFlick {
    type Sample = PinchSample;

    fn symbol(&self) -> Symbol {
        Symbol::Cat
    }

    fn precondition(&self, hand: &HandLandmarks) -> bool {
        poses::pinch_pose(hand)
    }

    fn sample(&self, hand: &HandLandmarks) -> PinchSample {
        let thumb = hand[Joint::ThumbTip];
        let index = hand[Joint::IndexTip];
        PinchSample {
            x: 0.5 * (thumb.x + index.x),
            y: 0.5 * (thumb.y + index.y),
            scale: hand.palm_scale_2d(),
        }
    }

    fn fires(&self, history: &[PinchSample]) -> bool {
        self.matches(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing;

    fn circle(turns: f32, n: usize) -> Vec<[f32; 2]> {
        (0..n)
            .map(|i| {
                let a = TAU * turns * i as f32 / (n - 1) as f32;
                [0.5 + 0.1 * a.cos(), 0.5 + 0.1 * a.sin()]
            })
            .collect()
    }

    fn rotation() -> Rotation {
        Rotation {
            params: RotationParams::default(),
        }
    }

    fn stroke() -> Stroke {
        Stroke {
            params: StrokeParams::default(),
        }
    }

    #[test]
    fn buffer_evicts_oldest() {
        let mut buffer = TrajectoryBuffer::new(3);
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_slice(), &[2, 3, 4]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn winding_counts_signed_turns() {
        let ccw = winding_turns(&circle(2.0, 200));
        assert!((ccw - 2.0).abs() < 0.01, "{ccw}");

        let mut cw = circle(2.0, 200);
        cw.reverse();
        assert!((winding_turns(&cw) + 2.0).abs() < 0.01);
    }

    #[test]
    fn rotation_fires_just_above_threshold() {
        let r = rotation();
        assert!(!r.fires(&circle(1.77, 120)));
        assert!(r.fires(&circle(1.81, 120)));
    }

    #[test]
    fn winding_centre_follows_sample_density() {
        // A long dwell at the start pulls the centre toward it, so the
        // final partial loop counts for less than its arc.
        let at = |a: f32| [0.5 + 0.1 * a.cos(), 0.5 + 0.1 * a.sin()];
        let mut path = vec![at(0.0); 60];
        path.extend((0..60).map(|i| at(TAU * 1.82 * i as f32 / 59.0)));

        let turns = winding_turns(&path);
        assert!((turns - 1.749).abs() < 0.01, "{turns}");
        assert!(!rotation().fires(&path));
    }

    #[test]
    fn rotation_needs_enough_points() {
        assert!(!rotation().fires(&circle(2.5, 39)));
    }

    #[test]
    fn spin_accumulates_absolute_change() {
        let spin = Spin {
            params: SpinParams::default(),
        };
        // Back-and-forth twisting counts in both directions.
        let wobble: Vec<f32> = (0..30)
            .map(|i| if i % 2 == 0 { 0.0 } else { 0.2 })
            .collect();
        assert!(total_spin(&wobble) > 1.2 * PI);
        assert!(spin.fires(&wobble));

        let short = &wobble[..27];
        assert!(!spin.fires(short));

        let still = vec![0.3; 40];
        assert!(!spin.fires(&still));
    }

    #[test]
    fn spin_unwraps_across_pi() {
        let angles = [PI - 0.05, -PI + 0.05];
        assert!((total_spin(&angles) - 0.1).abs() < 1e-4);
    }

    #[test]
    fn resample_spaces_points_evenly() {
        let line = [[0.0, 0.0], [1.0, 0.0]];
        let out = resample_by_arc_length(&line, 5);
        assert_eq!(out.len(), 5);
        for (i, p) in out.iter().enumerate() {
            assert!((p[0] - i as f32 * 0.25).abs() < 1e-5);
        }
        assert_eq!(resample_by_arc_length(&[[0.2, 0.2], [0.2, 0.2]], 4).len(), 4);
    }

    #[test]
    fn stroke_accepts_double_bulge() {
        for n in [40, 60] {
            let path: Vec<[f32; 2]> = (0..n)
                .map(|i| {
                    let t = i as f32 / (n - 1) as f32;
                    [0.4 + 0.1 * (TAU * t).sin().abs(), 0.3 + 0.3 * t]
                })
                .collect();
            assert!(stroke().matches(&path), "{n} points");
        }
    }

    #[test]
    fn stroke_rejects_latin_z_and_lines() {
        let corners = [[0.3, 0.3], [0.5, 0.3], [0.3, 0.5], [0.5, 0.5]];
        let mut latin = Vec::new();
        for w in corners.windows(2) {
            for i in 0..15 {
                let t = i as f32 / 15.0;
                latin.push([
                    w[0][0] + t * (w[1][0] - w[0][0]),
                    w[0][1] + t * (w[1][1] - w[0][1]),
                ]);
            }
        }
        assert!(!stroke().matches(&latin));

        let vertical: Vec<[f32; 2]> = (0..60).map(|i| [0.5, 0.2 + 0.01 * i as f32]).collect();
        assert!(!stroke().matches(&vertical));
    }

    #[test]
    fn pinch_flick_needs_horizontal_travel() {
        let flick = PinchFlick {
            params: PinchParams::default(),
        };
        let sideways: Vec<PinchSample> = (0..7)
            .map(|i| PinchSample {
                x: 0.44 + 0.01 * i as f32,
                y: 0.61,
                scale: 0.2,
            })
            .collect();
        assert!(flick.matches(&sideways));
        assert!(!flick.matches(&sideways[..5]));

        let downward: Vec<PinchSample> = (0..7)
            .map(|i| PinchSample {
                x: 0.44,
                y: 0.61 + 0.01 * i as f32,
                scale: 0.2,
            })
            .collect();
        assert!(!flick.matches(&downward));
    }

    #[test]
    fn shape_matchers_tolerate_tiny_min_points() {
        let flick = PinchFlick {
            params: PinchParams {
                min_points: 0,
                ..PinchParams::default()
            },
        };
        let sample = PinchSample {
            x: 0.44,
            y: 0.61,
            scale: 0.2,
        };
        assert!(!flick.matches(&[]));
        assert!(!flick.matches(&[sample]));
        assert!(!flick.matches(&[sample, sample]));

        let stroke = Stroke {
            params: StrokeParams {
                min_points: 1,
                ..StrokeParams::default()
            },
        };
        assert!(!stroke.matches(&[]));
        assert!(!stroke.matches(&[[0.5, 0.5]]));
    }

    #[test]
    fn tracker_fires_once_then_cools_down() {
        let mut tracker = Tracker::new(rotation(), 120, 0, 800);
        let mut fired = Vec::new();
        for k in 0..60u64 {
            let a = TAU * 2.0 * k as f32 / 48.0;
            let hand = testing::two_finger_pose()
                .shift(0.05 * a.cos(), 0.05 * a.sin(), 0.0)
                .build();
            if tracker.observe(&hand, 1000 + 33 * k).is_some() {
                fired.push(k);
            }
        }
        assert_eq!(fired, vec![43]);
    }

    #[test]
    fn tracker_clears_on_broken_pose() {
        let mut tracker = Tracker::new(rotation(), 120, 0, 800);
        let pose = testing::two_finger_pose().build();
        for k in 0..5 {
            tracker.observe(&pose, k);
        }
        assert_eq!(tracker.len(), 5);
        tracker.observe(&testing::fist(), 6);
        assert!(tracker.is_empty());
    }

    #[test]
    fn tracker_tolerates_misses() {
        let flick = PinchFlick {
            params: PinchParams::default(),
        };
        let mut tracker = Tracker::new(flick, 35, 3, 600);
        let pinch = testing::pinch_pose().build();
        let open = testing::open_palm();

        tracker.observe(&pinch, 0);
        tracker.observe(&pinch, 1);
        for t in 2..5 {
            tracker.observe(&open, t);
        }
        assert_eq!(tracker.len(), 2, "three misses are tolerated");
        tracker.observe(&open, 5);
        assert!(tracker.is_empty(), "the fourth miss clears");
    }
}
