//! Synthetic hand fixtures for exercising the geometry rules.
//!
//! `HandBuilder` starts from a relaxed right hand with the palm toward the
//! camera and every finger pointing up, then reshapes individual fingers.
//! The named fixtures below are the poses the rule tests rely on.

use crate::landmarks::{Finger, HandLandmarks, JOINT_COUNT, Joint, Point3};

const WRIST: [f32; 3] = [0.50, 0.80, 0.0];
const FINGER_SEGMENTS: [f32; 3] = [0.06, 0.04, 0.03];
const THUMB_SEGMENTS: [f32; 3] = [0.05, 0.04, 0.03];

fn base_of(finger: Finger) -> [f32; 3] {
    match finger {
        Finger::Thumb => [0.45, 0.77, 0.0],
        Finger::Index => [0.44, 0.62, 0.0],
        Finger::Middle => [0.50, 0.60, 0.0],
        Finger::Ring => [0.56, 0.62, 0.0],
        Finger::Pinky => [0.61, 0.65, 0.0],
    }
}

fn segments_of(finger: Finger) -> [f32; 3] {
    if finger == Finger::Thumb {
        THUMB_SEGMENTS
    } else {
        FINGER_SEGMENTS
    }
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn scaled(v: [f32; 3], k: f32) -> [f32; 3] {
    [v[0] * k, v[1] * k, v[2] * k]
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    scaled(v, 1.0 / len)
}

/// Where a touching fingertip lands on the other hand's open palm.
fn palm_contact_point(finger: Finger) -> [f32; 3] {
    match finger {
        Finger::Thumb => [0.50, 0.78, -0.02],
        Finger::Index => [0.44, 0.62, -0.02],
        Finger::Middle => [0.50, 0.60, -0.02],
        Finger::Ring => [0.56, 0.62, -0.02],
        Finger::Pinky => [0.61, 0.65, -0.02],
    }
}

/// Fluent constructor for synthetic hands.
#[derive(Debug, Clone)]
pub struct HandBuilder {
    points: [[f32; 3]; JOINT_COUNT],
}

impl Default for HandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HandBuilder {
    pub fn new() -> Self {
        let mut points = [[0.0; 3]; JOINT_COUNT];
        points[Joint::Wrist.index()] = WRIST;
        for finger in Finger::ALL {
            points[finger.base().index()] = base_of(finger);
        }
        Self { points }
            .straight(Finger::Thumb, [-0.8, -0.5, 0.0])
            .straight(Finger::Index, [0.0, -1.0, 0.0])
            .straight(Finger::Middle, [0.0, -1.0, 0.0])
            .straight(Finger::Ring, [0.0, -1.0, 0.0])
            .straight(Finger::Pinky, [0.0, -1.0, 0.0])
    }

    fn get(&self, joint: Joint) -> [f32; 3] {
        self.points[joint.index()]
    }

    fn set(&mut self, joint: Joint, p: [f32; 3]) {
        self.points[joint.index()] = p;
    }

    /// Straighten a finger along `dir` from its base.
    pub fn straight(mut self, finger: Finger, dir: [f32; 3]) -> Self {
        let d = normalized(dir);
        let joints = finger.joints();
        let mut cur = self.get(joints[0]);
        for (joint, seg) in joints[1..].iter().zip(segments_of(finger)) {
            cur = add(cur, scaled(d, seg));
            self.set(*joint, cur);
        }
        self
    }

    /// Fold a finger into the palm.
    pub fn curl(mut self, finger: Finger) -> Self {
        let [base, pip, dip, tip] = finger.joints();
        let p = add(self.get(base), [0.0, -0.05, 0.0]);
        let d = add(p, [0.0, 0.0, -0.04]);
        let t = add(d, [0.0, 0.04, 0.0]);
        self.set(pip, p);
        self.set(dip, d);
        self.set(tip, t);
        self
    }

    /// Bend the thumb so its tip lands at `tip`.
    pub fn thumb_to(mut self, tip: [f32; 3]) -> Self {
        let mcp = add(self.get(Joint::ThumbCmc), [-0.03, -0.03, -0.01]);
        let ip = [
            (mcp[0] + tip[0]) / 2.0 - 0.015,
            (mcp[1] + tip[1]) / 2.0,
            (mcp[2] + tip[2]) / 2.0,
        ];
        self.set(Joint::ThumbMcp, mcp);
        self.set(Joint::ThumbIp, ip);
        self.set(Joint::ThumbTip, tip);
        self
    }

    /// Point a straight finger from its base so the tip lands exactly on `target`.
    pub fn reach(mut self, finger: Finger, target: [f32; 3]) -> Self {
        let joints = finger.joints();
        let base = self.get(joints[0]);
        let segs = segments_of(finger);
        let total: f32 = segs.iter().sum();
        let delta = [target[0] - base[0], target[1] - base[1], target[2] - base[2]];
        let mut acc = 0.0;
        for (joint, seg) in joints[1..].iter().zip(segs) {
            acc += seg;
            self.set(*joint, add(base, scaled(delta, acc / total)));
        }
        self.set(finger.tip(), target);
        self
    }

    /// Translate the whole hand.
    pub fn shift(mut self, dx: f32, dy: f32, dz: f32) -> Self {
        for p in self.points.iter_mut() {
            *p = add(*p, [dx, dy, dz]);
        }
        self
    }

    /// Turn the hand about the vertical axis through the wrist.
    pub fn rotate_y(mut self, degrees: f32) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let w = self.get(Joint::Wrist);
        for p in self.points.iter_mut() {
            let x = p[0] - w[0];
            let z = p[2] - w[2];
            p[0] = w[0] + x * c + z * s;
            p[2] = w[2] - x * s + z * c;
        }
        self
    }

    /// Grow or shrink the hand about the wrist.
    pub fn scale(mut self, factor: f32) -> Self {
        let w = self.get(Joint::Wrist);
        for p in self.points.iter_mut() {
            for axis in 0..3 {
                p[axis] = w[axis] + (p[axis] - w[axis]) * factor;
            }
        }
        self
    }

    pub fn build(self) -> HandLandmarks {
        HandLandmarks::new(self.points.map(Point3::from))
    }
}

// ── Named poses ────────────────────────────────────────────

/// Five spread fingers, palm toward the camera. Reads as "5".
pub fn open_palm_pose() -> HandBuilder {
    HandBuilder::new()
        .straight(Finger::Index, [-0.25, -1.0, 0.0])
        .straight(Finger::Ring, [0.12, -1.0, 0.0])
        .straight(Finger::Pinky, [0.35, -1.0, 0.0])
}

pub fn open_palm() -> HandLandmarks {
    open_palm_pose().build()
}

/// Closed fist with the thumb folded across the knuckles. Reads as "А".
pub fn fist_pose() -> HandBuilder {
    Finger::FOUR
        .into_iter()
        .fold(HandBuilder::new(), |b, f| b.curl(f))
        .thumb_to([0.47, 0.68, -0.03])
}

pub fn fist() -> HandLandmarks {
    fist_pose().build()
}

/// Index and middle up and slightly apart, ring and pinky folded.
/// Static reading is "2"; circling it draws "Д".
pub fn two_finger_pose() -> HandBuilder {
    HandBuilder::new()
        .curl(Finger::Ring)
        .curl(Finger::Pinky)
        .straight(Finger::Index, [0.1, -1.0, 0.0])
        .straight(Finger::Middle, [-0.1, -1.0, 0.0])
        .thumb_to([0.47, 0.70, -0.03])
}

/// Only the index finger raised. Static reading is "1"; tracing a zigzag draws "З".
pub fn pointing_pose() -> HandBuilder {
    HandBuilder::new()
        .curl(Finger::Middle)
        .curl(Finger::Ring)
        .curl(Finger::Pinky)
        .thumb_to([0.47, 0.70, -0.03])
}

/// Fist with the thumb tip pressed against the index knuckle.
/// Still reads as "А"; a sideways flick makes "КОШКА".
pub fn pinch_pose() -> HandBuilder {
    Finger::FOUR
        .into_iter()
        .fold(HandBuilder::new(), |b, f| b.curl(f))
        .thumb_to([0.445, 0.615, -0.04])
}

/// Four fingers up and fanned, thumb folded. "4" facing the camera,
/// "В" once turned edge-on.
pub fn four_fingers_pose() -> HandBuilder {
    HandBuilder::new()
        .straight(Finger::Index, [0.3, -1.0, 0.0])
        .straight(Finger::Middle, [0.05, -1.0, 0.0])
        .straight(Finger::Ring, [-0.2, -1.0, 0.0])
        .straight(Finger::Pinky, [-0.4, -1.0, 0.0])
        .thumb_to([0.50, 0.70, -0.03])
}

/// All five fingertips gathered into a beak, hand turned edge-on. Reads as "Ж".
pub fn beak_pose() -> HandBuilder {
    HandBuilder::new()
        .reach(Finger::Index, [0.51, 0.45, 0.0])
        .reach(Finger::Middle, [0.52, 0.44, 0.0])
        .reach(Finger::Ring, [0.53, 0.45, 0.0])
        .reach(Finger::Pinky, [0.54, 0.46, 0.0])
        .reach(Finger::Thumb, [0.50, 0.47, 0.0])
        .rotate_y(80.0)
}

/// Second hand placed in front of and below `open_palm`, with the given
/// fingertips resting on the palm. Other non-thumb fingers are folded.
pub fn palm_toucher(touching: &[Finger]) -> HandLandmarks {
    let mut builder = HandBuilder::new().shift(0.0, 0.25, -0.05);
    for finger in Finger::ALL {
        if touching.contains(&finger) {
            builder = builder.reach(finger, palm_contact_point(finger));
        } else if finger != Finger::Thumb {
            builder = builder.curl(finger);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::dist3;

    #[test]
    fn builder_keeps_segment_lengths() {
        let hand = HandBuilder::new().build();
        let seg = dist3(hand[Joint::IndexMcp], hand[Joint::IndexPip]);
        assert!((seg - 0.06).abs() < 1e-5);
        let seg = dist3(hand[Joint::ThumbIp], hand[Joint::ThumbTip]);
        assert!((seg - 0.03).abs() < 1e-5);
    }

    #[test]
    fn reach_lands_tip_on_target() {
        let hand = HandBuilder::new()
            .reach(Finger::Middle, [0.3, 0.3, -0.1])
            .build();
        assert_eq!(hand[Joint::MiddleTip], Point3::new(0.3, 0.3, -0.1));
    }

    #[test]
    fn rotation_pivots_on_wrist() {
        let hand = HandBuilder::new().rotate_y(45.0).build();
        assert_eq!(hand[Joint::Wrist], Point3::new(0.50, 0.80, 0.0));
        let tip = hand[Joint::PinkyTip];
        assert!(tip.z < 0.0, "pinky side should turn toward the camera");
    }
}
