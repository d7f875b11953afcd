//! Scale-invariant geometric primitives over hand landmarks.
//!
//! Distances are normalized by the palm scale (wrist to middle-finger base)
//! so every threshold is independent of how far the hand is from the camera.

use crate::landmarks::{Finger, HandLandmarks, Joint, Point3};

const EPS: f32 = 1e-9;

/// Both PIP and DIP angles must be below this for a finger to count as curled.
pub const CURLED_ANGLE_DEG: f32 = 165.0;
/// A curled finger's tip lies within this many palm scales of its base.
pub const CURLED_TIP_TO_BASE: f32 = 0.75;
/// Thumb counts as flexed when its IP angle is below this.
pub const THUMB_FLEX_DEG: f32 = 165.0;
/// A tucked thumb tip lies within this many palm scales of the index or middle knuckle.
pub const THUMB_TUCK_DIST: f32 = 0.90;

// ── Vector helpers ─────────────────────────────────────────

fn norm3(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean distance in 3D.
pub fn dist3(a: Point3, b: Point3) -> f32 {
    norm3(a.sub(&b))
}

/// Euclidean distance in the image plane.
pub fn dist2(a: Point3, b: Point3) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Angle ABC at `b` in degrees, 3D.
pub fn angle_3d(a: Point3, b: Point3, c: Point3) -> f32 {
    let ba = a.sub(&b);
    let bc = c.sub(&b);
    let cos = dot3(ba, bc) / ((norm3(ba) + EPS) * (norm3(bc) + EPS));
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle ABC at `b` in degrees, projected onto the image plane.
///
/// Degenerate segments (shorter than 1e-6) read as a straight line.
pub fn angle_2d(a: Point3, b: Point3, c: Point3) -> f32 {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);
    let ab = bax.hypot(bay);
    let cb = bcx.hypot(bcy);
    if ab < 1e-6 || cb < 1e-6 {
        return 180.0;
    }
    let cos = (bax * bcx + bay * bcy) / (ab * cb);
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle between two free vectors in degrees.
pub fn angle_between(v1: [f32; 3], v2: [f32; 3]) -> f32 {
    let cos = dot3(v1, v2) / ((norm3(v1) + EPS) * (norm3(v2) + EPS));
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

// ── Hand measurements ──────────────────────────────────────

impl HandLandmarks {
    /// Wrist to middle-finger base distance, the normalization unit.
    pub fn palm_scale(&self) -> f32 {
        dist3(self[Joint::Wrist], self[Joint::MiddleMcp]) + EPS
    }

    /// Palm scale measured in the image plane.
    pub fn palm_scale_2d(&self) -> f32 {
        dist2(self[Joint::Wrist], self[Joint::MiddleMcp]) + 1e-6
    }

    /// Distance between two joints in palm scales.
    pub fn ndist(&self, a: Joint, b: Joint) -> f32 {
        dist3(self[a], self[b]) / self.palm_scale()
    }

    /// Normal of the palm plane spanned by wrist, index base and pinky base.
    pub fn palm_normal(&self) -> [f32; 3] {
        let wrist = self[Joint::Wrist];
        cross(
            self[Joint::IndexMcp].sub(&wrist),
            self[Joint::PinkyMcp].sub(&wrist),
        )
    }
}

/// Joint angles at the two middle joints of a finger (PIP and DIP; thumb MCP and IP).
pub fn finger_angles(hand: &HandLandmarks, finger: Finger) -> (f32, f32) {
    let [base, first, second, tip] = finger.joints();
    (
        angle_3d(hand[base], hand[first], hand[second]),
        angle_3d(hand[first], hand[second], hand[tip]),
    )
}

/// Both inter-joint angles exceed `threshold_deg`.
pub fn finger_extended(hand: &HandLandmarks, finger: Finger, threshold_deg: f32) -> bool {
    let (a, b) = finger_angles(hand, finger);
    a > threshold_deg && b > threshold_deg
}

/// Both inter-joint angles are bent and the tip is folded back near its base.
pub fn finger_curled(hand: &HandLandmarks, finger: Finger) -> bool {
    let (a, b) = finger_angles(hand, finger);
    a < CURLED_ANGLE_DEG
        && b < CURLED_ANGLE_DEG
        && hand.ndist(finger.tip(), finger.base()) < CURLED_TIP_TO_BASE
}

/// Thumb bent at the IP joint with its tip resting against the fist.
pub fn thumb_flexed_and_tucked(hand: &HandLandmarks) -> bool {
    let ip_angle = angle_3d(
        hand[Joint::ThumbMcp],
        hand[Joint::ThumbIp],
        hand[Joint::ThumbTip],
    );
    let touch = hand
        .ndist(Joint::ThumbTip, Joint::IndexMcp)
        .min(hand.ndist(Joint::ThumbTip, Joint::MiddleMcp));
    ip_angle < THUMB_FLEX_DEG && touch < THUMB_TUCK_DIST
}

/// Palm turned edge-on to the camera: the normal points mostly along x.
pub fn palm_is_sideways(hand: &HandLandmarks) -> bool {
    let n = hand.palm_normal();
    n[0].abs() > n[2].abs()
}

/// Palm faces the camera: the normal's z component dominates x by `ratio`.
pub fn palm_facing_camera(hand: &HandLandmarks, ratio: f32) -> bool {
    let n = hand.palm_normal();
    n[2].abs() > n[0].abs() * ratio
}

/// Hand is not bent at the wrist.
///
/// The palm must not pitch up or down (small normal y) and the wrist must sit
/// at roughly the same depth as the knuckles.
pub fn wrist_not_bent(hand: &HandLandmarks, max_depth_gap: f32, max_normal_y: f32) -> bool {
    let n = hand.palm_normal();
    let len = norm3(n) + EPS;
    let pitch_ok = (n[1] / len).abs() < max_normal_y;

    let knuckle_z = Joint::knuckles().iter().map(|j| hand[*j].z).sum::<f32>() / 4.0;
    let depth_ok = (hand[Joint::Wrist].z - knuckle_z).abs() < max_depth_gap;

    pitch_ok && depth_ok
}

/// The wrist→pinky-base edge points straight up within `max_angle_deg`.
///
/// Edges shorter than `min_len` palm scales are treated as detection noise.
pub fn pinky_edge_vertical(hand: &HandLandmarks, max_angle_deg: f32, min_len: f32) -> bool {
    let wrist = hand[Joint::Wrist];
    let pinky = hand[Joint::PinkyMcp];
    let dx = pinky.x - wrist.x;
    let dy = pinky.y - wrist.y;

    // Image y grows downward, so "up" is negative dy.
    if dy >= 0.0 {
        return false;
    }

    let len = dx.hypot(dy);
    if len / hand.palm_scale() < min_len {
        return false;
    }

    let cos = (dy.abs() / (len + EPS)).clamp(-1.0, 1.0);
    cos.acos().to_degrees() <= max_angle_deg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing::{self, HandBuilder};

    fn p(x: f32, y: f32, z: f32) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn angles_of_simple_triplets() {
        let straight = angle_3d(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0));
        assert!((straight - 180.0).abs() < 0.01);

        let right = angle_3d(p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0));
        assert!((right - 90.0).abs() < 0.01);

        let right_2d = angle_2d(p(1.0, 0.0, 0.0), p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert!((right_2d - 90.0).abs() < 0.01);
    }

    #[test]
    fn degenerate_2d_angle_reads_straight() {
        // Points differing only in depth collapse in the image plane.
        let a = angle_2d(p(0.5, 0.5, 0.0), p(0.5, 0.5, -0.1), p(0.6, 0.5, 0.0));
        assert_eq!(a, 180.0);
    }

    #[test]
    fn normalized_distance_is_scale_invariant() {
        let near = HandBuilder::new().scale(1.6).build();
        let far = HandBuilder::new().scale(0.5).build();
        let a = near.ndist(Joint::ThumbTip, Joint::PinkyTip);
        let b = far.ndist(Joint::ThumbTip, Joint::PinkyTip);
        assert!((a - b).abs() < 1e-3, "{a} vs {b}");
        assert!((near.ndist(Joint::Wrist, Joint::MiddleMcp) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn extended_and_curled_fingers() {
        let open = testing::open_palm();
        for finger in Finger::FOUR {
            assert!(finger_extended(&open, finger, 165.0), "{}", finger.as_str());
            assert!(!finger_curled(&open, finger), "{}", finger.as_str());
        }

        let fist = testing::fist();
        for finger in Finger::FOUR {
            assert!(finger_curled(&fist, finger), "{}", finger.as_str());
            assert!(!finger_extended(&fist, finger, 150.0), "{}", finger.as_str());
        }
        assert!(thumb_flexed_and_tucked(&fist));
        assert!(!thumb_flexed_and_tucked(&open));
    }

    #[test]
    fn palm_orientation() {
        let facing = testing::open_palm();
        assert!(palm_facing_camera(&facing, 1.15));
        assert!(!palm_is_sideways(&facing));

        let sideways = HandBuilder::new().rotate_y(80.0).build();
        assert!(palm_is_sideways(&sideways));
        assert!(!palm_facing_camera(&sideways, 1.15));
    }

    #[test]
    fn wrist_and_pinky_edge() {
        let edge_on = HandBuilder::new().rotate_y(80.0).build();
        assert!(wrist_not_bent(&edge_on, 0.07, 0.60));
        assert!(pinky_edge_vertical(&edge_on, 12.0, 0.30));

        // Facing the camera the wrist→pinky edge leans about 36° off vertical.
        let facing = HandBuilder::new().build();
        assert!(!pinky_edge_vertical(&facing, 12.0, 0.30));
    }
}
