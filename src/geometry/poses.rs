//! Static hand-shape predicates.
//!
//! Letter predicates (`А Б В Г Е Ж`), the preconditions that gate the
//! trajectory gestures, and the raised-finger digit fallback. Every predicate
//! is a pure function of one hand.

use crate::geometry::primitives::{
    angle_2d, angle_between, finger_curled, finger_extended, palm_is_sideways,
    pinky_edge_vertical, thumb_flexed_and_tucked, wrist_not_bent,
};
use crate::geometry::symbol::Symbol;
use crate::landmarks::{Finger, HandLandmarks, Joint};

const FIST_COMPACT: f32 = 1.10;

fn all_curled(hand: &HandLandmarks) -> bool {
    Finger::FOUR.into_iter().all(|f| finger_curled(hand, f))
}

fn all_extended(hand: &HandLandmarks, threshold_deg: f32) -> bool {
    Finger::FOUR
        .into_iter()
        .all(|f| finger_extended(hand, f, threshold_deg))
}

fn mean_y(hand: &HandLandmarks, joints: &[Joint]) -> f32 {
    joints.iter().map(|j| hand[*j].y).sum::<f32>() / joints.len() as f32
}

fn fingertips() -> [Joint; 4] {
    Finger::FOUR.map(|f| f.tip())
}

// ── Letters ────────────────────────────────────────────────

/// "А": closed fist, thumb folded against it, knuckles above the wrist.
pub fn letter_a(hand: &HandLandmarks) -> bool {
    if !thumb_flexed_and_tucked(hand) || !all_curled(hand) {
        return false;
    }
    let compact = fingertips()
        .into_iter()
        .all(|tip| hand.ndist(tip, Joint::Wrist) < FIST_COMPACT);
    if !compact {
        return false;
    }
    // Upright hand: knuckles sit above the wrist in the image.
    mean_y(hand, &Joint::knuckles()) + 0.01 < hand[Joint::Wrist].y
}

/// "Б": index straight, middle bent against it, ring and pinky curled,
/// thumb touching the curled fingers.
pub fn letter_be(hand: &HandLandmarks) -> bool {
    let index_straight = finger_extended(hand, Finger::Index, 170.0);
    let middle_bent = !finger_extended(hand, Finger::Middle, 170.0);
    let middle_on_index = hand
        .ndist(Joint::MiddleTip, Joint::IndexPip)
        .min(hand.ndist(Joint::MiddleTip, Joint::IndexDip))
        < 0.65;
    let ring_pinky_curled =
        finger_curled(hand, Finger::Ring) && finger_curled(hand, Finger::Pinky);
    let thumb_touch = hand.ndist(Joint::ThumbTip, Joint::RingTip) < 0.6
        || hand.ndist(Joint::ThumbTip, Joint::PinkyTip) < 0.65;
    let hand_up = hand[Joint::IndexTip].y + 0.02 < hand[Joint::Wrist].y;

    index_straight && middle_bent && middle_on_index && ring_pinky_curled && thumb_touch && hand_up
}

/// "В": four straight fingers side by side with the palm edge-on.
pub fn letter_ve(hand: &HandLandmarks) -> bool {
    if !all_extended(hand, 170.0) {
        return false;
    }
    let thumb_in = hand.ndist(Joint::ThumbTip, Joint::Wrist) < 1.2;

    let zs = fingertips().map(|tip| hand[tip].z);
    let max = zs.iter().copied().fold(f32::MIN, f32::max);
    let min = zs.iter().copied().fold(f32::MAX, f32::min);
    let flat = max - min < 0.10;

    thumb_in && flat && palm_is_sideways(hand)
}

/// "Г": index and thumb straight at a wide angle, index pointing down,
/// other fingers bent.
pub fn letter_ge(hand: &HandLandmarks) -> bool {
    let index_straight = finger_extended(hand, Finger::Index, 155.0);
    let thumb_straight = finger_extended(hand, Finger::Thumb, 145.0);
    let others_bent = [Finger::Middle, Finger::Ring, Finger::Pinky]
        .into_iter()
        .all(|f| !finger_extended(hand, f, 160.0));

    let thumb_dir = hand[Joint::ThumbTip].sub(&hand[Joint::ThumbMcp]);
    let index_dir = hand[Joint::IndexTip].sub(&hand[Joint::IndexMcp]);
    let spread = angle_between(thumb_dir, index_dir);
    let wide = spread > 60.0 && spread < 150.0;

    // Image y grows downward.
    let pointing_down = index_dir[1] > 0.25 * index_dir[0].abs();

    index_straight && thumb_straight && others_bent && wide && pointing_down
}

/// "Е": fingers curled into an upright tunnel over a tucked thumb.
pub fn letter_ye(hand: &HandLandmarks) -> bool {
    if !all_curled(hand) || !thumb_flexed_and_tucked(hand) {
        return false;
    }
    let tunnel = hand.ndist(Joint::IndexTip, Joint::MiddleTip) < 0.55
        && hand.ndist(Joint::MiddleTip, Joint::RingTip) < 0.55
        && hand.ndist(Joint::RingTip, Joint::PinkyTip) < 0.55;
    let hand_up = mean_y(hand, &fingertips()) + 0.02 < hand[Joint::Wrist].y;
    tunnel && hand_up
}

/// "Ж": all fingertips gathered into a tight beak with the thumb, hand
/// upright, edge-on and unbent at the wrist.
pub fn letter_zhe(hand: &HandLandmarks) -> bool {
    if !pinky_edge_vertical(hand, 12.0, 0.30) || !wrist_not_bent(hand, 0.07, 0.60) {
        return false;
    }
    if !all_extended(hand, 155.0) {
        return false;
    }

    let adjacent = [
        hand.ndist(Joint::IndexTip, Joint::MiddleTip),
        hand.ndist(Joint::MiddleTip, Joint::RingTip),
        hand.ndist(Joint::RingTip, Joint::PinkyTip),
    ];
    if adjacent.iter().any(|d| *d >= 0.34) || hand.ndist(Joint::IndexTip, Joint::PinkyTip) >= 0.55 {
        return false;
    }

    let thumb_to_cluster = fingertips()
        .into_iter()
        .map(|tip| hand.ndist(Joint::ThumbTip, tip))
        .fold(f32::MAX, f32::min);
    if thumb_to_cluster >= 0.55 {
        return false;
    }

    let tip_spread = adjacent.iter().sum::<f32>() / 3.0;
    let knuckle_spread = (hand.ndist(Joint::IndexMcp, Joint::MiddleMcp)
        + hand.ndist(Joint::MiddleMcp, Joint::RingMcp)
        + hand.ndist(Joint::RingMcp, Joint::PinkyMcp))
        / 3.0;
    if tip_spread >= 0.65 * knuckle_spread {
        return false;
    }

    palm_is_sideways(hand)
}

/// Predicate for a static-tier letter, if it has one.
pub fn static_predicate(symbol: Symbol) -> Option<fn(&HandLandmarks) -> bool> {
    match symbol {
        Symbol::A => Some(letter_a),
        Symbol::Be => Some(letter_be),
        Symbol::Ve => Some(letter_ve),
        Symbol::Ge => Some(letter_ge),
        Symbol::Ye => Some(letter_ye),
        Symbol::Zhe => Some(letter_zhe),
        _ => None,
    }
}

// ── Trajectory preconditions ───────────────────────────────

/// Index and middle raised together, ring and pinky down. Circled for "Д".
pub fn two_finger_pose(hand: &HandLandmarks) -> bool {
    finger_extended(hand, Finger::Index, 160.0)
        && finger_extended(hand, Finger::Middle, 160.0)
        && hand.ndist(Joint::IndexTip, Joint::MiddleTip) < 0.35
        && !finger_extended(hand, Finger::Ring, 160.0)
        && !finger_extended(hand, Finger::Pinky, 160.0)
}

/// Curled tunnel with the thumb tucked. Twisted for "Ё".
pub fn tunnel_pose(hand: &HandLandmarks) -> bool {
    if !all_curled(hand) || !thumb_flexed_and_tucked(hand) {
        return false;
    }
    hand.ndist(Joint::IndexTip, Joint::MiddleTip) < 0.60
        && hand.ndist(Joint::MiddleTip, Joint::RingTip) < 0.60
        && hand.ndist(Joint::RingTip, Joint::PinkyTip) < 0.60
        && hand.ndist(Joint::IndexTip, Joint::PinkyTip) < 0.95
}

/// Only the index finger out, thumb kept close. Traced for "З".
pub fn pointing_pose(hand: &HandLandmarks) -> bool {
    finger_extended(hand, Finger::Index, 165.0)
        && finger_curled(hand, Finger::Middle)
        && finger_curled(hand, Finger::Ring)
        && finger_curled(hand, Finger::Pinky)
        && hand.ndist(Joint::ThumbTip, Joint::Wrist) < 1.20
}

/// Thumb and index tips pinched, not all of the other fingers straight.
/// Flicked sideways for "КОШКА".
pub fn pinch_pose(hand: &HandLandmarks) -> bool {
    let pinch = hand.ndist(Joint::ThumbTip, Joint::IndexTip);
    let reference = [
        hand.ndist(Joint::IndexTip, Joint::MiddleTip),
        hand.ndist(Joint::ThumbTip, Joint::MiddleTip),
        hand.ndist(Joint::IndexTip, Joint::IndexMcp),
        hand.ndist(Joint::ThumbTip, Joint::ThumbMcp),
    ]
    .into_iter()
    .fold(f32::MAX, f32::min);
    if pinch >= 0.55 * reference {
        return false;
    }

    // Three straight fingers behind the pinch is the "0" ring instead.
    let rest_straight = [Finger::Middle, Finger::Ring, Finger::Pinky]
        .into_iter()
        .all(|f| finger_extended(hand, f, 165.0));
    !rest_straight
}

/// Thumb and index rounded into a ring with the other three fingers straight
/// and held together. Reads as "0".
pub fn ring_pose(hand: &HandLandmarks) -> bool {
    if hand.ndist(Joint::ThumbTip, Joint::IndexTip) >= 0.33 {
        return false;
    }

    let index_pip = angle_2d(hand[Joint::IndexMcp], hand[Joint::IndexPip], hand[Joint::IndexDip]);
    let index_dip = angle_2d(hand[Joint::IndexPip], hand[Joint::IndexDip], hand[Joint::IndexTip]);
    let index_round = index_pip < 150.0
        && index_dip < 165.0
        && hand.ndist(Joint::IndexTip, Joint::IndexMcp) < 1.10;
    if !index_round {
        return false;
    }

    let thumb_ip = angle_2d(hand[Joint::ThumbMcp], hand[Joint::ThumbIp], hand[Joint::ThumbTip]);
    if thumb_ip >= 165.0 || hand.ndist(Joint::ThumbTip, Joint::ThumbMcp) >= 1.05 {
        return false;
    }

    let rest_straight = finger_extended(hand, Finger::Middle, 150.0)
        && finger_extended(hand, Finger::Ring, 145.0)
        && finger_extended(hand, Finger::Pinky, 140.0);
    if !rest_straight {
        return false;
    }

    hand.ndist(Joint::MiddleTip, Joint::RingTip) < 0.65
        && hand.ndist(Joint::RingTip, Joint::PinkyTip) < 0.65
        && hand.ndist(Joint::MiddleTip, Joint::PinkyTip) < 0.95
}

// ── Finger count ───────────────────────────────────────────

/// Raised state of each finger, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerStates(pub [bool; 5]);

impl FingerStates {
    pub fn of(hand: &HandLandmarks) -> Self {
        let thumb = finger_extended(hand, Finger::Thumb, 150.0)
            && hand.ndist(Joint::ThumbTip, Joint::Wrist) > 0.85
            && hand.ndist(Joint::ThumbTip, Joint::IndexMcp) > 0.45;
        let [index, middle, ring, pinky] =
            Finger::FOUR.map(|f| finger_extended(hand, f, 165.0));
        Self([thumb, index, middle, ring, pinky])
    }

    /// Digit 1-5 for the exact raised patterns; anything else is no digit.
    pub fn digit(&self) -> Option<Symbol> {
        match self.0 {
            [true, true, true, true, true] => Some(Symbol::Five),
            [false, true, true, true, true] => Some(Symbol::Four),
            [false, true, true, true, false] => Some(Symbol::Three),
            [false, true, true, false, false] => Some(Symbol::Two),
            [false, true, false, false, false] => Some(Symbol::One),
            _ => None,
        }
    }
}

/// Last-resort reading by counting raised fingers.
///
/// A "4" held edge-on that also satisfies the "В" predicate reads as "В".
pub fn finger_count_symbol(hand: &HandLandmarks) -> Option<Symbol> {
    match FingerStates::of(hand).digit()? {
        Symbol::Four if palm_is_sideways(hand) && letter_ve(hand) => Some(Symbol::Ve),
        digit => Some(digit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing::{self, HandBuilder};

    #[test]
    fn open_palm_counts_five() {
        let hand = testing::open_palm();
        assert_eq!(
            FingerStates::of(&hand),
            FingerStates([true, true, true, true, true])
        );
        assert_eq!(finger_count_symbol(&hand), Some(Symbol::Five));
    }

    #[test]
    fn fist_satisfies_a() {
        let hand = testing::fist();
        assert!(letter_a(&hand));
        assert!(!letter_ve(&hand));
        assert!(!letter_ge(&hand));
        assert_eq!(FingerStates::of(&hand).digit(), None);
    }

    #[test]
    fn two_finger_pose_reads_two_statically() {
        let hand = testing::two_finger_pose().build();
        assert!(two_finger_pose(&hand));
        assert_eq!(finger_count_symbol(&hand), Some(Symbol::Two));
    }

    #[test]
    fn pointing_pose_reads_one() {
        let hand = testing::pointing_pose().build();
        assert!(pointing_pose(&hand));
        assert!(!two_finger_pose(&hand));
        assert_eq!(finger_count_symbol(&hand), Some(Symbol::One));
    }

    #[test]
    fn pinch_pose_is_not_a_ring() {
        let hand = testing::pinch_pose().build();
        assert!(pinch_pose(&hand));
        assert!(!ring_pose(&hand));
        assert!(letter_a(&hand));
    }

    #[test]
    fn four_facing_camera_is_four() {
        let hand = testing::four_fingers_pose().build();
        assert!(!palm_is_sideways(&hand));
        assert_eq!(finger_count_symbol(&hand), Some(Symbol::Four));
    }

    #[test]
    fn four_turned_edge_on_becomes_ve() {
        for angle in [60.0, 70.0, 85.0] {
            let hand = testing::four_fingers_pose().rotate_y(angle).build();
            assert!(letter_ve(&hand), "rotated {angle}°");
            assert_eq!(finger_count_symbol(&hand), Some(Symbol::Ve), "rotated {angle}°");
        }
    }

    #[test]
    fn beak_satisfies_zhe() {
        let hand = testing::beak_pose().build();
        assert!(letter_zhe(&hand));
    }

    #[test]
    fn beak_facing_camera_is_not_zhe() {
        let hand = testing::beak_pose().rotate_y(-80.0).build();
        assert!(!letter_zhe(&hand));
    }

    #[test]
    fn relaxed_hand_has_no_static_letter() {
        let hand = HandBuilder::new().build();
        for symbol in [Symbol::A, Symbol::Be, Symbol::Ve, Symbol::Ge, Symbol::Ye, Symbol::Zhe] {
            let predicate = static_predicate(symbol).unwrap();
            assert!(!predicate(&hand), "{symbol} matched a relaxed hand");
        }
        assert!(static_predicate(Symbol::Cat).is_none());
    }
}
