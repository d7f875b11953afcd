//! Two-hand digits 6-9: fingertips of one hand laid on the other's open palm.

use crate::geometry::primitives::{dist3, finger_extended, palm_facing_camera};
use crate::geometry::symbol::Symbol;
use crate::landmarks::{Finger, HandLandmarks, Joint};

/// A composite digit: which fingertips must rest on the palm.
#[derive(Debug, Clone, Copy)]
pub struct CompositeRule {
    pub symbol: Symbol,
    pub tips: &'static [Finger],
    /// When false, a thumb resting on the palm rules the digit out.
    pub thumb_may_touch: bool,
    /// Upper bound on other straight fingers of the touching hand.
    pub max_other_extended: Option<usize>,
}

/// Descending by contact count; the first rule that holds wins.
pub const COMPOSITE_RULES: [CompositeRule; 4] = [
    CompositeRule {
        symbol: Symbol::Nine,
        tips: &[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky],
        thumb_may_touch: false,
        max_other_extended: None,
    },
    CompositeRule {
        symbol: Symbol::Eight,
        tips: &[Finger::Thumb, Finger::Index, Finger::Middle],
        thumb_may_touch: true,
        max_other_extended: None,
    },
    CompositeRule {
        symbol: Symbol::Seven,
        tips: &[Finger::Index, Finger::Middle],
        thumb_may_touch: false,
        max_other_extended: None,
    },
    CompositeRule {
        symbol: Symbol::Six,
        tips: &[Finger::Thumb],
        thumb_may_touch: true,
        max_other_extended: Some(2),
    },
];

/// Touching fingers must be at least this straight.
const TOUCH_EXTENDED_DEG: f32 = 150.0;

/// Five extended, spread fingers.
pub fn open_palm(hand: &HandLandmarks) -> bool {
    let thumb = finger_extended(hand, Finger::Thumb, 150.0)
        && hand.ndist(Joint::ThumbTip, Joint::Wrist) > 0.75;
    let fingers = Finger::FOUR
        .into_iter()
        .all(|f| finger_extended(hand, f, 165.0));
    let spread = hand.ndist(Joint::IndexTip, Joint::PinkyTip) > 0.85;
    thumb && fingers && spread
}

/// Closest distance from a fingertip to the palm's reference points, in the
/// palm hand's scale.
fn tip_to_palm(toucher: &HandLandmarks, finger: Finger, palm: &HandLandmarks) -> f32 {
    let tip = toucher[finger.tip()];
    Joint::palm_targets()
        .into_iter()
        .map(|j| dist3(tip, palm[j]))
        .fold(f32::MAX, f32::min)
        / palm.palm_scale()
}

impl CompositeRule {
    /// `palm` is the presenting hand, `toucher` the one laying fingers on it.
    pub fn holds(
        &self,
        palm: &HandLandmarks,
        toucher: &HandLandmarks,
        touch_threshold: f32,
        face_ratio: f32,
    ) -> bool {
        if !open_palm(palm) || !palm_facing_camera(palm, face_ratio) {
            return false;
        }

        let touching = |f: Finger| tip_to_palm(toucher, f, palm) < touch_threshold;
        if !self.tips.iter().all(|f| touching(*f)) {
            return false;
        }
        if !self
            .tips
            .iter()
            .all(|f| finger_extended(toucher, *f, TOUCH_EXTENDED_DEG))
        {
            return false;
        }
        if !self.thumb_may_touch && touching(Finger::Thumb) {
            return false;
        }

        if let Some(max) = self.max_other_extended {
            let others = Finger::FOUR
                .into_iter()
                .filter(|f| finger_extended(toucher, *f, 165.0))
                .count();
            if others > max {
                return false;
            }
        }
        true
    }
}

/// First composite digit formed by the pair, trying both role assignments.
pub fn classify_pair(
    a: &HandLandmarks,
    b: &HandLandmarks,
    touch_threshold: f32,
    face_ratio: f32,
) -> Option<Symbol> {
    COMPOSITE_RULES
        .iter()
        .find(|rule| {
            rule.holds(a, b, touch_threshold, face_ratio)
                || rule.holds(b, a, touch_threshold, face_ratio)
        })
        .map(|rule| rule.symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::testing::{self, palm_toucher};

    const TOUCH: f32 = 0.55;
    const FACE: f32 = 1.15;

    fn rule(symbol: Symbol) -> CompositeRule {
        *COMPOSITE_RULES.iter().find(|r| r.symbol == symbol).unwrap()
    }

    #[test]
    fn open_palm_fixture_presents() {
        assert!(open_palm(&testing::open_palm()));
        assert!(!open_palm(&testing::fist()));
    }

    #[test]
    fn four_fingers_read_nine() {
        let palm = testing::open_palm();
        let toucher = palm_toucher(&[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]);
        assert_eq!(classify_pair(&palm, &toucher, TOUCH, FACE), Some(Symbol::Nine));
        assert_eq!(classify_pair(&toucher, &palm, TOUCH, FACE), Some(Symbol::Nine));
    }

    #[test]
    fn higher_contact_count_wins() {
        let palm = testing::open_palm();

        // Four fingertips also satisfy the two-finger "7".
        let nine = palm_toucher(&[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]);
        assert!(rule(Symbol::Seven).holds(&palm, &nine, TOUCH, FACE));
        assert_eq!(classify_pair(&palm, &nine, TOUCH, FACE), Some(Symbol::Nine));

        // Thumb plus two fingers also satisfies the thumb-only "6".
        let eight = palm_toucher(&[Finger::Thumb, Finger::Index, Finger::Middle]);
        assert!(rule(Symbol::Six).holds(&palm, &eight, TOUCH, FACE));
        assert_eq!(classify_pair(&palm, &eight, TOUCH, FACE), Some(Symbol::Eight));
    }

    #[test]
    fn seven_and_six() {
        let palm = testing::open_palm();
        let seven = palm_toucher(&[Finger::Index, Finger::Middle]);
        assert_eq!(classify_pair(&palm, &seven, TOUCH, FACE), Some(Symbol::Seven));

        let six = palm_toucher(&[Finger::Thumb]);
        assert_eq!(classify_pair(&palm, &six, TOUCH, FACE), Some(Symbol::Six));
    }

    #[test]
    fn hands_apart_form_nothing() {
        let palm = testing::open_palm();
        let far = testing::HandBuilder::new().shift(0.6, 0.0, 0.0).build();
        assert_eq!(classify_pair(&palm, &far, TOUCH, FACE), None);
    }
}
