//! Hand landmark data structures.
//!
//! A hand is 21 joints in image-normalized space: x grows to the right,
//! y grows downward, z is relative depth (smaller is closer to the camera).
//! No handedness is carried; two-hand logic tries both role assignments.

use std::ops::Index;

// ── Joint definitions ──────────────────────────────────────

/// The 21 hand joints, in engine output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 21;

impl Joint {
    /// Convert joint enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The four knuckles (index..pinky MCP).
    pub fn knuckles() -> [Joint; 4] {
        [Self::IndexMcp, Self::MiddleMcp, Self::RingMcp, Self::PinkyMcp]
    }

    /// Reference points of the palm surface: wrist plus the four knuckles.
    pub fn palm_targets() -> [Joint; 5] {
        [
            Self::Wrist,
            Self::IndexMcp,
            Self::MiddleMcp,
            Self::RingMcp,
            Self::PinkyMcp,
        ]
    }
}

/// A digit of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Self::Thumb,
        Self::Index,
        Self::Middle,
        Self::Ring,
        Self::Pinky,
    ];

    /// The four non-thumb fingers.
    pub const FOUR: [Finger; 4] = [Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    /// Joint chain from base to tip (thumb: CMC, MCP, IP, tip).
    pub fn joints(&self) -> [Joint; 4] {
        match self {
            Self::Thumb => [Joint::ThumbCmc, Joint::ThumbMcp, Joint::ThumbIp, Joint::ThumbTip],
            Self::Index => [Joint::IndexMcp, Joint::IndexPip, Joint::IndexDip, Joint::IndexTip],
            Self::Middle => [
                Joint::MiddleMcp,
                Joint::MiddlePip,
                Joint::MiddleDip,
                Joint::MiddleTip,
            ],
            Self::Ring => [Joint::RingMcp, Joint::RingPip, Joint::RingDip, Joint::RingTip],
            Self::Pinky => [Joint::PinkyMcp, Joint::PinkyPip, Joint::PinkyDip, Joint::PinkyTip],
        }
    }

    pub fn base(&self) -> Joint {
        self.joints()[0]
    }

    pub fn tip(&self) -> Joint {
        self.joints()[3]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumb => "thumb",
            Self::Index => "index",
            Self::Middle => "middle",
            Self::Ring => "ring",
            Self::Pinky => "pinky",
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// A joint position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Point3) -> [f32; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }

    /// Projection onto the image plane.
    pub fn xy(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

impl From<[f32; 3]> for Point3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

// ── Hand ───────────────────────────────────────────────────

/// Joint positions of one detected hand.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Point3; JOINT_COUNT],
}

impl HandLandmarks {
    pub fn new(points: [Point3; JOINT_COUNT]) -> Self {
        Self { points }
    }

    /// Build from an engine's output slice. Returns `None` unless exactly
    /// 21 points are present.
    pub fn from_slice(points: &[Point3]) -> Option<Self> {
        let points: [Point3; JOINT_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn points(&self) -> &[Point3; JOINT_COUNT] {
        &self.points
    }
}

impl Index<Joint> for HandLandmarks {
    type Output = Point3;

    fn index(&self, joint: Joint) -> &Point3 {
        &self.points[joint.index()]
    }
}
