//! Geometric sign recognition over hand landmarks.

pub mod engine;
pub mod poses;
pub mod primitives;
pub mod symbol;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod testing;
pub mod trajectory;
pub mod two_hand;

pub use engine::{EngineConfig, GestureEngine, StaticPriority};
pub use symbol::Symbol;
