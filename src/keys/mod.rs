//! Key names and combinations.

pub mod combo;
pub mod normalize;

pub use combo::{ComboError, Combination, Modifier};
pub use normalize::normalize;
