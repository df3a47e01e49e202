//! Utility modules: case conversion, parameter merging, deadlines.

pub mod case;
pub mod params;
pub mod timeout;
