//! Utility helpers shared by the mapping and configuration code.

pub mod safe_cast;
