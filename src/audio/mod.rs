//! Audio utilities.
//! Device selection, reference tones and frequency analysis.

pub mod algorithms;
pub mod analysis;
pub mod devices;
pub mod tone;
pub mod windows;
