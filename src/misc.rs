//! Small helpers that don't belong anywhere else.

pub mod buf_writer;
pub mod ring_buffer;
mod similarity;

pub use similarity::{similarity, Similarity};
