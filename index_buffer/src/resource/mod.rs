//! Resource module
//!
//! Device-resident resources built on top of the graphics device.

pub mod index_buffer;

pub use index_buffer::IndexBuffer;
