//! Feed rendering module for Atom 1.0 output.
//!
//! The scrape layer produces a normalized [`Channel`](crate::channel::Channel);
//! this module serializes one into an Atom 1.0 document:
//!
//! - [`render`] - Pretty-printed XML via the `quick-xml` writer
//!
//! Rendering is pure: no I/O, and byte-identical output for identical input.

mod atom;

pub use atom::render;
