//! Layout and interaction engine for the threat graph explorer.
//!
//! The [`graph`] module tree is toolkit independent: it turns a raw JSON
//! payload into a canonical graph, lays it out, freezes it, and answers
//! selection, search and organize requests through a [`graph::Session`].
//! [`source`] and [`export`] sit at the I/O boundary.

pub mod export;
pub mod graph;
pub mod source;

pub use graph::{DisplayMode, Graph, Session, SessionConfig};
