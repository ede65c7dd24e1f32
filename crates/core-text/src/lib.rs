//! Grapheme segmentation and display-width helpers shared by the document
//! core and the viewport.
//!
//! Nothing in this crate knows about files, keystrokes, or a particular
//! rendering back-end; it only answers "where are the cluster boundaries in
//! this string" and "how many terminal/pixel columns wide is this cluster".
//! Both `core-doc` (markup tokenizing, `render_line`) and `core-viewport`
//! (line measurement) depend on it.

pub mod grapheme;
pub mod width;

pub use width::egc_width;
