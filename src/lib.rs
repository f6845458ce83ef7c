//! Typed event extraction and side-by-side alignment for ICC2
//! optimization logs.
//!
//! A log is loaded into a [`store::LineStore`], scanned by the enabled
//! [`collect::Collector`]s, merged into an [`index::EventIndex`], and
//! either listed on its own or aligned against a second log with
//! [`align::align`] and rendered by [`render`].

pub mod align;
pub mod collect;
pub mod config;
pub mod event;
pub mod index;
pub mod render;
pub mod store;
