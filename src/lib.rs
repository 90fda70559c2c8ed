//! Tracescope crate root: re-exports and module wiring.
//!
//! A real-time streaming downsample-and-render core: a producer fills a
//! shared ring buffer ([`SourceBuffer`]); a UI timer polls each
//! [`ScopeView`] roughly every 20 ms, which folds the new samples into
//! per-pixel columns and keeps a persistent bitmap up to date. Pausing
//! turns the ring into a scrubbable history; a trigger watch can align
//! sweeps to TTL events and average them across trials.
//!
//! The windowing framework, option panels and persistence plumbing live
//! outside this crate; they drive a view through its setters, the
//! [`ViewController`] handle and the [`persistence`] snapshot.

pub mod aggregate;
pub mod channels;
pub mod color_scheme;
pub mod columns;
pub mod config;
pub mod controllers;
pub mod error;
pub mod persistence;
pub mod plotters;
pub mod render;
pub mod ring;
pub mod scrollback;
pub mod source;
pub mod stats;
pub mod trigger;
pub mod view;

// Public re-exports for a compact external API
pub use channels::Channel;
pub use color_scheme::ColorScheme;
pub use config::{DrawMethod, ViewConfig};
pub use controllers::ViewController;
pub use error::{Result, ScopeError};
pub use persistence::ViewStateSerde;
pub use source::{SourceBuffer, EVENT_LINES};
pub use trigger::{TriggerPhase, TriggerPolarity};
pub use view::ScopeView;
