//! Single-document PDF viewer core
//!
//! Page render scheduling and fit/zoom state for a viewer that shows one PDF page
//! at a time. Parsing and rasterization are delegated to a [`pdf_engine::PdfEngine`];
//! this crate decides *what* to render and *when*:
//!
//! - view state (current page, scale, fit mode) owned by a [`RenderScheduler`]
//! - fit-to-viewport scaling in auto, width and page modes
//! - at most one render in flight, with later requests coalesced into a single
//!   trailing render of the latest state
//! - translation of buttons, keys, modifier+wheel, swipes and resizes into
//!   navigation, zoom and refit requests
//!
//! # Example
//!
//! ```no_run
//! use pdf_engine::LopdfEngine;
//! use std::path::Path;
//! use viewer_core::{Button, InputEvent, Viewer, ViewerConfig, Viewport};
//!
//! let mut viewer = Viewer::new(LopdfEngine::new(), ViewerConfig::default())
//!     .expect("default config is valid")
//!     .with_viewport(Viewport::new(800.0, 600.0).with_device_pixel_ratio(2.0));
//!
//! viewer.load(Path::new("document.pdf")).expect("document should open");
//! viewer.dispatch(InputEvent::Button(Button::Next));
//! viewer.run_until_idle();
//!
//! println!("{}", viewer.indicator());
//! ```

mod config;
mod error;
mod fit;
mod indicator;
mod input;
mod layout;
mod scheduler;
mod viewer;

pub use config::{ConfigError, ViewerConfig, MAX_SCALE_PRECISION};
pub use error::{ViewerError, ViewerResult};
pub use fit::{clamp_scale, compute_fit_scale, round_scale, FitMode, Viewport};
pub use indicator::StatusIndicator;
pub use input::{Button, InputEvent, InputTranslator, Key, ViewerAction};
pub use layout::SurfaceLayout;
pub use scheduler::{
    RenderOutcome, RenderPlan, RenderScheduler, RenderTicket, SchedulerStats, ViewState,
};
pub use viewer::{RenderedFrame, Viewer};
