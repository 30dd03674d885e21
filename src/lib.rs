//! Raster sketching core: a pixel surface driven by pointer gestures, with
//! freehand, shape, move-selection and flood-fill tools, a PNG-backed undo
//! log, session files and a headless script runner.

pub mod canvas;
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod fill;
pub mod history;
pub mod io;
pub mod logger;
pub mod project;
pub mod raster;
pub mod script;
pub mod surface;
pub mod tools;
pub mod transfer;

pub use canvas::Canvas;
pub use error::{SketchError, SketchResult};
pub use surface::{PixelSurface, Point};
pub use tools::{Outcome, ShapeStyle, StrokeParams, Tool};
