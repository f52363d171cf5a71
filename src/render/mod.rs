//! Defect rendering through `${key}` templates.

pub mod defect;
pub mod template;

pub use defect::{DefectRenderer, RenderError, RenderedDefect, EVENTS_KEY};
pub use template::{Segment, Template};
