//! Core types for the trace plotting session.
//!
//! This crate owns the symbolic graph behind a plot: curves keyed `PV<n>`,
//! the axes that order them, and the formula dependencies between curves.
//! Rendering is delegated to a [`surface::PlotSurface`].

pub mod axis;
pub mod color;
pub mod curve;
pub mod dependency;
pub mod error;
pub mod keygen;
pub mod layout;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod surface;

pub use axis::{Axis, AxisCollection, AxisId};
pub use color::{Color, ColorAssigner};
pub use curve::{Curve, CurveDefaults, CurveKind};
pub use error::{PlotError, Result};
pub use keygen::{CurveKey, KeyGenerator};
pub use layout::Layout;
pub use registry::{CurveRegistry, DanglingPolicy, Removal, Replacement};
pub use session::{CommitReport, EditOutcome, PlotSession, SessionOptions};
pub use surface::{PlotSurface, RecordingSurface, SeriesDescriptor, SeriesHandle};
