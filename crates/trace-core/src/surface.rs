//! The plotting surface a session renders into.

use serde::Serialize;

use crate::color::Color;
use crate::keygen::CurveKey;

/// Opaque handle to a series owned by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SeriesHandle(u64);

/// Everything a surface needs to draw one curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDescriptor {
    pub key: CurveKey,
    /// Address or formula text.
    pub name: String,
    pub axis_name: String,
    pub color: Color,
    pub active: bool,
    pub use_live_data: bool,
    pub use_archive_data: bool,
}

/// A renderer that turns curve descriptors into drawable series.
///
/// The session calls these only when a curve is created, retired or has its
/// descriptor change; it never asks the surface about coordinates or paint.
pub trait PlotSurface {
    fn add_series(&mut self, descriptor: SeriesDescriptor) -> SeriesHandle;

    fn remove_series(&mut self, handle: SeriesHandle);

    /// Series currently on the surface, in the order they were added.
    fn current_series(&self) -> Vec<SeriesHandle>;

    /// Refresh a live series after its axis, flags or address changed.
    ///
    /// The default re-adds the series, which reorders it to the end.
    fn update_series(&mut self, handle: SeriesHandle, descriptor: SeriesDescriptor) -> SeriesHandle {
        self.remove_series(handle);
        self.add_series(descriptor)
    }
}

/// In-memory surface that keeps descriptors in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    next: u64,
    series: Vec<(SeriesHandle, SeriesDescriptor)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn descriptor(&self, handle: SeriesHandle) -> Option<&SeriesDescriptor> {
        self.series.iter().find(|(h, _)| *h == handle).map(|(_, d)| d)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &SeriesDescriptor> {
        self.series.iter().map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl PlotSurface for RecordingSurface {
    fn add_series(&mut self, descriptor: SeriesDescriptor) -> SeriesHandle {
        self.next += 1;
        let handle = SeriesHandle(self.next);
        self.series.push((handle, descriptor));
        handle
    }

    fn remove_series(&mut self, handle: SeriesHandle) {
        self.series.retain(|(h, _)| *h != handle);
    }

    fn current_series(&self) -> Vec<SeriesHandle> {
        self.series.iter().map(|(h, _)| *h).collect()
    }

    // Keep the slot so list order survives flag changes.
    fn update_series(&mut self, handle: SeriesHandle, descriptor: SeriesDescriptor) -> SeriesHandle {
        match self.series.iter_mut().find(|(h, _)| *h == handle) {
            Some(slot) => {
                slot.1 = descriptor;
                handle
            }
            None => self.add_series(descriptor),
        }
    }
}
