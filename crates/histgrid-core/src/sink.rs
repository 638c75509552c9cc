//! Output boundary for completed grids

use crate::assembler::TableLayout;
use crate::errors::EmitError;
use crate::grid::Grid;
use crate::types::TimeWindow;

/// One completed grid ready to be written
#[derive(Debug, Clone, Copy)]
pub struct Emission<'g> {
    pub grid: &'g Grid,

    /// Requested span the grid covers (used for file naming)
    pub span: TimeWindow,

    pub layout: TableLayout,

    /// Position of the window in the plan; `None` for a run-wide grid
    pub window_index: Option<usize>,
}

/// Receives completed grids in ascending window order
pub trait GridSink {
    fn emit(&mut self, emission: &Emission<'_>) -> Result<(), EmitError>;
}

impl<T: GridSink + ?Sized> GridSink for &mut T {
    fn emit(&mut self, emission: &Emission<'_>) -> Result<(), EmitError> {
        (**self).emit(emission)
    }
}

/// Owned copy of an emission kept by [`CollectingSink`]
#[derive(Debug, Clone)]
pub struct CollectedGrid {
    pub grid: Grid,
    pub span: TimeWindow,
    pub layout: TableLayout,
    pub window_index: Option<usize>,
}

/// In-memory sink, used by tests and library callers that post-process grids
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub emitted: Vec<CollectedGrid>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GridSink for CollectingSink {
    fn emit(&mut self, emission: &Emission<'_>) -> Result<(), EmitError> {
        self.emitted.push(CollectedGrid {
            grid: emission.grid.clone(),
            span: emission.span,
            layout: emission.layout,
            window_index: emission.window_index,
        });
        Ok(())
    }
}
