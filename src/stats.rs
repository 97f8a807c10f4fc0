use crate::model::{Counts, Grid};
use serde::{Deserialize, Serialize};

/// Per-iteration count of each cell state across a run.
///
/// The four vectors always have equal length, one entry per observation,
/// indexed by iteration. This is the time series handed to an external
/// charting tool.
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsSeries {
    pub susceptible: Vec<usize>,
    pub infected: Vec<usize>,
    pub recovered: Vec<usize>,
    pub vacant: Vec<usize>,
}

impl CountsSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, counts: Counts) {
        self.susceptible.push(counts.susceptible);
        self.infected.push(counts.infected);
        self.recovered.push(counts.recovered);
        self.vacant.push(counts.vacant);
    }

    pub fn len(&self) -> usize {
        self.susceptible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.susceptible.is_empty()
    }
}

/// Full record of a batch run: the counts time series plus the grid
/// observed at each iteration, in iteration order.
#[derive(Debug, Default)]
pub struct History {
    pub counts: CountsSeries,
    pub grids: Vec<Grid>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, counts: Counts, grid: Grid) {
        self.counts.push(counts);
        self.grids.push(grid);
    }
}
