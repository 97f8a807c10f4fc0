use crate::config::Config;
use crate::model::{CellState, Grid};
use crate::stats::History;
use anyhow::{Result, bail};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::{Bernoulli, Uniform};

/// Simulation engine.
///
/// Holds the lattice, the random number generator, and the per-rule
/// Bernoulli distributions, and applies the three phases of the model
/// (disease dynamics, vital dynamics, migration) once per iteration.
///
/// Every phase performs its trials by sampling cells with replacement:
/// a cell may be visited several times or not at all within one phase.
pub struct Engine {
    grid: Grid,
    rng: ChaCha12Rng,

    n_trials: usize,
    n_migrations: usize,

    coord: Uniform<usize>,
    infect: Bernoulli,
    recover: Bernoulli,
    relapse: Bernoulli,
    birth: Bernoulli,
    death: Bernoulli,
    death_infected: Bernoulli,
}

impl Engine {
    /// Create a new `Engine` from a validated configuration and an initial grid.
    ///
    /// Seeds the random number generator from `cfg.seed` when present,
    /// otherwise from OS entropy.
    pub fn new(cfg: &Config, grid: Grid) -> Result<Self> {
        let rng = match cfg.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::try_from_os_rng()?,
        };
        Self::with_rng(cfg, grid, rng)
    }

    /// Create a new `Engine` with an injected random number generator.
    ///
    /// Two engines built with equal configurations, grids, and generator
    /// states produce identical trajectories.
    pub fn with_rng(cfg: &Config, grid: Grid, rng: ChaCha12Rng) -> Result<Self> {
        if grid.side() != cfg.side {
            bail!(
                "grid side must match the configured side {}, but is {}",
                cfg.side,
                grid.side()
            );
        }

        let n_trials = cfg.side * cfg.side;
        let n_migrations = (cfg.migration_rate * n_trials as f64) as usize;

        Ok(Self {
            grid,
            rng,
            n_trials,
            n_migrations,
            coord: Uniform::new(0, cfg.side)?,
            infect: Bernoulli::new(cfg.prob_infect)?,
            recover: Bernoulli::new(cfg.prob_recover)?,
            relapse: Bernoulli::new(cfg.prob_relapse)?,
            birth: Bernoulli::new(cfg.prob_birth)?,
            death: Bernoulli::new(cfg.prob_death)?,
            death_infected: Bernoulli::new(cfg.prob_death + cfg.prob_death_infected)?,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Run a finite batch of iterations and collect the full history.
    ///
    /// Emits `iterations + 1` observations, each taken before the phases
    /// of its iteration execute; observation 0 is the untouched initial
    /// grid. The phases also run after the final observation, matching
    /// the loop structure of the model, but that state is not observed.
    pub fn run(&mut self, iterations: usize) -> History {
        let mut history = History::new();
        for _ in 0..=iterations {
            history.record(self.grid.tally(), self.grid.clone());
            self.step();
        }
        history
    }

    /// Lazy stream of grid snapshots for an interactive consumer.
    ///
    /// Each `next()` call executes one full iteration in place and yields
    /// the resulting grid. The stream is infinite and cannot be rewound
    /// since the underlying grid mutates.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { engine: self }
    }

    /// Apply one full iteration: the three phases in fixed order.
    pub fn step(&mut self) {
        self.disease_phase();
        self.vital_phase();
        self.migration_phase();
    }

    fn draw_cell(&mut self) -> (usize, usize) {
        let row = self.coord.sample(&mut self.rng);
        let col = self.coord.sample(&mut self.rng);
        (row, col)
    }

    fn draw_neighbor(&mut self, row: usize, col: usize) -> CellState {
        let neighbors = self.grid.neighbors(row, col);
        neighbors[self.rng.random_range(0..neighbors.len())]
    }

    fn disease_phase(&mut self) {
        for _ in 0..self.n_trials {
            let (row, col) = self.draw_cell();
            self.disease_trial(row, col);
        }
    }

    // Each trial acts on the status read once at its start, so a
    // transition made by one rule never feeds another rule within the
    // same trial.
    fn disease_trial(&mut self, row: usize, col: usize) {
        match self.grid.get(row, col) {
            CellState::Susceptible => {
                let neighbor = self.draw_neighbor(row, col);
                if neighbor == CellState::Infected && self.infect.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Infected);
                }
            }
            CellState::Infected => {
                if self.recover.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Recovered);
                }
            }
            CellState::Recovered => {
                if self.relapse.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Susceptible);
                }
            }
            CellState::Vacant => {}
        }
    }

    fn vital_phase(&mut self) {
        for _ in 0..self.n_trials {
            let (row, col) = self.draw_cell();
            self.vital_trial(row, col);
        }
    }

    fn vital_trial(&mut self, row: usize, col: usize) {
        match self.grid.get(row, col) {
            CellState::Vacant => {
                let neighbor = self.draw_neighbor(row, col);
                if neighbor == CellState::Susceptible && self.birth.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Susceptible);
                }
            }
            CellState::Susceptible | CellState::Recovered => {
                if self.death.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Vacant);
                }
            }
            CellState::Infected => {
                if self.death_infected.sample(&mut self.rng) {
                    self.grid.set(row, col, CellState::Vacant);
                }
            }
        }
    }

    fn migration_phase(&mut self) {
        for _ in 0..self.n_migrations {
            let (row, col) = self.draw_cell();
            self.migration_trial(row, col);
        }
    }

    // One-directional copy: the sampled cell absorbs the neighbor's
    // state and the neighbor itself is left unchanged.
    fn migration_trial(&mut self, row: usize, col: usize) {
        let neighbor = self.draw_neighbor(row, col);
        self.grid.set(row, col, neighbor);
    }
}

/// Iterator over the grid snapshots of consecutive iterations.
///
/// See [`Engine::frames`].
pub struct Frames<'a> {
    engine: &'a mut Engine,
}

impl Iterator for Frames<'_> {
    type Item = Grid;

    fn next(&mut self) -> Option<Grid> {
        self.engine.step();
        Some(self.engine.grid().clone())
    }
}
