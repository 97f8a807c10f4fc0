use crate::config::Config;
use crate::engine::Engine;
use crate::model::Grid;
use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Orchestrates a simulation directory.
///
/// The directory must contain a `config.toml` and may contain an
/// `initial.txt` grid layout; outputs are written next to them.
pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    /// Run a finite batch and write the counts series and grid dumps.
    pub fn run_simulation(&self) -> Result<()> {
        let grid = self.load_initial_grid().context("failed to load initial grid")?;
        let mut engine = Engine::new(&self.cfg, grid).context("failed to construct engine")?;

        let history = engine.run(self.cfg.iterations);
        log::info!("completed {} iterations", self.cfg.iterations);

        let results_file = self.sim_dir.join("results.json");
        let file = File::create(&results_file)
            .with_context(|| format!("failed to create {results_file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &history.counts)
            .context("failed to serialize counts series")?;
        log::info!("wrote {results_file:?}");

        let grids_file = self.sim_dir.join("grids.txt");
        let file = File::create(&grids_file)
            .with_context(|| format!("failed to create {grids_file:?}"))?;
        let mut writer = BufWriter::new(file);
        for (iteration, grid) in history.grids.iter().enumerate() {
            writeln!(writer, "step: {iteration}")?;
            writeln!(writer, "{grid}")?;
        }
        writer.flush().context("failed to flush writer stream")?;
        log::info!("wrote {grids_file:?}");

        Ok(())
    }

    /// Stream grid snapshots to stdout, one iteration per frame.
    ///
    /// Runs forever when `steps` is `None`.
    pub fn watch_simulation(&self, steps: Option<usize>) -> Result<()> {
        let grid = self.load_initial_grid().context("failed to load initial grid")?;
        let mut engine = Engine::new(&self.cfg, grid).context("failed to construct engine")?;

        println!("step: 0");
        println!("{}", engine.grid());

        let mut frames = engine.frames();
        let mut iteration = 0;
        while steps.is_none_or(|steps| iteration < steps) {
            let frame = frames.next().context("frame stream ended unexpectedly")?;
            iteration += 1;
            println!("step: {iteration}");
            println!("{frame}");
        }

        Ok(())
    }

    fn load_initial_grid(&self) -> Result<Grid> {
        let grid_file = self.sim_dir.join("initial.txt");
        if !grid_file.exists() {
            log::info!("no {grid_file:?}, using the default layout");
            return Ok(Grid::default_layout());
        }

        let layout = fs::read_to_string(&grid_file)
            .with_context(|| format!("failed to read {grid_file:?}"))?;
        Grid::parse(&layout, self.cfg.side)
            .with_context(|| format!("invalid grid in {grid_file:?}"))
    }
}
