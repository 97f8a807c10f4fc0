use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Lattice side. The population holds `side * side` cells.
    pub side: usize,

    /// Probability of infection (S -> I) from an infected neighbor.
    pub prob_infect: f64,
    /// Probability of recovery (I -> R).
    pub prob_recover: f64,
    /// Probability of immunity loss (R -> S).
    pub prob_relapse: f64,

    /// Probability of birth into a vacancy (V -> S) next to a susceptible neighbor.
    pub prob_birth: f64,
    /// Probability of natural death (S -> V, R -> V).
    pub prob_death: f64,
    /// Additional death probability while infected; the I -> V rule
    /// fires with probability `prob_death + prob_death_infected`.
    pub prob_death_infected: f64,

    /// Fraction of the population relocated per iteration.
    pub migration_rate: f64,

    /// Number of iterations per run.
    pub iterations: usize,

    /// Seed for the random number generator; seeded from OS entropy when absent.
    pub seed: Option<u64>,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_num(self.side, 1..1024).context("invalid lattice side")?;

        check_num(self.prob_infect, 0.0..=1.0).context("invalid infection probability")?;
        check_num(self.prob_recover, 0.0..=1.0).context("invalid recovery probability")?;
        check_num(self.prob_relapse, 0.0..=1.0).context("invalid relapse probability")?;
        check_num(self.prob_birth, 0.0..=1.0).context("invalid birth probability")?;
        check_num(self.prob_death, 0.0..=1.0).context("invalid death probability")?;
        check_num(self.prob_death_infected, 0.0..=1.0)
            .context("invalid infected death probability")?;

        // The I -> V rule draws a single Bernoulli with the combined probability.
        let prob_death_total = self.prob_death + self.prob_death_infected;
        if prob_death_total > 1.0 {
            bail!(
                "prob_death + prob_death_infected must be at most 1.0, \
                 but is {prob_death_total}"
            );
        }

        check_num(self.migration_rate, 0.0..=1.0).context("invalid migration rate")?;

        check_num(self.iterations, 1..1_000_000).context("invalid number of iterations")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            side: 10,
            prob_infect: 0.20,
            prob_recover: 0.10,
            prob_relapse: 0.05,
            prob_birth: 0.70,
            prob_death: 0.01,
            prob_death_infected: 0.05,
            migration_rate: 0.2,
            iterations: 40,
            seed: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let mut cfg = valid_config();
        cfg.prob_infect = 1.2;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.prob_birth = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_combined_death_probability_above_one() {
        let mut cfg = valid_config();
        cfg.prob_death = 0.6;
        cfg.prob_death_infected = 0.6;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_side_and_zero_iterations() {
        let mut cfg = valid_config();
        cfg.side = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = valid_config();
        cfg.iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn deserializes_from_toml() {
        let cfg: Config = toml::from_str(
            r#"
side = 10
prob_infect = 0.20
prob_recover = 0.10
prob_relapse = 0.05
prob_birth = 0.70
prob_death = 0.01
prob_death_infected = 0.05
migration_rate = 0.2
iterations = 40
"#,
        )
        .unwrap();
        assert_eq!(cfg, valid_config());
    }
}
