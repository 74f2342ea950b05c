use abx_core::Condition;
use abx_experiment::ExperimentConfig;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "ABX listening/viewing test runner")]
pub struct Args {
    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Stimulus root, one subdirectory per driver (overrides config)
    #[arg(long)]
    pub stim: Option<PathBuf>,

    /// Participant id; asked for on startup when omitted
    #[arg(long)]
    pub participant: Option<String>,

    /// Number of experiment trials (overrides config)
    #[arg(long)]
    pub trials: Option<usize>,

    /// Number of practice trials (overrides config)
    #[arg(long)]
    pub practice: Option<usize>,

    /// Conditions to include, e.g. viz,heat,aud (overrides config)
    #[arg(long, value_delimiter = ',')]
    pub modes: Option<Vec<Condition>>,

    /// Driver directories to scan, e.g. VER,RUS,NOR (overrides config)
    #[arg(long, value_delimiter = ',')]
    pub drivers: Option<Vec<String>>,

    /// RNG seed for a reproducible trial sequence
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append each response to this CSV file
    #[arg(long)]
    pub sheet: Option<PathBuf>,

    /// POST each response as JSON to this URL
    #[arg(long, conflicts_with = "sheet")]
    pub sink_url: Option<String>,

    /// Directory for the result exports
    #[arg(long, default_value = "results")]
    pub out: PathBuf,
}

impl Args {
    /// Command-line values win over the config file
    pub fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(stim) = &self.stim {
            config.stim_root = stim.clone();
        }
        if let Some(trials) = self.trials {
            config.experiment_trials = trials;
        }
        if let Some(practice) = self.practice {
            config.practice_trials = practice;
        }
        if let Some(modes) = &self.modes {
            config.conditions = modes.clone();
        }
        if let Some(drivers) = &self.drivers {
            config.drivers = drivers.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "abx-pilot",
            "--trials",
            "12",
            "--modes",
            "viz,aud",
            "--drivers",
            "VER,NOR",
            "--seed",
            "5",
        ]);
        let mut config = ExperimentConfig::default();
        args.apply(&mut config);

        assert_eq!(config.experiment_trials, 12);
        assert_eq!(config.conditions, vec![Condition::Viz, Condition::Aud]);
        assert_eq!(config.drivers, vec!["VER", "NOR"]);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.practice_trials, 0);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Args::try_parse_from(["abx-pilot", "--modes", "viz,video"]).is_err());
    }

    #[test]
    fn sheet_and_url_are_exclusive() {
        assert!(
            Args::try_parse_from(["abx-pilot", "--sheet", "a.csv", "--sink-url", "http://x"])
                .is_err()
        );
    }
}
