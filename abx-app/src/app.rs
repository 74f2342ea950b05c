use crate::cli::Args;
use crate::sink::HttpSink;
use abx_cache::PoolCache;
use abx_core::{AbxTrial, Condition, Phase, Side, StandardPhase, StimulusPool, StimulusRecord};
use abx_experiment::{
    CsvFileSink, ExperimentConfig, MemorySink, Recorder, SessionEvent, SessionStateMachine, Sink,
    participant_file_stem,
};
use abx_timing::HighPrecisionTimer;
use anyhow::{Context, Result, bail};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

type Session = SessionStateMachine<StandardPhase, HighPrecisionTimer>;

enum Choice {
    Answer(Side),
    Quit,
}

/// Terminal front end: one prompt per trial, answers typed as `a`/`b`
pub struct App<R: BufRead, W: Write> {
    args: Args,
    config: ExperimentConfig,
    cache: PoolCache,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(args: Args, input: R, output: W) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => ExperimentConfig::from_json_file(path)?,
            None => ExperimentConfig::default(),
        };
        args.apply(&mut config);
        config.validate()?;

        let cache = PoolCache::new(config.stim_root.clone(), config.drivers.clone());
        Ok(Self {
            args,
            config,
            cache,
            input,
            output,
        })
    }

    pub fn run(mut self) -> Result<()> {
        writeln!(self.output, "=== ABX PILOT ===")?;
        let participant = self.participant()?;
        let Some(pool) = self.welcome()? else {
            info!("quit before start");
            return Ok(());
        };

        let timer = HighPrecisionTimer::new();
        let config = self.config.clone();
        let seed = config.seed;
        let mut session = match seed {
            Some(seed) => {
                Session::new(config, &participant, &pool, timer, &mut StdRng::seed_from_u64(seed))
            }
            None => Session::new(config, &participant, &pool, timer, &mut rand::rng()),
        }?;
        let mut recorder = Recorder::new(session.participant(), self.build_sink());

        session.handle_event(SessionEvent::ParticipantStarted);
        let aborted = self.run_trials(&mut session, &mut recorder)?;

        let summary = session.summary();
        summary.log();
        let out = self.args.out.clone();
        let paths = recorder
            .write_exports(&out)
            .with_context(|| format!("failed to write results to {}", out.display()))?;
        let summary_path = out.join(format!(
            "{}_summary.json",
            participant_file_stem(session.participant())
        ));
        summary
            .write_json(&summary_path)
            .with_context(|| format!("failed to write {}", summary_path.display()))?;

        if aborted {
            writeln!(self.output, "\nSession stopped early.")?;
        } else {
            writeln!(self.output, "\nAll done, thank you!")?;
        }
        writeln!(self.output, "Results: {}", paths.log.display())?;
        if let Some(backup) = &paths.backup {
            writeln!(
                self.output,
                "{} rows could not be delivered; local backup: {}",
                recorder.backup().len(),
                backup.display()
            )?;
        }
        writeln!(self.output, "Summary: {}", summary_path.display())?;
        Ok(())
    }

    /// Returns `true` when the participant quit before the end
    fn run_trials<S: Sink>(
        &mut self,
        session: &mut Session,
        recorder: &mut Recorder<S>,
    ) -> Result<bool> {
        while !session.is_complete() {
            let progress = session.trial_progress();
            let label = if session.current_phase().is_practice() {
                "Practice"
            } else {
                "Trial"
            };
            let Some(trial) = session.present().cloned() else {
                let events = session.update();
                if events.is_empty() {
                    break;
                }
                for event in events {
                    session.handle_event(event);
                }
                continue;
            };

            if let Some((pos, total)) = progress {
                writeln!(
                    self.output,
                    "\n{} {}/{} - mode: {}",
                    label,
                    pos,
                    total,
                    trial.condition.as_str().to_uppercase()
                )?;
            }
            self.render_trial(&trial)?;

            match self.read_choice()? {
                Choice::Answer(side) => {
                    if let Some(response) = session.record_response(side) {
                        recorder.record(&response);
                    }
                }
                Choice::Quit => {
                    warn!("{} quit during the session", session.participant());
                    return Ok(true);
                }
            }

            for event in session.update() {
                session.handle_event(event);
            }
        }
        Ok(false)
    }

    fn render_trial(&mut self, trial: &AbxTrial) -> Result<()> {
        self.render_stimulus("X (reference)", &trial.x)?;
        self.render_stimulus("A", &trial.a)?;
        self.render_stimulus("B", &trial.b)?;
        Ok(())
    }

    fn render_stimulus(&mut self, label: &str, record: &StimulusRecord) -> Result<()> {
        let path = self.asset_path(record);
        writeln!(
            self.output,
            "  {:<14} [{}] {}",
            label,
            record.kind().label(),
            path.display()
        )?;
        Ok(())
    }

    fn asset_path(&self, record: &StimulusRecord) -> PathBuf {
        self.cache.root().join(&record.path)
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn read_choice(&mut self) -> Result<Choice> {
        loop {
            write!(self.output, "Which matches X? [a/b, q to quit] ")?;
            let Some(line) = self.read_line()? else {
                return Ok(Choice::Quit);
            };
            if line.eq_ignore_ascii_case("q") {
                return Ok(Choice::Quit);
            }
            match line.parse::<Side>() {
                Ok(side) => return Ok(Choice::Answer(side)),
                Err(_) => writeln!(self.output, "Please answer A or B.")?,
            }
        }
    }

    fn participant(&mut self) -> Result<String> {
        if let Some(p) = self.args.participant.clone().filter(|p| !p.trim().is_empty()) {
            return Ok(p.trim().to_string());
        }
        write!(self.output, "Participant ID (e.g. test01): ")?;
        match self.read_line()? {
            Some(p) if !p.is_empty() => Ok(p),
            _ => bail!("a participant id is required to start"),
        }
    }

    /// Shows the pool and waits for the start key; `r` rescans the stimulus folder
    fn welcome(&mut self) -> Result<Option<Arc<StimulusPool>>> {
        let mut pool = self
            .cache
            .get()
            .with_context(|| format!("cannot scan {}", self.cache.root().display()))?;
        loop {
            if pool.is_empty() {
                bail!(
                    "no stimuli found under {}; expected <driver>/*_fp.png, *_heat.png or *.wav",
                    self.cache.root().display()
                );
            }
            let counts: Vec<String> = Condition::ALL
                .iter()
                .map(|c| format!("{} {}", pool.count_by_condition(*c), c))
                .collect();
            writeln!(
                self.output,
                "{} stimuli ({}). Modes: {}.",
                pool.len(),
                counts.join(", "),
                self.config
                    .conditions
                    .iter()
                    .map(Condition::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(self.output, "Press Enter to start, r to rescan, q to quit: ")?;
            match self.read_line()?.as_deref() {
                Some("") => return Ok(Some(pool)),
                Some("r") | Some("R") => {
                    pool = self.cache.rescan()?;
                }
                None | Some("q") | Some("Q") => return Ok(None),
                Some(_) => {}
            }
        }
    }

    fn build_sink(&self) -> Box<dyn Sink> {
        if let Some(url) = &self.args.sink_url {
            info!("sending responses to {}", url);
            Box::new(HttpSink::new(url.as_str()))
        } else if let Some(sheet) = &self.args.sheet {
            info!("appending responses to {}", sheet.display());
            Box::new(CsvFileSink::new(sheet.clone()))
        } else {
            Box::new(MemorySink::new())
        }
    }
}
