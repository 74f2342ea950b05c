use super::config::ExperimentConfig;
use super::error::SessionError;
use super::sampler::TrialSampler;
use super::summary::SessionSummary;
use super::trial::PlannedTrial;
use abx_core::{AbxTrial, Phase, Side, StimulusPool, TrialResponse, TrialState};
use abx_timing::Timer;
use rand::Rng;
use std::ops::Range;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ParticipantStarted,
    Response(Side),
    PhaseComplete,
}

/// One participant's run through the generated trial sequence.
///
/// All trials are drawn when the session is created. The session hands out
/// one trial at a time and never exposes trials beyond the current one.
pub struct SessionStateMachine<P, T>
where
    P: Phase,
    T: Timer,
{
    pub phase: P,
    pub timer: T,
    pub config: ExperimentConfig,
    participant: String,
    trials: Vec<PlannedTrial<T::Timestamp>>,
    practice_len: usize,
    cursor: usize,
    phase_trial_number: usize,
    responses: Vec<TrialResponse>,
}

impl<P, T> SessionStateMachine<P, T>
where
    P: Phase,
    T: Timer<Timestamp = u64>,
{
    pub fn new<R: Rng + ?Sized>(
        config: ExperimentConfig,
        participant: &str,
        pool: &StimulusPool,
        timer: T,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let participant = participant.trim();
        if participant.is_empty() {
            return Err(SessionError::EmptyParticipant);
        }

        let sampler = TrialSampler::new(pool, &config.conditions);
        if sampler.eligible_len() == 0 {
            return Err(SessionError::NoEligibleStimuli {
                conditions: config.conditions.clone(),
            });
        }

        let practice = sampler.take(config.practice_trials, rng);
        let experiment = sampler.take(config.experiment_trials, rng);
        if experiment.len() < config.experiment_trials {
            warn!(
                "pool supports {} of {} requested experiment trials",
                experiment.len(),
                config.experiment_trials
            );
        }

        let practice_len = practice.len();
        let trials: Vec<_> = practice
            .into_iter()
            .map(|t| (true, t))
            .chain(experiment.into_iter().map(|t| (false, t)))
            .enumerate()
            .map(|(id, (is_practice, trial))| PlannedTrial::new(id, is_practice, trial))
            .collect();

        info!(
            "session for {}: {} practice + {} experiment trials",
            participant,
            practice_len,
            trials.len() - practice_len
        );

        Ok(Self {
            phase: P::default(),
            timer,
            config,
            participant: participant.to_string(),
            trials,
            practice_len,
            cursor: 0,
            phase_trial_number: 0,
            responses: Vec::new(),
        })
    }

    fn block_for(&self, phase: P) -> Range<usize> {
        if phase.is_practice() {
            0..self.practice_len
        } else if phase.is_experiment() {
            self.practice_len..self.trials.len()
        } else {
            self.trials.len()..self.trials.len()
        }
    }

    /// Moves to the next phase, skipping trial blocks with nothing in them
    pub fn advance_phase(&mut self) -> bool {
        let mut next = self.phase.next();
        while let Some(phase) = next {
            let block = self.block_for(phase);
            if phase.runs_trials() && block.is_empty() {
                debug!("skipping empty {:?} block", phase);
                next = phase.next();
                continue;
            }
            self.phase = phase;
            self.phase_trial_number = 0;
            if phase.runs_trials() || phase.is_debrief() {
                self.cursor = block.start;
            }
            info!("{}: entering {:?}", self.participant, phase);
            return true;
        }
        false
    }

    pub fn update(&self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.phase.runs_trials() && self.cursor >= self.block_for(self.phase).end {
            events.push(SessionEvent::PhaseComplete);
        }
        events
    }

    pub fn handle_event(&mut self, event: SessionEvent) -> bool {
        match (self.phase, event) {
            (phase, SessionEvent::ParticipantStarted) if phase.is_welcome() => self.advance_phase(),

            (phase, SessionEvent::Response(side)) if phase.runs_trials() && phase.allows_input() => {
                self.record_response(side).is_some()
            }

            (_, SessionEvent::PhaseComplete) => self.advance_phase(),

            _ => false,
        }
    }

    fn current_index(&self) -> Option<usize> {
        if !self.phase.runs_trials() {
            return None;
        }
        let block = self.block_for(self.phase);
        block.contains(&self.cursor).then_some(self.cursor)
    }

    pub fn current_trial(&self) -> Option<&AbxTrial> {
        self.current_index().map(|i| &self.trials[i].trial)
    }

    pub fn current_trial_state(&self) -> Option<TrialState> {
        self.current_index().map(|i| self.trials[i].state)
    }

    /// Marks the current trial as on screen and starts its response clock.
    ///
    /// Only the first call per trial stamps the time, so redraws do not
    /// reset the reaction time.
    pub fn present(&mut self) -> Option<&AbxTrial> {
        let idx = self.current_index()?;
        let now = self.timer.now();
        let planned = &mut self.trials[idx];
        if planned.timestamps.presented.is_none() {
            planned.timestamps.presented = Some(now);
            planned.state = TrialState::Presented;
            debug!("trial {} presented at {} ns", planned.id, now);
        }
        Some(&planned.trial)
    }

    /// Records the answer for the current trial and moves to the next one
    pub fn record_response(&mut self, chosen: Side) -> Option<TrialResponse> {
        let idx = self.current_index()?;
        let now = self.timer.now();
        let timestamp = self.timer.wall_clock();
        let reaction_time_ms = self.trials[idx]
            .timestamps
            .presented
            .map(|start| self.timer.elapsed(start).as_millis() as u64)
            .unwrap_or(0);

        let planned = &mut self.trials[idx];
        planned.timestamps.response = Some(now);
        planned.state = TrialState::Responded;

        let response = TrialResponse {
            trial_index: planned.id,
            is_practice: planned.is_practice,
            trial: planned.trial.clone(),
            chosen,
            reaction_time_ms,
            is_correct: planned.trial.score(chosen),
            timestamp,
        };
        debug!(
            "trial {} answered {} (correct {:?}) in {} ms",
            response.trial_index,
            chosen,
            response.trial.correct_answer,
            reaction_time_ms
        );

        self.responses.push(response.clone());
        self.cursor += 1;
        self.phase_trial_number += 1;
        Some(response)
    }

    pub fn participant(&self) -> &str {
        &self.participant
    }

    pub fn current_phase(&self) -> &P {
        &self.phase
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_debrief()
    }

    /// Number of trials generated for this session
    pub fn total_trials(&self) -> usize {
        self.trials.len()
    }

    pub fn responses(&self) -> &[TrialResponse] {
        &self.responses
    }

    /// Ends the session, handing over the response log
    pub fn into_responses(self) -> Vec<TrialResponse> {
        self.responses
    }

    /// 1-based position within the current block and the block size
    pub fn trial_progress(&self) -> Option<(usize, usize)> {
        if self.phase.runs_trials() {
            let block = self.block_for(self.phase);
            Some((self.phase_trial_number + 1, block.len()))
        } else {
            None
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_responses(&self.participant, &self.responses)
    }
}
