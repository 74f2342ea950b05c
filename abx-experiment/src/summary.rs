use abx_core::{Condition, TrialResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConditionSummary {
    pub trials: usize,
    pub scored: usize,
    pub correct: usize,
    pub accuracy: Option<f64>,
}

/// Debrief statistics over the non-practice responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub participant: String,
    pub trials: usize,
    /// Trials with a defined correct answer
    pub scored: usize,
    pub correct: usize,
    pub accuracy: Option<f64>,
    pub mean_rt_ms: Option<f64>,
    pub min_rt_ms: Option<u64>,
    pub max_rt_ms: Option<u64>,
    pub by_condition: BTreeMap<Condition, ConditionSummary>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

impl SessionSummary {
    pub fn from_responses(participant: &str, responses: &[TrialResponse]) -> Self {
        let main: Vec<&TrialResponse> = responses.iter().filter(|r| !r.is_practice).collect();

        let mut by_condition: BTreeMap<Condition, ConditionSummary> = BTreeMap::new();
        for r in &main {
            let entry = by_condition.entry(r.trial.condition).or_default();
            entry.trials += 1;
            if let Some(correct) = r.is_correct {
                entry.scored += 1;
                entry.correct += usize::from(correct);
            }
        }
        for entry in by_condition.values_mut() {
            entry.accuracy = ratio(entry.correct, entry.scored);
        }

        let scored = main.iter().filter(|r| r.is_correct.is_some()).count();
        let correct = main.iter().filter(|r| r.is_correct == Some(true)).count();
        let times: Vec<u64> = main.iter().map(|r| r.reaction_time_ms).collect();
        let mean_rt_ms =
            (!times.is_empty()).then(|| times.iter().sum::<u64>() as f64 / times.len() as f64);

        Self {
            participant: participant.to_string(),
            trials: main.len(),
            scored,
            correct,
            accuracy: ratio(correct, scored),
            mean_rt_ms,
            min_rt_ms: times.iter().min().copied(),
            max_rt_ms: times.iter().max().copied(),
            by_condition,
        }
    }

    pub fn log(&self) {
        info!(
            "{}: {} trials, {} scored, accuracy {}",
            self.participant,
            self.trials,
            self.scored,
            self.accuracy
                .map(|a| format!("{:.1}%", a * 100.0))
                .unwrap_or_else(|| "n/a".into())
        );
        if let (Some(mean), Some(min), Some(max)) = (self.mean_rt_ms, self.min_rt_ms, self.max_rt_ms) {
            info!(
                "reaction times: mean {:.1} ms, min {} ms, max {} ms",
                mean, min, max
            );
        }
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abx_core::{AbxTrial, Construction, Side, StimulusRecord};
    use chrono::Utc;

    fn response(condition: Condition, practice: bool, x_driver: &str, chosen: Side, rt: u64) -> TrialResponse {
        let trial = AbxTrial::from_triad(
            condition,
            StimulusRecord::new(condition, "VER", "a"),
            StimulusRecord::new(condition, "RUS", "b"),
            StimulusRecord::new(condition, x_driver, "x"),
            Construction::Fallback,
        );
        TrialResponse {
            trial_index: 0,
            is_practice: practice,
            is_correct: trial.score(chosen),
            trial,
            chosen,
            reaction_time_ms: rt,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn practice_and_unscoreable_trials_are_excluded_from_accuracy() {
        let responses = vec![
            response(Condition::Viz, true, "VER", Side::B, 9000),
            response(Condition::Viz, false, "VER", Side::A, 400),
            response(Condition::Viz, false, "RUS", Side::A, 600),
            response(Condition::Aud, false, "NOR", Side::A, 800),
        ];
        let summary = SessionSummary::from_responses("p01", &responses);

        assert_eq!(summary.trials, 3);
        assert_eq!(summary.scored, 2);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.accuracy, Some(0.5));
        assert_eq!(summary.mean_rt_ms, Some(600.0));
        assert_eq!(summary.min_rt_ms, Some(400));
        assert_eq!(summary.max_rt_ms, Some(800));

        let aud = &summary.by_condition[&Condition::Aud];
        assert_eq!((aud.trials, aud.scored, aud.accuracy), (1, 0, None));
    }

    #[test]
    fn empty_session_has_no_statistics() {
        let summary = SessionSummary::from_responses("p01", &[]);
        assert_eq!(summary.trials, 0);
        assert_eq!(summary.accuracy, None);
        assert_eq!(summary.mean_rt_ms, None);
        assert!(summary.by_condition.is_empty());
    }
}
