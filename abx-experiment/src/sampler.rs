//! ABX trial construction.
//!
//! Records are bucketed by `(condition, driver)`. A paired trial draws X and
//! a second record from one driver's bucket and a foil from another driver
//! under the same condition, then places the match on A or B with equal
//! probability. Only conditions with two drivers, at least one of them holding
//! two records, can be paired. When no requested condition qualifies, three
//! records are drawn from the whole eligible pool instead.

use abx_core::{AbxTrial, Condition, Construction, Driver, Side, StimulusPool, StimulusRecord};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom, index};
use std::collections::BTreeMap;
use tracing::{debug, warn};

type Buckets<'a> = BTreeMap<Condition, BTreeMap<Driver, Vec<&'a StimulusRecord>>>;

/// Draws trials from a fixed pool restricted to a set of conditions.
///
/// Bucketing happens once; every call to [`TrialSampler::sample`] is an
/// independent draw, so assets can repeat across trials.
#[derive(Debug)]
pub struct TrialSampler<'a> {
    eligible: Vec<&'a StimulusRecord>,
    buckets: Buckets<'a>,
}

impl<'a> TrialSampler<'a> {
    pub fn new(pool: &'a StimulusPool, conditions: &[Condition]) -> Self {
        let eligible: Vec<&'a StimulusRecord> = pool.eligible(conditions).collect();
        let mut buckets = Buckets::new();
        for &record in &eligible {
            buckets
                .entry(record.condition)
                .or_default()
                .entry(record.driver.clone())
                .or_default()
                .push(record);
        }
        Self { eligible, buckets }
    }

    /// Number of records matching the requested conditions
    pub fn eligible_len(&self) -> usize {
        self.eligible.len()
    }

    /// Conditions with at least two drivers where some driver has two records
    pub fn pairable_conditions(&self) -> Vec<Condition> {
        self.buckets
            .iter()
            .filter(|(_, drivers)| {
                drivers.len() >= 2 && drivers.values().any(|bucket| bucket.len() >= 2)
            })
            .map(|(condition, _)| *condition)
            .collect()
    }

    /// Draws up to `n` trials; stops early once not even a fallback triad fits.
    pub fn take<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<AbxTrial> {
        let mut trials = Vec::with_capacity(n);
        for _ in 0..n {
            match self.sample(rng) {
                Some(trial) => trials.push(trial),
                None => {
                    warn!(
                        "only {} eligible stimuli, stopping after {} of {} trials",
                        self.eligible.len(),
                        trials.len(),
                        n
                    );
                    break;
                }
            }
        }
        trials
    }

    /// Draws a single trial, or `None` when fewer than three records are eligible.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AbxTrial> {
        let pairable = self.pairable_conditions();
        let Some(&condition) = pairable.choose(rng) else {
            return self.fallback(rng);
        };
        let drivers = &self.buckets[&condition];
        let names: Vec<&Driver> = drivers.keys().collect();

        let mut same = *names.choose(rng)?;
        if drivers[same].len() < 2 {
            let alternatives: Vec<&Driver> = names
                .iter()
                .copied()
                .filter(|d| *d != same && drivers[*d].len() >= 2)
                .collect();
            let alt = *alternatives.choose(rng)?;
            debug!("{} has a single {} stimulus, matching on {}", same, condition, alt);
            same = alt;
        }
        let others: Vec<&Driver> = names.iter().copied().filter(|d| *d != same).collect();
        let different = *others.choose(rng)?;

        let same_bucket = &drivers[same];
        let x = *same_bucket.choose(rng)?;
        let partner = choose_other_path(same_bucket, x, rng)?;
        let foil = *drivers[different].choose(rng)?;

        let (a, b, correct) = if rng.random_bool(0.5) {
            (partner, foil, Side::A)
        } else {
            (foil, partner, Side::B)
        };
        debug!(
            "{} trial: X={} A={} B={} answer {}",
            condition, x.path, a.path, b.path, correct
        );

        Some(AbxTrial {
            condition,
            a: a.clone(),
            b: b.clone(),
            x: x.clone(),
            correct_answer: Some(correct),
            construction: Construction::Paired,
        })
    }

    /// Three distinct records from the whole eligible pool: two become A/B in
    /// random order, the third is X.
    fn fallback<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<AbxTrial> {
        if self.eligible.len() < 3 {
            return None;
        }
        let picks: Vec<&StimulusRecord> = index::sample(rng, self.eligible.len(), 3)
            .iter()
            .map(|i| self.eligible[i])
            .collect();
        let condition = picks[0].condition;
        let x = picks[2];
        let mut pair = [picks[0], picks[1]];
        pair.shuffle(rng);

        let trial = AbxTrial::from_triad(
            condition,
            pair[0].clone(),
            pair[1].clone(),
            x.clone(),
            Construction::Fallback,
        );
        if trial.is_scoreable() {
            debug!("fallback {} trial: X={}", condition, x.path);
        } else {
            warn!(
                "fallback {} trial has no unique driver match for X={}, marked unscoreable",
                condition, x.path
            );
        }
        Some(trial)
    }
}

/// Picks a record whose path differs from `x`, or any record when all share it.
fn choose_other_path<'a, R: Rng + ?Sized>(
    bucket: &[&'a StimulusRecord],
    x: &StimulusRecord,
    rng: &mut R,
) -> Option<&'a StimulusRecord> {
    let others: Vec<&'a StimulusRecord> = bucket
        .iter()
        .copied()
        .filter(|r| r.path != x.path)
        .collect();
    if others.is_empty() {
        bucket.choose(rng).copied()
    } else {
        others.choose(rng).copied()
    }
}

/// Builds `n` trials from `pool`, restricted to `conditions`.
///
/// Returns fewer than `n` trials when the eligible pool holds fewer than three
/// records; callers see a short sequence rather than an error.
pub fn make_trials<R: Rng + ?Sized>(
    pool: &StimulusPool,
    conditions: &[Condition],
    n: usize,
    rng: &mut R,
) -> Vec<AbxTrial> {
    TrialSampler::new(pool, conditions).take(n, rng)
}
