use abx_core::{AbxTrial, Condition, Construction, Side, StimulusPool, StimulusRecord};
use abx_experiment::{TrialSampler, make_trials};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rec(condition: Condition, driver: &str, path: &str) -> StimulusRecord {
    StimulusRecord::new(condition, driver, path)
}

/// Three drivers with several records each under every condition
fn full_pool() -> StimulusPool {
    let mut records = Vec::new();
    for driver in ["VER", "RUS", "NOR"] {
        for lap in 1..=4 {
            let stem = driver.to_lowercase();
            records.push(rec(Condition::Viz, driver, &format!("{driver}/{stem}_lap{lap}_fp.png")));
            records.push(rec(Condition::Heat, driver, &format!("{driver}/{stem}_lap{lap}_heat.png")));
            records.push(rec(Condition::Aud, driver, &format!("{driver}/{stem}_lap{lap}.wav")));
        }
    }
    StimulusPool::new(records)
}

fn assert_well_formed(trial: &AbxTrial) {
    assert_eq!(trial.construction, Construction::Paired);
    let correct = trial.correct_answer.expect("paired trials are scoreable");
    let matching = trial.slot(correct);
    let foil = trial.slot(correct.other());
    assert_eq!(matching.driver, trial.x.driver);
    assert_ne!(foil.driver, trial.x.driver);
    assert_ne!(trial.a.path, trial.b.path);
    assert_ne!(matching.path, trial.x.path);
    for record in [&trial.a, &trial.b, &trial.x] {
        assert_eq!(record.condition, trial.condition);
    }
}

#[test]
fn pairable_pool_yields_exactly_n_scoreable_trials() {
    let pool = full_pool();
    for n in [1, 5, 60] {
        let mut rng = StdRng::seed_from_u64(n as u64);
        let trials = make_trials(&pool, &[Condition::Heat], n, &mut rng);
        assert_eq!(trials.len(), n);
        for trial in &trials {
            assert_eq!(trial.condition, Condition::Heat);
            assert_well_formed(trial);
        }
    }
}

#[test]
fn different_seeds_differ_but_both_hold_the_guarantee() {
    let pool = full_pool();
    let all = Condition::ALL;
    let first = make_trials(&pool, &all, 40, &mut StdRng::seed_from_u64(1));
    let second = make_trials(&pool, &all, 40, &mut StdRng::seed_from_u64(2));
    assert_ne!(first, second);
    first.iter().chain(&second).for_each(assert_well_formed);
}

#[test]
fn correct_side_is_balanced() {
    let pool = full_pool();
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 4000;
    let trials = make_trials(&pool, &Condition::ALL, n, &mut rng);
    let on_a = trials
        .iter()
        .filter(|t| t.correct_answer == Some(Side::A))
        .count();
    // expected 2000, sd ~31.6; allow about five sd
    assert!((1840..=2160).contains(&on_a), "A was correct {on_a} times out of {n}");
}

#[test]
fn minimal_three_record_pool() {
    let pool = StimulusPool::new(vec![
        rec(Condition::Viz, "VER", "v1"),
        rec(Condition::Viz, "VER", "v2"),
        rec(Condition::Viz, "RUS", "r1"),
    ]);
    for seed in 0..20 {
        let trials = make_trials(&pool, &[Condition::Viz], 1, &mut StdRng::seed_from_u64(seed));
        assert_eq!(trials.len(), 1);
        let trial = &trials[0];
        assert_eq!(trial.condition, Condition::Viz);
        assert!(["v1", "v2"].contains(&trial.x.path.as_str()));

        let correct = trial.correct_answer.unwrap();
        assert_eq!(trial.slot(correct).driver.as_str(), "VER");
        assert!(["v1", "v2"].contains(&trial.slot(correct).path.as_str()));
        assert_ne!(trial.slot(correct).path, trial.x.path);
        assert_eq!(trial.slot(correct.other()).path, "r1");
    }
}

#[test]
fn two_record_pool_yields_no_trials() {
    let pool = StimulusPool::new(vec![
        rec(Condition::Viz, "VER", "v1"),
        rec(Condition::Heat, "RUS", "r1"),
        rec(Condition::Aud, "NOR", "n1.wav"),
    ]);
    let mut rng = StdRng::seed_from_u64(9);
    let trials = make_trials(&pool, &[Condition::Viz, Condition::Heat], 5, &mut rng);
    assert!(trials.is_empty());
}

#[test]
fn conditions_outside_the_request_are_never_used() {
    let pool = full_pool();
    let mut rng = StdRng::seed_from_u64(11);
    let trials = make_trials(&pool, &[Condition::Viz, Condition::Aud], 200, &mut rng);
    assert_eq!(trials.len(), 200);
    assert!(trials.iter().all(|t| t.condition != Condition::Heat));
    assert!(trials.iter().any(|t| t.condition == Condition::Viz));
    assert!(trials.iter().any(|t| t.condition == Condition::Aud));
}

#[test]
fn sampler_can_be_reused_for_independent_blocks() {
    let pool = full_pool();
    let sampler = TrialSampler::new(&pool, &[Condition::Aud]);
    assert_eq!(sampler.eligible_len(), 12);
    let mut rng = StdRng::seed_from_u64(5);
    let practice = sampler.take(3, &mut rng);
    let main = sampler.take(10, &mut rng);
    assert_eq!((practice.len(), main.len()), (3, 10));
}

#[test]
fn unpairable_condition_does_not_force_fallback_when_another_pairs() {
    // viz has two drivers but one record each; heat can always be paired
    let pool = StimulusPool::new(vec![
        rec(Condition::Viz, "VER", "v1"),
        rec(Condition::Viz, "RUS", "r1"),
        rec(Condition::Heat, "VER", "h1"),
        rec(Condition::Heat, "VER", "h2"),
        rec(Condition::Heat, "RUS", "rh1"),
    ]);
    let mut rng = StdRng::seed_from_u64(1);
    let trials = make_trials(&pool, &[Condition::Viz, Condition::Heat], 400, &mut rng);
    assert_eq!(trials.len(), 400);
    for trial in &trials {
        assert_eq!(trial.condition, Condition::Heat);
        assert_well_formed(trial);
        assert_eq!(trial.x.driver.as_str(), "VER");
    }
}
