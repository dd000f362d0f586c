use anyhow::{Context, Result, bail};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::hash::Hasher;
use std::rc::Rc;
use std::time::{Duration, Instant};
use twox_hash::XxHash64;

use saltmarch_travel::numbers::{floor_f64_to_index, usize_to_f64};
use saltmarch_travel::{
    Command, Creature, EncounterConfig, EncounterOutcome, EncounterStream, Envelope, HexCoordinate,
    PartyMember, RandomSource, RngBundle, SessionPorts, SimpleClock, TimeChangeReason, TimeService,
    TravelConfig, TravelSession, TravelStatus,
};

use crate::fixtures::HashedTerrain;
use crate::scenarios::Scenario;

/// Real milliseconds per simulated frame (60 Hz).
const FRAME_MS: f64 = 1_000.0 / 60.0;
const MAX_FRAMES: u32 = 250_000;
const OUTCOMES: [EncounterOutcome; 3] = [
    EncounterOutcome::Victory,
    EncounterOutcome::Flee,
    EncounterOutcome::Negotiated,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub encounters_generated: u32,
    pub hours_travelled: f64,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

/// What one simulated journey did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub seed: u64,
    pub arrived: bool,
    pub final_position: HexCoordinate,
    pub frames: u32,
    pub travel_minutes: u64,
    pub checks: u32,
    pub encounters_generated: u32,
    pub encounters_skipped: u32,
    pub command_failures: u32,
    pub event_digest: u64,
}

struct Tally {
    checks: u32,
    generated: u32,
    skipped: u32,
    failures: u32,
    digest: XxHash64,
}

impl Default for Tally {
    fn default() -> Self {
        Self {
            checks: 0,
            generated: 0,
            skipped: 0,
            failures: 0,
            digest: XxHash64::with_seed(0),
        }
    }
}

impl Tally {
    fn record(&mut self, envelope: &Envelope) {
        match envelope.name() {
            "encounter:check-triggered" => self.checks += 1,
            "encounter:generated" => self.generated += 1,
            "encounter:skipped" => self.skipped += 1,
            "travel:command-failed" | "encounter:command-failed" => self.failures += 1,
            _ => {}
        }
        self.digest.write(envelope.name().as_bytes());
        self.digest.write_u64(envelope.id.0);
    }
}

pub struct ScenarioRunner {
    bestiary: Rc<Vec<Creature>>,
    party: Rc<Vec<PartyMember>>,
    verbose: bool,
}

impl ScenarioRunner {
    pub fn new(bestiary: Vec<Creature>, party: Vec<PartyMember>, verbose: bool) -> Self {
        Self {
            bestiary: Rc::new(bestiary),
            party: Rc::new(party),
            verbose,
        }
    }

    pub fn run_scenario(&self, scenario: &Scenario, seeds: &[u64], iterations: usize) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.verbose {
                    eprintln!(
                        "🧪 Testing scenario: {} (seed: {seed})",
                        scenario.key.bright_white()
                    );
                }
                self.run_seed(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_seed(&self, scenario: &Scenario, seed: u64, iterations: usize) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut timings = Vec::new();
        let mut encounters = 0;
        let mut minutes = 0;

        for i in 0..iterations {
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let started = Instant::now();
            match self.run_iteration(scenario, iteration_seed) {
                Ok(summary) => {
                    successes += 1;
                    timings.push(started.elapsed());
                    encounters += summary.encounters_generated;
                    minutes += summary.travel_minutes;
                    if self.verbose {
                        eprintln!(
                            "  ✅ Iteration {}/{iterations} arrived at {} after {} frames, {} encounters, {} skipped checks",
                            i + 1,
                            summary.final_position,
                            summary.frames,
                            summary.encounters_generated,
                            summary.encounters_skipped
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        eprintln!("  ❌ {}", message.red());
                    }
                    failures.push(message);
                }
            }
        }

        let average_duration = if timings.is_empty() {
            Duration::ZERO
        } else {
            timings.iter().sum::<Duration>() / u32::try_from(timings.len()).unwrap_or(1)
        };
        #[allow(clippy::cast_precision_loss)]
        let hours_travelled = if successes == 0 {
            0.0
        } else {
            minutes as f64 / 60.0 / successes as f64
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            encounters_generated: encounters,
            hours_travelled,
            average_duration,
        }
    }

    fn run_iteration(&self, scenario: &Scenario, seed: u64) -> Result<RunSummary> {
        let summary = self.simulate(scenario, seed)?;
        if !summary.arrived {
            bail!(
                "did not arrive: stopped at {} after {} frames",
                summary.final_position,
                summary.frames
            );
        }
        if summary.encounters_generated < scenario.min_encounters {
            bail!(
                "expected at least {} encounters, saw {} in {} checks",
                scenario.min_encounters,
                summary.encounters_generated,
                summary.checks
            );
        }
        if summary.command_failures > 0 {
            bail!("{} commands failed during the run", summary.command_failures);
        }
        if scenario.verify_replay {
            let replay = self.simulate(scenario, seed).context("replaying seed")?;
            if replay != summary {
                bail!(
                    "replay diverged: digest {:016x} vs {:016x}",
                    summary.event_digest,
                    replay.event_digest
                );
            }
        }
        Ok(summary)
    }

    /// Drive one journey frame by frame, resolving encounters as they appear.
    /// Outcomes are drawn from the seed's ambient stream.
    pub fn simulate(&self, scenario: &Scenario, seed: u64) -> Result<RunSummary> {
        let clock = Rc::new(RefCell::new(SimpleClock::default()));
        let time: Rc<RefCell<dyn TimeService>> = clock.clone();
        let bundle = Rc::new(RngBundle::from_user_seed(seed));
        let ports = SessionPorts::new(
            Rc::new(HashedTerrain::new(seed)),
            time,
            self.bestiary.clone(),
            self.party.clone(),
            Box::new(EncounterStream(Rc::clone(&bundle))),
        );
        let travel = TravelConfig {
            speed_multiplier: scenario.speed_multiplier,
            ..TravelConfig::default()
        };
        let encounters = EncounterConfig {
            check_probability: scenario.check_probability,
            ..EncounterConfig::default()
        };
        travel.validate().context("scenario travel config")?;
        encounters.validate().context("scenario encounter config")?;

        let mut session = TravelSession::new(travel, encounters, ports).with_party_position(scenario.start);
        let tally = Rc::new(RefCell::new(Tally::default()));
        let sink = Rc::clone(&tally);
        session.subscribe(move |envelope| sink.borrow_mut().record(envelope));

        for coord in &scenario.waypoints {
            session
                .dispatch(Command::AddWaypoint { coord: *coord })
                .with_context(|| format!("adding waypoint {coord}"))?;
        }
        session.dispatch(Command::StartTravel).context("starting travel")?;

        let mut frames = 0;
        let mut resolved = 0_usize;
        while frames < MAX_FRAMES && session.travel_state().status.is_active() {
            session.tick(FRAME_MS);
            frames += 1;
            if session.encounter_state().is_active() {
                let roll = bundle.ambient().next_unit() * usize_to_f64(OUTCOMES.len());
                let outcome = OUTCOMES[floor_f64_to_index(roll, OUTCOMES.len())];
                session
                    .dispatch(Command::ResolveEncounter { outcome })
                    .context("resolving encounter")?;
                resolved += 1;
            }
        }
        log::debug!("{} seed {seed}: {frames} frames, {resolved} encounters resolved", scenario.key);

        let state = session.travel_state();
        let destination = scenario.waypoints.last().copied().unwrap_or(scenario.start);
        let tally = tally.borrow();
        Ok(RunSummary {
            seed,
            arrived: state.status == TravelStatus::Arrived && state.party_position == destination,
            final_position: state.current_position(),
            frames,
            travel_minutes: clock.borrow().minutes_advanced_for(TimeChangeReason::Travel),
            checks: tally.checks,
            encounters_generated: tally.generated,
            encounters_skipped: tally.skipped,
            command_failures: tally.failures,
            event_digest: tally.digest.finish(),
        })
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{default_party, load_bestiary};
    use crate::scenarios::get_scenario;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(load_bestiary().expect("bestiary"), default_party(), false)
    }

    #[test]
    fn short_hop_arrives() {
        let scenario = get_scenario("short-hop").expect("scenario");
        let summary = runner().simulate(&scenario, 1337).expect("simulate");
        assert!(summary.arrived, "{summary:?}");
        assert!(summary.travel_minutes > 0);
        assert_eq!(summary.command_failures, 0);
    }

    #[test]
    fn same_seed_same_digest() {
        let scenario = get_scenario("deterministic-replay").expect("scenario");
        let r = runner();
        let a = r.simulate(&scenario, 7).expect("first");
        let b = r.simulate(&scenario, 7).expect("second");
        assert_eq!(a, b);
    }

    #[test]
    fn results_aggregate_iterations() {
        let scenario = get_scenario("short-hop").expect("scenario");
        let results = runner().run_scenario(&scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed && r.successful_iterations == 2));
    }
}
