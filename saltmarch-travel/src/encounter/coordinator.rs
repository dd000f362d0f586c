use std::rc::Rc;

use super::generator::{EncounterRequest, generate_encounter, roll_encounter_check};
use super::{
    EncounterConfig, EncounterOutcome, EncounterState, EncounterStatus, GeneratedEncounter, SkipReason,
};
use crate::duration::{Duration, MINUTES_PER_HOUR};
use crate::error::{CommandError, CommandResult, ErrorCode};
use crate::events::{EncounterEvent, EventSink};
use crate::hex::HexCoordinate;
use crate::ids::{IdGenerator, IdKind, SequentialIds};
use crate::ports::{CreaturePool, PartyRoster, TerrainLookup};
use crate::rng::RandomSource;
use crate::time::{GameTime, TimeChangeReason};

/// Hourly encounter checks during travel.
///
/// Counts travel hours from time-change notifications, rolls once per new
/// hour and publishes `encounter:generated` when the roll and the generator
/// both succeed. Pausing travel in response is left to whoever routes events.
pub struct EncounterCoordinator {
    state: EncounterState,
    config: EncounterConfig,
    terrain: Rc<dyn TerrainLookup>,
    creatures: Rc<dyn CreaturePool>,
    party: Rc<dyn PartyRoster>,
    rng: Box<dyn RandomSource>,
    ids: Box<dyn IdGenerator>,
    position: HexCoordinate,
    last_seen_time: Option<GameTime>,
}

impl EncounterCoordinator {
    pub fn new(
        config: EncounterConfig,
        terrain: Rc<dyn TerrainLookup>,
        creatures: Rc<dyn CreaturePool>,
        party: Rc<dyn PartyRoster>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            state: EncounterState::default(),
            config,
            terrain,
            creatures,
            party,
            rng,
            ids: Box::new(SequentialIds::new()),
            position: HexCoordinate::ORIGIN,
            last_seen_time: None,
        }
    }

    #[must_use]
    pub fn with_ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub const fn state(&self) -> &EncounterState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &EncounterConfig {
        &self.config
    }

    /// Last position reported by travel.
    #[must_use]
    pub const fn position(&self) -> HexCoordinate {
        self.position
    }

    pub fn update_config(&mut self, config: EncounterConfig) {
        if let Err(err) = config.validate() {
            log::warn!(target: "saltmarch::encounter", "encounter config rejected: {err}");
            return;
        }
        self.config = config;
    }

    /// A journey (re)started at `position`: hour counters go back to zero.
    pub fn travel_started(&mut self, position: HexCoordinate, sink: &mut dyn EventSink) {
        self.position = position;
        self.state.travel_hours_elapsed = 0;
        self.state.last_check_hour = 0;
        self.publish_state(sink);
    }

    pub fn party_moved(&mut self, position: HexCoordinate) {
        self.position = position;
    }

    /// React to a time-port advancement. Only travel time counts, one check
    /// per whole hour.
    pub fn time_changed(
        &mut self,
        current: GameTime,
        reason: TimeChangeReason,
        advanced: Duration,
        sink: &mut dyn EventSink,
    ) {
        self.last_seen_time = Some(current);
        if reason != TimeChangeReason::Travel {
            return;
        }
        let hours = advanced.to_minutes() / MINUTES_PER_HOUR;
        for _ in 0..hours {
            self.state.travel_hours_elapsed = self.state.travel_hours_elapsed.saturating_add(1);
            if self.state.travel_hours_elapsed > self.state.last_check_hour {
                self.state.last_check_hour = self.state.travel_hours_elapsed;
                self.run_check(self.state.travel_hours_elapsed, sink);
            }
            self.publish_state(sink);
        }
    }

    /// Close the active encounter with an outcome.
    ///
    /// # Errors
    ///
    /// `NO_ACTIVE_ENCOUNTER` when nothing is active.
    pub fn resolve_encounter(&mut self, outcome: EncounterOutcome, sink: &mut dyn EventSink) -> CommandResult {
        let Some(encounter) = self.state.active_encounter.take() else {
            return Err(CommandError::new(
                ErrorCode::NoActiveEncounter,
                "cannot resolve: no active encounter",
            ));
        };
        self.state.status = EncounterStatus::Idle;
        log::info!(target: "saltmarch::encounter", "encounter {} resolved: {outcome:?}", encounter.id);
        sink.publish(
            EncounterEvent::Resolved {
                encounter_id: encounter.id,
                outcome,
            }
            .into(),
        );
        self.publish_state(sink);
        Ok(())
    }

    /// Drop the active encounter, if any, without an outcome.
    pub fn dismiss_encounter(&mut self, sink: &mut dyn EventSink) {
        if let Some(encounter) = self.state.active_encounter.take() {
            log::info!(target: "saltmarch::encounter", "encounter {} dismissed", encounter.id);
        }
        self.state.status = EncounterStatus::Idle;
        self.publish_state(sink);
    }

    /// Generate an encounter on demand at the current position, bypassing the
    /// roll.
    ///
    /// # Errors
    ///
    /// `ENCOUNTER_ACTIVE` while one is running, `NO_CREATURES_AVAILABLE` when
    /// the generator finds nothing suitable.
    pub fn generate_now(&mut self, sink: &mut dyn EventSink) -> CommandResult<GeneratedEncounter> {
        if self.state.is_active() {
            return Err(CommandError::new(
                ErrorCode::EncounterActive,
                "an encounter is already active",
            ));
        }
        let terrain = self.terrain_id();
        let encounter = self.generate(&terrain).ok_or_else(|| {
            CommandError::new(
                ErrorCode::NoCreaturesAvailable,
                format!("no creatures suit the party on {terrain}"),
            )
        })?;
        self.activate(encounter.clone(), self.state.travel_hours_elapsed, sink);
        Ok(encounter)
    }

    fn run_check(&mut self, hour: u32, sink: &mut dyn EventSink) {
        if self.state.is_active() {
            log::debug!(target: "saltmarch::encounter", "hour {hour}: encounter already active, check skipped");
            return;
        }
        let terrain = self.terrain_id();
        if !self.config.enabled {
            sink.publish(
                EncounterEvent::Skipped {
                    hour,
                    terrain,
                    reason: SkipReason::Disabled,
                }
                .into(),
            );
            return;
        }

        sink.publish(
            EncounterEvent::CheckTriggered {
                hour,
                terrain: terrain.clone(),
                position: self.position,
            }
            .into(),
        );

        if !roll_encounter_check(self.config.check_probability, self.rng.as_mut()) {
            sink.publish(
                EncounterEvent::Skipped {
                    hour,
                    terrain,
                    reason: SkipReason::RollFailed,
                }
                .into(),
            );
            return;
        }

        match self.generate(&terrain) {
            Some(encounter) => self.activate(encounter, hour, sink),
            None => sink.publish(
                EncounterEvent::Skipped {
                    hour,
                    terrain,
                    reason: SkipReason::NoCreatures,
                }
                .into(),
            ),
        }
    }

    fn terrain_id(&self) -> String {
        self.terrain
            .terrain_at(self.position)
            .map_or_else(|| self.config.fallback_terrain.clone(), |t| t.id)
    }

    fn generate(&mut self, terrain: &str) -> Option<GeneratedEncounter> {
        let pool = self.creatures.list();
        let levels: Vec<u32> = self.party.members().iter().map(|m| m.level).collect();
        let id = self.ids.next_id(IdKind::Encounter);
        generate_encounter(
            EncounterRequest::from_config(&self.config, &pool, &levels, terrain, id).at(self.last_seen_time),
        )
    }

    fn activate(&mut self, encounter: GeneratedEncounter, hour: u32, sink: &mut dyn EventSink) {
        log::info!(
            target: "saltmarch::encounter",
            "encounter {} generated: {} creatures, {} adjusted XP ({})",
            encounter.id,
            encounter.creature_count,
            encounter.adjusted_xp,
            encounter.difficulty
        );
        self.state.status = EncounterStatus::Active;
        self.state.active_encounter = Some(encounter.clone());
        sink.publish(
            EncounterEvent::Generated {
                encounter,
                hour,
                position: self.position,
            }
            .into(),
        );
        self.publish_state(sink);
    }

    fn publish_state(&self, sink: &mut dyn EventSink) {
        sink.publish(
            EncounterEvent::StateChanged {
                state: self.state.clone(),
            }
            .into(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::{Creature, PartyMember};
    use crate::events::Event;
    use crate::ports::UnmappedTerrain;
    use crate::rng::ScriptedRolls;

    fn coordinator(rolls: ScriptedRolls, config: EncounterConfig) -> EncounterCoordinator {
        let pool = vec![Creature {
            id: "wolf".into(),
            name: "Wolf".into(),
            cr: 0.25,
            terrain_preference: vec!["plains".into()],
        }];
        let party = vec![PartyMember::new(1), PartyMember::new(1)];
        EncounterCoordinator::new(
            config,
            Rc::new(UnmappedTerrain),
            Rc::new(pool),
            Rc::new(party),
            Box::new(rolls),
        )
    }

    fn hour(c: &mut EncounterCoordinator, sink: &mut Vec<Event>) {
        let now = GameTime {
            year: 1,
            month: 1,
            day: 1,
            hour: 9,
            minute: 0,
        };
        c.time_changed(now, TimeChangeReason::Travel, Duration::from_hours(1), sink);
    }

    fn skip_reasons(events: &[Event]) -> Vec<SkipReason> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Encounter(EncounterEvent::Skipped { reason, .. }) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn failed_roll_is_skipped() {
        let mut c = coordinator(ScriptedRolls::constant(0.99), EncounterConfig::default());
        let mut events = Vec::new();
        hour(&mut c, &mut events);
        assert_eq!(skip_reasons(&events), [SkipReason::RollFailed]);
        assert_eq!(c.state().travel_hours_elapsed, 1);
        assert_eq!(c.state().last_check_hour, 1);
    }

    #[test]
    fn successful_roll_activates_on_fallback_terrain() {
        let mut c = coordinator(ScriptedRolls::constant(0.0), EncounterConfig::default());
        let mut events = Vec::new();
        hour(&mut c, &mut events);
        assert!(c.state().is_active());
        let enc = c.state().active_encounter.as_ref().expect("active");
        assert_eq!(enc.terrain, "plains");
        assert!(enc.generated_at.is_some());
        assert!(events.iter().any(|e| e.name() == "encounter:generated"));

        // further hours do not stack encounters
        events.clear();
        hour(&mut c, &mut events);
        assert!(!events.iter().any(|e| e.name() == "encounter:check-triggered"));
        assert_eq!(c.state().travel_hours_elapsed, 2);
    }

    #[test]
    fn non_travel_time_and_partial_hours_are_ignored() {
        let mut c = coordinator(ScriptedRolls::constant(0.0), EncounterConfig::default());
        let mut events = Vec::new();
        let now = GameTime {
            year: 1,
            month: 1,
            day: 1,
            hour: 9,
            minute: 30,
        };
        c.time_changed(now, TimeChangeReason::Rest, Duration::from_hours(8), &mut events);
        c.time_changed(now, TimeChangeReason::Travel, Duration::from_minutes_only(30), &mut events);
        assert!(events.is_empty());
        assert_eq!(c.state().travel_hours_elapsed, 0);
    }

    #[test]
    fn disabled_checks_report_reason() {
        let config = EncounterConfig {
            enabled: false,
            ..EncounterConfig::default()
        };
        let mut c = coordinator(ScriptedRolls::constant(0.0), config);
        let mut events = Vec::new();
        hour(&mut c, &mut events);
        assert_eq!(skip_reasons(&events), [SkipReason::Disabled]);
        assert!(!c.state().is_active());
    }

    #[test]
    fn resolve_and_dismiss() {
        let mut c = coordinator(ScriptedRolls::constant(0.0), EncounterConfig::default());
        let mut events = Vec::new();
        let err = c
            .resolve_encounter(EncounterOutcome::Victory, &mut events)
            .expect_err("nothing active");
        assert_eq!(err.code, ErrorCode::NoActiveEncounter);

        hour(&mut c, &mut events);
        c.resolve_encounter(EncounterOutcome::Flee, &mut events).expect("resolve");
        assert!(!c.state().is_active());

        c.generate_now(&mut events).expect("manual");
        let err = c.generate_now(&mut events).expect_err("already active");
        assert_eq!(err.code, ErrorCode::EncounterActive);
        c.dismiss_encounter(&mut events);
        assert!(c.state().active_encounter.is_none());
        c.dismiss_encounter(&mut events);
    }

    #[test]
    fn counters_reset_when_travel_starts() {
        let mut c = coordinator(ScriptedRolls::constant(0.99), EncounterConfig::default());
        let mut events = Vec::new();
        hour(&mut c, &mut events);
        hour(&mut c, &mut events);
        c.travel_started(HexCoordinate::new(4, 4), &mut events);
        assert_eq!(c.state().travel_hours_elapsed, 0);
        assert_eq!(c.state().last_check_hour, 0);
        assert_eq!(c.position(), HexCoordinate::new(4, 4));
    }
}
