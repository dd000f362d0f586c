//! Session wrapper wiring the travel and encounter domains through one bus.
use std::cell::RefCell;
use std::rc::Rc;

use crate::encounter::{EncounterConfig, EncounterCoordinator, EncounterState};
use crate::error::CommandResult;
use crate::events::{
    Command, EncounterEvent, Envelope, Event, EventBus, EventId, EventSink, SubscriptionId, TimeEvent,
    TravelEvent,
};
use crate::hex::HexCoordinate;
use crate::ids::SequentialIds;
use crate::ports::{CreaturePool, NullPositionStore, PartyRoster, PositionStore, TerrainLookup, TimeService};
use crate::rng::RandomSource;
use crate::travel::{TravelConfig, TravelMachine, TravelState};

/// Host-provided collaborators for a session.
pub struct SessionPorts {
    pub terrain: Rc<dyn TerrainLookup>,
    pub time: Rc<RefCell<dyn TimeService>>,
    pub creatures: Rc<dyn CreaturePool>,
    pub party: Rc<dyn PartyRoster>,
    pub rng: Box<dyn RandomSource>,
    pub store: Box<dyn PositionStore>,
}

impl SessionPorts {
    /// Ports with a store that discards writes.
    pub fn new(
        terrain: Rc<dyn TerrainLookup>,
        time: Rc<RefCell<dyn TimeService>>,
        creatures: Rc<dyn CreaturePool>,
        party: Rc<dyn PartyRoster>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            terrain,
            time,
            creatures,
            party,
            rng,
            store: Box::new(NullPositionStore),
        }
    }

    #[must_use]
    pub fn with_position_store(mut self, store: Box<dyn PositionStore>) -> Self {
        self.store = store;
        self
    }
}

/// High-level session owning the bus, the travel machine and the encounter
/// coordinator.
///
/// Hosts feed [`Command`]s in through [`dispatch`](Self::dispatch) and watch
/// the resulting envelopes through [`subscribe`](Self::subscribe). Each
/// dispatch drains the whole cascade before returning.
pub struct TravelSession {
    bus: EventBus,
    travel: TravelMachine,
    encounters: EncounterCoordinator,
}

impl TravelSession {
    /// Construct a session with instance-scoped id generators.
    pub fn new(travel_config: TravelConfig, encounter_config: EncounterConfig, ports: SessionPorts) -> Self {
        let travel = TravelMachine::new(travel_config, Rc::clone(&ports.terrain), ports.time)
            .with_ids(Box::new(SequentialIds::new()))
            .with_position_store(ports.store);
        let encounters = EncounterCoordinator::new(
            encounter_config,
            ports.terrain,
            ports.creatures,
            ports.party,
            ports.rng,
        )
        .with_ids(Box::new(SequentialIds::new()));
        Self::from_parts(travel, encounters)
    }

    /// Build a session from preconfigured components.
    #[must_use]
    pub fn from_parts(travel: TravelMachine, encounters: EncounterCoordinator) -> Self {
        let mut session = Self {
            bus: EventBus::new(),
            travel,
            encounters,
        };
        let position = session.travel.state().party_position;
        session.encounters.party_moved(position);
        session
    }

    /// Place the party before any travel, without events or persistence.
    #[must_use]
    pub fn with_party_position(mut self, coord: HexCoordinate) -> Self {
        self.travel = self.travel.with_party_position(coord);
        self.encounters.party_moved(coord);
        self
    }

    /// Publish a command and process everything it causes.
    ///
    /// # Errors
    ///
    /// Returns the command's own failure. The failure is also published as a
    /// `command-failed` event; failures of reactions further down the cascade
    /// are only published.
    pub fn dispatch(&mut self, command: Command) -> CommandResult {
        let root = self.bus.enqueue(command.into());
        self.bus.begin_cascade(root);
        let outcome = self.drain(Some(root));
        self.bus.end_cascade();
        outcome
    }

    /// Advance the frame clock by `delta_ms` real milliseconds.
    pub fn tick(&mut self, delta_ms: f64) {
        // Ticks never fail.
        let _ = self.dispatch(Command::Tick { delta_ms });
    }

    /// Replace the travel configuration.
    pub fn update_travel_config(&mut self, config: TravelConfig) {
        self.travel.update_config(config, &mut self.bus);
        let _ = self.drain(None);
    }

    pub fn update_encounter_config(&mut self, config: EncounterConfig) {
        self.encounters.update_config(config);
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Envelope) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    #[must_use]
    pub const fn travel_state(&self) -> &TravelState {
        self.travel.state()
    }

    #[must_use]
    pub const fn encounter_state(&self) -> &EncounterState {
        self.encounters.state()
    }

    #[must_use]
    pub const fn travel(&self) -> &TravelMachine {
        &self.travel
    }

    #[must_use]
    pub const fn encounters(&self) -> &EncounterCoordinator {
        &self.encounters
    }

    fn drain(&mut self, root: Option<EventId>) -> CommandResult {
        let mut outcome = Ok(());
        while let Some(envelope) = self.bus.next() {
            self.bus.notify(&envelope);
            if let Err(err) = self.route(&envelope.event)
                && Some(envelope.id) == root
            {
                outcome = Err(err);
            }
        }
        outcome
    }

    fn route(&mut self, event: &Event) -> CommandResult {
        match event {
            Event::Command(command) => self.execute(command),
            Event::Travel(TravelEvent::Started { from, .. }) => {
                self.encounters.travel_started(*from, &mut self.bus);
                Ok(())
            }
            Event::Travel(
                TravelEvent::PositionChanged { current: position, .. }
                | TravelEvent::Stopped {
                    final_position: position,
                    ..
                }
                | TravelEvent::Completed { to: position, .. },
            ) => {
                self.encounters.party_moved(*position);
                Ok(())
            }
            Event::Travel(TravelEvent::StateChanged { state }) => {
                self.encounters.party_moved(state.current_position());
                Ok(())
            }
            Event::Encounter(EncounterEvent::Generated { encounter, .. }) => {
                if let Err(err) = self.travel.pause_travel(&mut self.bus) {
                    log::debug!(target: "saltmarch::session", "encounter {} left travel as is: {err}", encounter.id);
                }
                Ok(())
            }
            Event::Encounter(EncounterEvent::Resolved { encounter_id, .. }) => {
                if let Err(err) = self.travel.resume_travel(&mut self.bus) {
                    log::debug!(target: "saltmarch::session", "resolving {encounter_id} did not resume travel: {err}");
                }
                Ok(())
            }
            Event::Time(TimeEvent::Changed {
                current,
                reason,
                advanced,
                ..
            }) => {
                self.encounters
                    .time_changed(*current, *reason, *advanced, &mut self.bus);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn execute(&mut self, command: &Command) -> CommandResult {
        let sink = &mut self.bus;
        let result = match command {
            Command::StartTravel => self.travel.start_travel(sink),
            Command::PauseTravel => self.travel.pause_travel(sink),
            Command::ResumeTravel => self.travel.resume_travel(sink),
            Command::StopTravel => {
                self.travel.stop_travel(sink);
                Ok(())
            }
            Command::ClearRoute => {
                self.travel.clear_route(sink);
                Ok(())
            }
            Command::AddWaypoint { coord } => {
                self.travel.add_waypoint(*coord, sink);
                Ok(())
            }
            Command::RemoveWaypoint { waypoint_id } => self.travel.remove_waypoint(waypoint_id, sink),
            Command::MoveWaypoint { waypoint_id, coord } => {
                self.travel.move_waypoint(waypoint_id, *coord, sink)
            }
            Command::SetPartyPosition { coord } => {
                self.travel.set_party_position(*coord, sink);
                Ok(())
            }
            Command::Tick { delta_ms } => {
                self.travel.tick(*delta_ms, sink);
                Ok(())
            }
            Command::SetSpeed { speed } => {
                self.travel.set_animation_speed(*speed);
                Ok(())
            }
            Command::ResolveEncounter { outcome } => self.encounters.resolve_encounter(*outcome, sink),
            Command::DismissEncounter => {
                self.encounters.dismiss_encounter(sink);
                Ok(())
            }
            Command::GenerateEncounter => self.encounters.generate_now(sink).map(|_| ()),
        };

        if let Err(error) = &result {
            log::warn!(target: "saltmarch::session", "{} failed: {error}", command.name());
            let name = command.name().to_string();
            let failure: Event = if command.is_encounter() {
                EncounterEvent::CommandFailed {
                    command: name,
                    error: error.clone(),
                }
                .into()
            } else {
                TravelEvent::CommandFailed {
                    command: name,
                    error: error.clone(),
                }
                .into()
            };
            self.bus.publish(failure);
        }
        result
    }
}
