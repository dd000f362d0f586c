//! Event vocabulary and the single-threaded publish/subscribe bus.
//!
//! Components never hold references to each other. They publish [`Event`]s into
//! an [`EventSink`]; the session drains the bus in FIFO order and routes each
//! envelope to whoever reacts to it. Publishing while a drain is in progress
//! simply queues the event behind the ones already pending.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::constants::MAX_CASCADE_DEPTH;
use crate::duration::Duration;
use crate::encounter::{EncounterOutcome, EncounterState, GeneratedEncounter, SkipReason};
use crate::error::CommandError;
use crate::hex::{HexCoordinate, PixelPoint};
use crate::time::{GameTime, TimeAdvanceResult, TimeChangeReason};
use crate::travel::TravelState;

/// Requests accepted from hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartTravel,
    PauseTravel,
    ResumeTravel,
    StopTravel,
    ClearRoute,
    AddWaypoint { coord: HexCoordinate },
    RemoveWaypoint { waypoint_id: String },
    MoveWaypoint { waypoint_id: String, coord: HexCoordinate },
    SetPartyPosition { coord: HexCoordinate },
    Tick { delta_ms: f64 },
    SetSpeed { speed: f64 },
    ResolveEncounter { outcome: EncounterOutcome },
    DismissEncounter,
    GenerateEncounter,
}

impl Command {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartTravel => "travel:start-requested",
            Self::PauseTravel => "travel:pause-requested",
            Self::ResumeTravel => "travel:resume-requested",
            Self::StopTravel => "travel:stop-requested",
            Self::ClearRoute => "travel:clear-requested",
            Self::AddWaypoint { .. } => "travel:waypoint-add-requested",
            Self::RemoveWaypoint { .. } => "travel:waypoint-remove-requested",
            Self::MoveWaypoint { .. } => "travel:waypoint-move-requested",
            Self::SetPartyPosition { .. } => "travel:position-set-requested",
            Self::Tick { .. } => "travel:tick-requested",
            Self::SetSpeed { .. } => "travel:speed-changed",
            Self::ResolveEncounter { .. } => "encounter:resolve-requested",
            Self::DismissEncounter => "encounter:dismiss-requested",
            Self::GenerateEncounter => "encounter:generate-requested",
        }
    }

    /// Whether the command belongs to the encounter domain.
    #[must_use]
    pub const fn is_encounter(&self) -> bool {
        matches!(
            self,
            Self::ResolveEncounter { .. } | Self::DismissEncounter | Self::GenerateEncounter
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TravelEvent {
    Started {
        route_id: String,
        from: HexCoordinate,
        to: HexCoordinate,
        estimated_duration: Duration,
    },
    Paused {
        route_id: String,
        current_position: HexCoordinate,
        progress: f64,
    },
    Resumed {
        route_id: String,
    },
    Stopped {
        final_position: HexCoordinate,
        progress: f64,
    },
    Completed {
        route_id: String,
        from: HexCoordinate,
        to: HexCoordinate,
        actual_duration: Duration,
    },
    WaypointReached {
        route_id: String,
        waypoint_id: String,
        coord: HexCoordinate,
    },
    PositionChanged {
        previous: HexCoordinate,
        current: HexCoordinate,
        pixel_position: PixelPoint,
    },
    StateChanged {
        state: TravelState,
    },
    CommandFailed {
        command: String,
        error: CommandError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncounterEvent {
    CheckTriggered {
        hour: u32,
        terrain: String,
        position: HexCoordinate,
    },
    Generated {
        encounter: GeneratedEncounter,
        hour: u32,
        position: HexCoordinate,
    },
    Skipped {
        hour: u32,
        terrain: String,
        reason: SkipReason,
    },
    Resolved {
        encounter_id: String,
        outcome: EncounterOutcome,
    },
    StateChanged {
        state: EncounterState,
    },
    CommandFailed {
        command: String,
        error: CommandError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeEvent {
    Changed {
        previous: GameTime,
        current: GameTime,
        reason: TimeChangeReason,
        /// Amount requested from the time port for this change.
        advanced: Duration,
    },
    DayChanged {
        current: GameTime,
    },
    TimeOfDayChanged {
        previous: String,
        current: String,
    },
    SeasonChanged {
        previous: String,
        current: String,
    },
}

impl TimeEvent {
    /// Events describing one time-port advancement, `Changed` first.
    #[must_use]
    pub fn from_advance(result: &TimeAdvanceResult, reason: TimeChangeReason, advanced: Duration) -> Vec<Self> {
        let mut events = vec![Self::Changed {
            previous: result.previous,
            current: result.current,
            reason,
            advanced,
        }];
        if result.day_changed {
            events.push(Self::DayChanged {
                current: result.current,
            });
        }
        if let Some(change) = &result.time_of_day_change {
            events.push(Self::TimeOfDayChanged {
                previous: change.previous.clone(),
                current: change.current.clone(),
            });
        }
        if let Some(change) = &result.season_change {
            events.push(Self::SeasonChanged {
                previous: change.previous.clone(),
                current: change.current.clone(),
            });
        }
        events
    }
}

/// Everything that travels over the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum Event {
    Command(Command),
    Travel(TravelEvent),
    Encounter(EncounterEvent),
    Time(TimeEvent),
}

impl Event {
    /// Stable wire name, e.g. `travel:waypoint-reached`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Command(command) => command.name(),
            Self::Travel(event) => match event {
                TravelEvent::Started { .. } => "travel:started",
                TravelEvent::Paused { .. } => "travel:paused",
                TravelEvent::Resumed { .. } => "travel:resumed",
                TravelEvent::Stopped { .. } => "travel:stopped",
                TravelEvent::Completed { .. } => "travel:completed",
                TravelEvent::WaypointReached { .. } => "travel:waypoint-reached",
                TravelEvent::PositionChanged { .. } => "travel:position-changed",
                TravelEvent::StateChanged { .. } => "travel:state-changed",
                TravelEvent::CommandFailed { .. } => "travel:command-failed",
            },
            Self::Encounter(event) => match event {
                EncounterEvent::CheckTriggered { .. } => "encounter:check-triggered",
                EncounterEvent::Generated { .. } => "encounter:generated",
                EncounterEvent::Skipped { .. } => "encounter:skipped",
                EncounterEvent::Resolved { .. } => "encounter:resolved",
                EncounterEvent::StateChanged { .. } => "encounter:state-changed",
                EncounterEvent::CommandFailed { .. } => "encounter:command-failed",
            },
            Self::Time(event) => match event {
                TimeEvent::Changed { .. } => "time:changed",
                TimeEvent::DayChanged { .. } => "time:day-changed",
                TimeEvent::TimeOfDayChanged { .. } => "time:time-of-day-changed",
                TimeEvent::SeasonChanged { .. } => "time:season-changed",
            },
        }
    }
}

impl From<Command> for Event {
    fn from(value: Command) -> Self {
        Self::Command(value)
    }
}

impl From<TravelEvent> for Event {
    fn from(value: TravelEvent) -> Self {
        Self::Travel(value)
    }
}

impl From<EncounterEvent> for Event {
    fn from(value: EncounterEvent) -> Self {
        Self::Encounter(value)
    }
}

impl From<TimeEvent> for Event {
    fn from(value: TimeEvent) -> Self {
        Self::Time(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An event with its bus id and the id of the command that caused it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation: Option<EventId>,
    pub event: Event,
}

impl Envelope {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.event.name()
    }
}

/// Destination for events published by a component.
pub trait EventSink {
    fn publish(&mut self, event: Event);
}

/// Collects events in order; handy for driving a component directly.
impl EventSink for Vec<Event> {
    fn publish(&mut self, event: Event) {
        self.push(event);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Envelope)>;

/// FIFO event queue with passive listeners.
///
/// Listeners observe envelopes as they are drained; they cannot publish. Only
/// the session reacts to events by calling into components.
///
/// Each queued envelope remembers its depth: zero for events published outside
/// a drain, one more than the envelope being handled otherwise. Long but
/// finite cascades drain completely; only a chain deeper than
/// [`MAX_CASCADE_DEPTH`] is cut.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<(Envelope, u32)>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_event: u64,
    next_subscription: u64,
    cause: Option<EventId>,
    /// Depth of the envelope last returned by [`EventBus::next`].
    handling: Option<u32>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.queue.len())
            .field("listeners", &self.listeners.len())
            .field("next_event", &self.next_event)
            .field("cause", &self.cause)
            .finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it sees every envelope drained from now on.
    pub fn subscribe(&mut self, listener: impl FnMut(&Envelope) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Queue an event and return its id. Events published during a cascade
    /// carry the id of the command that started it.
    ///
    /// An event that would sit deeper than [`MAX_CASCADE_DEPTH`] is logged and
    /// not queued; its id is still consumed.
    pub fn enqueue(&mut self, event: Event) -> EventId {
        self.next_event += 1;
        let id = EventId(self.next_event);
        let depth = self.handling.map_or(0, |d| d.saturating_add(1));
        if depth > MAX_CASCADE_DEPTH {
            log::error!(
                target: "saltmarch::bus",
                "dropping {} {id}: cascade from {:?} is deeper than {MAX_CASCADE_DEPTH}",
                event.name(),
                self.cause
            );
            return id;
        }
        log::trace!(target: "saltmarch::bus", "queued {} {id} at depth {depth}", event.name());
        self.queue.push_back((
            Envelope {
                id,
                correlation: self.cause,
                event,
            },
            depth,
        ));
        id
    }

    /// Start a cascade rooted at `cause`.
    pub fn begin_cascade(&mut self, cause: EventId) {
        self.cause = Some(cause);
        self.handling = None;
    }

    pub fn end_cascade(&mut self) {
        self.cause = None;
        self.handling = None;
    }

    /// Next queued envelope. Whatever is published until the following call
    /// is treated as a reaction to it.
    pub fn next(&mut self) -> Option<Envelope> {
        let Some((envelope, depth)) = self.queue.pop_front() else {
            self.handling = None;
            return None;
        };
        self.handling = Some(depth);
        Some(envelope)
    }

    /// Hand an envelope to every listener.
    pub fn notify(&mut self, envelope: &Envelope) {
        log::debug!(target: "saltmarch::bus", "{} {}", envelope.name(), envelope.id);
        for (_, listener) in &mut self.listeners {
            listener(envelope);
        }
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl EventSink for EventBus {
    fn publish(&mut self, event: Event) {
        self.enqueue(event);
    }
}
