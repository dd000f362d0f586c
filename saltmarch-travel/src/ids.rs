//! Instance-scoped identifier generation for routes, waypoints and encounters.

/// Entity family an identifier is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Route,
    Waypoint,
    Encounter,
}

impl IdKind {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Waypoint => "wp",
            Self::Encounter => "enc",
        }
    }
}

/// Source of fresh identifiers. Every travel machine and coordinator owns its
/// own generator, so two sessions never share a counter.
pub trait IdGenerator {
    fn next_id(&mut self, kind: IdKind) -> String;
}

/// Monotonic counter producing ids such as `route-1`, `wp-2`.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, kind: IdKind) -> String {
        self.next = self.next.saturating_add(1);
        format!("{}-{}", kind.prefix(), self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_instance() {
        let mut a = SequentialIds::new();
        let mut b = SequentialIds::new();
        assert_eq!(a.next_id(IdKind::Route), "route-1");
        assert_eq!(a.next_id(IdKind::Waypoint), "wp-2");
        assert_eq!(b.next_id(IdKind::Route), "route-1");
        assert_eq!(a.next_id(IdKind::Encounter), "enc-3");
    }
}
