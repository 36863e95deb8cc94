use std::time::{Duration, Instant};

/// Quiet period after the last change before a run fires
pub const WATCH_DEBOUNCE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// A change arrived; fire at `deadline` unless another change restarts it
    Pending { deadline: Instant },
    /// A run is in progress. `rerun` records changes seen meanwhile.
    Firing { rerun: bool },
}

/// Event debouncer driven by explicit transitions:
/// `Idle -> Pending -> Firing -> Idle | Pending`.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Record a change event. A pending deadline is cancelled and restarted.
    pub fn on_event(&mut self, now: Instant) {
        self.state = match self.state {
            DebounceState::Idle | DebounceState::Pending { .. } => DebounceState::Pending {
                deadline: now + self.window,
            },
            DebounceState::Firing { .. } => DebounceState::Firing { rerun: true },
        };
    }

    /// When the pending run is due, if any
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            DebounceState::Pending { deadline } => Some(deadline),
            _ => None,
        }
    }

    /// Move to `Firing` if the deadline has passed. Returns true when the
    /// caller should start a run.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Firing { rerun: false };
                true
            }
            _ => false,
        }
    }

    /// The run finished. Changes seen while firing schedule another run.
    pub fn finish(&mut self, now: Instant) {
        self.state = match self.state {
            DebounceState::Firing { rerun: true } => DebounceState::Pending {
                deadline: now + self.window,
            },
            DebounceState::Firing { rerun: false } => DebounceState::Idle,
            other => other,
        };
    }
}
