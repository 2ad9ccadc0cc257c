//! Liveness tracking: probe every connection each period, evict the ones
//! that never answered the previous probe.
//!
//! The monitor holds no timers and touches no sockets. Its owner calls
//! [`LivenessMonitor::sweep`] on a fixed interval, sends a ping to every
//! connection in [`Sweep::probe`], terminates every connection in
//! [`Sweep::evict`], and reports pongs back through
//! [`LivenessMonitor::confirm`].
//!
//! ```text
//!   track ──→ Confirmed ──(sweep: probe)──→ AwaitingProbe ──(sweep)──→ evicted
//!                 ↑                              │
//!                 └────────────(pong)────────────┘
//! ```

use std::collections::HashMap;

use stagecall_transport::ConnectionId;

/// Where a connection is in the probe cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    /// Answered the last probe (or was just admitted).
    Confirmed,
    /// Probed; must answer before the next sweep.
    AwaitingProbe,
}

/// What the owner must do after a sweep. Both lists are sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sweep {
    /// Connections that missed their probe. Already untracked.
    pub evict: Vec<ConnectionId>,
    /// Connections to ping now.
    pub probe: Vec<ConnectionId>,
}

/// Per-connection liveness states.
#[derive(Debug, Default)]
pub struct LivenessMonitor {
    states: HashMap<ConnectionId, LivenessState>,
}

impl LivenessMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a newly admitted connection as [`LivenessState::Confirmed`].
    pub fn track(&mut self, id: ConnectionId) {
        self.states.insert(id, LivenessState::Confirmed);
    }

    /// Records a probe response. Returns `false` for untracked connections.
    pub fn confirm(&mut self, id: ConnectionId) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                *state = LivenessState::Confirmed;
                true
            }
            None => false,
        }
    }

    /// Stops tracking a connection. Returns `false` if it wasn't tracked.
    pub fn untrack(&mut self, id: ConnectionId) -> bool {
        self.states.remove(&id).is_some()
    }

    pub fn state(&self, id: ConnectionId) -> Option<LivenessState> {
        self.states.get(&id).copied()
    }

    /// Runs one probe cycle.
    pub fn sweep(&mut self) -> Sweep {
        let mut sweep = Sweep::default();
        self.states.retain(|id, state| match state {
            LivenessState::AwaitingProbe => {
                sweep.evict.push(*id);
                false
            }
            LivenessState::Confirmed => {
                *state = LivenessState::AwaitingProbe;
                sweep.probe.push(*id);
                true
            }
        });
        sweep.evict.sort();
        sweep.probe.sort();

        if !sweep.evict.is_empty() {
            tracing::debug!(
                evicted = sweep.evict.len(),
                probed = sweep.probe.len(),
                "liveness sweep"
            );
        }
        sweep
    }

    /// Returns the number of tracked connections.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
