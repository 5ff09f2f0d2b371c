// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

/// Represents the current cancel state.
#[derive(PartialEq)]
enum CancelState {
    Untouched,
    Cancelled,
}

/// A cancel handle is held by a scheduler run. The tick loop sleeps on the
/// handle between beats; cancelling wakes the sleeper immediately, so a run
/// can be torn down without waiting out the current beat.
#[derive(Clone)]
pub struct CancelHandle {
    /// Set once the underlying run should be cancelled.
    cancelled: Arc<Mutex<CancelState>>,
    /// The condvar will handle notification of cancelling.
    condvar: Arc<Condvar>,
}

impl CancelHandle {
    /// Creates a new cancel handle.
    pub fn new() -> CancelHandle {
        CancelHandle {
            cancelled: Arc::new(Mutex::new(CancelState::Untouched)),
            condvar: Arc::new(Condvar::new()),
        }
    }

    /// Returns true if the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.lock().expect("Error getting lock") == CancelState::Cancelled
    }

    /// Blocks until the deadline passes or the handle is cancelled, whichever
    /// comes first. Returns true if the handle was cancelled.
    pub fn wait_deadline(&self, deadline: Instant) -> bool {
        let mut state = self.cancelled.lock().expect("Error getting lock");
        loop {
            if *state == CancelState::Cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .condvar
                .wait_timeout(state, deadline - now)
                .expect("Error getting lock");
            state = next;
        }
    }

    /// Cancels the run and wakes any waiter.
    pub fn cancel(&self) {
        let mut cancel_state = self.cancelled.lock().expect("Error getting lock");
        if *cancel_state == CancelState::Untouched {
            *cancel_state = CancelState::Cancelled;
            self.condvar.notify_all();
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        CancelHandle::new()
    }
}

#[cfg(test)]
mod test {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_wait_deadline_times_out() {
        let cancel_handle = CancelHandle::new();
        let deadline = Instant::now() + Duration::from_millis(20);

        assert!(!cancel_handle.wait_deadline(deadline));
        assert!(Instant::now() >= deadline);
        assert!(!cancel_handle.is_cancelled());
    }

    #[test]
    fn test_cancel_wakes_waiter() {
        let cancel_handle = CancelHandle::new();

        let join = {
            let cancel_handle = cancel_handle.clone();
            thread::spawn(move || {
                cancel_handle.wait_deadline(Instant::now() + Duration::from_secs(60))
            })
        };

        cancel_handle.cancel();
        assert!(join.join().expect("Error joining thread"));
        assert!(cancel_handle.is_cancelled());
    }

    #[test]
    fn test_wait_after_cancel_returns_immediately() {
        let cancel_handle = CancelHandle::new();
        cancel_handle.cancel();
        assert!(cancel_handle.wait_deadline(Instant::now() + Duration::from_secs(60)));
    }
}
