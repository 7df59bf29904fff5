//! One-job-at-a-time gate for the panels.
//!
//! A panel runs at most one backend job at a time.  Refreshes that arrive
//! while a job runs are dropped (the next tick repeats them), but user
//! actions are kept: the most recent one waits in a single slot and is
//! handed back when the running job finishes.

use log::debug;

/// Busy flag plus one queued action.
#[derive(Debug)]
pub struct JobGate<A> {
    busy: bool,
    queued: Option<A>,
}

impl<A> Default for JobGate<A> {
    fn default() -> Self {
        Self {
            busy: false,
            queued: None,
        }
    }
}

impl<A> JobGate<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate for a job that may be skipped.  Returns `false` if a
    /// job is already running.
    pub fn try_begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Claim the gate for `action`, returning it to run now.  While busy
    /// the action is queued instead (replacing an older queued one) and
    /// `None` is returned.
    pub fn begin_or_queue(&mut self, action: A) -> Option<A> {
        if self.busy {
            if self.queued.replace(action).is_some() {
                debug!("queued action replaced");
            }
            return None;
        }
        self.busy = true;
        Some(action)
    }

    /// Mark the running job done.  A queued action is returned with the
    /// gate still claimed for it; otherwise the gate is released.
    pub fn finish(&mut self) -> Option<A> {
        match self.queued.take() {
            Some(next) => Some(next),
            None => {
                self.busy = false;
                None
            }
        }
    }
}
