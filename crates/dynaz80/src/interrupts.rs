//! Halt/interrupt handshake between the execution loop and interrupt
//! sources.
//!
//! The execution loop is the only consumer: it halts, acknowledges the
//! halt, blocks in [`InterruptManager::wait_for_next_interrupt`] and
//! resumes. Producers on other threads call [`InterruptManager::interrupt`],
//! which forces a halt if needed and blocks until the loop has taken the
//! address. Only one interrupt can be in flight; requests arriving while
//! one is being delivered are dropped.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use log::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptPhase {
    Running,
    Halted,
    /// An address is waiting for the execution loop.
    InterruptPending,
    /// The loop has taken the address and is servicing it.
    DeliveringInterrupt,
}

type ResumeTask = Box<dyn FnOnce() + Send>;

struct State {
    phase: InterruptPhase,
    halt_acknowledged: bool,
    in_flight: bool,
    pending: Option<u16>,
    resume_tasks: Vec<ResumeTask>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            phase: InterruptPhase::Running,
            halt_acknowledged: false,
            in_flight: false,
            pending: None,
            resume_tasks: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    changed: Condvar,
}

#[derive(Clone, Default)]
pub struct InterruptManager {
    shared: Arc<Shared>,
}

impl InterruptManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait<'a>(&self, guard: MutexGuard<'a, State>) -> MutexGuard<'a, State> {
        self.shared
            .changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> InterruptPhase {
        self.lock().phase
    }

    /// Enter the halted state. A no-op unless running.
    pub fn halt(&self) {
        let mut state = self.lock();
        if state.phase == InterruptPhase::Running {
            state.phase = InterruptPhase::Halted;
            state.halt_acknowledged = false;
            self.shared.changed.notify_all();
        }
    }

    /// True from a halt (CPU or forced) until the matching resume.
    pub fn is_halted(&self) -> bool {
        self.lock().phase != InterruptPhase::Running
    }

    /// True while an interrupt request has not been fully delivered.
    pub fn interrupt_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Halted with no request queued or being delivered. Only a new
    /// request can end the halt.
    pub fn is_halted_without_request(&self) -> bool {
        let state = self.lock();
        state.phase != InterruptPhase::Running && !state.in_flight
    }

    /// The execution loop has observed the halt.
    pub fn notify_halt(&self) {
        let mut state = self.lock();
        state.halt_acknowledged = true;
        self.shared.changed.notify_all();
    }

    /// Block until an interrupt is delivered and return its address.
    pub fn wait_for_next_interrupt(&self) -> u16 {
        let mut state = self.lock();
        loop {
            if let Some(address) = state.pending.take() {
                state.phase = InterruptPhase::DeliveringInterrupt;
                state.in_flight = false;
                self.shared.changed.notify_all();
                return address;
            }
            state = self.wait(state);
        }
    }

    /// Leave the halted state and run the queued resume tasks.
    ///
    /// A request that arrived after the loop stopped waiting stays pending
    /// and is picked up on the next step.
    pub fn notify_resume(&self) {
        let tasks = {
            let mut state = self.lock();
            state.phase = if state.pending.is_some() {
                InterruptPhase::InterruptPending
            } else {
                InterruptPhase::Running
            };
            state.halt_acknowledged = false;
            self.shared.changed.notify_all();
            std::mem::take(&mut state.resume_tasks)
        };
        for task in tasks {
            task();
        }
    }

    /// Deliver `address` to the execution loop and wait until it has been
    /// taken. Returns `false` if another interrupt was already in flight
    /// and this one was dropped.
    pub fn interrupt(&self, address: u16) -> bool {
        let mut state = self.lock();
        if !self.begin(&mut state, address) {
            return false;
        }

        if state.phase == InterruptPhase::Running {
            state.phase = InterruptPhase::Halted;
            state.halt_acknowledged = false;
        }
        while !state.halt_acknowledged && state.phase == InterruptPhase::Halted {
            state = self.wait(state);
        }

        state.pending = Some(address);
        state.phase = InterruptPhase::InterruptPending;
        self.shared.changed.notify_all();
        while state.pending == Some(address) && state.in_flight {
            state = self.wait(state);
        }
        true
    }

    /// Queue `address` without waiting. For producers running on the
    /// execution thread, where [`interrupt`](Self::interrupt) would block
    /// forever. Returns `false` if the request was dropped.
    pub fn request_interrupt(&self, address: u16) -> bool {
        let mut state = self.lock();
        if !self.begin(&mut state, address) {
            return false;
        }
        state.pending = Some(address);
        state.phase = InterruptPhase::InterruptPending;
        self.shared.changed.notify_all();
        true
    }

    fn begin(&self, state: &mut State, address: u16) -> bool {
        if state.in_flight {
            // No priority ordering: the later request loses.
            debug!("dropping interrupt {address:#06X}: another interrupt is in flight");
            return false;
        }
        state.in_flight = true;
        true
    }

    /// Run `task` once, when the next resume completes.
    pub fn add_resume_task(&self, task: impl FnOnce() + Send + 'static) {
        self.lock().resume_tasks.push(Box::new(task));
    }
}

#[cfg(test)]
mod tests;
