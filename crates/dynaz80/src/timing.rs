use std::ops::{Add, AddAssign};

/// Cost of executed code in machine cycles (M) and clock cycles (T).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct InstructionTimings {
    pub machine_cycles: u32,
    pub clock_cycles: u32,
}

impl InstructionTimings {
    pub const fn new(machine_cycles: u32, clock_cycles: u32) -> Self {
        Self {
            machine_cycles,
            clock_cycles,
        }
    }

    #[inline]
    pub fn add_cycles(&mut self, machine_cycles: u32, clock_cycles: u32) {
        self.machine_cycles += machine_cycles;
        self.clock_cycles += clock_cycles;
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.machine_cycles == 0 && self.clock_cycles == 0
    }
}

impl Add for InstructionTimings {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.machine_cycles + rhs.machine_cycles,
            self.clock_cycles + rhs.clock_cycles,
        )
    }
}

impl AddAssign for InstructionTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.machine_cycles += rhs.machine_cycles;
        self.clock_cycles += rhs.clock_cycles;
    }
}

/// Sink for components that must advance in step with CPU time
/// (e.g. a video controller).
///
/// The core calls `sync` once after every executed block and once per
/// accepted interrupt, always on the execution thread.
pub trait InstructionTimingsSync: Send {
    fn sync(&mut self, timings: InstructionTimings);
}

impl<F> InstructionTimingsSync for F
where
    F: FnMut(InstructionTimings) + Send,
{
    fn sync(&mut self, timings: InstructionTimings) {
        self(timings)
    }
}
