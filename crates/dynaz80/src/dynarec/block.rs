use std::fmt;

use crate::timing::InstructionTimings;

use super::context::ExecutionContext;

/// One decoded instruction (or part of one), ready to run.
pub type Operation = Box<dyn Fn(&mut ExecutionContext<'_>) + Send + Sync>;

type BlockBody = Box<dyn Fn(&mut ExecutionContext<'_>) -> InstructionTimings + Send + Sync>;

/// Box a closure as an [`Operation`], fixing its argument type.
#[inline]
pub(crate) fn operation<F>(f: F) -> Operation
where
    F: Fn(&mut ExecutionContext<'_>) + Send + Sync + 'static,
{
    Box::new(f)
}

#[inline]
fn body<F>(f: F) -> BlockBody
where
    F: Fn(&mut ExecutionContext<'_>) -> InstructionTimings + Send + Sync + 'static,
{
    Box::new(f)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockTiming {
    /// Every execution costs exactly this much.
    Static(InstructionTimings),
    /// At least this much; branches and repeat loops add to it at run time.
    Dynamic(InstructionTimings),
}

impl BlockTiming {
    pub fn base(&self) -> InstructionTimings {
        match *self {
            BlockTiming::Static(timings) | BlockTiming::Dynamic(timings) => timings,
        }
    }
}

/// An immutable translation of the bytes `[address, address + length)`.
pub struct CompiledBlock {
    address: u16,
    length: u32,
    timing: BlockTiming,
    body: BlockBody,
}

impl CompiledBlock {
    /// Fold the operations into a single callable with the block epilogue:
    /// the PC is moved past the block when `sync_pc` is set and R advances
    /// by the number of bytes decoded.
    pub(crate) fn finalize(
        address: u16,
        length: u32,
        operations: Vec<Operation>,
        timing: BlockTiming,
        sync_pc: bool,
    ) -> Self {
        let next = address.wrapping_add(length as u16);
        let run: BlockBody = match timing {
            BlockTiming::Static(timings) => body(move |ctx| {
                for operation in &operations {
                    operation(ctx);
                }
                if sync_pc {
                    ctx.registers.pc = next;
                }
                ctx.registers.increment_refresh(length);
                timings
            }),
            BlockTiming::Dynamic(base) => body(move |ctx| {
                for operation in &operations {
                    operation(ctx);
                }
                if sync_pc {
                    ctx.registers.pc = next;
                }
                ctx.registers.increment_refresh(length);
                base + ctx.take_extra_timing()
            }),
        };

        Self {
            address,
            length,
            timing,
            body: run,
        }
    }

    #[inline]
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Bytes decoded into this block.
    #[inline]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Exclusive end in the 17-bit space; exceeds 0xFFFF for blocks that
    /// wrap to the bottom of memory.
    #[inline]
    pub fn end(&self) -> u32 {
        u32::from(self.address) + self.length
    }

    #[inline]
    pub fn timing(&self) -> BlockTiming {
        self.timing
    }

    /// True if any byte of `[address, address + length)` belongs to this
    /// block. Both ranges may wrap past 0xFFFF.
    pub fn overlaps(&self, address: u16, length: usize) -> bool {
        if length == 0 {
            return false;
        }
        let relative = u32::from(address.wrapping_sub(self.address));
        if relative < self.length {
            return true;
        }
        let relative = u32::from(self.address.wrapping_sub(address));
        (relative as usize) < length
    }

    /// Run the block and return what it cost.
    #[inline]
    pub fn execute(&self, ctx: &mut ExecutionContext<'_>) -> InstructionTimings {
        (self.body)(ctx)
    }
}

impl fmt::Debug for CompiledBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBlock")
            .field("address", &format_args!("{:#06X}", self.address))
            .field("length", &self.length)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
