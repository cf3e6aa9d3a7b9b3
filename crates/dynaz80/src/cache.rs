//! Compiled block cache.
//!
//! Blocks are keyed by start address and live until a write touches any
//! byte they were decoded from. The cache is a cheap clone handle so the
//! MMU write listener, the core and host components (e.g. a bank switching
//! controller) can all invalidate it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::trace;

use crate::dynarec::CompiledBlock;

const ADDRESS_SPACE: u32 = 0x1_0000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub compilations: u64,
    /// Blocks removed because a write touched them.
    pub invalidations: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct CacheInner {
    blocks: BTreeMap<u16, Arc<CompiledBlock>>,
    /// Start addresses of blocks that run past 0xFFFF.
    wrapping: BTreeSet<u16>,
    /// Upper bound on the length of any cached block.
    longest: u32,
    stats: CacheStats,
}

impl CacheInner {
    fn insert(&mut self, block: Arc<CompiledBlock>) {
        let address = block.address();
        if block.end() > ADDRESS_SPACE {
            self.wrapping.insert(address);
        } else {
            self.wrapping.remove(&address);
        }
        self.longest = self.longest.max(block.length());
        self.blocks.insert(address, block);
    }

    fn invalidate(&mut self, address: u16, length: usize) -> usize {
        if length == 0 || self.blocks.is_empty() {
            return 0;
        }

        let start = u32::from(address);
        let end = start + length.min(ADDRESS_SPACE as usize) as u32;
        let reach = self.longest.saturating_sub(1).min(start) as u16;

        let mut candidates: Vec<u16> = self
            .blocks
            .range(address - reach..=(end.min(ADDRESS_SPACE) - 1) as u16)
            .map(|(start, _)| *start)
            .collect();
        if end > ADDRESS_SPACE {
            let wrapped_end = (end - ADDRESS_SPACE).min(ADDRESS_SPACE);
            candidates.extend(
                self.blocks
                    .range(..=(wrapped_end - 1) as u16)
                    .map(|(start, _)| *start),
            );
        }
        candidates.extend(self.wrapping.iter().copied());

        let mut removed = 0;
        for candidate in candidates {
            let hit = self
                .blocks
                .get(&candidate)
                .is_some_and(|block| block.overlaps(address, length));
            if hit {
                self.blocks.remove(&candidate);
                self.wrapping.remove(&candidate);
                removed += 1;
            }
        }

        self.stats.invalidations += removed as u64;
        if removed > 0 {
            trace!("invalidated {removed} block(s) for write of {length} byte(s) at {address:#06X}");
        }
        removed
    }
}

#[derive(Clone, Default)]
pub struct BlockCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached block at `address`, if any. Does not count towards the stats.
    pub fn get(&self, address: u16) -> Option<Arc<CompiledBlock>> {
        self.lock().blocks.get(&address).cloned()
    }

    /// The block at `address`, compiling and caching it on a miss.
    ///
    /// The lock is not held while `compile` runs. A failed compilation
    /// caches nothing.
    pub fn get_or_compile<E>(
        &self,
        address: u16,
        compile: impl FnOnce() -> Result<CompiledBlock, E>,
    ) -> Result<Arc<CompiledBlock>, E> {
        {
            let mut inner = self.lock();
            if let Some(block) = inner.blocks.get(&address).cloned() {
                inner.stats.hits += 1;
                return Ok(block);
            }
            inner.stats.misses += 1;
        }

        let block = Arc::new(compile()?);
        let mut inner = self.lock();
        inner.stats.compilations += 1;
        inner.insert(Arc::clone(&block));
        Ok(block)
    }

    /// Drop every block that shares a byte with `[address, address + length)`.
    /// Returns how many were dropped.
    pub fn invalidate(&self, address: u16, length: usize) -> usize {
        self.lock().invalidate(address, length)
    }

    /// MMU write listener that keeps this cache coherent.
    pub fn write_listener(&self) -> impl FnMut(u16, usize) + Send + 'static {
        let cache = self.clone();
        move |address, length| {
            cache.invalidate(address, length);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().blocks.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.blocks.clear();
        inner.wrapping.clear();
        inner.longest = 0;
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }
}
