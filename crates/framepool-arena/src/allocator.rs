//! Ring-ordered block allocator.
//!
//! [`BlockAllocator`] owns the free-space state of the pool. Blocks are
//! carved from a circular address space in grant order:
//!
//! ```text
//!  not wrapped (head > tail)          wrapped (head <= tail)
//!  0      tail        head    cap     0   head      tail        cap
//!  |free..|##live#####|free...|       |###|free.....|####live###|gap|
//! ```
//!
//! A new block goes at `head` if it fits before the end of the pool,
//! otherwise at 0 if it fits before `tail`. The end-of-pool gap skipped
//! by a wrap is reclaimed once the tail moves past it. Blocks are
//! reclaimed strictly oldest-first: releasing a younger block retires it,
//! and it is reclaimed when every older block has been released too.

use indexmap::IndexMap;
use tracing::{debug, warn};

use framepool_core::{Addr, AllocError, Generation, SizeRequest};

use crate::handle::Allocation;
use crate::size_class::BlockSizes;

/// Bookkeeping for one granted block.
#[derive(Clone, Copy, Debug)]
struct LiveBlock {
    units: u32,
    /// Released by the caller but not yet reclaimed (an older block is
    /// still live).
    retired: bool,
}

/// Size-validating allocator over a circular slot range.
///
/// All methods are O(1) except [`release()`](Self::release), which is
/// O(live blocks) when it reclaims from the tail.
pub struct BlockAllocator {
    sizes: BlockSizes,
    capacity: u32,
    /// Grant order: index 0 is the tail (oldest block).
    live: IndexMap<Addr, LiveBlock>,
    /// Next free slot after the newest block.
    head: u32,
    /// Units held by blocks in `live`, retired or not.
    used: u32,
    high_water: u32,
    generation: Generation,
}

impl BlockAllocator {
    /// Create an allocator over `capacity` slots.
    pub fn new(sizes: BlockSizes, capacity: u32) -> Self {
        Self {
            sizes,
            capacity,
            live: IndexMap::new(),
            head: 0,
            used: 0,
            high_water: 0,
            generation: Generation(0),
        }
    }

    /// Validate `request` and reserve a block for it.
    ///
    /// On error the free-space state is untouched: an identical valid
    /// request made afterwards behaves exactly as if the failed one had
    /// never been made.
    pub fn allocate(&mut self, request: SizeRequest) -> Result<Allocation, AllocError> {
        let block = match self.sizes.resolve(request) {
            Ok(block) => block,
            Err(e) => {
                warn!(
                    requested = request.units(),
                    max = self.sizes.max_request(),
                    "allocation rejected: request too large"
                );
                return Err(e);
            }
        };

        let Some(base) = self.find_fit(block) else {
            let largest_free = self.largest_free_run();
            warn!(block, largest_free, "allocation rejected: pool exhausted");
            return Err(AllocError::PoolExhausted {
                requested: block,
                largest_free,
            });
        };

        let addr = Addr(base);
        self.live.insert(
            addr,
            LiveBlock {
                units: block,
                retired: false,
            },
        );
        self.head = base + block;
        self.used += block;
        self.high_water = self.high_water.max(self.used);

        debug!(%addr, size = request.units(), block, "block granted");
        Ok(Allocation::new(addr, request, block, self.generation))
    }

    /// Release the block based at `addr`.
    ///
    /// The block's slots become reusable once every older block has been
    /// released as well.
    pub fn release(&mut self, addr: Addr) -> Result<(), AllocError> {
        match self.live.get_mut(&addr) {
            Some(block) if !block.retired => block.retired = true,
            _ => return Err(AllocError::NotLive { addr }),
        }
        debug!(%addr, "block released");

        while self.live.first().is_some_and(|(_, block)| block.retired) {
            if let Some((_, block)) = self.live.shift_remove_index(0) {
                self.used -= block.units;
            }
        }
        if self.live.is_empty() {
            self.head = 0;
        }
        Ok(())
    }

    /// Release an allocation, rejecting handles from an earlier generation.
    pub fn release_allocation(&mut self, allocation: &Allocation) -> Result<(), AllocError> {
        self.check_generation(allocation)?;
        self.release(allocation.addr())
    }

    /// Check that a handle was granted in the current generation.
    pub fn check_generation(&self, allocation: &Allocation) -> Result<(), AllocError> {
        if allocation.generation() != self.generation {
            return Err(AllocError::StaleHandle {
                handle_generation: allocation.generation(),
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Drop every block and start a new generation.
    pub fn reset(&mut self) {
        self.live.clear();
        self.head = 0;
        self.used = 0;
        self.generation = self.generation.next();
        debug!(generation = %self.generation, "pool reset");
    }

    /// Pool capacity in slots.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The block-size rules in force.
    pub fn sizes(&self) -> BlockSizes {
        self.sizes
    }

    /// Current pool generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Number of blocks granted and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.values().filter(|block| !block.retired).count()
    }

    /// Whether `addr` is the base of a block that has not been released.
    pub fn is_live(&self, addr: Addr) -> bool {
        self.live.get(&addr).is_some_and(|block| !block.retired)
    }

    /// Slots not held by any block. Not necessarily contiguous.
    pub fn free_units(&self) -> u32 {
        self.capacity - self.used
    }

    /// Slots held by blocks, including released blocks awaiting reclaim.
    pub fn used_units(&self) -> u32 {
        self.used
    }

    /// Highest `used_units()` seen since creation.
    pub fn high_water(&self) -> u32 {
        self.high_water
    }

    /// Longest run of slots a new block could be placed in.
    pub fn largest_free_run(&self) -> u32 {
        match self.tail() {
            None => self.capacity,
            Some(tail) if self.head > tail => (self.capacity - self.head).max(tail),
            Some(tail) => tail - self.head,
        }
    }

    /// Live blocks in grant order, as `(base, reserved units)`.
    pub fn live_blocks(&self) -> impl Iterator<Item = (Addr, u32)> + '_ {
        self.live
            .iter()
            .filter(|(_, block)| !block.retired)
            .map(|(addr, block)| (*addr, block.units))
    }

    fn tail(&self) -> Option<u32> {
        self.live.first().map(|(addr, _)| addr.0)
    }

    fn find_fit(&self, block: u32) -> Option<u32> {
        match self.tail() {
            None => (block <= self.capacity).then_some(0),
            Some(tail) if self.head > tail => {
                if self.capacity - self.head >= block {
                    Some(self.head)
                } else if tail >= block {
                    Some(0)
                } else {
                    None
                }
            }
            Some(tail) => (tail - self.head >= block).then_some(self.head),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(units: u32) -> SizeRequest {
        SizeRequest::new(units).unwrap()
    }

    fn allocator(capacity: u32) -> BlockAllocator {
        BlockAllocator::new(BlockSizes::new(4, 16), capacity)
    }

    #[test]
    fn boundary_requests() {
        let mut a = allocator(1024);
        assert!(a.allocate(req(14)).is_ok());
        assert!(matches!(
            a.allocate(req(18)),
            Err(AllocError::RequestTooLarge {
                requested: 18,
                max: 16
            })
        ));
        assert!(a.allocate(req(3)).is_ok());
        assert_eq!(a.live_count(), 2);
    }

    #[test]
    fn sequential_blocks_are_adjacent() {
        let mut a = allocator(1024);
        let first = a.allocate(req(16)).unwrap();
        let second = a.allocate(req(8)).unwrap();
        assert_eq!(first.addr(), Addr(0));
        assert_eq!(second.addr(), Addr(16));
        assert!(!first.overlaps(&second));
    }

    #[test]
    fn rejection_leaves_state_unchanged() {
        let mut a = allocator(64);
        a.allocate(req(5)).unwrap();
        let (free, used, head) = (a.free_units(), a.used_units(), a.head);
        assert!(a.allocate(req(20)).is_err());
        assert_eq!((a.free_units(), a.used_units(), a.head), (free, used, head));
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut a = allocator(32);
        a.allocate(req(16)).unwrap();
        a.allocate(req(16)).unwrap();
        assert_eq!(
            a.allocate(req(1)),
            Err(AllocError::PoolExhausted {
                requested: 4,
                largest_free: 0
            })
        );
    }

    #[test]
    fn exhaustion_recovers_after_release() {
        let mut a = allocator(32);
        let first = a.allocate(req(16)).unwrap();
        a.allocate(req(16)).unwrap();
        assert!(a.allocate(req(16)).is_err());
        a.release(first.addr()).unwrap();
        let third = a.allocate(req(16)).unwrap();
        assert_eq!(third.addr(), Addr(0));
    }

    #[test]
    fn wraps_around_when_tail_frees() {
        let mut a = allocator(48);
        let b0 = a.allocate(req(16)).unwrap(); // 0..16
        let b1 = a.allocate(req(16)).unwrap(); // 16..32
        let _b2 = a.allocate(req(12)).unwrap(); // 32..44, gap 44..48
        a.release(b0.addr()).unwrap();
        let b3 = a.allocate(req(16)).unwrap();
        assert_eq!(b3.addr(), Addr(0));
        assert!(a.allocate(req(4)).is_err());
        a.release(b1.addr()).unwrap();
        let b4 = a.allocate(req(16)).unwrap();
        assert_eq!(b4.addr(), Addr(16));
    }

    #[test]
    fn out_of_order_release_waits_for_tail() {
        let mut a = allocator(32);
        let b0 = a.allocate(req(16)).unwrap();
        let b1 = a.allocate(req(16)).unwrap();
        a.release(b1.addr()).unwrap();
        assert_eq!(a.live_count(), 1);
        assert_eq!(a.used_units(), 32);
        assert!(a.allocate(req(4)).is_err());
        a.release(b0.addr()).unwrap();
        assert_eq!(a.used_units(), 0);
        assert_eq!(a.allocate(req(4)).unwrap().addr(), Addr(0));
    }

    #[test]
    fn double_release_is_rejected() {
        let mut a = allocator(64);
        let b0 = a.allocate(req(4)).unwrap();
        let _b1 = a.allocate(req(4)).unwrap();
        a.release(b0.addr()).unwrap();
        assert_eq!(
            a.release(b0.addr()),
            Err(AllocError::NotLive { addr: b0.addr() })
        );
    }

    #[test]
    fn reset_bumps_generation_and_frees_everything() {
        let mut a = allocator(64);
        let stale = a.allocate(req(16)).unwrap();
        a.reset();
        assert_eq!(a.generation(), Generation(1));
        assert_eq!(a.free_units(), 64);
        assert!(matches!(
            a.release_allocation(&stale),
            Err(AllocError::StaleHandle { .. })
        ));
        assert_eq!(a.allocate(req(16)).unwrap().addr(), Addr(0));
    }

    #[test]
    fn high_water_tracks_peak() {
        let mut a = allocator(64);
        let b0 = a.allocate(req(16)).unwrap();
        a.allocate(req(8)).unwrap();
        a.release(b0.addr()).unwrap();
        assert_eq!(a.used_units(), 8);
        assert_eq!(a.high_water(), 24);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc(u32),
            ReleaseOldest,
            ReleaseNewest,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => (0u32..=31).prop_map(Op::Alloc),
                1 => Just(Op::ReleaseOldest),
                1 => Just(Op::ReleaseNewest),
            ]
        }

        proptest! {
            #[test]
            fn live_blocks_never_overlap(ops in proptest::collection::vec(op(), 1..200)) {
                let mut a = allocator(128);
                let mut live: Vec<Allocation> = Vec::new();
                for op in ops {
                    match op {
                        Op::Alloc(units) => match a.allocate(req(units)) {
                            Ok(new) => {
                                prop_assert!(units <= 16);
                                prop_assert!(new.block_range().end <= 128);
                                for other in &live {
                                    prop_assert!(!new.overlaps(other), "{new} overlaps {other}");
                                }
                                live.push(new);
                            }
                            Err(AllocError::RequestTooLarge { .. }) => prop_assert!(units > 16),
                            Err(AllocError::PoolExhausted { .. }) => {}
                            Err(e) => prop_assert!(false, "unexpected {e}"),
                        },
                        Op::ReleaseOldest if !live.is_empty() => {
                            let gone = live.remove(0);
                            a.release(gone.addr()).unwrap();
                        }
                        Op::ReleaseNewest => {
                            if let Some(gone) = live.pop() {
                                a.release(gone.addr()).unwrap();
                            }
                        }
                        _ => {}
                    }
                    prop_assert_eq!(a.live_count(), live.len());
                }
            }

            #[test]
            fn oversize_request_is_side_effect_free(
                prefix in proptest::collection::vec(0u32..=16, 0..10),
                oversize in 17u32..=31,
                follow in 0u32..=16,
            ) {
                let mut with_reject = allocator(256);
                let mut without = allocator(256);
                for &units in &prefix {
                    let _ = with_reject.allocate(req(units));
                    let _ = without.allocate(req(units));
                }
                prop_assert!(with_reject.allocate(req(oversize)).is_err());
                let a = with_reject.allocate(req(follow)).map(|x| x.addr());
                let b = without.allocate(req(follow)).map(|x| x.addr());
                prop_assert_eq!(a, b);
            }
        }
    }
}
