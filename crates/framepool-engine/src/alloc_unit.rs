//! Cycle-level allocator state machine.
//!
//! [`AllocatorUnit`] wraps a [`BlockAllocator`] in the signal protocol:
//! `alloc_en` and `request_size` are sampled on each edge, and the
//! answer appears on `o_valid`/`o_addr`/`o_err` a fixed number of edges
//! later.
//!
//! ```text
//!   IDLE ──alloc_en──▶ VALIDATE ──(latency elapsed)──┬──▶ GRANT  ──▶ IDLE
//!                                                    └──▶ REJECT ──▶ IDLE
//! ```
//!
//! Only one request is in flight. A strobe sampled while the unit is in
//! `VALIDATE`, including the edge that produces the pulse, is dropped:
//! there is no queue, so the caller that sent it has lost it.

use tracing::{debug, warn};

use framepool_arena::{Allocation, BlockAllocator};
use framepool_core::{AllocError, AllocInputs, AllocOutputs, SizeRequest};

use crate::clock::Clock;
use crate::error::EngineError;

/// Externally visible FSM state after the most recent edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No request in flight.
    Idle,
    /// A request is latched and waiting out the response latency.
    Validate,
    /// The last edge emitted a successful response pulse.
    Grant,
    /// The last edge emitted a rejection pulse.
    Reject,
}

#[derive(Clone, Copy, Debug)]
enum State {
    Idle,
    Validate { request: SizeRequest, remaining: u32 },
}

/// Allocator with a cycle-accurate request/response interface.
pub struct AllocatorUnit {
    allocator: BlockAllocator,
    latency: u32,
    state: State,
    phase: Phase,
    /// Registered outputs. `valid` is cleared every edge; `addr`/`err` hold.
    outputs: AllocOutputs,
    response: Option<Result<Allocation, AllocError>>,
    dropped_strobes: u64,
}

impl AllocatorUnit {
    /// Wrap `allocator` with a response latency of `latency` edges.
    ///
    /// A latency of 0 is treated as 1; the pulse never lands on the
    /// strobe edge itself.
    pub fn new(allocator: BlockAllocator, latency: u32) -> Self {
        Self {
            allocator,
            latency: latency.max(1),
            state: State::Idle,
            phase: Phase::Idle,
            outputs: AllocOutputs::default(),
            response: None,
            dropped_strobes: 0,
        }
    }

    /// Advance one edge.
    ///
    /// Returns the outputs as they stand after the edge.
    pub fn clock(&mut self, inputs: AllocInputs) -> AllocOutputs {
        self.outputs.valid = false;
        let busy = matches!(self.state, State::Validate { .. });

        self.phase = match self.state {
            State::Idle => Phase::Idle,
            State::Validate { request, remaining } if remaining <= 1 => {
                self.state = State::Idle;
                self.respond(request)
            }
            State::Validate { request, remaining } => {
                self.state = State::Validate {
                    request,
                    remaining: remaining - 1,
                };
                Phase::Validate
            }
        };

        if inputs.enable {
            if busy {
                self.dropped_strobes += 1;
                warn!(
                    request = %inputs.request_size,
                    dropped = self.dropped_strobes,
                    "strobe while request in flight, dropped"
                );
            } else {
                self.state = State::Validate {
                    request: inputs.request_size,
                    remaining: self.latency,
                };
                self.phase = Phase::Validate;
            }
        }

        self.outputs
    }

    fn respond(&mut self, request: SizeRequest) -> Phase {
        let result = self.allocator.allocate(request);
        self.outputs.valid = true;
        let phase = match &result {
            Ok(allocation) => {
                self.outputs.addr = allocation.addr();
                self.outputs.err = false;
                Phase::Grant
            }
            Err(_) => {
                // o_addr keeps its previous value; it is meaningless with o_err.
                self.outputs.err = true;
                Phase::Reject
            }
        };
        self.response = Some(result);
        phase
    }

    /// Take the typed result of the most recent pulse, if not yet taken.
    ///
    /// The signal outputs only say "rejected"; this says why, and hands
    /// back the [`Allocation`] needed to release or write the block.
    pub fn take_response(&mut self) -> Option<Result<Allocation, AllocError>> {
        self.response.take()
    }

    /// Strobe one request and clock until its pulse, at most `max_cycles`
    /// edges after the strobe.
    ///
    /// This is the caller-side bounded wait: the unit itself never times
    /// out, so a missing pulse is reported as
    /// [`EngineError::ResponseTimeout`].
    pub fn request(
        &mut self,
        size: SizeRequest,
        max_cycles: u64,
        clock: &mut Clock,
    ) -> Result<Allocation, EngineError> {
        self.response = None;
        clock.edge();
        self.clock(AllocInputs::strobe(size));
        for _ in 0..max_cycles {
            clock.edge();
            let out = self.clock(AllocInputs::idle());
            if out.valid {
                return match self.take_response() {
                    Some(result) => result.map_err(EngineError::from),
                    None => Err(EngineError::ResponseTimeout { cycles: max_cycles }),
                };
            }
        }
        warn!(
            request = %size,
            cycles = max_cycles,
            "no allocator response"
        );
        Err(EngineError::ResponseTimeout { cycles: max_cycles })
    }

    /// Release a granted block back to the pool.
    pub fn release(&mut self, allocation: &Allocation) -> Result<(), AllocError> {
        self.allocator.release_allocation(allocation)
    }

    /// Drop every block, abandon any in-flight request, and clear outputs.
    pub fn reset(&mut self) {
        if matches!(self.state, State::Validate { .. }) {
            debug!("reset abandoned in-flight request");
        }
        self.allocator.reset();
        self.state = State::Idle;
        self.phase = Phase::Idle;
        self.outputs = AllocOutputs::default();
        self.response = None;
    }

    /// The wrapped allocator.
    pub fn allocator(&self) -> &BlockAllocator {
        &self.allocator
    }

    /// Whether a request is in flight.
    pub fn busy(&self) -> bool {
        matches!(self.state, State::Validate { .. })
    }

    /// State after the most recent edge.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current registered outputs.
    pub fn outputs(&self) -> AllocOutputs {
        self.outputs
    }

    /// Response latency in edges.
    pub fn latency(&self) -> u32 {
        self.latency
    }

    /// Strobes dropped because a request was already in flight.
    pub fn dropped_strobes(&self) -> u64 {
        self.dropped_strobes
    }
}
