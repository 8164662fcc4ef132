//! Multi-hop flooding over a node grid.
//!
//! Node 0 broadcasts once; every node that decodes the packet for the first
//! time waits a jittered backoff, carrier-senses, and rebroadcasts.  The run
//! prints how far the flood spread and what the medium dropped on the way.
//!
//! ```text
//! RUST_LOG=debug cargo run -p flood
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use log::info;

use wsim_core::{NodeId, Position, SimConfig};
use wsim_event::CarrierSenseOutcome;
use wsim_kernel::{KernelBuilder, KernelResult, Layer, LayerCtx};
use wsim_models::{SirThresholdMangling, UnitDiskModel};
use wsim_packet::{LayerKind, Packet, PacketDestination};

const GRID_SIDE: usize = 5;
const SPACING_M: f64 = 70.0;
const SIGNAL_DBM: f64 = 14.0;
const AIRTIME_SECS: f64 = 0.004;

const TAG_START: u64 = 0;
const TAG_REBROADCAST: u64 = 1;

// ── Flooding MAC ──────────────────────────────────────────────────────────────

/// Rebroadcast-once flooding: relay the first valid copy heard, suppress the
/// rest.
struct FloodMac {
    heard:  Rc<RefCell<Vec<bool>>>,
    origin: bool,
}

impl FloodMac {
    fn send(&self, ctx: &mut LayerCtx<'_>) {
        let mut packet = Packet::new(LayerKind::Mac, ctx.node, PacketDestination::Broadcast, 192);
        if packet.set_duration_secs(AIRTIME_SECS).is_ok() {
            ctx.transmit(packet, SIGNAL_DBM, Vec::new());
        }
    }
}

impl Layer for FloodMac {
    fn kind(&self) -> LayerKind {
        LayerKind::Mac
    }

    fn initialize(&mut self, ctx: &mut LayerCtx<'_>) {
        if self.origin {
            ctx.schedule_wake_up(0.05, TAG_START);
        }
    }

    fn process_wake_up(&mut self, tag: u64, ctx: &mut LayerCtx<'_>) {
        match tag {
            TAG_START => {
                self.heard.borrow_mut()[ctx.node.index()] = true;
                self.send(ctx);
            }
            TAG_REBROADCAST => ctx.perform_carrier_sense(0.002, 0.004),
            _ => {}
        }
    }

    fn carrier_sense_result(&mut self, outcome: CarrierSenseOutcome, ctx: &mut LayerCtx<'_>) {
        if outcome.medium_free() {
            self.send(ctx);
        } else {
            let backoff = ctx.rng.gen_range(0.005..0.03);
            ctx.schedule_wake_up(backoff, TAG_REBROADCAST);
        }
    }

    fn upper_sap(&mut self, _packet: Packet, _ctx: &mut LayerCtx<'_>) {}

    fn lower_sap(&mut self, packet: Packet, ctx: &mut LayerCtx<'_>) {
        if !packet.chain_valid() {
            return;
        }
        let first_copy = {
            let mut heard = self.heard.borrow_mut();
            let slot = &mut heard[ctx.node.index()];
            !std::mem::replace(slot, true)
        };
        if first_copy {
            let jitter = ctx.rng.gen_range(0.002..0.02);
            ctx.schedule_wake_up(jitter, TAG_REBROADCAST);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn grid_positions() -> Vec<Position> {
    let mut positions = Vec::with_capacity(GRID_SIDE * GRID_SIDE);
    for row in 0..GRID_SIDE {
        for col in 0..GRID_SIDE {
            positions.push(Position::new(col as f64 * SPACING_M, row as f64 * SPACING_M));
        }
    }
    positions
}

fn main() -> KernelResult<()> {
    env_logger::init();

    let config = SimConfig {
        propagation_delay_secs: 1e-6,
        horizon_secs: 10.0,
        steps_per_second: 1_000,
        seed: 42,
    };

    let node_count = GRID_SIDE * GRID_SIDE;
    let heard = Rc::new(RefCell::new(vec![false; node_count]));
    let stacks_heard = Rc::clone(&heard);

    let mut kernel = KernelBuilder::new(
        config,
        UnitDiskModel::new(100.0, 180.0),
        SirThresholdMangling::new(10.0),
    )
    .with_nodes(grid_positions())
    .with_stacks(move |id| {
        vec![Box::new(FloodMac {
            heard:  Rc::clone(&stacks_heard),
            origin: id == NodeId(0),
        }) as Box<dyn Layer>]
    })
    .build()?;

    let outcome = kernel.run()?;
    info!("run ended: {outcome:?} at {}", kernel.now());

    let covered = heard.borrow().iter().filter(|h| **h).count();
    let (mut dropped, mut discarded, mut mangled) = (0, 0, 0);
    for node in kernel.nodes() {
        let counters = node.air.counters();
        dropped += counters.dropped;
        discarded += counters.discarded;
        mangled += counters.mangled;
    }

    println!("flood coverage: {covered}/{node_count} nodes");
    println!("envelopes delivered: {}", kernel.delivered_total());
    println!("dropped: {dropped}, discarded: {discarded}, mangled: {mangled}");
    Ok(())
}
