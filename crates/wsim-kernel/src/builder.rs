//! Fluent kernel construction with up-front validation.
//!
//! Everything wrong with a scenario — malformed config, duplicate generator
//! slots, a missing stack factory — is rejected here, before the run
//! starts.  The builder owns the two pluggable models by value; pick them
//! at compile time the way you would pick a routing algorithm.

use wsim_core::{NodeId, Position, SimConfig};
use wsim_models::{BitManglingModel, PhysicalModel};

use crate::error::{KernelError, KernelResult};
use crate::generator::GeneratorManager;
use crate::kernel::Kernel;
use crate::layer::Layer;
use crate::node::Node;
use crate::observer::{KernelObserver, NoopObserver};

type StackFactory = Box<dyn FnMut(NodeId) -> Vec<Box<dyn Layer>>>;

pub struct KernelBuilder<P, B> {
    config:    SimConfig,
    physical:  P,
    mangling:  B,
    positions: Vec<Position>,
    stacks:    Option<StackFactory>,
    managers:  Vec<Box<dyn GeneratorManager>>,
    observer:  Box<dyn KernelObserver>,
}

impl<P: PhysicalModel, B: BitManglingModel> KernelBuilder<P, B> {
    pub fn new(config: SimConfig, physical: P, mangling: B) -> Self {
        Self {
            config,
            physical,
            mangling,
            positions: Vec::new(),
            stacks: None,
            managers: Vec::new(),
            observer: Box::new(NoopObserver),
        }
    }

    /// One node per position, ids assigned sequentially from zero.
    pub fn with_nodes(mut self, positions: Vec<Position>) -> Self {
        self.positions = positions;
        self
    }

    /// Factory producing each node's layer stack, bottom (medium side)
    /// first.
    pub fn with_stacks(mut self, factory: impl FnMut(NodeId) -> Vec<Box<dyn Layer>> + 'static) -> Self {
        self.stacks = Some(Box::new(factory));
        self
    }

    pub fn with_manager(mut self, manager: Box<dyn GeneratorManager>) -> Self {
        self.managers.push(manager);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn KernelObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn build(mut self) -> KernelResult<Kernel<P, B>> {
        self.config.validate()?;

        for (i, a) in self.managers.iter().enumerate() {
            if self.managers[i + 1..].iter().any(|b| b.kind() == a.kind()) {
                return Err(KernelError::DuplicateGenerator(a.kind()));
            }
        }

        let mut factory = self.stacks.take();
        if factory.is_none() && !self.positions.is_empty() {
            return Err(KernelError::MissingStackFactory);
        }

        let seed = self.config.seed;
        let nodes: Vec<Node> = self
            .positions
            .into_iter()
            .enumerate()
            .map(|(i, position)| {
                let id = NodeId(i as u32);
                let stack = factory.as_mut().map(|f| f(id)).unwrap_or_default();
                Node::new(id, position, stack, seed)
            })
            .collect();

        Ok(Kernel::new(
            self.config,
            nodes,
            self.physical,
            self.mangling,
            self.managers,
            self.observer,
        ))
    }
}
