//! Task nodes: the graph's payload type, and the plugin contract a concrete
//! task implements.
//!
//! Per the redesign note in spec.md §9, there is one concrete `TaskNode`
//! carrying a capability tag set and a single trait-object variant (the sum
//! of CPU | GPU | Remote bodies), rather than a class hierarchy with virtual
//! methods. The scheduler dispatches on the variant, never on runtime type
//! identity.

use {
    crate::{
        arch::ProcNode,
        buffer::{Buffer, Requisition},
        error::Result,
    },
    bitflags::bitflags,
};

bitflags! {
    /// Capability tags a task advertises. A task may hold more than one —
    /// e.g. a task that is both GPU-executable and an input source.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const CPU          = 0b0001;
        const GPU          = 0b0010;
        const REMOTE       = 0b0100;
        const INPUT_SOURCE = 0b1000;
    }
}

/// A task's execution mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// One-in/one-out per tick.
    Single,
    /// Stateful one-in/one-out.
    Processor,
    /// Many-in/few-out with explicit collect/reduce phases.
    Reduce,
}

/// Per-input metadata a task declares for one of its input ports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InputParam {
    pub n_dims: usize,
}

/// A task's structural metadata, returned once by `get_structure`.
#[derive(Clone, Debug)]
pub struct Structure {
    pub n_inputs: usize,
    pub input_params: Vec<InputParam>,
    pub mode: Mode,
}

/// Resources handed to a task at `setup` time — a stand-in for whatever the
/// host program's plugin loader and device enumeration provide. The core
/// does not interpret its contents.
#[derive(Clone, Copy, Debug, Default)]
pub struct Resources;

/// Every concrete task implements at least this.
pub trait TaskPlugin: Send {
    fn setup(&mut self, resources: &Resources) -> Result<()>;
    fn get_structure(&self) -> Structure;
    fn get_requisition(&self, inputs: &[Buffer]) -> Requisition;
}

/// A task executable on a CPU worker.
pub trait CpuTask: TaskPlugin {
    /// Returns whether the stream continues (`true`) or has ended (`false`).
    fn process(
        &mut self,
        inputs: &mut [Buffer],
        output: &mut Buffer,
        requisition: Requisition,
    ) -> Result<bool>;
}

/// A task executable on a GPU worker, bound to the `proc_node` assigned by
/// [`crate::transforms::map`].
pub trait GpuTask: TaskPlugin {
    fn process(
        &mut self,
        inputs: &mut [Buffer],
        output: &mut Buffer,
        requisition: Requisition,
        proc_node: &ProcNode,
    ) -> Result<bool>;
}

/// A task that participates in the remote transport, bound to the
/// `proc_node` assigned by [`crate::transforms::map`].
pub trait RemoteTask: TaskPlugin {
    fn process(
        &mut self,
        inputs: &mut [Buffer],
        output: &mut Buffer,
        requisition: Requisition,
        proc_node: &ProcNode,
    ) -> Result<bool>;
}

/// Accumulator state threaded through a reduce-mode task's `collect` calls
/// and finally consumed by `reduce`. Concrete reducers downcast this to
/// whatever state they need; the core only moves it around.
pub type Accumulator = Box<dyn std::any::Any + Send>;

/// A reduce-mode task: many inputs collected into an accumulator, then
/// drained into some number of outputs.
pub trait ReduceTask: TaskPlugin {
    fn collect(&mut self, inputs: &mut [Buffer], accumulator: &mut Accumulator) -> Result<()>;

    /// Called repeatedly after the first EOS. Returns `true` when `output`
    /// was written this call (the scheduler publishes it and calls again in
    /// case more follow), `false` once nothing more remains to be produced.
    fn reduce(&mut self, accumulator: &mut Accumulator, output: &mut Buffer) -> Result<bool>;

    fn new_accumulator(&self) -> Accumulator;
}

/// The sum-of-variants task body: exactly one concrete execution path per
/// task, selected by capability rather than subtype.
pub enum TaskBody {
    Cpu(Box<dyn CpuTask>),
    Gpu(Box<dyn GpuTask>),
    Remote(Box<dyn RemoteTask>),
    Reduce(Box<dyn ReduceTask>),
}

impl TaskBody {
    pub fn get_structure(&self) -> Structure {
        match self {
            Self::Cpu(t) => t.get_structure(),
            Self::Gpu(t) => t.get_structure(),
            Self::Remote(t) => t.get_structure(),
            Self::Reduce(t) => t.get_structure(),
        }
    }

    pub fn setup(&mut self, resources: &Resources) -> Result<()> {
        match self {
            Self::Cpu(t) => t.setup(resources),
            Self::Gpu(t) => t.setup(resources),
            Self::Remote(t) => t.setup(resources),
            Self::Reduce(t) => t.setup(resources),
        }
    }
}

/// A node in the task graph: structural metadata plus the assigned
/// processing node (set by `map`, absent before mapping).
///
/// `#[derive(Clone)]` clones every field, `proc_node` included — this is
/// relied on by [`crate::scheduler::Scheduler::run`], which clones each
/// mapped node to hand it to its worker thread and reads `proc_node` back
/// out of the clone for GPU/remote dispatch. A node duplicated by
/// [`crate::graph::Graph::split`] happens to carry whatever `proc_node` its
/// original had at that point, which is `None` in the normal pipeline order
/// (`split` runs before `map`) — `split` itself does not reset the field,
/// the graph just hasn't been mapped yet when it runs.
#[derive(Clone)]
pub struct TaskNode {
    pub plugin_name: String,
    pub capabilities: Capabilities,
    n_inputs: usize,
    mode: Mode,
    pub proc_node: Option<ProcNode>,
}

impl TaskNode {
    pub fn new(plugin_name: impl Into<String>, capabilities: Capabilities, n_inputs: usize, mode: Mode) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            capabilities,
            n_inputs,
            mode,
            proc_node: None,
        }
    }

    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_gpu(&self) -> bool {
        self.capabilities.contains(Capabilities::GPU)
    }

    pub fn is_cpu(&self) -> bool {
        self.capabilities.contains(Capabilities::CPU)
    }

    pub fn is_remote(&self) -> bool {
        self.capabilities.contains(Capabilities::REMOTE)
    }

    pub fn is_input_source(&self) -> bool {
        self.capabilities.contains(Capabilities::INPUT_SOURCE)
    }
}
