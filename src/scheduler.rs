//! The concurrency core: spawns one worker per mapped task node and drives
//! the `get_requisition -> acquire_output -> process -> publish` loop
//! described in spec.md §4.6.
//!
//! Per spec.md §9's redesign note, task nodes never carry a back-pointer to
//! the graph; the scheduler alone owns the `task_id -> proc_node` mapping
//! (baked into each node by [`crate::transforms::map`] before the graph
//! reaches here) and the edge queues that connect workers.

use {
    crate::{
        arch::ProcNode,
        buffer::{Buffer, DeviceContext, Requisition},
        config::ProfileLevel,
        error::{Error, Result},
        graph::NodeIndex,
        input_task::InputTask,
        logger::{default_logger, Logger},
        task::{Accumulator, Resources, TaskBody, TaskNode},
        transforms::TaskGraph,
    },
    crossbeam_channel::{Receiver, Sender},
    std::{
        collections::HashMap,
        sync::{Arc, Mutex},
        thread::{self, JoinHandle},
    },
};

/// Default bounded capacity for every edge's downstream and recycle queue,
/// per spec.md §4.6 ("implementation parameter, default small, e.g., 2").
pub const DEFAULT_QUEUE_CAPACITY: usize = 2;

/// The in-band sentinel carried on every edge alongside real data.
enum QueueItem {
    Data(Buffer),
    Eos,
}

/// A node's runtime body: either a concrete task variant, or a task wrapped
/// in an [`InputTask`] bridging an external asynchronous feed (spec.md
/// §4.4). Supplied by the host program per node — the core never
/// constructs task bodies itself (that is the plugin loader's job, out of
/// scope per spec.md §1).
pub enum NodeBody {
    Task(TaskBody),
    InputSource(Arc<InputTask>),
}

struct InEdge {
    down_rx: Receiver<QueueItem>,
    recycle_tx: Sender<Buffer>,
}

struct OutEdge {
    down_tx: Sender<QueueItem>,
    recycle_rx: Receiver<Buffer>,
}

/// One worker's error, recorded in the run-level collector and surfaced at
/// [`Scheduler::run`]'s final join (spec.md §7).
#[derive(Debug)]
pub struct WorkerFailure {
    pub plugin_name: String,
    pub error: Error,
}

/// The outcome of a completed run. `Ok(())` iff every worker exited via EOS
/// without error; cooperative `stop()` is the only clean, error-free early
/// termination path.
pub struct RunReport {
    pub failures: Vec<WorkerFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives a mapped [`TaskGraph`] to completion: one OS thread per task node,
/// connected by bounded FIFO edge queues with a parallel recycle
/// back-channel, as specified in spec.md §4.6.
pub struct Scheduler {
    task_graph: TaskGraph,
    bodies: HashMap<NodeIndex, NodeBody>,
    resources: Resources,
    context: Option<Arc<dyn DeviceContext>>,
    logger: Arc<dyn Logger>,
    profile_level: ProfileLevel,
    queue_capacity: usize,
}

impl Scheduler {
    pub fn new(
        task_graph: TaskGraph,
        bodies: HashMap<NodeIndex, NodeBody>,
        resources: Resources,
        context: Option<Arc<dyn DeviceContext>>,
    ) -> Self {
        Self {
            task_graph,
            bodies,
            resources,
            context,
            logger: default_logger(),
            profile_level: ProfileLevel::None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_profile_level(mut self, level: ProfileLevel) -> Self {
        self.profile_level = level;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Builds edge queues for every graph edge, spawns one worker thread
    /// per node, and blocks until every worker has exited.
    pub fn run(mut self) -> Result<RunReport> {
        let edges: Vec<(NodeIndex, NodeIndex, u32)> = self
            .task_graph
            .node_indices()
            .flat_map(|n| {
                self.task_graph
                    .successors(n)
                    .into_iter()
                    .map(move |(dest, label)| (n, dest, label))
            })
            .collect();

        // For every edge, build its downstream + recycle channel pair and
        // prime the recycle side with scratch buffers (spec.md §4.6: "primed
        // at pipeline start ... so steady-state allocations are zero").
        let mut out_edges: HashMap<NodeIndex, Vec<(u32, OutEdge)>> = HashMap::new();
        let mut in_edges: HashMap<NodeIndex, Vec<(u32, InEdge)>> = HashMap::new();

        for (source, dest, label) in edges {
            let (down_tx, down_rx) = crossbeam_channel::bounded(self.queue_capacity);
            let (recycle_tx, recycle_rx) = crossbeam_channel::bounded(self.queue_capacity);

            for _ in 0..self.queue_capacity {
                let scratch = Buffer::new(Requisition::new(&[1]), self.context.clone())?;
                recycle_tx
                    .send(scratch)
                    .expect("freshly created channel has capacity");
            }

            out_edges
                .entry(source)
                .or_default()
                .push((label, OutEdge { down_tx, recycle_rx }));
            in_edges
                .entry(dest)
                .or_default()
                .push((label, InEdge { down_rx, recycle_tx }));
        }

        let failures = Arc::new(Mutex::new(Vec::new()));
        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        for node in self.task_graph.node_indices() {
            let task = self.task_graph.node(node).clone();
            let body = self
                .bodies
                .remove(&node)
                .expect("every graph node must have a registered body");

            let mut node_in_edges = in_edges.remove(&node).unwrap_or_default();
            node_in_edges.sort_by_key(|(label, _)| *label);
            let node_in_edges: Vec<InEdge> = node_in_edges.into_iter().map(|(_, e)| e).collect();

            let mut node_out_edges = out_edges.remove(&node).unwrap_or_default();
            node_out_edges.sort_by_key(|(label, _)| *label);
            let node_out_edges: Vec<OutEdge> = node_out_edges.into_iter().map(|(_, e)| e).collect();

            let resources = self.resources;
            let context = self.context.clone();
            let logger = Arc::clone(&self.logger);
            let profile_level = self.profile_level;
            let failures = Arc::clone(&failures);

            handles.push(thread::spawn(move || {
                run_worker(
                    node,
                    task,
                    body,
                    node_in_edges,
                    node_out_edges,
                    resources,
                    context,
                    &*logger,
                    profile_level,
                    &failures,
                );
            }));
        }

        for handle in handles {
            let _ = handle.join();
        }

        let failures = Arc::try_unwrap(failures)
            .map(|m| m.into_inner().unwrap())
            .unwrap_or_default();

        Ok(RunReport { failures })
    }
}

fn emit_eos(out_edges: &[OutEdge]) {
    for edge in out_edges {
        let _ = edge.down_tx.send(QueueItem::Eos);
    }
}

/// Pops one item per in-edge that has not yet reported EOS. Returns, per
/// edge, either a real buffer or a flag that it has now seen EOS. Edges that
/// already saw EOS on a previous call are skipped (not polled again).
///
/// This realizes spec.md §4.6's fan-in barrier: "Multi-input fan-in takes
/// EOS when *all* inputs have EOS" — an edge hitting EOS before its
/// siblings does not by itself end the worker; the worker keeps draining
/// the other edges (discarding, since there is nothing meaningful to
/// process with a partial set of inputs) until every edge has reported EOS.
fn poll_inputs(
    in_edges: &[InEdge],
    eos_seen: &mut [bool],
    slots: &mut [Option<Buffer>],
) -> bool {
    for (i, edge) in in_edges.iter().enumerate() {
        if eos_seen[i] {
            continue;
        }

        match edge.down_rx.recv() {
            Ok(QueueItem::Data(buf)) => slots[i] = Some(buf),
            Ok(QueueItem::Eos) | Err(_) => eos_seen[i] = true,
        }
    }

    eos_seen.iter().all(|seen| *seen)
}

fn recycle_inputs(in_edges: &[InEdge], slots: &mut [Option<Buffer>]) {
    for (edge, slot) in in_edges.iter().zip(slots.iter_mut()) {
        if let Some(buf) = slot.take() {
            let _ = edge.recycle_tx.send(buf);
        }
    }
}

/// Acquires one output buffer per out-edge from that edge's recycle queue
/// (or allocates fresh on first use / capacity exhaustion), resized to
/// `requisition`. A node with no out-edges (a sink) still needs a single
/// throwaway buffer to satisfy `process`'s signature.
fn acquire_outputs(
    out_edges: &[OutEdge],
    requisition: Requisition,
    context: &Option<Arc<dyn DeviceContext>>,
) -> Result<Vec<Buffer>> {
    if out_edges.is_empty() {
        return Ok(vec![Buffer::new(requisition, context.clone())?]);
    }

    let mut outputs = Vec::with_capacity(out_edges.len());
    for edge in out_edges {
        let mut buf = match edge.recycle_rx.try_recv() {
            Ok(buf) => buf,
            Err(_) => Buffer::new(requisition, context.clone())?,
        };
        buf.resize(requisition)?;
        outputs.push(buf);
    }

    Ok(outputs)
}

fn publish_outputs(out_edges: &[OutEdge], mut outputs: Vec<Buffer>) {
    for (edge, buf) in out_edges.iter().zip(outputs.drain(..)) {
        let _ = edge.down_tx.send(QueueItem::Data(buf));
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    node_index: NodeIndex,
    node: TaskNode,
    mut body: NodeBody,
    in_edges: Vec<InEdge>,
    out_edges: Vec<OutEdge>,
    resources: Resources,
    context: Option<Arc<dyn DeviceContext>>,
    logger: &dyn Logger,
    profile_level: ProfileLevel,
    failures: &Mutex<Vec<WorkerFailure>>,
) {
    let plugin_name = node.plugin_name.clone();
    let proc_node = node.proc_node.clone();

    if profile_level != ProfileLevel::None {
        logger.info(&format!("worker[{node_index}:{plugin_name}] starting"));
    }

    let result = match &mut body {
        NodeBody::Task(TaskBody::Reduce(_)) => {
            run_reduce_worker(&mut body, &in_edges, &out_edges, &context, logger, profile_level)
        }
        _ => run_single_worker(
            &mut body,
            &in_edges,
            &out_edges,
            &resources,
            &context,
            proc_node.as_ref(),
            logger,
            profile_level,
        ),
    };

    match result {
        Ok(()) => {
            if profile_level != ProfileLevel::None {
                logger.info(&format!("worker[{plugin_name}] exited via EOS"));
            }
        }
        Err(error) => {
            logger.error(&format!("worker[{plugin_name}] failed: {error}"));
            emit_eos(&out_edges);
            failures.lock().unwrap().push(WorkerFailure {
                plugin_name,
                error,
            });
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_single_worker(
    body: &mut NodeBody,
    in_edges: &[InEdge],
    out_edges: &[OutEdge],
    resources: &Resources,
    context: &Option<Arc<dyn DeviceContext>>,
    proc_node: Option<&ProcNode>,
    logger: &dyn Logger,
    profile_level: ProfileLevel,
) -> Result<()> {
    match body {
        NodeBody::Task(task) => task.setup(resources)?,
        NodeBody::InputSource(input_task) => input_task.setup(resources)?,
    }

    let mut slots: Vec<Option<Buffer>> = (0..in_edges.len()).map(|_| None).collect();
    let mut eos_seen = vec![false; in_edges.len()];

    loop {
        if !in_edges.is_empty() {
            let all_eos = poll_inputs(in_edges, &mut eos_seen, &mut slots);
            if all_eos {
                emit_eos(out_edges);
                return Ok(());
            }

            // Partial EOS across a fan-in: nothing meaningful to process
            // this round. Recycle whatever arrived and keep draining the
            // remaining live edges until they too report EOS.
            if eos_seen.iter().any(|seen| *seen) {
                recycle_inputs(in_edges, &mut slots);
                continue;
            }
        }

        let mut inputs: Vec<Buffer> = slots.iter_mut().map(|s| s.take().unwrap()).collect();

        let requisition = match body {
            NodeBody::Task(TaskBody::Cpu(t)) => t.get_requisition(&inputs),
            NodeBody::Task(TaskBody::Gpu(t)) => t.get_requisition(&inputs),
            NodeBody::Task(TaskBody::Remote(t)) => t.get_requisition(&inputs),
            NodeBody::Task(TaskBody::Reduce(_)) => unreachable!("reduce handled separately"),
            NodeBody::InputSource(_) => Requisition::new(&[1]),
        };

        let mut outputs = acquire_outputs(out_edges, requisition, context)?;

        let cont = match body {
            NodeBody::Task(TaskBody::Cpu(t)) => t.process(&mut inputs, &mut outputs[0], requisition)?,
            NodeBody::Task(TaskBody::Gpu(t)) => {
                let proc_node = proc_node
                    .ok_or_else(|| Error::TaskFailure("GPU task has no assigned proc node".into()))?;
                t.process(&mut inputs, &mut outputs[0], requisition, proc_node)?
            }
            NodeBody::Task(TaskBody::Remote(t)) => {
                let proc_node = proc_node
                    .ok_or_else(|| Error::TaskFailure("remote task has no assigned proc node".into()))?;
                t.process(&mut inputs, &mut outputs[0], requisition, proc_node)?
            }
            NodeBody::Task(TaskBody::Reduce(_)) => unreachable!("reduce handled separately"),
            NodeBody::InputSource(input_task) => input_task.process(&mut outputs[0], proc_node)?,
        };

        for (edge, buf) in in_edges.iter().zip(inputs) {
            let _ = edge.recycle_tx.send(buf);
        }

        if !cont {
            // A terminal iteration (an input source signalling end-of-stream,
            // or a CPU/GPU/remote task returning `false`) has not necessarily
            // written `outputs[0]` — publishing it downstream would hand the
            // next worker a buffer that is still `Location::Invalid`. Drop
            // the acquired scratch buffers in place and emit EOS instead.
            emit_eos(out_edges);
            return Ok(());
        }

        for i in 1..outputs.len() {
            let (left, right) = outputs.split_at_mut(i);
            Buffer::copy(&left[0], &mut right[0])?;
        }

        if profile_level == ProfileLevel::Full {
            logger.debug(&format!(
                "worker iteration: {} inputs, requisition {:?}",
                inputs.len(),
                requisition.dims()
            ));
        }

        publish_outputs(out_edges, outputs);
    }
}

fn run_reduce_worker(
    body: &mut NodeBody,
    in_edges: &[InEdge],
    out_edges: &[OutEdge],
    context: &Option<Arc<dyn DeviceContext>>,
    logger: &dyn Logger,
    profile_level: ProfileLevel,
) -> Result<()> {
    let task = match body {
        NodeBody::Task(TaskBody::Reduce(t)) => t,
        _ => unreachable!("run_reduce_worker only called for Reduce bodies"),
    };

    let mut accumulator: Accumulator = task.new_accumulator();
    let mut slots: Vec<Option<Buffer>> = (0..in_edges.len()).map(|_| None).collect();
    let mut eos_seen = vec![false; in_edges.len()];
    let mut n_collected = 0usize;

    loop {
        let all_eos = poll_inputs(in_edges, &mut eos_seen, &mut slots);
        if all_eos {
            break;
        }

        if eos_seen.iter().any(|seen| *seen) {
            recycle_inputs(in_edges, &mut slots);
            continue;
        }

        let mut inputs: Vec<Buffer> = slots.iter_mut().map(|s| s.take().unwrap()).collect();
        task.collect(&mut inputs, &mut accumulator)?;
        n_collected += 1;

        for (edge, buf) in in_edges.iter().zip(inputs) {
            let _ = edge.recycle_tx.send(buf);
        }
    }

    if profile_level != ProfileLevel::None {
        logger.debug(&format!("reducer collected {n_collected} buffer(s) before EOS"));
    }

    loop {
        // Reduce-mode tasks always have output arity 1; a reducer with zero
        // out-edges would have nowhere to drain its result, so this treats
        // the same single-output contract as the regular worker loop.
        //
        // `reduce` returns `true` exactly when it wrote a buffer this call
        // (publish it, then call again in case more follow); `false` means
        // nothing was written and the reduce phase is over.
        let requisition = Requisition::new(&[1]);
        let mut outputs = acquire_outputs(out_edges, requisition, context)?;
        let wrote_output = task.reduce(&mut accumulator, &mut outputs[0])?;

        if !wrote_output {
            break;
        }

        publish_outputs(out_edges, outputs);
    }

    emit_eos(out_edges);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arch::{ArchGraph, GpuNode},
        buffer::Location,
        task::{Capabilities, InputParam, Mode, Structure, TaskPlugin},
        transforms,
    };

    struct Identity;

    impl TaskPlugin for Identity {
        fn setup(&mut self, _resources: &Resources) -> Result<()> {
            Ok(())
        }

        fn get_structure(&self) -> Structure {
            Structure {
                n_inputs: 1,
                input_params: vec![InputParam { n_dims: 1 }],
                mode: Mode::Single,
            }
        }

        fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
            inputs[0].get_requisition()
        }
    }

    impl crate::task::CpuTask for Identity {
        fn process(
            &mut self,
            inputs: &mut [Buffer],
            output: &mut Buffer,
            requisition: Requisition,
        ) -> Result<bool> {
            output.resize(requisition)?;
            Buffer::copy(&inputs[0], output)?;
            Ok(true)
        }
    }

    struct Sum {
        emitted: bool,
    }

    impl TaskPlugin for Sum {
        fn setup(&mut self, _resources: &Resources) -> Result<()> {
            Ok(())
        }

        fn get_structure(&self) -> Structure {
            Structure {
                n_inputs: 1,
                input_params: vec![InputParam { n_dims: 1 }],
                mode: Mode::Reduce,
            }
        }

        fn get_requisition(&self, _inputs: &[Buffer]) -> Requisition {
            Requisition::new(&[1])
        }
    }

    impl crate::task::ReduceTask for Sum {
        fn collect(&mut self, inputs: &mut [Buffer], accumulator: &mut Accumulator) -> Result<()> {
            let total = accumulator.downcast_mut::<f32>().unwrap();
            *total += inputs[0].get_host_array(None)?[0];
            Ok(())
        }

        fn reduce(&mut self, accumulator: &mut Accumulator, output: &mut Buffer) -> Result<bool> {
            if self.emitted {
                return Ok(false);
            }
            let total = *accumulator.downcast_ref::<f32>().unwrap();
            output.resize(Requisition::new(&[1]))?;
            output.get_host_array(None)?[0] = total;
            self.emitted = true;
            Ok(true)
        }

        fn new_accumulator(&self) -> Accumulator {
            Box::new(0.0f32)
        }
    }

    #[test]
    fn linear_pipeline_propagates_eos_and_preserves_order_s5() {
        let mut graph = TaskGraph::new();
        let src = graph.add_node(TaskNode::new(
            "src",
            Capabilities::CPU | Capabilities::INPUT_SOURCE,
            0,
            Mode::Single,
        ));
        let id = graph.add_node(TaskNode::new("id", Capabilities::CPU, 1, Mode::Single));
        let sink = graph.add_node(TaskNode::new("sink", Capabilities::CPU, 1, Mode::Single));
        graph.connect(src, id, 0);
        graph.connect(id, sink, 0);

        let input_task = Arc::new(InputTask::new(crate::input_task::WrappedTask::Cpu(Box::new(
            Identity,
        ))));

        for i in 0..10 {
            let mut buf = Buffer::new(Requisition::new(&[1]), None).unwrap();
            buf.get_host_array(None).unwrap()[0] = i as f32;
            input_task.release_input_buffer(0, buf);
        }

        let mut bodies: HashMap<NodeIndex, NodeBody> = HashMap::new();
        bodies.insert(src, NodeBody::InputSource(Arc::clone(&input_task)));
        bodies.insert(id, NodeBody::Task(TaskBody::Cpu(Box::new(Identity))));

        struct Sink {
            received: Mutex<Vec<f32>>,
        }
        impl TaskPlugin for Sink {
            fn setup(&mut self, _r: &Resources) -> Result<()> {
                Ok(())
            }
            fn get_structure(&self) -> Structure {
                Structure {
                    n_inputs: 1,
                    input_params: vec![InputParam { n_dims: 1 }],
                    mode: Mode::Single,
                }
            }
            fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
                inputs[0].get_requisition()
            }
        }
        impl crate::task::CpuTask for Sink {
            fn process(
                &mut self,
                inputs: &mut [Buffer],
                output: &mut Buffer,
                requisition: Requisition,
            ) -> Result<bool> {
                let value = inputs[0].get_host_array(None)?[0];
                self.received.lock().unwrap().push(value);
                output.resize(requisition)?;
                Ok(true)
            }
        }

        let received = Arc::new(Mutex::new(Vec::new()));
        struct SinkHandle(Arc<Mutex<Vec<f32>>>);
        impl TaskPlugin for SinkHandle {
            fn setup(&mut self, _r: &Resources) -> Result<()> {
                Ok(())
            }
            fn get_structure(&self) -> Structure {
                Structure {
                    n_inputs: 1,
                    input_params: vec![InputParam { n_dims: 1 }],
                    mode: Mode::Single,
                }
            }
            fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
                inputs[0].get_requisition()
            }
        }
        impl crate::task::CpuTask for SinkHandle {
            fn process(
                &mut self,
                inputs: &mut [Buffer],
                output: &mut Buffer,
                requisition: Requisition,
            ) -> Result<bool> {
                let value = inputs[0].get_host_array(None)?[0];
                self.0.lock().unwrap().push(value);
                output.resize(requisition)?;
                Ok(true)
            }
        }

        bodies.insert(
            sink,
            NodeBody::Task(TaskBody::Cpu(Box::new(SinkHandle(Arc::clone(&received))))),
        );

        let arch = ArchGraph::new(vec![GpuNode::new(0, "gpu0")], vec![]);
        let mut strategy = transforms::FirstFitStrategy;
        transforms::map(&mut graph, &arch, &mut strategy);

        input_task.stop();

        let scheduler = Scheduler::new(graph, bodies, Resources, None);
        let report = scheduler.run().unwrap();
        assert!(report.is_success());

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 10);
        assert_eq!(*received, (0..10).map(|i| i as f32).collect::<Vec<_>>());
    }

    #[test]
    fn reducer_emits_single_buffer_after_eos_s6() {
        let mut graph = TaskGraph::new();
        let src = graph.add_node(TaskNode::new(
            "src",
            Capabilities::CPU | Capabilities::INPUT_SOURCE,
            0,
            Mode::Single,
        ));
        let sum = graph.add_node(TaskNode::new("sum", Capabilities::CPU, 1, Mode::Reduce));
        let sink = graph.add_node(TaskNode::new("sink", Capabilities::CPU, 1, Mode::Single));
        graph.connect(src, sum, 0);
        graph.connect(sum, sink, 0);

        let input_task = Arc::new(InputTask::new(crate::input_task::WrappedTask::Cpu(Box::new(
            Identity,
        ))));
        for _ in 0..5 {
            let mut buf = Buffer::new(Requisition::new(&[1]), None).unwrap();
            buf.get_host_array(None).unwrap()[0] = 1.0;
            input_task.release_input_buffer(0, buf);
        }
        input_task.stop();

        let received = Arc::new(Mutex::new(Vec::new()));
        struct SinkHandle(Arc<Mutex<Vec<f32>>>);
        impl TaskPlugin for SinkHandle {
            fn setup(&mut self, _r: &Resources) -> Result<()> {
                Ok(())
            }
            fn get_structure(&self) -> Structure {
                Structure {
                    n_inputs: 1,
                    input_params: vec![InputParam { n_dims: 1 }],
                    mode: Mode::Single,
                }
            }
            fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
                inputs[0].get_requisition()
            }
        }
        impl crate::task::CpuTask for SinkHandle {
            fn process(
                &mut self,
                inputs: &mut [Buffer],
                output: &mut Buffer,
                requisition: Requisition,
            ) -> Result<bool> {
                let value = inputs[0].get_host_array(None)?[0];
                self.0.lock().unwrap().push(value);
                output.resize(requisition)?;
                Ok(true)
            }
        }

        let mut bodies: HashMap<NodeIndex, NodeBody> = HashMap::new();
        bodies.insert(src, NodeBody::InputSource(input_task));
        bodies.insert(
            sum,
            NodeBody::Task(TaskBody::Reduce(Box::new(Sum { emitted: false }))),
        );
        bodies.insert(
            sink,
            NodeBody::Task(TaskBody::Cpu(Box::new(SinkHandle(Arc::clone(&received))))),
        );

        let scheduler = Scheduler::new(graph, bodies, Resources, None);
        let report = scheduler.run().unwrap();
        assert!(report.is_success());

        let received = received.lock().unwrap();
        assert_eq!(*received, vec![5.0]);
    }

    #[test]
    fn location_reexport_smoke() {
        // Buffer::location is only used indirectly by workers; this just
        // confirms the re-export used above stays reachable from here.
        let buf = Buffer::new(Requisition::new(&[1]), None).unwrap();
        assert_eq!(buf.location(), Location::Invalid);
    }
}
