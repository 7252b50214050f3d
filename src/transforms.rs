//! Task graph transforms: `split` (widen GPU paths across available GPUs)
//! and `map` (assign processing nodes to tasks).

use crate::{
    arch::{ArchGraph, ProcNode, RemoteNode},
    graph::{Graph, NodeIndex},
    task::TaskNode,
};

pub type TaskGraph = Graph<TaskNode>;

/// Picks a remote node for a remote-capable task. Per spec.md §9 Open
/// Question (i), the original always picked `remote_nodes[0]`; whether that
/// was intentional is unclear, so the policy is pluggable rather than
/// hard-coded.
pub trait RemoteNodeStrategy {
    fn select<'a>(&mut self, remote_nodes: &'a [RemoteNode]) -> &'a RemoteNode;
}

/// Reproduces the original behavior: always the first remote node.
#[derive(Default)]
pub struct FirstFitStrategy;

impl RemoteNodeStrategy for FirstFitStrategy {
    fn select<'a>(&mut self, remote_nodes: &'a [RemoteNode]) -> &'a RemoteNode {
        &remote_nodes[0]
    }
}

/// Splits `task_graph` in a way that most of the resources in `arch_graph`
/// can be occupied: the longest possible GPU-only paths are duplicated once
/// per additional GPU beyond the first.
pub fn split(task_graph: &mut TaskGraph, arch_graph: &ArchGraph) {
    let n_gpus = arch_graph.num_gpus();
    let paths = task_graph.get_paths(|node| node.is_gpu());

    for path in paths {
        for _ in 1..n_gpus {
            task_graph.split(&path);
        }
    }
}

/// `fuse` is declared but unimplemented upstream; kept as a documented
/// no-op rather than silently omitted. Its contract, were it implemented,
/// would merge adjacent single-predecessor/single-successor task pairs that
/// share a processing node into one fused task to increase data locality.
pub fn fuse(_task_graph: &mut TaskGraph) {}

/// Assigns processing nodes to every task in `task_graph` via DFS from each
/// root. GPU-capable or input-source nodes receive
/// `gpu_nodes[proc_index % n_gpus]`; remote-capable nodes receive the node
/// chosen by `strategy`. Each visited successor advances `proc_index` by one
/// (mod `n_gpus`) to fan siblings out across GPUs.
pub fn map(task_graph: &mut TaskGraph, arch_graph: &ArchGraph, strategy: &mut dyn RemoteNodeStrategy) {
    let roots = task_graph.roots();
    for root in roots {
        map_proc_node(task_graph, root, 0, arch_graph, strategy);
    }
}

fn map_proc_node(
    task_graph: &mut TaskGraph,
    node: NodeIndex,
    proc_index: usize,
    arch_graph: &ArchGraph,
    strategy: &mut dyn RemoteNodeStrategy,
) {
    let n_gpus = arch_graph.num_gpus().max(1);

    {
        let task = task_graph.node_mut(node);
        if task.is_gpu() || task.is_input_source() {
            if let Some(gpu) = arch_graph.gpu_nodes().get(proc_index % n_gpus) {
                task.proc_node = Some(ProcNode::Gpu(gpu.clone()));
            }
        }

        if task.is_remote() {
            if !arch_graph.remote_nodes().is_empty() {
                let remote = strategy.select(arch_graph.remote_nodes());
                task.proc_node = Some(ProcNode::Remote(remote.clone()));
            }
        }
    }

    let successors = task_graph.successors(node);
    let mut index = 0;
    for (successor, _label) in successors {
        map_proc_node(task_graph, successor, proc_index + index, arch_graph, strategy);
        index = (index + 1) % n_gpus;
    }
}
