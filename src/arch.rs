//! Enumeration of available processing resources.
//!
//! An [`ArchGraph`] is passive: it is not constructed by the core, only
//! consumed. The host environment is responsible for discovering the GPUs
//! and remote workers actually available and handing their identities here.

/// A single GPU processing resource. The core treats this as an opaque
/// identity — no internal detail is consumed beyond equality and cloning.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GpuNode {
    pub id: u32,
    pub name: String,
}

impl GpuNode {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A single remote worker processing resource, addressed the way a
/// [`crate::messenger::Messenger`] would connect to it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteNode {
    pub id: u32,
    pub address: String,
}

impl RemoteNode {
    pub fn new(id: u32, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
        }
    }
}

/// A processing node assigned to a task by [`crate::transforms::map`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProcNode {
    Gpu(GpuNode),
    Remote(RemoteNode),
}

/// Enumeration of available processing resources: GPUs and remote workers.
#[derive(Clone, Debug, Default)]
pub struct ArchGraph {
    gpu_nodes: Vec<GpuNode>,
    remote_nodes: Vec<RemoteNode>,
}

impl ArchGraph {
    pub fn new(gpu_nodes: Vec<GpuNode>, remote_nodes: Vec<RemoteNode>) -> Self {
        Self {
            gpu_nodes,
            remote_nodes,
        }
    }

    pub fn gpu_nodes(&self) -> &[GpuNode] {
        &self.gpu_nodes
    }

    pub fn remote_nodes(&self) -> &[RemoteNode] {
        &self.remote_nodes
    }

    pub fn num_gpus(&self) -> usize {
        self.gpu_nodes.len()
    }
}
