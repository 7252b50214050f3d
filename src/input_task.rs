//! The input task queue bridge (spec.md §4.4).
//!
//! Bridges an asynchronous external feed (e.g. a camera, a file reader
//! driven by its own thread) with a wrapped task's synchronous per-iteration
//! execution contract. Grounded in `ufo-input-task.c`: `release_input_buffer`
//! / `get_input_buffer` are the external producer/consumer surface;
//! `process` is what the scheduler drives once per iteration exactly like
//! any other [`crate::task::CpuTask`] or [`crate::task::GpuTask`].

use {
    crate::{
        arch::ProcNode,
        buffer::{Buffer, Requisition},
        error::Result,
        task::{CpuTask, GpuTask, Resources, Structure, TaskPlugin},
    },
    crossbeam_channel::{Receiver, Sender},
    parking_lot::Mutex,
};

/// The wrapped task body an [`InputTask`] drives each iteration. Only the
/// CPU and GPU execution shapes make sense to wrap — a reduce task has its
/// own collect/reduce contract and a remote task is driven by the messenger,
/// neither of which is what `ufo-input-task.c`'s synchronous `process`
/// bridges.
pub enum WrappedTask {
    Cpu(Box<dyn CpuTask>),
    Gpu(Box<dyn GpuTask>),
}

impl WrappedTask {
    fn get_structure(&self) -> Structure {
        match self {
            Self::Cpu(t) => t.get_structure(),
            Self::Gpu(t) => t.get_structure(),
        }
    }

    fn setup(&mut self, resources: &Resources) -> Result<()> {
        match self {
            Self::Cpu(t) => t.setup(resources),
            Self::Gpu(t) => t.setup(resources),
        }
    }

    fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
        match self {
            Self::Cpu(t) => t.get_requisition(inputs),
            Self::Gpu(t) => t.get_requisition(inputs),
        }
    }

    fn process(
        &mut self,
        inputs: &mut [Buffer],
        output: &mut Buffer,
        requisition: Requisition,
        proc_node: Option<&ProcNode>,
    ) -> Result<bool> {
        match self {
            Self::Cpu(t) => t.process(inputs, output, requisition),
            Self::Gpu(t) => {
                let proc_node = proc_node.expect("GPU task driven without an assigned proc node");
                t.process(inputs, output, requisition, proc_node)
            }
        }
    }
}

/// One input port's pair of queues: `inbound` carries full buffers pushed by
/// an external producer, `outbound` carries the same buffers on to whatever
/// pops them for the inner task to see.
struct PortQueues {
    inbound_tx: Sender<Buffer>,
    inbound_rx: Receiver<Buffer>,
    outbound_tx: Sender<Buffer>,
    outbound_rx: Receiver<Buffer>,
}

/// Bridges an asynchronous external feed with a wrapped task's synchronous
/// per-iteration `process` contract.
///
/// `active` flips to `false` when [`InputTask::stop`] is called; this does
/// not discard buffers already queued before the call — `process` keeps
/// draining and processing them one at a time, switching from a blocking to
/// a non-blocking pop. Only once the inbound queue is empty does `process`
/// return `Ok(false)` without touching the wrapped task, which is how
/// cooperative cancellation (spec.md §5) reaches this worker.
pub struct InputTask {
    wrapped: Mutex<WrappedTask>,
    ports: Vec<PortQueues>,
    active: std::sync::atomic::AtomicBool,
}

impl InputTask {
    pub fn new(wrapped: WrappedTask) -> Self {
        let n_inputs = wrapped.get_structure().n_inputs;
        let ports = (0..n_inputs)
            .map(|_| {
                let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
                let (outbound_tx, outbound_rx) = crossbeam_channel::unbounded();
                PortQueues {
                    inbound_tx,
                    inbound_rx,
                    outbound_tx,
                    outbound_rx,
                }
            })
            .collect();

        Self {
            wrapped: Mutex::new(wrapped),
            ports,
            active: std::sync::atomic::AtomicBool::new(true),
        }
    }

    pub fn setup(&self, resources: &Resources) -> Result<()> {
        self.wrapped.lock().setup(resources)
    }

    pub fn n_inputs(&self) -> usize {
        self.ports.len()
    }

    /// External producer pushes `buf` into `inbound[input_index]`.
    pub fn release_input_buffer(&self, input_index: usize, buf: Buffer) {
        self.ports[input_index]
            .inbound_tx
            .send(buf)
            .expect("input task outlives its own receivers");
    }

    /// External consumer pops from `outbound[input_index]` — the spent
    /// buffer the inner task has finished reading this iteration, handed
    /// back so the external producer can recycle or refill it.
    pub fn get_input_buffer(&self, input_index: usize) -> Buffer {
        self.ports[input_index]
            .outbound_rx
            .recv()
            .expect("input task outlives its own senders")
    }

    /// Sets `active = false`; the next `process` call returns terminal.
    pub fn stop(&self) {
        self.active.store(false, std::sync::atomic::Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Pops one buffer per input port, delegates to the wrapped task's
    /// synchronous execution, pushes each input slot buffer onward for
    /// external pickup, and returns whether the stream continues.
    ///
    /// While active, popping blocks (the external producer is still
    /// expected to feed this port). Once `stop()` has been called, popping
    /// switches to non-blocking: any buffers already queued before `stop()`
    /// are still drained and processed one at a time, and only once the
    /// inbound queue is empty does this return terminal — `stop()` ends the
    /// stream, it does not discard what was already queued.
    pub fn process(
        &self,
        output: &mut Buffer,
        proc_node: Option<&ProcNode>,
    ) -> Result<bool> {
        let active = self.is_active();
        let mut inputs: Vec<Buffer> = Vec::with_capacity(self.ports.len());

        for port in &self.ports {
            let popped = if active {
                port.inbound_rx.recv().ok()
            } else {
                port.inbound_rx.try_recv().ok()
            };

            match popped {
                Some(buf) => inputs.push(buf),
                None => {
                    // Nothing (more) to process this round. Re-queue
                    // whatever was already popped from other ports so a
                    // later call still sees a complete, in-order set.
                    for (p, buf) in self.ports.iter().zip(inputs) {
                        let _ = p.inbound_tx.send(buf);
                    }
                    return Ok(false);
                }
            }
        }

        let mut wrapped = self.wrapped.lock();
        let requisition = wrapped.get_requisition(&inputs);
        let cont = wrapped.process(&mut inputs, output, requisition, proc_node)?;
        drop(wrapped);

        for (port, buf) in self.ports.iter().zip(inputs) {
            port.outbound_tx
                .send(buf)
                .expect("input task outlives its own receivers");
        }

        if !cont {
            self.active.store(false, std::sync::atomic::Ordering::SeqCst);
        }

        Ok(cont)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{InputParam, Mode};

    struct PassThrough;

    impl TaskPlugin for PassThrough {
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

    impl CpuTask for PassThrough {
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

    #[test]
    fn bridges_one_buffer_through() {
        let input_task = InputTask::new(WrappedTask::Cpu(Box::new(PassThrough)));

        let mut source = Buffer::new(Requisition::new(&[4]), None).unwrap();
        source
            .get_host_array(None)
            .unwrap()
            .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        input_task.release_input_buffer(0, source);

        let mut output = Buffer::new(Requisition::new(&[4]), None).unwrap();
        let cont = input_task.process(&mut output, None).unwrap();
        assert!(cont);
        assert_eq!(output.get_host_array(None).unwrap(), &[1.0, 2.0, 3.0, 4.0]);

        // The spent input buffer is handed back for external pickup.
        let spent = input_task.get_input_buffer(0);
        assert_eq!(spent.get_size(), 16);
    }

    #[test]
    fn stop_makes_next_process_terminal() {
        let input_task = InputTask::new(WrappedTask::Cpu(Box::new(PassThrough)));
        input_task.stop();

        let mut output = Buffer::new(Requisition::new(&[4]), None).unwrap();
        assert!(!input_task.process(&mut output, None).unwrap());
    }
}
