//! End-to-end scenarios driven purely through the public API (spec.md §8),
//! kept separate from the unit tests embedded next to each module — the
//! same split the teacher draws between its own unit tests and
//! `tests/gfx-backend-test`.

use {
    dflow_core::{prelude::*, task::TaskPlugin},
    std::sync::{Arc, Mutex},
};

struct PassThrough;

impl TaskPlugin for PassThrough {
    fn setup(&mut self, _resources: &dflow_core::task::Resources) -> Result<()> {
        Ok(())
    }

    fn get_structure(&self) -> dflow_core::task::Structure {
        dflow_core::task::Structure {
            n_inputs: 1,
            input_params: vec![dflow_core::task::InputParam { n_dims: 1 }],
            mode: dflow_core::task::Mode::Single,
        }
    }

    fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
        inputs[0].get_requisition()
    }
}

impl CpuTask for PassThrough {
    fn process(&mut self, inputs: &mut [Buffer], output: &mut Buffer, requisition: Requisition) -> Result<bool> {
        output.resize(requisition)?;
        Buffer::copy(&inputs[0], output)?;
        Ok(true)
    }
}

struct RecordingSink(Arc<Mutex<Vec<f32>>>);

impl TaskPlugin for RecordingSink {
    fn setup(&mut self, _resources: &dflow_core::task::Resources) -> Result<()> {
        Ok(())
    }

    fn get_structure(&self) -> dflow_core::task::Structure {
        dflow_core::task::Structure {
            n_inputs: 1,
            input_params: vec![dflow_core::task::InputParam { n_dims: 1 }],
            mode: dflow_core::task::Mode::Single,
        }
    }

    fn get_requisition(&self, inputs: &[Buffer]) -> Requisition {
        inputs[0].get_requisition()
    }
}

impl CpuTask for RecordingSink {
    fn process(&mut self, inputs: &mut [Buffer], output: &mut Buffer, requisition: Requisition) -> Result<bool> {
        let value = inputs[0].get_host_array(None)?[0];
        self.0.lock().unwrap().push(value);
        output.resize(requisition)?;
        Ok(true)
    }
}

/// S5: stream 10 buffers through `src -> id -> sink`, stop the source, and
/// confirm the sink observes all 10 in order followed by a clean EOS.
#[test]
fn linear_pipeline_runs_to_clean_eos() {
    use dflow_core::{
        input_task::{InputTask, WrappedTask},
        scheduler::NodeBody,
        task::{Capabilities, TaskBody, TaskNode},
    };
    use std::collections::HashMap;

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

    let input_task = Arc::new(InputTask::new(WrappedTask::Cpu(Box::new(PassThrough))));
    for i in 0..10 {
        let mut buf = Buffer::new(Requisition::new(&[1]), None).unwrap();
        buf.get_host_array(None).unwrap()[0] = i as f32;
        input_task.release_input_buffer(0, buf);
    }
    input_task.stop();

    let received = Arc::new(Mutex::new(Vec::new()));
    let mut bodies: HashMap<_, _> = HashMap::new();
    bodies.insert(src, NodeBody::InputSource(input_task));
    bodies.insert(id, NodeBody::Task(TaskBody::Cpu(Box::new(PassThrough))));
    bodies.insert(
        sink,
        NodeBody::Task(TaskBody::Cpu(Box::new(RecordingSink(Arc::clone(&received))))),
    );

    let arch = ArchGraph::new(vec![dflow_core::arch::GpuNode::new(0, "gpu0")], vec![]);
    let mut strategy = dflow_core::transforms::FirstFitStrategy;
    dflow_core::transforms::map(&mut graph, &arch, &mut strategy);

    let report = Scheduler::new(graph, bodies, dflow_core::task::Resources, None)
        .run()
        .unwrap();
    assert!(report.is_success());

    let received = received.lock().unwrap();
    assert_eq!(*received, (0..10).map(|i| i as f32).collect::<Vec<_>>());
}

/// S3: a GPU-only path in a larger graph widens to one parallel copy per
/// additional GPU once `split` runs, with endpoints rewired per spec.md §9
/// Open Question (iii).
#[test]
fn split_widens_gpu_path_across_three_gpus() {
    use dflow_core::task::{Capabilities, TaskNode};

    let mut graph = TaskGraph::new();
    let r = graph.add_node(TaskNode::new("R", Capabilities::CPU, 1, Mode::Single));
    let g1 = graph.add_node(TaskNode::new("G1", Capabilities::GPU, 1, Mode::Single));
    let g2 = graph.add_node(TaskNode::new("G2", Capabilities::GPU, 1, Mode::Single));
    let s = graph.add_node(TaskNode::new("S", Capabilities::CPU, 1, Mode::Single));
    graph.connect(r, g1, 0);
    graph.connect(g1, g2, 0);
    graph.connect(g2, s, 0);

    let arch = ArchGraph::new(
        vec![
            dflow_core::arch::GpuNode::new(0, "gpu0"),
            dflow_core::arch::GpuNode::new(1, "gpu1"),
            dflow_core::arch::GpuNode::new(2, "gpu2"),
        ],
        vec![],
    );

    dflow_core::transforms::split(&mut graph, &arch);

    let gpu_paths = graph.get_paths(|node| node.is_gpu());
    assert_eq!(gpu_paths.len(), 3);
    for path in &gpu_paths {
        assert_eq!(graph.predecessors(path[0]), vec![(r, 0)]);
        assert_eq!(graph.successors(*path.last().unwrap()), vec![(s, 0)]);
    }
}

#[cfg(feature = "mock-device")]
#[test]
fn buffer_migrates_host_device_host_through_the_mock_backend_s1() {
    use dflow_core::mock_device::MockDeviceContext;

    let context = MockDeviceContext::arc();
    let mut buf = Buffer::new(Requisition::new(&[4]), Some(context)).unwrap();

    buf.get_host_array(None)
        .unwrap()
        .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);

    buf.get_device_array(None).unwrap();
    assert_eq!(buf.location(), Location::Device);

    assert_eq!(buf.get_host_array(None).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(buf.location(), Location::Host);
}
