//! Minimal end-to-end demo: builds `src -> id -> sink`, streams a handful
//! of buffers through it, and prints what the sink observed. Run with
//! `cargo run --example run_pipeline -- -vv` for worker lifecycle logging.

use {
    dflow_core::{
        input_task::{InputTask, WrappedTask},
        prelude::*,
        scheduler::NodeBody,
        task::{Capabilities, InputParam, Resources, Structure, TaskBody, TaskNode, TaskPlugin},
    },
    std::collections::HashMap,
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

impl CpuTask for Identity {
    fn process(&mut self, inputs: &mut [Buffer], output: &mut Buffer, requisition: Requisition) -> Result<bool> {
        output.resize(requisition)?;
        Buffer::copy(&inputs[0], output)?;
        Ok(true)
    }
}

struct PrintingSink;

impl TaskPlugin for PrintingSink {
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

impl CpuTask for PrintingSink {
    fn process(&mut self, inputs: &mut [Buffer], output: &mut Buffer, requisition: Requisition) -> Result<bool> {
        let value = inputs[0].get_host_array(None)?[0];
        println!("sink received {value}");
        output.resize(requisition)?;
        Ok(true)
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();

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

    let input_task = std::sync::Arc::new(InputTask::new(WrappedTask::Cpu(Box::new(Identity))));
    for i in 0..5 {
        let mut buf = Buffer::new(Requisition::new(&[1]), None)?;
        buf.get_host_array(None)?[0] = i as f32;
        input_task.release_input_buffer(0, buf);
    }
    input_task.stop();

    let mut bodies: HashMap<_, _> = HashMap::new();
    bodies.insert(src, NodeBody::InputSource(input_task));
    bodies.insert(id, NodeBody::Task(TaskBody::Cpu(Box::new(Identity))));
    bodies.insert(sink, NodeBody::Task(TaskBody::Cpu(Box::new(PrintingSink))));

    let arch = ArchGraph::new(vec![dflow_core::arch::GpuNode::new(0, "gpu0")], vec![]);
    let mut strategy = dflow_core::transforms::FirstFitStrategy;
    dflow_core::transforms::map(&mut graph, &arch, &mut strategy);

    let report = Scheduler::new(graph, bodies, Resources, None)
        .with_profile_level(ProfileLevel::Minimal)
        .run()?;

    if report.is_success() {
        println!("pipeline completed successfully");
    } else {
        for failure in &report.failures {
            eprintln!("{} failed: {}", failure.plugin_name, failure.error);
        }
    }

    Ok(())
}
