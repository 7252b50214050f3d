#![deny(warnings)]
#![allow(dead_code)]

//! A dataflow execution engine for streaming multi-dimensional numeric data
//! across CPU, GPU and remote workers.
//!
//! A pipeline is built as a [`graph::Graph`] of [`task::TaskNode`]s (a
//! [`transforms::TaskGraph`]), shaped for the available hardware with
//! [`transforms::split`] and bound to it with [`transforms::map`], then
//! handed to a [`scheduler::Scheduler`] which spawns one worker per node and
//! runs the pipeline to end-of-stream. [`buffer::Buffer`] is the unit of data
//! moving along graph edges; [`messenger::Messenger`] is the transport
//! contract remote-capable tasks use to reach a peer process.

#[macro_use]
extern crate log as log_crate;

pub mod arch;
pub mod buffer;
pub mod config;
pub mod error;
pub mod graph;
pub mod input_task;
pub mod logger;
pub mod messenger;
pub mod scheduler;
pub mod task;
pub mod transforms;

#[cfg(feature = "mock-device")]
pub mod mock_device;

/// Things used in almost every pipeline built against this crate.
pub mod prelude {
    pub use {
        super::{
            arch::{ArchGraph, ProcNode},
            buffer::{Buffer, DeviceContext, Location, Requisition},
            config::{Config, ProfileLevel},
            error::{Error, Result},
            graph::Graph,
            logger::{default_logger, Level, Logger},
            scheduler::{RunReport, Scheduler},
            task::{Capabilities, CpuTask, GpuTask, Mode, RemoteTask, TaskBody, TaskNode},
            transforms::TaskGraph,
        },
        log_crate::{debug, error, info, trace, warn},
    };
}

pub use self::error::Error;
