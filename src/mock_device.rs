//! An in-memory [`DeviceContext`] used by the test suite so buffer migration
//! (spec.md §8 scenario S1) can be exercised without a real accelerator.
//! Grounded in the teacher's `mock-gfx`-style feature-gated backend: a real
//! transfer path stood in for by a plain host-side copy, behind the same
//! `mock-device` feature name the teacher uses for its own mock backend.

use {
    crate::{
        buffer::{CommandQueue, DeviceAllocation, DeviceContext},
        error::{Error, Result},
    },
    parking_lot::Mutex,
    std::sync::Arc,
};

/// A "device" allocation backed by a plain `Vec<f32>` on the host, standing
/// in for whatever opaque handle a real accelerator driver would return.
struct MockAllocation(Mutex<Vec<f32>>);

/// An in-memory stand-in for a real device context. Allocations are just
/// `Vec<f32>`s; transfers are plain copies. Never construct this outside of
/// tests — it provides none of the performance a real device context would.
#[derive(Default)]
pub struct MockDeviceContext;

impl MockDeviceContext {
    pub fn new() -> Self {
        Self
    }

    pub fn arc() -> Arc<dyn DeviceContext> {
        Arc::new(Self::new())
    }
}

impl DeviceContext for MockDeviceContext {
    fn device_alloc(&self, byte_size: usize) -> Result<DeviceAllocation> {
        let n_floats = byte_size / std::mem::size_of::<f32>();
        let allocation = MockAllocation(Mutex::new(vec![0.0; n_floats]));
        Ok(DeviceAllocation::new(Box::new(allocation), byte_size))
    }

    fn device_free(&self, _allocation: DeviceAllocation) {
        // The Vec<f32> drops along with the boxed handle; nothing else to do.
    }

    fn copy_host_to_device(
        &self,
        _queue: &CommandQueue,
        host: &[f32],
        device: &mut DeviceAllocation,
    ) -> Result<()> {
        let allocation = device
            .handle()
            .downcast_ref::<MockAllocation>()
            .ok_or(Error::TransferFailure)?;
        let mut guard = allocation.0.lock();
        if guard.len() < host.len() {
            return Err(Error::TransferFailure);
        }
        guard[..host.len()].copy_from_slice(host);
        Ok(())
    }

    fn copy_device_to_host(
        &self,
        _queue: &CommandQueue,
        device: &DeviceAllocation,
        host: &mut [f32],
    ) -> Result<()> {
        let allocation = device
            .handle()
            .downcast_ref::<MockAllocation>()
            .ok_or(Error::TransferFailure)?;
        let guard = allocation.0.lock();
        if guard.len() < host.len() {
            return Err(Error::TransferFailure);
        }
        host.copy_from_slice(&guard[..host.len()]);
        Ok(())
    }

    fn default_queue(&self) -> CommandQueue {
        CommandQueue::new(Arc::new(()))
    }
}
