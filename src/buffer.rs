//! N-dimensional float32 buffers with dual host/device residency.

use {
    crate::error::{Error, Result},
    std::{any::Any, cmp::Ordering, sync::Arc},
};

/// Maximum number of dimensions a [`Requisition`] may carry.
pub const MAX_NDIMS: usize = 8;

/// Shape specification for a [`Buffer`]: element type is implicitly `f32`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Requisition {
    n_dims: usize,
    dims: [usize; MAX_NDIMS],
}

impl Requisition {
    /// Builds a requisition from a slice of `1..=MAX_NDIMS` dimensions.
    ///
    /// # Panics
    ///
    /// Panics if `dims` is empty or longer than [`MAX_NDIMS`].
    pub fn new(dims: &[usize]) -> Self {
        assert!(!dims.is_empty() && dims.len() <= MAX_NDIMS);

        let mut buf = [0usize; MAX_NDIMS];
        buf[..dims.len()].copy_from_slice(dims);

        Self {
            n_dims: dims.len(),
            dims: buf,
        }
    }

    pub fn n_dims(&self) -> usize {
        self.n_dims
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims[..self.n_dims]
    }

    /// Number of `f32` elements this requisition describes.
    pub fn n_elements(&self) -> usize {
        self.dims().iter().product()
    }

    /// Byte size: `4 * product(dims)`.
    pub fn byte_size(&self) -> usize {
        self.n_elements() * std::mem::size_of::<f32>()
    }
}

/// Which side of a [`Buffer`] currently holds the authoritative copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    Invalid,
    Host,
    Device,
}

/// Source sample depth consumed by [`Buffer::convert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceDepth {
    U8,
    U16,
}

impl SourceDepth {
    fn bytes_per_element(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }
}

/// An opaque device-side allocation. The core never interprets its contents;
/// it is created and freed exclusively through a [`DeviceContext`].
#[derive(Debug)]
pub struct DeviceAllocation {
    handle: Box<dyn Any + Send>,
    capacity: usize,
}

impl DeviceAllocation {
    pub fn new(handle: Box<dyn Any + Send>, capacity: usize) -> Self {
        Self { handle, capacity }
    }

    pub fn handle(&self) -> &(dyn Any + Send) {
        &*self.handle
    }

    pub fn handle_mut(&mut self) -> &mut (dyn Any + Send) {
        &mut *self.handle
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// An opaque handle to the command queue a device transfer should be
/// ordered on. Cloning a queue is cheap — it is a shared reference to
/// whatever the transport's real queue object is.
#[derive(Clone)]
pub struct CommandQueue(Arc<dyn Any + Send + Sync>);

impl CommandQueue {
    pub fn new(inner: Arc<dyn Any + Send + Sync>) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> &(dyn Any + Send + Sync) {
        &*self.0
    }
}

/// The device binding the core consumes but does not implement: allocation
/// and blocking host<->device transfers. A concrete accelerator backend
/// (command queue creation, kernel compilation) lives entirely outside the
/// core and is supplied by the host program.
pub trait DeviceContext: Send + Sync {
    fn device_alloc(&self, byte_size: usize) -> Result<DeviceAllocation>;

    fn device_free(&self, allocation: DeviceAllocation);

    /// Blocking host -> device transfer of `host[..byte_size]`.
    fn copy_host_to_device(
        &self,
        queue: &CommandQueue,
        host: &[f32],
        device: &mut DeviceAllocation,
    ) -> Result<()>;

    /// Blocking device -> host transfer into `host[..byte_size]`.
    fn copy_device_to_host(
        &self,
        queue: &CommandQueue,
        device: &DeviceAllocation,
        host: &mut [f32],
    ) -> Result<()>;

    /// The command queue transfers issued through this context should use
    /// absent a more specific one (e.g. one tied to a particular proc node).
    fn default_queue(&self) -> CommandQueue;
}

/// An n-dimensional float32 container with dual host/device residency.
///
/// See the crate-level buffer state machine documentation for the exact
/// rules governing `location` transitions; every public method here upholds
/// them.
pub struct Buffer {
    requisition: Requisition,
    host: Option<Vec<f32>>,
    device: Option<DeviceAllocation>,
    location: Location,
    context: Option<Arc<dyn DeviceContext>>,
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let (Some(device), Some(context)) = (self.device.take(), self.context.as_ref()) {
            context.device_free(device);
        }
    }
}

impl Buffer {
    /// Allocates a new buffer for `requisition`. With no device context the
    /// buffer is host-only for its entire lifetime. Initial location is
    /// always `Invalid` — nothing has been written yet.
    pub fn new(requisition: Requisition, context: Option<Arc<dyn DeviceContext>>) -> Result<Self> {
        let host = vec![0.0f32; requisition.n_elements()];

        Ok(Self {
            requisition,
            host: Some(host),
            device: None,
            location: Location::Invalid,
            context,
        })
    }

    pub fn get_requisition(&self) -> Requisition {
        self.requisition
    }

    pub fn get_size(&self) -> usize {
        self.requisition.byte_size()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Lexicographic comparison of `(n_dims, dims[0..])` against `other`.
    pub fn cmp_dimensions(&self, other: Requisition) -> Ordering {
        self.requisition
            .n_dims
            .cmp(&other.n_dims)
            .then_with(|| self.requisition.dims().cmp(other.dims()))
    }

    /// Resizes in place. If the new byte size fits within whichever sides
    /// are currently allocated, only `requisition` changes and `location` is
    /// preserved. Otherwise the affected side(s) are reallocated and
    /// `location` becomes `Invalid`.
    pub fn resize(&mut self, requisition: Requisition) -> Result<()> {
        let grows_host = self
            .host
            .as_ref()
            .map(|h| requisition.n_elements() > h.len())
            .unwrap_or(false);
        let grows_device = self
            .device
            .as_ref()
            .map(|d| requisition.byte_size() > d.capacity())
            .unwrap_or(false);

        if grows_host {
            self.host = Some(vec![0.0f32; requisition.n_elements()]);
        }

        if grows_device {
            let context = self
                .context
                .as_ref()
                .expect("device side allocated without a context");
            if let Some(old) = self.device.take() {
                context.device_free(old);
            }
            self.device = Some(context.device_alloc(requisition.byte_size())?);
        }

        self.requisition = requisition;

        if grows_host || grows_device {
            self.location = Location::Invalid;
        }

        Ok(())
    }

    fn queue_or_default(&self, queue: Option<&CommandQueue>) -> Result<CommandQueue> {
        if let Some(queue) = queue {
            return Ok(queue.clone());
        }

        self.context
            .as_ref()
            .map(|ctx| ctx.default_queue())
            .ok_or(Error::TransferFailure)
    }

    /// Makes the host side authoritative, migrating from the device if
    /// necessary, and returns it. Blocks until any migration completes.
    pub fn get_host_array(&mut self, queue: Option<&CommandQueue>) -> Result<&mut [f32]> {
        match self.location {
            Location::Host | Location::Invalid => {
                self.location = Location::Host;
            }
            Location::Device => {
                let queue = self.queue_or_default(queue)?;
                let context = self.context.clone().ok_or(Error::TransferFailure)?;
                let device = self.device.as_ref().ok_or(Error::TransferFailure)?;
                let host = self.host.get_or_insert_with(|| {
                    vec![0.0f32; self.requisition.n_elements()]
                });
                context.copy_device_to_host(&queue, device, host)?;
                self.location = Location::Host;
            }
        }

        let n = self.requisition.n_elements();
        Ok(&mut self.host.as_mut().expect("host side allocated")[..n])
    }

    /// Makes the device side authoritative, migrating from the host if
    /// necessary, and returns the device allocation. Blocks until any
    /// migration completes.
    pub fn get_device_array(&mut self, queue: Option<&CommandQueue>) -> Result<&mut DeviceAllocation> {
        let context = self.context.clone().ok_or(Error::TransferFailure)?;

        if self.device.is_none() {
            self.device = Some(context.device_alloc(self.requisition.byte_size())?);
        }

        match self.location {
            Location::Device | Location::Invalid => {
                self.location = Location::Device;
            }
            Location::Host => {
                let queue = self.queue_or_default(queue)?;
                let n = self.requisition.n_elements();
                let host = self.host.as_ref().ok_or(Error::TransferFailure)?;
                let device = self.device.as_mut().expect("device side just allocated");
                context.copy_host_to_device(&queue, &host[..n], device)?;
                self.location = Location::Device;
            }
        }

        Ok(self.device.as_mut().expect("device side allocated"))
    }

    /// If `self.location == location`, drops its validity (sets `Invalid`).
    /// The other side's contents are assumed authoritative by the caller if
    /// it follows with a `get_*`.
    pub fn discard_location(&mut self, location: Location) {
        if self.location == location {
            self.location = Location::Invalid;
        }
    }

    /// Copies from `src`'s current authoritative side to the matching side
    /// of `dst`, updating `dst.location`. Sizes must match.
    pub fn copy(src: &Buffer, dst: &mut Buffer) -> Result<()> {
        if src.get_size() != dst.get_size() {
            return Err(Error::TransferFailure);
        }

        match src.location {
            Location::Host => {
                let host = src.host.as_ref().ok_or(Error::TransferFailure)?;
                let n = src.requisition.n_elements();
                let dst_host = dst
                    .host
                    .get_or_insert_with(|| vec![0.0f32; dst.requisition.n_elements()]);
                dst_host[..n].copy_from_slice(&host[..n]);
                dst.location = Location::Host;
            }
            Location::Device => {
                let src_device = src.device.as_ref().ok_or(Error::TransferFailure)?;
                let context = dst.context.clone().ok_or(Error::TransferFailure)?;
                if dst.device.is_none() {
                    dst.device = Some(context.device_alloc(dst.requisition.byte_size())?);
                }
                // No device-to-device primitive in the consumed interface; round-trip
                // through a scratch host buffer.
                let mut scratch = vec![0.0f32; src.requisition.n_elements()];
                let queue = context.default_queue();
                context.copy_device_to_host(&queue, src_device, &mut scratch)?;
                let dst_device = dst.device.as_mut().expect("just allocated");
                context.copy_host_to_device(&queue, &scratch, dst_device)?;
                dst.location = Location::Device;
            }
            Location::Invalid => return Err(Error::TransferFailure),
        }

        Ok(())
    }

    /// Deep clone with the same requisition and authoritative contents.
    pub fn dup(&self) -> Result<Buffer> {
        let mut clone = Buffer::new(self.requisition, self.context.clone())?;
        clone.location = self.location;

        match self.location {
            Location::Host => {
                clone.host = self.host.clone();
            }
            Location::Device => {
                Buffer::copy(self, &mut clone)?;
            }
            Location::Invalid => {}
        }

        Ok(clone)
    }

    /// Reinterprets the first `n_elements * bytes_per_source_element` bytes
    /// of the host array as packed `depth` samples and expands them to
    /// float32 in place, iterating from the high index downward so earlier
    /// (lower-index) source bytes are never overwritten before they are
    /// read.
    ///
    /// Precondition: `location == Host`. Afterward, `location` stays `Host`.
    pub fn convert(&mut self, depth: SourceDepth) -> Result<()> {
        if self.location != Location::Host {
            return Err(Error::TransferFailure);
        }

        let n = self.requisition.n_elements();
        let host = self.host.as_mut().ok_or(Error::TransferFailure)?;
        let bytes_per_element = depth.bytes_per_element();

        // View the first n_elements f32 slots as a packed byte buffer
        // holding n_elements source samples.
        let mut bytes = vec![0u8; n * bytes_per_element];
        {
            let byte_view = bytemuck_f32_to_bytes(&host[..n]);
            bytes.copy_from_slice(&byte_view[..n * bytes_per_element]);
        }

        for i in (0..n).rev() {
            let value = match depth {
                SourceDepth::U8 => bytes[i] as f32,
                SourceDepth::U16 => {
                    let lo = bytes[2 * i] as u16;
                    let hi = bytes[2 * i + 1] as u16;
                    (lo | (hi << 8)) as f32
                }
            };
            host[i] = value;
        }

        Ok(())
    }
}

/// Reinterprets an `f32` slice as its little-endian byte representation,
/// without requiring a `bytemuck` dependency for this single call site.
fn bytemuck_f32_to_bytes(floats: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(floats.len() * 4);
    for f in floats {
        bytes.extend_from_slice(&f.to_le_bytes());
    }
    bytes
}
