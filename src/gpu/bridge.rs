/*!
Device-resident pixel memory.

A [`DeviceBuffer`] is allocated once per run and reused for every frame.
The kernel writes into `storage`; the same submission copies it into the
map-readable `staging` buffer, and [`DeviceBuffer::copy_back`] maps that
copy. Mapping only completes after every earlier submission on the queue,
so the host never observes a half-rendered frame.
*/

use std::sync::mpsc;

use log::debug;

use crate::{
    error::{AllocationError, TransferError},
    gpu::{
        compute,
        device::GpuContext,
        typed_buffer::{self, Buffer},
    },
    pixel::PixelBuffer,
    screen,
};

pub struct DeviceBuffer {
    size: screen::Size,
    storage: Buffer<u32>,
    staging: Buffer<u32>,
}

impl DeviceBuffer {
    pub fn allocate(
        context: &GpuContext,
        size: screen::Size,
    ) -> Result<Self, AllocationError> {
        let words = compute::word_count(size.pixel_count());
        let storage = typed_buffer::Builder::<u32>::new(words)
            .with_label("pixel-storage")
            .with_usage(wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC);
        let staging = typed_buffer::Builder::<u32>::new(words)
            .with_label("pixel-staging")
            .with_usage(wgpu::BufferUsages::MAP_READ);

        let requested = storage.size_in_bytes();
        let limits = context.device.limits();
        let limit = limits
            .max_buffer_size
            .min(limits.max_storage_buffer_binding_size as u64);
        if requested > limit {
            return Err(AllocationError::TooLarge { requested, limit });
        }

        context
            .device
            .push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let storage = storage.create(&context.device);
        let staging = staging.create(&context.device);
        if let Some(error) = pollster::block_on(context.device.pop_error_scope()) {
            storage.destroy();
            staging.destroy();
            return Err(AllocationError::OutOfMemory(error.to_string()));
        }

        debug!("allocated {requested} byte device buffer for {size:?}");
        Ok(Self {
            size,
            storage,
            staging,
        })
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    /// Number of packed `u32` words, one per kernel invocation.
    pub fn word_count(&self) -> u64 {
        self.storage.len()
    }

    pub(crate) fn storage_binding(&self) -> wgpu::BindingResource {
        self.storage.binding_resource()
    }

    /// Record the storage to staging copy; must follow the kernel dispatch
    /// in the same submission.
    pub(crate) fn encode_copy_back(&self, command_encoder: &mut wgpu::CommandEncoder) {
        typed_buffer::copy_buffer_to_buffer(
            command_encoder,
            &self.storage,
            &self.staging,
            self.storage.len(),
        );
    }

    /**
    Block until the last submitted frame is on the host and copy it into
    `pixels`.

    `pixels` is only written once the mapping has succeeded: on error it
    still holds the previous frame, never a partial one.
    */
    pub fn copy_back(
        &self,
        context: &GpuContext,
        pixels: &mut PixelBuffer,
    ) -> Result<(), TransferError> {
        if pixels.size() != self.size {
            return Err(TransferError::SizeMismatch {
                expected: self.size,
                actual: pixels.size(),
            });
        }

        let slice = self.staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        context.device.poll(wgpu::Maintain::Wait);

        receiver
            .recv()
            .map_err(|_| TransferError::Disconnected)??;

        {
            let words = slice.get_mapped_range();
            let bytes: &[u8] = bytemuck::cast_slice(&*words);
            let target = pixels.as_mut_slice();
            let len = target.len();
            target.copy_from_slice(&bytes[..len]);
        }
        self.staging.unmap();

        Ok(())
    }

    /// Free the device memory now rather than at the end of scope.
    pub fn release(self) {
        drop(self)
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        debug!("releasing device buffer for {:?}", self.size);
        self.storage.destroy();
        self.staging.destroy();
    }
}
