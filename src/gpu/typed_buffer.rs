/*!
Typed `wgpu` buffers.

[`bytemuck`](https://docs.rs/bytemuck/latest/bytemuck/) casts between Rust
values and the bytes the device sees. The pixel buffers here hold palette
indices packed four to a `u32` word (WGSL has no byte-sized storage type),
so a buffer is typed by its word and sized in words, never in bytes.
*/

use std::{
    marker::PhantomData,
    mem::size_of,
    ops::{Deref, RangeBounds},
};

use wgpu::util::DeviceExt;

pub struct Buffer<A> {
    buffer: wgpu::Buffer,
    len: u64,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Buffer<A> {
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Number of `A`s the buffer holds.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn slice<S: RangeBounds<wgpu::BufferAddress>>(&self, bounds: S) -> Slice<A> {
        Slice {
            slice: self.buffer.slice(bounds),
            phantom_data: PhantomData,
        }
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }

    pub fn unmap(&self) {
        self.buffer.unmap()
    }

    pub fn destroy(&self) {
        self.buffer.destroy()
    }
}

pub struct Slice<'a, A> {
    slice: wgpu::BufferSlice<'a>,
    phantom_data: PhantomData<A>,
}

impl<'a, A> Slice<'a, A> {
    pub fn map_async(
        &self,
        mode: wgpu::MapMode,
        callback: impl FnOnce(Result<(), wgpu::BufferAsyncError>) + Send + 'static,
    ) {
        self.slice.map_async(mode, callback)
    }

    pub fn get_mapped_range(&self) -> Mapped<'a, A> {
        Mapped {
            view: self.slice.get_mapped_range(),
            phantom_data: PhantomData,
        }
    }
}

/// A mapped, host-readable range of a [`Buffer`].
pub struct Mapped<'a, A> {
    view: wgpu::BufferView<'a>,
    phantom_data: PhantomData<A>,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Deref for Mapped<'a, A> {
    type Target = [A];

    fn deref(&self) -> &Self::Target {
        bytemuck::cast_slice(&*self.view)
    }
}

pub struct Builder<'a, A> {
    label: Option<&'a str>,
    len: u64,
    usage: wgpu::BufferUsages,
    phantom_data: PhantomData<A>,
}

impl<'a, A: bytemuck::Pod + bytemuck::Zeroable> Builder<'a, A> {
    /// An uninitialised buffer of `len` elements.
    pub fn new(len: u64) -> Self {
        Self {
            label: None,
            len,
            usage: wgpu::BufferUsages::COPY_DST,
            phantom_data: PhantomData,
        }
    }

    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_usage(mut self, usage: wgpu::BufferUsages) -> Self {
        self.usage |= usage;
        self
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.len * size_of::<A>() as u64
    }

    pub fn create(self, device: &wgpu::Device) -> Buffer<A> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: self.label,
            size: self.size_in_bytes(),
            usage: self.usage,
            mapped_at_creation: false,
        });

        Buffer {
            buffer,
            len: self.len,
            phantom_data: PhantomData,
        }
    }
}

pub fn copy_buffer_to_buffer<A: bytemuck::Pod + bytemuck::Zeroable>(
    command_encoder: &mut wgpu::CommandEncoder,
    source: &Buffer<A>,
    destination: &Buffer<A>,
    copy_size: u64,
) {
    command_encoder.copy_buffer_to_buffer(
        source.buffer(),
        0,
        destination.buffer(),
        0,
        copy_size * size_of::<A>() as u64,
    )
}

/// One `A` in a uniform buffer, rewritten before each dispatch.
pub struct Uniform<A> {
    buffer: wgpu::Buffer,
    phantom_data: PhantomData<A>,
}

impl<A: bytemuck::Pod + bytemuck::Zeroable> Uniform<A> {
    pub fn new(device: &wgpu::Device, label: &str, initial: A) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            buffer,
            phantom_data: PhantomData,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, value: A) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&value));
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
