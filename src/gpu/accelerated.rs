use bytemuck::{Pod, Zeroable};
use log::{debug, trace};

use crate::{
    error::{AllocationError, RenderError},
    gpu::{
        bridge::DeviceBuffer,
        compute,
        device::GpuContext,
        encoder::{self, CommandEncoderExt},
        typed_buffer::Uniform,
    },
    pixel::PixelBuffer,
    render::Renderer,
    screen,
    view::{Mapper, View},
};

/// Uniform block for `mandelbrot.wgsl`; layout matches `Params` there.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug)]
pub struct KernelParams {
    pub center_x: f32,
    pub center_y: f32,
    pub step: f32,
    pub max_iterations: u32,
    pub width: u32,
    pub height: u32,
    pub _pad: [u32; 2],
}

impl KernelParams {
    pub fn new(view: &View, size: screen::Size, max_iterations: u32) -> Self {
        // The step is computed on the host so both sides start from the
        // same bits.
        let mapper = Mapper::new(view, size);
        Self {
            center_x: view.center_x,
            center_y: view.center_y,
            step: mapper.step(),
            max_iterations,
            width: size.width,
            height: size.height,
            _pad: [0; 2],
        }
    }
}

/// Renders on the GPU through a compute kernel, one invocation per four
/// pixels.
pub struct Accelerated {
    context: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
    params: Uniform<KernelParams>,
    pixels: DeviceBuffer,
    max_iterations: u32,
}

impl Accelerated {
    pub fn new(
        context: GpuContext,
        size: screen::Size,
        max_iterations: u32,
    ) -> Result<Self, AllocationError> {
        let pixels = DeviceBuffer::allocate(&context, size)?;
        let device = &context.device;

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mandelbrot-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mandelbrot.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mandelbrot-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mandelbrot-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("mandelbrot-pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: "mandelbrot",
        });

        let params = Uniform::new(
            device,
            "mandelbrot-params",
            KernelParams::new(&View::new(0.0, 0.0, 1.0), size, max_iterations),
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mandelbrot-bind-group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.binding_resource(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: pixels.storage_binding(),
                },
            ],
        });

        debug!("mandelbrot pipeline ready for {size:?}");
        Ok(Self {
            context,
            pipeline,
            bind_group,
            params,
            pixels,
            max_iterations,
        })
    }

    /// Submit one frame: the kernel dispatch followed by the copy into the
    /// staging buffer. Returns without waiting for the device.
    pub fn dispatch(&self, view: &View) {
        self.params.write(
            &self.context.queue,
            KernelParams::new(view, self.pixels.size(), self.max_iterations),
        );

        let command_buffer = encoder::record(&self.context.device, "mandelbrot-frame", |encoder| {
            encoder.with_compute_pass("mandelbrot-pass", |compute_pass| {
                compute_pass.set_pipeline(&self.pipeline);
                compute_pass.set_bind_group(0, &self.bind_group, &[]);
                compute_pass.insert_debug_marker("mandelbrot");
                let (x, y, z) = compute::mandelbrot_dispatch_size(self.pixels.word_count());
                compute_pass.dispatch_workgroups(x, y, z);
            });
            self.pixels.encode_copy_back(encoder);
        });

        self.context.queue.submit([command_buffer]);
    }
}

impl Renderer for Accelerated {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn render(&mut self, view: &View, pixels: &mut PixelBuffer) -> Result<(), RenderError> {
        trace!("begin gpu render");
        self.dispatch(view);
        self.pixels.copy_back(&self.context, pixels)?;
        trace!("end gpu render");
        Ok(())
    }
}
