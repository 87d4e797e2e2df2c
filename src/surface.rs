/*!
Presentation of finished frames.

The benchmark only ever hands a [`Surface`] a buffer that a renderer has
completely written. [`WindowSurface`] expands the palette indices to RGBA,
uploads them as a texture and draws it with a full-screen quad.
*/

use std::{ffi::OsString, num::NonZeroU32, panic};

use log::{debug, info};
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

use crate::{
    colour::Palette,
    error::{GpuError, SurfaceError},
    gpu::{
        encoder::{self, CommandEncoderExt},
        GpuContext,
    },
    pixel::PixelBuffer,
    screen,
};

pub trait Surface {
    fn present(&mut self, pixels: &PixelBuffer) -> Result<(), SurfaceError>;
}

/// Discards every frame; for headless benchmarking.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn present(&mut self, _pixels: &PixelBuffer) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// Whether a window system looks reachable. Only the unix desktops
/// advertise their display through the environment.
fn display_available(var: impl Fn(&str) -> Option<OsString>) -> bool {
    if cfg!(all(
        unix,
        not(any(target_os = "macos", target_os = "ios", target_os = "android"))
    )) {
        ["DISPLAY", "WAYLAND_DISPLAY"]
            .iter()
            .any(|name| var(name).map_or(false, |value| !value.is_empty()))
    } else {
        true
    }
}

fn open_event_loop() -> Result<EventLoop<()>, SurfaceError> {
    if !display_available(|name| std::env::var_os(name)) {
        return Err(SurfaceError::NoDisplay);
    }
    // winit panics rather than failing when no backend can connect.
    panic::catch_unwind(EventLoop::<()>::new).map_err(|_| SurfaceError::NoDisplay)
}

pub struct WindowSurface {
    // Declared before `window`: the surface must be dropped first.
    surface: wgpu::Surface,
    context: GpuContext,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    palette: Palette,
    size: screen::Size,
    rgba: Vec<u8>,
    window: Window,
    event_loop: EventLoop<()>,
}

impl WindowSurface {
    pub fn new(size: screen::Size, palette: Palette) -> Result<Self, SurfaceError> {
        let event_loop = open_event_loop()?;
        let window = WindowBuilder::new()
            .with_title("mandelbench")
            .with_inner_size(PhysicalSize::new(size.width, size.height))
            .with_resizable(false)
            .build(&event_loop)?;

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(&window) };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        }))
        .ok_or(GpuError::NoAdapter)?;
        let context = GpuContext::from_adapter(&adapter)?;

        let format = surface
            .get_supported_formats(&adapter)
            .first()
            .copied()
            .ok_or(SurfaceError::NoFormat)?;
        surface.configure(
            &context.device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format,
                width: size.width,
                height: size.height,
                // Frame pacing would cap the benchmark at the refresh rate.
                present_mode: wgpu::PresentMode::AutoNoVsync,
                alpha_mode: wgpu::CompositeAlphaMode::Auto,
            },
        );
        info!("presenting {size:?} frames as {format:?}");

        // Palette colours are sRGB-encoded; let the sampler decode them when
        // the surface will encode again.
        let texture_format = if format.describe().srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("frame-texture"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = context
            .device
            .create_sampler(&wgpu::SamplerDescriptor::default());

        let shader_module = context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("present-shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("present.wgsl").into()),
            });

        let pipeline = context
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("present-pipeline"),
                layout: None,
                vertex: wgpu::VertexState {
                    module: &shader_module,
                    entry_point: "vertex_main",
                    buffers: &[],
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    unclipped_depth: false,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: &shader_module,
                    entry_point: "fragment_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                multiview: None,
            });

        let bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("present-bind-group"),
                layout: &pipeline.get_bind_group_layout(0),
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&texture_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });

        Ok(Self {
            surface,
            context,
            texture,
            bind_group,
            pipeline,
            palette,
            size,
            rgba: vec![0; size.pixel_count() * 4],
            window,
            event_loop,
        })
    }

    /// Drain pending window events without blocking.
    fn pump_events(&mut self) -> Result<(), SurfaceError> {
        let window_id = self.window.id();
        let mut closed = false;

        self.event_loop
            .run_return(|event, _, control_flow| match event {
                Event::WindowEvent {
                    window_id: id,
                    event: WindowEvent::CloseRequested,
                } if id == window_id => {
                    closed = true;
                    *control_flow = ControlFlow::Exit;
                }
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => *control_flow = ControlFlow::Poll,
            });

        if closed {
            debug!("window close requested");
            return Err(SurfaceError::Closed);
        }
        Ok(())
    }
}

impl Surface for WindowSurface {
    fn present(&mut self, pixels: &PixelBuffer) -> Result<(), SurfaceError> {
        self.pump_events()?;

        debug_assert_eq!(pixels.size(), self.size);
        self.palette.expand(pixels.as_slice(), &mut self.rgba);
        self.context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &self.rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: NonZeroU32::new(4 * self.size.width),
                rows_per_image: NonZeroU32::new(self.size.height),
            },
            extent(self.size),
        );

        let surface_texture = self.surface.get_current_texture()?;
        let target = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let command_buffer = encoder::record(&self.context.device, "present-frame", |encoder| {
            encoder.with_render_pass("present-pass", &target, |render_pass| {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.bind_group, &[]);
                render_pass.draw(0..4, 0..1);
            });
        });

        self.context.queue.submit([command_buffer]);
        surface_texture.present();
        Ok(())
    }
}

fn extent(size: screen::Size) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.width,
        height: size.height,
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(
        unix,
        not(any(target_os = "macos", target_os = "ios", target_os = "android"))
    ))]
    fn display_comes_from_the_environment() {
        assert!(!display_available(|_| None));
        assert!(!display_available(|_| Some(OsString::new())));
        assert!(display_available(|name| {
            (name == "WAYLAND_DISPLAY").then(|| OsString::from("wayland-0"))
        }));
        assert!(display_available(|name| {
            (name == "DISPLAY").then(|| OsString::from(":0"))
        }));
    }

    #[test]
    fn null_surface_accepts_any_frame() {
        let pixels = PixelBuffer::new(screen::Size::new(4, 2));
        assert!(NullSurface.present(&pixels).is_ok());
    }
}
