//! Closure-scoped command recording.

/// Record commands into a fresh encoder and finish it.
pub fn record(
    device: &wgpu::Device,
    label: &str,
    function: impl FnOnce(&mut wgpu::CommandEncoder),
) -> wgpu::CommandBuffer {
    let mut command_encoder =
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
    command_encoder.push_debug_group(label);
    function(&mut command_encoder);
    command_encoder.pop_debug_group();
    command_encoder.finish()
}

pub trait CommandEncoderExt {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A;

    /// A render pass that clears `target` to black, then runs `function`.
    fn with_render_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        target: &'pass wgpu::TextureView,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A;
}

impl CommandEncoderExt for wgpu::CommandEncoder {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A {
        let mut compute_pass =
            self.begin_compute_pass(&wgpu::ComputePassDescriptor { label: Some(label) });
        function(&mut compute_pass)
    }

    fn with_render_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        target: &'pass wgpu::TextureView,
        function: impl FnOnce(&mut wgpu::RenderPass<'pass>) -> A,
    ) -> A {
        let mut render_pass = self.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: true,
                },
            })],
            depth_stencil_attachment: None,
        });
        function(&mut render_pass)
    }
}
