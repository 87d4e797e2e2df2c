//! GPU-accelerated rendering using wgpu.

mod accelerated;
mod bridge;
mod compute;
mod device;
pub(crate) mod encoder;
mod typed_buffer;

pub use accelerated::{Accelerated, KernelParams};
pub use bridge::DeviceBuffer;
pub use device::GpuContext;
