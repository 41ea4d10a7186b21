//! GPU device + surface management.
//!
//! [`Gpu`] owns the wgpu adapter, device, queue and the window surface, and
//! hands out one [`GpuFrame`] per presented image. Backends build on it; the
//! render loop never touches it directly.

mod gpu;
mod init;
mod surface;

pub use gpu::{Gpu, GpuFrame};
pub use init::GpuInit;
pub use surface::SurfaceRecovery;
