//! Non-owning descriptors for device buffers allocated outside the toolbox.
//!
//! External code can hand a pre-allocated device buffer to the
//! reconstruction core without copying by wrapping its address and layout in
//! a [`GpuLink`]. The registration routine on the native side reads the
//! descriptor and maps the block into the core's data manager.

use std::mem::size_of;

use anyhow::{ensure, Result};
use bytemuck::{Pod, Zeroable};

use crate::Scalar;

/// Address of a device allocation holding `f32` samples.
///
/// The value lives in the GPU address space; it is never dereferenced on the
/// host and carries no ownership.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct DevicePtr(pub u64);

impl DevicePtr {
    pub const NULL: DevicePtr = DevicePtr(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Layout metadata for an externally owned device buffer.
///
/// `x` is the fastest-changing extent and `z` the slowest. `pitch` is the
/// width in bytes of one row of the block: `x * size_of::<f32>()` for a
/// tightly packed allocation, larger for pitched allocations such as those
/// returned by `cudaMalloc3D`.
///
/// The handle never owns the memory behind `ptr`. The caller keeps the
/// allocation alive for as long as the handle circulates; nothing here
/// tracks or enforces that lifetime.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct GpuLink {
    pub ptr: DevicePtr,
    pub x: u64,
    pub y: u64,
    pub z: u64,
    pub pitch: u64,
}

impl GpuLink {
    /// Builds a link descriptor, rejecting layouts no device block can have.
    pub fn new(ptr: DevicePtr, x: u64, y: u64, z: u64, pitch: u64) -> Result<Self> {
        ensure!(
            x > 0 && y > 0 && z > 0,
            "device buffer extents must be positive, got {x}x{y}x{z}"
        );
        let row_bytes = x * size_of::<Scalar>() as u64;
        ensure!(
            pitch >= row_bytes,
            "pitch of {pitch} bytes cannot hold a row of {x} samples ({row_bytes} bytes)"
        );
        Ok(Self { ptr, x, y, z, pitch })
    }

    /// Link descriptor for a tightly packed block, deriving the pitch.
    pub fn contiguous(ptr: DevicePtr, x: u64, y: u64, z: u64) -> Result<Self> {
        Self::new(ptr, x, y, z, x * size_of::<Scalar>() as u64)
    }

    pub fn is_contiguous(&self) -> bool {
        self.pitch == self.x * size_of::<Scalar>() as u64
    }

    /// Number of samples the linked block exposes.
    pub fn element_count(&self) -> u64 {
        self.x * self.y * self.z
    }

    /// Footprint in bytes of the pitched block, row padding included.
    pub fn size_in_bytes(&self) -> u64 {
        self.pitch * self.y * self.z
    }
}
