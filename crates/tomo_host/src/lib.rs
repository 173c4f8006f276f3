//! Host-side bookkeeping helpers for the GPU reconstruction core.
//!
//! The heavy lifting (projectors, kernels, data management) lives in the
//! native reconstruction core; this crate carries the glue the host bindings
//! need around it:
//! - geometry descriptor parsing and array shape resolution, used to
//!   pre-size volume and projection-data buffers
//! - non-owning link descriptors that hand caller-allocated device buffers
//!   to the core without copying

pub mod geometry;
pub mod link;
pub mod shape;

/// Sample type of every device buffer the toolbox exchanges.
pub type Scalar = f32;

pub use geometry::{extent_of, shape_of, Beam2d, Beam3d, Geometry, VecBeam3d, VectorTable};
pub use link::{DevicePtr, GpuLink};
pub use shape::Shape;
