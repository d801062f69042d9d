//! WebGPU rendering module
//!
//! Uses SDF (Signed Distance Fields) for all rendering in the fragment shader.
//! Sprites are decoded on the CPU and sampled from a storage buffer; anything
//! that failed to load is drawn procedurally instead.

pub mod sdf_pipeline;

pub use sdf_pipeline::SdfRenderState;
