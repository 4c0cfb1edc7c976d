//! Mesh processing algorithms built on the connectivity kernel.

pub mod decimate;

pub use decimate::{qem_decimate, DecimateOptions};
