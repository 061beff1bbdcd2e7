//! Pixel-level image analysis: lighting, blur and document boundaries
//!
//! Everything here is synchronous and CPU-bound. Callers schedule it off
//! any interactive thread.

pub mod brightness;
pub mod edges;
pub mod sharpness;

pub use brightness::LightingCondition;
pub use edges::{DocumentCorners, EdgeDetector, Point};
