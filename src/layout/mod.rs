//! Auto-layout ("Rearrange") for flow graphs

pub mod engine;

pub use engine::LayoutEngine;
