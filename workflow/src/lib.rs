//! Training and deployment orchestration for the segmentation demo.
//!
//! A [`Session`] runs the whole flow in order against any
//! [`platform::Workspace`]: sample inspection, compute provisioning (the one
//! guarded call), environment and dataset registration, distributed job
//! submission, managed endpoint deployment, and a sample inference scored
//! against the ground-truth masks.

pub mod config;
pub mod error;
pub mod render;
pub mod session;

pub use config::WorkflowConfig;
pub use error::{Result, WorkflowErr};
pub use session::{RunReport, Session};
