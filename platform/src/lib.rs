//! Resource model and narrow client seams for an ML workspace.
//!
//! Every remote concern the workflow touches (datasets, compute,
//! environments, jobs, endpoints) sits behind its own small trait with
//! explicit error types, so the orchestration glue can run against the
//! filesystem-backed [`LocalWorkspace`] or the in-memory [`FakeWorkspace`]
//! without a real cloud backend.

pub mod client;
pub mod error;
pub mod fake;
pub mod local;
pub mod resources;

pub use client::{
    ComputeProvisioner, DatasetRegistry, EndpointManager, EnvironmentRegistry, JobSubmitter,
    Workspace, ensure_compute,
};
pub use error::{PlatformErr, ResourceKind, Result};
pub use fake::FakeWorkspace;
pub use local::{LocalWorkspace, Scorer};
pub use resources::{
    AssetKind, AssetRef, AssetSpec, AuthMode, ComputeTarget, ComputeTier, DataAsset, Deployment,
    Distribution, Endpoint, Environment, JobHandle, JobSpec, ModelRef,
};
