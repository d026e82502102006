//! Domain model (artifacts, versions, ids, work orders, traces, errors).

pub mod artifact;
pub mod errors;
pub mod ids;
pub mod orchestration;
pub mod trace;
pub mod version_order;

pub use self::artifact::{
    ArtifactType, DeliveryArtifact, DeliveryArtifactVersion, Provenance, RegisteredArtifact,
};
pub use self::errors::{ArtifactError, ErrorKind, InfrastructureError, ValidationError};
pub use self::ids::ArtifactUid;
pub use self::orchestration::{Job, OrchestrationRequest};
pub use self::trace::Trace;
pub use self::version_order::VersionOrdering;
