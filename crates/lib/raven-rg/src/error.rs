use raven_rhi::ResourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{operation}({name:?}) called outside of node construction!")]
    OutsideConstruction {
        operation: &'static str,
        name: String,
    },

    #[error("{kind} {name:?} is already published by node {previous_publisher:?}, node {publisher:?} can not publish it again!")]
    DuplicatePublish {
        kind: ResourceKind,
        name: String,
        publisher: String,
        previous_publisher: String,
    },

    #[error("Node {publisher:?} tried to publish {kind} {name:?} which is owned by another registry!")]
    ForeignResource {
        kind: ResourceKind,
        name: String,
        publisher: String,
    },

    #[error("Reusable {kind} {name:?} is created twice in the same epoch!")]
    DuplicateReuseName {
        kind: ResourceKind,
        name: String,
    },

    #[error("Reusable {kind} {name:?} changed its parameters across epochs: previous {previous}, requested {requested}")]
    ReuseMismatch {
        kind: ResourceKind,
        name: String,
        previous: String,
        requested: String,
    },

    #[error("Registry arena exhausted: {0}")]
    ArenaExhausted(#[from] raven_container::ContainerError),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Can not add node {name:?} after the pipeline has been constructed!")]
    TopologyLocked {
        name: String,
    },

    #[error("Node named {name:?} already exists in the pipeline!")]
    DuplicateNodeName {
        name: String,
    },

    #[error("Pipeline was constructed with registry {constructed:?}, but executed with registry {executed:?}!")]
    StaleRegistry {
        constructed: Option<u64>,
        executed: u64,
    },

    #[error("Registry {id:?} (epoch {epoch}) is {state:?}, a pipeline can only be constructed into a fresh registry!")]
    RegistryNotFresh {
        id: u64,
        epoch: u64,
        state: crate::registry::RegistryState,
    },

    #[error("Node {consumer:?} requested {name:?} before node {producer:?} published it, declare {producer:?} first!")]
    OrderingViolation {
        consumer: String,
        producer: String,
        name: String,
    },
}
