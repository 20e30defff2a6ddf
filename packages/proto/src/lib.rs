//! Generated protobuf/gRPC bindings for cross-service contracts.

pub mod directory {
    tonic::include_proto!("directory");
}
