//! # Terraform Plugin Protocol
//!
//! Protocol version 6 bindings generated by `build.rs`, plus the pieces that
//! sit between the wire and the provider:
//!
//! - [`schema`]: attribute declarations rendered into `Schema` messages
//! - [`value`]: the msgpack/JSON value codec
//! - [`diagnostics`]: error and warning collection
//! - [`service`]: the `tfplugin6.Provider` gRPC service

pub mod diagnostics;
pub mod schema;
pub mod service;
pub mod value;

/// Generated protobuf bindings
#[allow(clippy::all)]
pub mod proto {
    pub mod tfplugin6 {
        tonic::include_proto!("tfplugin6");
    }

    pub mod plugin {
        tonic::include_proto!("plugin");
    }

    pub mod health {
        tonic::include_proto!("grpc.health.v1");
    }
}

pub use diagnostics::Diagnostics;
pub use schema::{Attribute, AttributeType, Block};
pub use service::ProviderService;
pub use value::{ObjectValue, Value};
