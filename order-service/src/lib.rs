//! # Order Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a gRPC server implementation,
//! the `.proto` sources and a descriptor set for integration testing `protocall`.
//! It is not intended for production use.

pub mod pb {
    pub mod common {
        include!(concat!(env!("OUT_DIR"), "/common.rs"));
    }

    pub mod order {
        include!(concat!(env!("OUT_DIR"), "/order.rs"));
    }
}

pub use pb::order::order_service_server::{OrderService, OrderServiceServer};
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

/// Directory holding the `.proto` sources the server was built from.
pub const PROTO_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/proto");
