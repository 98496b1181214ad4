//! # JSON Marshalling
//!
//! Converts between JSON and [`DynamicMessage`] using canonical proto3 JSON.
//!
//! Marshalling is strict: unknown fields and type mismatches are errors, reported with the
//! JSON path of the offending value. Unmarshalling emits lowerCamelCase field names, omits
//! fields holding their default value and renders 64-bit integers as strings.
use prost_reflect::{DeserializeOptions, DynamicMessage, MessageDescriptor, ReflectMessage};

#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("Input does not match '{message}' at '{path}': {source}")]
    Mismatch {
        message: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to convert '{message}' to JSON: {source}")]
    Unmarshal {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Builds a message of type `descriptor` from `input`.
pub fn marshal(
    input: &serde_json::Value,
    descriptor: &MessageDescriptor,
) -> Result<DynamicMessage, MarshalError> {
    let options = DeserializeOptions::new();
    let mut track = serde_path_to_error::Track::new();

    let result = DynamicMessage::deserialize_with_options(
        descriptor.clone(),
        serde_path_to_error::Deserializer::new(input, &mut track),
        &options,
    );

    result.map_err(|source| MarshalError::Mismatch {
        message: descriptor.full_name().to_string(),
        path: track.path().to_string(),
        source,
    })
}

/// Renders `message` as canonical proto3 JSON.
pub fn unmarshal(message: &DynamicMessage) -> Result<serde_json::Value, MarshalError> {
    serde_json::to_value(message).map_err(|source| MarshalError::Unmarshal {
        message: message.descriptor().full_name().to_string(),
        source,
    })
}
