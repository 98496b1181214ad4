//! # DynamicMessage Codec
//!
//! Implements `tonic::codec::Codec` for [`DynamicMessage`], so `tonic` can transport messages
//! whose shape is only known from a [`MessageDescriptor`] at runtime.
//!
//! JSON never reaches the codec. The engine marshals the input before the call and
//! unmarshals the response after it, which keeps schema errors out of the transport.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A Codec that writes and reads Protobuf binary for runtime-described messages.
pub struct DynamicCodec {
    /// Schema for the response message.
    res_desc: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(res_desc: MessageDescriptor) -> Self {
        Self { res_desc }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicMessage;
    type Decode = DynamicMessage;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.res_desc.clone())
    }
}

pub struct DynamicEncoder;

impl Encoder for DynamicEncoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        item.encode_raw(dst);
        Ok(())
    }
}

pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicMessage;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src).map_err(|e| {
            Status::internal(format!(
                "Failed to decode '{}' from Protobuf bytes: {e}",
                self.0.full_name()
            ))
        })?;

        Ok(Some(msg))
    }
}
