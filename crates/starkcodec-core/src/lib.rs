//! # starkcodec-core
//!
//! Core primitives shared by every StarkCodec crate: the felt codec, block
//! references, the error type, the discriminator resolver and the variant
//! registry that maps a discriminator to a decode/encode strategy.
//!
//! Nothing in this crate performs I/O. Decoding and encoding are pure,
//! synchronous functions over JSON text.

pub mod block;
pub mod discriminator;
pub mod error;
pub mod felt;
pub mod registry;

pub use block::{BlockId, BlockTag};
pub use discriminator::{Discriminator, DiscriminatorKey, TransactionType, TransactionVersion};
pub use error::{CodecError, EnvelopeFamily};
pub use felt::{Felt, FeltParseError};
pub use registry::{
    decode_variant, decode_with_path, embed, encode_variant, encode_variant_text, Envelope, Keyed,
    Strategy, Variant, VariantRegistry,
};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}
