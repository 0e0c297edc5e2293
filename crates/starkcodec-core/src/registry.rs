//! The variant registry: static tables mapping a discriminator key to the
//! pair of pure functions that decode and encode one concrete variant.
//!
//! Tables are `static` slices built with the [`strategy!`](crate::strategy)
//! macro, so they are fixed at compile time and safe to read from any number
//! of threads without locking.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::debug;

use crate::discriminator::DiscriminatorKey;
use crate::error::{CodecError, EnvelopeFamily};

/// A concrete payload shape selected by a discriminator key.
///
/// Payload structs never store their own `type`/`version`; the key is
/// implied by the type and stamped on encode.
pub trait Variant: Serialize + DeserializeOwned {
    type Key: DiscriminatorKey;
    const KEY: Self::Key;
}

/// An envelope value that knows which registry key it was built from.
pub trait Keyed {
    type Key: DiscriminatorKey;

    fn key(&self) -> Self::Key;
}

/// Decode/encode pair for one registered variant of envelope `E`.
pub struct Strategy<K: 'static, E: 'static> {
    pub key: K,
    pub decode: fn(&str) -> Result<E, CodecError>,
    pub encode: fn(&E) -> Result<Value, CodecError>,
}

/// Read-only lookup table for one envelope family.
pub struct VariantRegistry<K: 'static, E: 'static> {
    family: EnvelopeFamily,
    strategies: &'static [Strategy<K, E>],
}

impl<K, E> VariantRegistry<K, E> {
    pub const fn new(family: EnvelopeFamily, strategies: &'static [Strategy<K, E>]) -> Self {
        Self { family, strategies }
    }

    pub fn family(&self) -> EnvelopeFamily {
        self.family
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl<K: DiscriminatorKey, E> VariantRegistry<K, E> {
    /// Every registered key, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.strategies.iter().map(|s| s.key)
    }

    pub fn is_registered(&self, key: K) -> bool {
        self.strategies.iter().any(|s| s.key == key)
    }

    pub fn lookup(&self, key: K) -> Result<&Strategy<K, E>, CodecError> {
        self.strategies
            .iter()
            .find(|s| s.key == key)
            .ok_or_else(|| key.unregistered(self.family))
    }

    /// Read just the discriminator members of a raw payload.
    pub fn resolve(&self, raw: &str) -> Result<K, CodecError> {
        K::resolve(raw, self.family)
    }

    /// Resolve the key, select its strategy and fully decode the payload.
    pub fn decode(&self, raw: &str) -> Result<E, CodecError> {
        let key = self.resolve(raw)?;
        let strategy = self.lookup(key)?;
        debug!(family = %self.family, %key, "resolved envelope variant");
        (strategy.decode)(raw)
    }

    /// Encode a value with the strategy registered under `key`.
    pub fn encode_value(&self, key: K, value: &E) -> Result<Value, CodecError> {
        (self.lookup(key)?.encode)(value)
    }
}

/// Decode a payload as the variant `T`.
///
/// The payload's self-reported key is read again and must equal `T::KEY`;
/// a payload that claims to be something else fails with `TypeMismatch`.
/// Field-level failures carry the JSON path of the offending member.
pub fn decode_variant<T: Variant>(raw: &str, family: EnvelopeFamily) -> Result<T, CodecError> {
    let found = T::Key::resolve(raw, family)?;
    if found != T::KEY {
        return Err(CodecError::TypeMismatch {
            expected: T::KEY.to_string(),
            got: found.to_string(),
        });
    }

    decode_with_path(raw)
}

/// Deserialize `raw` as `T`, reporting failures as `MalformedField` with the
/// JSON path of the member that failed. `T` may borrow from `raw`.
pub fn decode_with_path<'a, T: Deserialize<'a>>(raw: &'a str) -> Result<T, CodecError> {
    let mut de = serde_json::Deserializer::from_str(raw);
    let value: T = serde_path_to_error::deserialize(&mut de).map_err(|err| {
        let field = err.path().to_string();
        CodecError::MalformedField {
            field,
            reason: err.into_inner().to_string(),
        }
    })?;
    de.end().map_err(|err| CodecError::malformed("<root>", err))?;
    Ok(value)
}

/// Encode `variant` as a JSON object carrying its discriminator members.
pub fn encode_variant<T: Variant>(variant: &T) -> Result<Value, CodecError> {
    let mut value = serde_json::to_value(variant)?;
    let Some(object) = value.as_object_mut() else {
        return Err(CodecError::malformed(
            "<root>",
            "variant did not encode to a JSON object",
        ));
    };
    T::KEY.stamp(object);
    Ok(value)
}

/// Encode `variant` straight to JSON text carrying its discriminator members.
///
/// Unlike [`encode_variant`] no `Value` tree is built, so payloads that
/// write themselves as raw JSON are not re-parsed.
pub fn encode_variant_text<T: Variant>(variant: &T) -> Result<String, CodecError> {
    let body = serde_json::to_string(variant)?;
    let mut members = serde_json::Map::new();
    T::KEY.stamp(&mut members);
    let head = serde_json::to_string(&members)?;

    let (Some(head), Some(body)) = (head.strip_suffix('}'), body.strip_prefix('{')) else {
        return Err(CodecError::malformed(
            "<root>",
            "variant did not encode to a JSON object",
        ));
    };
    let separator = if head.len() > 1 && !body.starts_with('}') { "," } else { "" };
    Ok(format!("{head}{separator}{body}"))
}

/// Wrap canonical bytes from [`Envelope::encode`] for verbatim embedding in
/// a larger document.
pub fn embed(encoded: Vec<u8>) -> Result<Box<RawValue>, CodecError> {
    let text = String::from_utf8(encoded).map_err(|err| CodecError::malformed("<root>", err))?;
    Ok(RawValue::from_string(text)?)
}

/// A polymorphic wire value that can be decoded from and re-encoded to its
/// canonical JSON form.
pub trait Envelope: Sized {
    const FAMILY: EnvelopeFamily;

    /// Decode a single envelope from raw JSON text.
    fn decode(raw: &str) -> Result<Self, CodecError>;

    /// Encode to a JSON value in canonical wire shape.
    fn to_value(&self) -> Result<Value, CodecError>;

    fn decode_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let raw = std::str::from_utf8(bytes).map_err(|err| CodecError::malformed("<root>", err))?;
        Self::decode(raw)
    }

    /// Canonical JSON bytes. `decode_slice(encode(x)) == x`.
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(&self.to_value()?)?)
    }
}

/// Build a [`Strategy`] for `Envelope::Variant(Payload)`.
#[macro_export]
macro_rules! strategy {
    ($envelope:ident :: $variant:ident ( $payload:ty ), $family:expr) => {
        $crate::registry::Strategy {
            key: <$payload as $crate::registry::Variant>::KEY,
            decode: |raw| {
                $crate::registry::decode_variant::<$payload>(raw, $family).map($envelope::$variant)
            },
            encode: |envelope| match envelope {
                $envelope::$variant(payload) => $crate::registry::encode_variant(payload),
                other => Err($crate::CodecError::TypeMismatch {
                    expected: <$payload as $crate::registry::Variant>::KEY.to_string(),
                    got: $crate::registry::Keyed::key(other).to_string(),
                }),
            },
        }
    };
}

/// Implement `Serialize`/`Deserialize` for an [`Envelope`] by routing through
/// its resolver, so envelopes can sit inside ordinary serde structs.
///
/// Deserialization captures the element as raw JSON first, which only works
/// with `serde_json` deserializers reading text.
#[macro_export]
macro_rules! envelope_serde {
    ($ty:ty) => {
        impl $crate::__private::serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                use $crate::__private::serde::ser::Error as _;
                let value = $crate::registry::Envelope::to_value(self).map_err(S::Error::custom)?;
                $crate::__private::serde::Serialize::serialize(&value, serializer)
            }
        }

        impl<'de> $crate::__private::serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: $crate::__private::serde::Deserializer<'de>,
            {
                use $crate::__private::serde::de::Error as _;
                let raw: ::std::boxed::Box<$crate::__private::serde_json::value::RawValue> =
                    $crate::__private::serde::Deserialize::deserialize(deserializer)?;
                <$ty as $crate::registry::Envelope>::decode(raw.get()).map_err(D::Error::custom)
            }
        }
    };
}
