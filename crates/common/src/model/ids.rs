use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdError {
    #[error("missing 0x prefix")]
    MissingPrefix,
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

fn decode_prefixed<const N: usize>(s: &str) -> Result<[u8; N], IdError> {
    let stripped = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or(IdError::MissingPrefix)?;
    let bytes = hex::decode(stripped)?;
    if bytes.len() != N {
        return Err(IdError::Length {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Declares a fixed-width, `0x`-hex encoded identifier.
///  All of them share the same wire representation so the
///  backend, the chain gateway and config files agree.
macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                decode_prefixed::<$len>(s).map(Self)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_id!(
    /// Account address of the connected principal
    Address,
    20
);
hex_id!(
    /// Deterministic bucket identifier, derived from owner + name
    BucketId,
    32
);
hex_id!(
    /// Deterministic file identifier, derived from owner + bucket + name
    FileKey,
    32
);
hex_id!(
    /// Content hash of a file's bytes
    Fingerprint,
    32
);
hex_id!(TxHash, 32);
hex_id!(
    /// On-chain identifier of a main storage provider
    ProviderId,
    32
);
hex_id!(ValuePropId, 32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_parse_and_display() {
        let s = "0x00112233445566778899aabbccddeeff00112233";
        let addr: Address = s.parse().unwrap();
        assert_eq!(addr.to_string(), s);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = "0x0011".parse::<BucketId>().unwrap_err();
        assert_eq!(
            err,
            IdError::Length {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn test_rejects_missing_prefix() {
        let err = "00112233445566778899aabbccddeeff00112233"
            .parse::<Address>()
            .unwrap_err();
        assert_eq!(err, IdError::MissingPrefix);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let key = FileKey::from_bytes([7; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "07".repeat(32)));
        let back: FileKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
