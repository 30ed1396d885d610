#![deny(unsafe_code)]

use std::fmt;

use uuid::Uuid;

use crate::error::{EntityKind, ModelError};

/// Stable identity of a line.
///
/// Generated guids are random 128-bit values rendered as lowercase hyphenated
/// hex. Guids read from documents are adopted verbatim after validation, so a
/// guid is compared by its exact text.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Guid(String);

impl Guid {
    /// Mint a fresh random guid.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validate an externally supplied guid.
    ///
    /// Surrounding whitespace is ignored. Empty values and values containing
    /// whitespace, quotes, markup characters or control characters are rejected
    /// because they cannot survive the XML attribute or script key they end up in.
    pub fn parse(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        let valid = !trimmed.is_empty()
            && !trimmed.chars().any(|ch| {
                ch.is_whitespace()
                    || ch.is_control()
                    || matches!(ch, '"' | '\'' | '<' | '>' | '&' | '\\')
            });
        if !valid {
            return Err(ModelError::InvalidGuid(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the guid is a well-formed UUID (generated guids always are).
    pub fn is_uuid(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok()
    }
}

impl TryFrom<String> for Guid {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Guid> for String {
    fn from(value: Guid) -> Self {
        value.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Mint a fresh guid. Stateless apart from the OS random source.
pub fn new_guid() -> Guid {
    Guid::generate()
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
                    return Err(ModelError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Externally assigned voice identifier.
    VoiceId,
    EntityKind::Voice
);
entity_id!(BroadcastId, EntityKind::Broadcast);
entity_id!(ChannelId, EntityKind::Channel);
entity_id!(
    /// Recorded media entry identifier; also the script table key.
    MediaId,
    EntityKind::RecordedMedia
);
entity_id!(CdId, EntityKind::Cd);
entity_id!(VhsId, EntityKind::VhsTape);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_guids_are_uuids_and_distinct() {
        let a = new_guid();
        let b = new_guid();
        assert_ne!(a, b);
        assert!(a.is_uuid());
        assert_eq!(a.as_str().len(), 36);
        assert_eq!(a.as_str(), a.as_str().to_lowercase());
    }

    #[test]
    fn parse_adopts_text_verbatim() {
        let guid = Guid::parse("  Line-0001  ").unwrap();
        assert_eq!(guid.as_str(), "Line-0001");
        assert!(!guid.is_uuid());
    }

    #[test]
    fn parse_rejects_unsafe_values() {
        for bad in ["", "   ", "a b", "a\"b", "<x>", "a&b", "a\u{7}b"] {
            assert!(
                matches!(Guid::parse(bad), Err(ModelError::InvalidGuid(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn guid_equality_is_exact() {
        let upper = Guid::parse("ABC-1").unwrap();
        let lower = Guid::parse("abc-1").unwrap();
        assert_ne!(upper, lower);
    }

    #[test]
    fn entity_ids_trim_and_reject_empty() {
        assert_eq!(VoiceId::new(" host ").unwrap().as_str(), "host");
        assert!(matches!(
            BroadcastId::new(""),
            Err(ModelError::InvalidId {
                kind: EntityKind::Broadcast,
                ..
            })
        ));
    }

    #[test]
    fn guid_deserialization_validates() {
        let ok: Guid = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<Guid>("\"\"").is_err());
    }
}
