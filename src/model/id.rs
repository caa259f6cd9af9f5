//! Track identity codec.
//!
//! Client-facing track ids are `{source}_{native_id}`. This module is
//! the only place that builds or strips the prefix; call sites route on
//! the decoded [`Source`] instead of sniffing id strings themselves.

use serde::{Deserialize, Serialize};

/// Provider that produced a record.
///
/// The serialized tag doubles as the id prefix, so an id's prefix always
/// matches its `source` field by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// YouTube Music (search, recommendations, streams).
    Ytm,
    /// LRCLIB lyrics database.
    Lrclib,
    /// iTunes Search catalog.
    Itunes,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid track id: {0:?}")]
pub struct InvalidIdentifier(pub String);

impl Source {
    pub fn tag(self) -> &'static str {
        match self {
            Source::Ytm => "ytm",
            Source::Lrclib => "lrclib",
            Source::Itunes => "itunes",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ytm" => Some(Source::Ytm),
            "lrclib" => Some(Source::Lrclib),
            "itunes" => Some(Source::Itunes),
            _ => None,
        }
    }

    /// Build the client-facing id for a provider-native id.
    pub fn encode(self, native: &str) -> String {
        format!("{}_{native}", self.tag())
    }
}

/// Split a client-facing id into its source and provider-native part.
///
/// Splits on the first `_`; the native part may itself contain
/// underscores.
pub fn decode(id: &str) -> Result<(Source, &str), InvalidIdentifier> {
    let (tag, native) = id
        .split_once('_')
        .ok_or_else(|| InvalidIdentifier(id.to_string()))?;
    let source = Source::from_tag(tag).ok_or_else(|| InvalidIdentifier(id.to_string()))?;
    Ok((source, native))
}

/// Accept both prefixed and provider-native ids for a known source.
///
/// `ytm_abc` becomes `abc`; a bare native id (which may legitimately
/// contain underscores) passes through unchanged, as does an id
/// prefixed for a different source.
pub fn native_of(source: Source, id: &str) -> &str {
    match decode(id) {
        Ok((s, native)) if s == source => native,
        _ => id,
    }
}
