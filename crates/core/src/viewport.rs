//! Viewport discriminator for heartbeats.
//!
//! Every pulse measures the same URL twice, once per [`Viewport`]. The
//! numeric code is what the `heartbeats.mode` column stores; the lowercase
//! token is what travels on the dispatch bus and in request paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Viewport mode code matching the SMALLINT `heartbeats.mode` column.
pub type ModeCode = i16;

/// Message used for every rejected viewport token.
pub const INVALID_VIEWPORT: &str = "Invalid viewport";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum Viewport {
    Mobile = 0,
    Desktop = 1,
}

impl Viewport {
    /// Both viewports, in mode-code order.
    pub const ALL: [Viewport; 2] = [Viewport::Mobile, Viewport::Desktop];

    /// Return the database mode code.
    pub fn code(self) -> ModeCode {
        self as ModeCode
    }

    /// Lowercase token used on the wire and in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }

    /// Resolve a wire token. Only the exact literals `mobile` and `desktop`
    /// are accepted.
    pub fn from_token(token: &str) -> Result<Self, CoreError> {
        match token {
            "mobile" => Ok(Self::Mobile),
            "desktop" => Ok(Self::Desktop),
            _ => Err(CoreError::Validation(INVALID_VIEWPORT.to_string())),
        }
    }

    /// Resolve a stored mode code.
    pub fn from_code(code: ModeCode) -> Option<Self> {
        match code {
            0 => Some(Self::Mobile),
            1 => Some(Self::Desktop),
            _ => None,
        }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Viewport {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s)
    }
}

impl From<Viewport> for ModeCode {
    fn from(value: Viewport) -> Self {
        value.code()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
