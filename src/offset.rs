//! Tracks the sequence id of the last accepted entry.
//!
//! The tracked [`Offset`] is sent with every subscribe request so the server
//! replays only what the client missed while disconnected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolViolation;

/// Sequence id of the most recently accepted entry.
///
/// [`Offset::BEGINNING`] asks the server for everything it still holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Offset(u64);

impl Offset {
    pub const BEGINNING: Offset = Offset(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_beginning(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Offset {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OffsetTracker {
    last: Option<u64>,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `id` would be accepted without recording it.
    pub fn check(&self, id: u64) -> Result<(), ProtocolViolation> {
        match self.last {
            Some(last) if id <= last => Err(ProtocolViolation::StaleSequence {
                id,
                offset: Offset(last),
            }),
            _ => Ok(()),
        }
    }

    /// Record `id` as the newest accepted entry.
    ///
    /// Ids must strictly increase; anything else leaves the offset untouched.
    pub fn accept(&mut self, id: u64) -> Result<(), ProtocolViolation> {
        self.check(id)?;
        self.last = Some(id);
        Ok(())
    }

    /// Move the offset forward to `id`. Never moves it backwards.
    pub fn advance_to(&mut self, id: u64) {
        if self.last.is_none_or(|last| id > last) {
            self.last = Some(id);
        }
    }

    pub fn current(&self) -> Offset {
        self.last.map(Offset).unwrap_or(Offset::BEGINNING)
    }
}
