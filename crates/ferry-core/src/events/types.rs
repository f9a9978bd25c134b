//! Event payloads posted by the storage layer.

use std::fmt;

/// Pager lock levels, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PagerLock {
    None = 0,
    Shared = 1,
    Reserved = 2,
    Pending = 3,
    Exclusive = 4,
}

impl PagerLock {
    /// Map a raw SQLite lock level (`SQLITE_LOCK_*`).
    pub fn from_raw(level: i32) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::Shared),
            2 => Some(Self::Reserved),
            3 => Some(Self::Pending),
            4 => Some(Self::Exclusive),
            _ => None,
        }
    }

    /// Levels a connection may request. `None` and `Pending` are only
    /// ever reported as transitions, never requested.
    pub fn is_requestable(self) -> bool {
        matches!(self, Self::Shared | Self::Reserved | Self::Exclusive)
    }
}

impl fmt::Display for PagerLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Shared => "shared",
            Self::Reserved => "reserved",
            Self::Pending => "pending",
            Self::Exclusive => "exclusive",
        };
        f.write_str(name)
    }
}

/// Shared-memory (WAL index) lock kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShmLock {
    Shared,
    Exclusive,
}

impl ShmLock {
    /// SQLite's `SQLITE_SHM_SHARED` flag.
    pub const SHARED_FLAG: i32 = 4;
    /// SQLite's `SQLITE_SHM_EXCLUSIVE` flag.
    pub const EXCLUSIVE_FLAG: i32 = 8;

    /// Decode the lock kind from raw `xShmLock` flags. Exactly one of the
    /// shared/exclusive bits must be set.
    pub fn from_flags(flags: i32) -> Option<Self> {
        let shared = flags & Self::SHARED_FLAG != 0;
        let exclusive = flags & Self::EXCLUSIVE_FLAG != 0;
        match (shared, exclusive) {
            (true, false) => Some(Self::Shared),
            (false, true) => Some(Self::Exclusive),
            _ => None,
        }
    }
}

/// A database file was opened by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOpenedEvent {
    pub path: String,
    pub read_only: bool,
}
