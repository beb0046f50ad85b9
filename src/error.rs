//! Error handling for the valtab library
//!
//! This module provides the crate-wide error type with detailed context for
//! every failure mode a table operation can report. Lookup misses are never
//! errors; they are expressed as `Option` at the call sites.

use thiserror::Error;

/// Main error type for the valtab library
#[derive(Error, Debug)]
pub enum ValtabError {
    /// Assigning a char-table parent that would create an inheritance cycle
    #[error("parent assignment would create a cycle in the inheritance chain")]
    ParentCycle,

    /// Access to an extra slot outside the table's allocated extras
    #[error("extra slot out of range: index {index}, slots {len}")]
    ExtraSlotOutOfRange {
        /// The invalid slot index
        index: usize,
        /// The number of extra slots the table owns
        len: usize,
    },

    /// Packed block start not aligned to a leaf block boundary
    #[error("packed block start {start:#x} is not aligned to a {block}-codepoint block")]
    MisalignedBlock {
        /// The misaligned start codepoint
        start: u32,
        /// The required block span
        block: u32,
    },

    /// Packed data loaded into a table not created as a property table
    #[error("packed blocks are only accepted by property tables")]
    NotPropertyTable,

    /// Packed block payload with the wrong shape
    #[error("bad packed block: {message}")]
    BadPackedBlock {
        /// What was malformed about the payload
        message: String,
    },

    /// Hash-table test name that names no builtin and no registered test
    #[error("unknown hash table test: {name}")]
    UnknownTest {
        /// The unrecognized test name
        name: String,
    },

    /// Weakness tag that names no retention policy
    #[error("unknown weakness: {name}")]
    UnknownWeakness {
        /// The unrecognized weakness name
        name: String,
    },

    /// Mutation attempted while a user test callback holds the table immutable
    #[error("hash table test modifies table")]
    TableImmutable,

    /// Requested table size exceeds the representable index width
    #[error("hash table too large: {size} entries")]
    TableTooLarge {
        /// The size that could not be indexed
        size: usize,
    },

    /// Failure reported by a user-supplied hash or equality callback
    #[error("test callback failed: {message}")]
    Callback {
        /// Message carried from the failing callback
        message: String,
    },
}

impl ValtabError {
    /// Create an extra-slot bounds error
    pub fn extra_slot_out_of_range(index: usize, len: usize) -> Self {
        Self::ExtraSlotOutOfRange { index, len }
    }

    /// Create a misaligned packed-block error
    pub fn misaligned_block(start: u32, block: u32) -> Self {
        Self::MisalignedBlock { start, block }
    }

    /// Create an unknown-test error
    pub fn unknown_test<S: Into<String>>(name: S) -> Self {
        Self::UnknownTest { name: name.into() }
    }

    /// Create an unknown-weakness error
    pub fn unknown_weakness<S: Into<String>>(name: S) -> Self {
        Self::UnknownWeakness { name: name.into() }
    }

    /// Create a table-too-large error
    pub fn table_too_large(size: usize) -> Self {
        Self::TableTooLarge { size }
    }

    /// Create a callback failure carrying a collaborator message
    pub fn callback<S: Into<String>>(message: S) -> Self {
        Self::Callback { message: message.into() }
    }

    /// Create a bad-packed-block error
    pub fn bad_packed_block<S: Into<String>>(message: S) -> Self {
        Self::BadPackedBlock { message: message.into() }
    }

    /// Check if this error leaves the table usable afterwards
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ParentCycle => true,
            Self::ExtraSlotOutOfRange { .. } => true,
            Self::MisalignedBlock { .. } => true,
            Self::NotPropertyTable => true,
            Self::BadPackedBlock { .. } => true,
            Self::UnknownTest { .. } => true,
            Self::UnknownWeakness { .. } => true,
            Self::TableImmutable => true,
            Self::TableTooLarge { .. } => false,
            Self::Callback { .. } => true,
        }
    }

    /// Get the error category for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            Self::ParentCycle => "chartab",
            Self::ExtraSlotOutOfRange { .. } => "chartab",
            Self::MisalignedBlock { .. } => "chartab",
            Self::NotPropertyTable => "chartab",
            Self::BadPackedBlock { .. } => "chartab",
            Self::UnknownTest { .. } => "hash_table",
            Self::UnknownWeakness { .. } => "hash_table",
            Self::TableImmutable => "hash_table",
            Self::TableTooLarge { .. } => "hash_table",
            Self::Callback { .. } => "hash_table",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValtabError>;
