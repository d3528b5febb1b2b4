/// Failures a [`Table`](crate::Table) can report instead of growing further.
///
/// Lookups and removals never fail; a missing key is an ordinary `None`.
/// Eviction cycles are recovered internally by growing, so only
/// construction misuse and exhausted growth surface here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CuckooError {
    /// Cuckoo hashing needs at least two independent subtables.
    #[error("a cuckoo table needs at least 2 subtables, got {tables}")]
    TooFewTables {
        /// The subtable count that was asked for.
        tables: usize,
    },

    /// Growing would exceed the ceiling set with
    /// [`Table::set_max_capacity`](crate::Table::set_max_capacity).
    #[error("growing to {requested} slots would exceed the maximum capacity of {max}")]
    CapacityExceeded {
        /// Slot count of the smallest layout that was still to be tried.
        requested: usize,
        /// The configured ceiling.
        max: usize,
    },

    /// The next layout does not fit in memory: its slot count overflows
    /// `usize`, or its bucket array cannot be allocated.
    #[error("capacity overflow")]
    CapacityOverflow,
}

/// The error returned by [`Table::try_insert`](crate::Table::try_insert).
///
/// Carries the entry that was left without a slot. Eviction moves entries
/// around before the table gives up, so this is not necessarily the entry
/// passed to `try_insert`: in that case the passed entry is stored and a
/// previously stored one is handed back here instead. Every other entry stays
/// in the table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not store entry: {error}")]
pub struct TryInsertError<K, V> {
    /// Key of the homeless entry.
    pub key: K,
    /// Value of the homeless entry.
    pub value: V,
    /// Why the table could not make room.
    #[source]
    pub error: CuckooError,
}

impl<K, V> TryInsertError<K, V> {
    /// Consumes the error, returning the homeless key and value.
    pub fn into_inner(self) -> (K, V) {
        (self.key, self.value)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            CuckooError::TooFewTables { tables: 1 }.to_string(),
            "a cuckoo table needs at least 2 subtables, got 1"
        );
        assert_eq!(
            CuckooError::CapacityExceeded {
                requested: 64,
                max: 40
            }
            .to_string(),
            "growing to 64 slots would exceed the maximum capacity of 40"
        );

        let err = TryInsertError {
            key: 7u32,
            value: "seven",
            error: CuckooError::CapacityOverflow,
        };
        assert_eq!(err.to_string(), "could not store entry: capacity overflow");
        assert_eq!(err.into_inner(), (7, "seven"));
    }

    #[test]
    fn source_is_the_table_error() {
        use core::error::Error;

        let err = TryInsertError {
            key: 1u8,
            value: 2u8,
            error: CuckooError::CapacityOverflow,
        };
        let source = err.source().expect("source should be set");
        assert_eq!(source.to_string(), "capacity overflow");
    }
}
