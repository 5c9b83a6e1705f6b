//! Append-only event log with a SHA-256 digest chain.
//!
//! Each record commits to its predecessor:
//! `digest_n = SHA-256("hodlvault:event:v1:" || digest_{n-1} || seq || recorded_at || event)`
//!
//! The log is bounded. When `capacity` is reached the oldest record is
//! evicted and its digest becomes the new chain base, so the retained
//! suffix stays verifiable.

use std::collections::VecDeque;

use hodlvault_types::{Identity, Result, Timestamp, VaultError, VaultEvent, constants};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One committed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log since genesis; never reused.
    pub sequence: u64,
    pub event: VaultEvent,
    pub recorded_at: Timestamp,
    /// Chain digest covering this record and all before it.
    pub digest: [u8; 32],
}

impl EventRecord {
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}

/// Bounded, hash-chained event log.
pub struct EventLog {
    records: VecDeque<EventRecord>,
    /// Digest preceding the first retained record.
    base: [u8; 32],
    next_sequence: u64,
    capacity: usize,
}

impl EventLog {
    /// Create a new log retaining at most `capacity` records.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "EventLog capacity must be > 0");
        Self {
            records: VecDeque::new(),
            base: [0u8; 32],
            next_sequence: 0,
            capacity,
        }
    }

    /// Append an event and return the committed record.
    pub fn append(&mut self, event: VaultEvent, recorded_at: Timestamp) -> &EventRecord {
        let digest = chain_digest(&self.head(), self.next_sequence, recorded_at, &event);

        if self.records.len() >= self.capacity {
            if let Some(oldest) = self.records.pop_front() {
                tracing::debug!(
                    sequence = oldest.sequence,
                    capacity = self.capacity,
                    "Event log full, evicting oldest record"
                );
                self.base = oldest.digest;
            }
        }

        self.records.push_back(EventRecord {
            sequence: self.next_sequence,
            event,
            recorded_at,
            digest,
        });
        self.next_sequence += 1;
        let last = self.records.len() - 1;
        &self.records[last]
    }

    /// Digest of the latest record (the zero digest for an empty log).
    #[must_use]
    pub fn head(&self) -> [u8; 32] {
        self.records.back().map_or(self.base, |r| r.digest)
    }

    #[must_use]
    pub fn head_hex(&self) -> String {
        hex::encode(self.head())
    }

    #[must_use]
    pub fn latest(&self) -> Option<&EventRecord> {
        self.records.back()
    }

    /// Retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &EventRecord> {
        self.records.iter()
    }

    /// Retained records with `sequence >= from`.
    pub fn since(&self, from: u64) -> impl Iterator<Item = &EventRecord> {
        self.records.iter().filter(move |r| r.sequence >= from)
    }

    /// Retained records concerning one beneficiary.
    pub fn for_beneficiary(&self, beneficiary: Identity) -> impl Iterator<Item = &EventRecord> {
        self.records
            .iter()
            .filter(move |r| r.event.beneficiary() == beneficiary)
    }

    /// Number of retained records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total events ever appended, including evicted ones.
    #[must_use]
    pub fn total_appended(&self) -> u64 {
        self.next_sequence
    }

    /// Recompute the chain over the retained records.
    ///
    /// # Errors
    /// Returns [`VaultError::Internal`] naming the first record whose digest
    /// does not match.
    pub fn verify_chain(&self) -> Result<()> {
        let mut prev = self.base;
        for record in &self.records {
            let expected = chain_digest(&prev, record.sequence, record.recorded_at, &record.event);
            if expected != record.digest {
                return Err(VaultError::Internal(format!(
                    "event log digest mismatch at sequence {}",
                    record.sequence
                )));
            }
            prev = record.digest;
        }
        Ok(())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(constants::DEFAULT_EVENT_LOG_CAPACITY)
    }
}

fn chain_digest(
    prev: &[u8; 32],
    sequence: u64,
    recorded_at: Timestamp,
    event: &VaultEvent,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::EVENT_DOMAIN);
    hasher.update(prev);
    hasher.update(sequence.to_le_bytes());
    hasher.update(recorded_at.to_le_bytes());
    match event {
        VaultEvent::PositionCreated {
            beneficiary,
            amount,
            release_time,
        } => {
            hasher.update([0x01]);
            hasher.update(beneficiary.as_bytes());
            hasher.update(amount.to_le_bytes());
            hasher.update(release_time.to_le_bytes());
        }
        VaultEvent::PositionWithdrawn {
            beneficiary,
            amount,
            withdrawn_at,
        } => {
            hasher.update([0x02]);
            hasher.update(beneficiary.as_bytes());
            hasher.update(amount.to_le_bytes());
            hasher.update(withdrawn_at.to_le_bytes());
        }
        VaultEvent::PositionLiquidated {
            beneficiary,
            amount,
            recipient,
            liquidated_at,
        } => {
            hasher.update([0x03]);
            hasher.update(beneficiary.as_bytes());
            hasher.update(amount.to_le_bytes());
            hasher.update(recipient.as_bytes());
            hasher.update(liquidated_at.to_le_bytes());
        }
    }
    hasher.finalize().into()
}
