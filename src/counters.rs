//! Sliding-window counter state for PSK replay protection.
//!
//! One `CounterState` exists per peer, owned by the caller and passed in
//! by exclusive borrow. The ledger delivers near-in-order but can reorder
//! within a few rounds, so receive validation accepts a window around the
//! high-water mark instead of demanding strict monotonicity. Counters are
//! only recorded after the AEAD tag has verified, so a forged header
//! cannot poison the window.

use std::collections::BTreeSet;

use crate::error::{ChatError, Result};

/// Reorder tolerance on either side of the high-water mark.
pub const COUNTER_WINDOW: u32 = 200;

const STATE_HEADER_LEN: usize = 12;

/// Outcome of validating an incoming counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterVerdict {
    /// Counter is fresh and inside the window.
    Accept,
    /// Counter was already accepted.
    Replay,
    /// Counter falls outside the sliding window.
    OutOfWindow,
}

/// Per-peer counter state for one PSK session.
///
/// Created when a PSK is adopted for a peer and destroyed with it. Every
/// successful send advances `send_counter`; every successful receive
/// records the counter and prunes the window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    send_counter: u32,
    receive_high: u32,
    seen: BTreeSet<u32>,
}

impl CounterState {
    /// Fresh state: next send is counter 0, any first receive is accepted.
    pub fn new() -> Self {
        Self::default()
    }

    /// The counter the next outgoing message will use.
    pub fn send_counter(&self) -> u32 {
        self.send_counter
    }

    /// The largest counter accepted so far.
    pub fn receive_high(&self) -> u32 {
        self.receive_high
    }

    /// Whether a counter is currently recorded in the window.
    pub fn has_seen(&self, counter: u32) -> bool {
        self.seen.contains(&counter)
    }

    /// Emits the next send counter and advances the state.
    ///
    /// Counters are emitted gapless from 0. Callers must persist the state
    /// before publishing the message.
    pub fn advance_send(&mut self) -> Result<u32> {
        if self.send_counter == u32::MAX {
            return Err(ChatError::CounterOverflow);
        }
        let counter = self.send_counter;
        self.send_counter += 1;
        Ok(counter)
    }

    /// Validates an incoming counter against the window.
    ///
    /// An empty `seen` set accepts any counter: a freshly adopted session
    /// has no lower bound until the first message lands.
    pub fn validate_receive(&self, counter: u32) -> CounterVerdict {
        if self.seen.contains(&counter) {
            return CounterVerdict::Replay;
        }
        if self.seen.is_empty() {
            return CounterVerdict::Accept;
        }

        let low = self.receive_high.saturating_sub(COUNTER_WINDOW);
        // Widen for the upper bound; wire counters are u32.
        let high = u64::from(self.receive_high) + u64::from(COUNTER_WINDOW);
        if counter >= low && u64::from(counter) <= high {
            CounterVerdict::Accept
        } else {
            CounterVerdict::OutOfWindow
        }
    }

    /// Records an accepted counter. Call only after the AEAD decryption of
    /// the carrying message succeeded.
    pub fn record_receive(&mut self, counter: u32) {
        self.seen.insert(counter);
        if counter > self.receive_high {
            self.receive_high = counter;
        }

        let cutoff = self.receive_high.saturating_sub(COUNTER_WINDOW);
        self.seen.retain(|&c| c >= cutoff);
    }

    /// Serialises the state.
    ///
    /// Layout, all big-endian: `send_counter (4) | receive_high (4) |
    /// entry count (4) | sorted seen entries (4 each)`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(STATE_HEADER_LEN + self.seen.len() * 4);
        data.extend_from_slice(&self.send_counter.to_be_bytes());
        data.extend_from_slice(&self.receive_high.to_be_bytes());
        data.extend_from_slice(&(self.seen.len() as u32).to_be_bytes());
        for counter in &self.seen {
            data.extend_from_slice(&counter.to_be_bytes());
        }
        data
    }

    /// Restores state from a serialised blob.
    ///
    /// Any in-range values are accepted; a truncated or inconsistent blob
    /// fails with [`ChatError::StateCorrupt`]. Callers should only fall
    /// back to a fresh state with explicit user consent.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < STATE_HEADER_LEN {
            return Err(ChatError::StateCorrupt("truncated header".into()));
        }

        let read_u32 = |at: usize| u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);
        let send_counter = read_u32(0);
        let receive_high = read_u32(4);
        let count = read_u32(8) as usize;

        let expected = count
            .checked_mul(4)
            .and_then(|n| n.checked_add(STATE_HEADER_LEN))
            .ok_or_else(|| ChatError::StateCorrupt("entry count overflow".into()))?;
        if data.len() != expected {
            return Err(ChatError::StateCorrupt(format!(
                "length mismatch: {} bytes for {} entries",
                data.len(),
                count
            )));
        }

        let mut seen = BTreeSet::new();
        for i in 0..count {
            seen.insert(read_u32(STATE_HEADER_LEN + i * 4));
        }

        Ok(Self {
            send_counter,
            receive_high,
            seen,
        })
    }
}
