// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use std::collections::VecDeque;

/// What happens to data bytes beyond the configured maximum length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SysexOverflowPolicy {
    /// Drop all further bytes and discard the whole message on termination.
    #[default]
    Reject,
    /// Drop all further bytes and emit the truncated message on termination.
    Truncate,
    /// Keep only the most recent bytes.
    DropOldest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PushOutcome {
    Stored,
    /// The first byte that exceeded the limit during the current run.
    Overflowed,
    /// Subsequent bytes after an overflow has already been reported.
    Dropped,
}

const MIN_RESERVE: usize = 64;

/// Bounded buffer for the payload of a single sysex message.
#[derive(Debug)]
pub(super) struct SysexAccumulator {
    buffer: VecDeque<u8>,
    max_len: usize,
    policy: SysexOverflowPolicy,
    active: bool,
    overflowed: bool,
}

impl SysexAccumulator {
    #[must_use]
    pub(super) const fn new(max_len: usize, policy: SysexOverflowPolicy) -> Self {
        Self {
            buffer: VecDeque::new(),
            max_len,
            policy,
            active: false,
            overflowed: false,
        }
    }

    #[must_use]
    pub(super) const fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub(super) fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Begin a new message, discarding any unterminated one.
    ///
    /// Returns `true` if an unterminated message has been discarded.
    pub(super) fn start(&mut self) -> bool {
        let aborted = self.abort();
        self.active = true;
        aborted
    }

    pub(super) fn push(&mut self, byte: u8) -> PushOutcome {
        debug_assert!(self.active);
        if self.buffer.len() < self.max_len {
            if self.buffer.len() == self.buffer.capacity() {
                let additional = self
                    .buffer
                    .len()
                    .max(MIN_RESERVE)
                    .min(self.max_len - self.buffer.len());
                self.buffer.reserve_exact(additional);
            }
            self.buffer.push_back(byte);
            return PushOutcome::Stored;
        }
        if self.policy == SysexOverflowPolicy::DropOldest && self.max_len > 0 {
            self.buffer.pop_front();
            self.buffer.push_back(byte);
        }
        if self.overflowed {
            PushOutcome::Dropped
        } else {
            self.overflowed = true;
            PushOutcome::Overflowed
        }
    }

    /// Terminate the current message.
    ///
    /// Returns `None` if the message overflowed and must be rejected.
    pub(super) fn finish(&mut self) -> Option<Vec<u8>> {
        debug_assert!(self.active);
        self.active = false;
        let overflowed = std::mem::take(&mut self.overflowed);
        if overflowed && self.policy == SysexOverflowPolicy::Reject {
            self.buffer.clear();
            return None;
        }
        Some(std::mem::take(&mut self.buffer).into())
    }

    /// Discard the current message without terminating it.
    ///
    /// Returns `true` if a message had been active.
    pub(super) fn abort(&mut self) -> bool {
        let was_active = self.active;
        self.active = false;
        self.overflowed = false;
        self.buffer.clear();
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(
        policy: SysexOverflowPolicy,
        max_len: usize,
        bytes: &[u8],
    ) -> (Vec<PushOutcome>, Option<Vec<u8>>) {
        let mut sysex = SysexAccumulator::new(max_len, policy);
        assert!(!sysex.start());
        let outcomes = bytes.iter().map(|&byte| sysex.push(byte)).collect();
        (outcomes, sysex.finish())
    }

    #[test]
    fn within_limit() {
        let (outcomes, payload) =
            accumulate(SysexOverflowPolicy::Reject, 4, &[0x7d, 0x00, 0x5a, 0x00]);
        assert!(outcomes.iter().all(|outcome| *outcome == PushOutcome::Stored));
        assert_eq!(Some(vec![0x7d, 0x00, 0x5a, 0x00]), payload);
    }

    #[test]
    fn reject_on_overflow() {
        let (outcomes, payload) = accumulate(SysexOverflowPolicy::Reject, 2, &[1, 2, 3, 4]);
        assert_eq!(
            vec![
                PushOutcome::Stored,
                PushOutcome::Stored,
                PushOutcome::Overflowed,
                PushOutcome::Dropped
            ],
            outcomes
        );
        assert_eq!(None, payload);
    }

    #[test]
    fn truncate_on_overflow() {
        let (_, payload) = accumulate(SysexOverflowPolicy::Truncate, 2, &[1, 2, 3, 4]);
        assert_eq!(Some(vec![1, 2]), payload);
    }

    #[test]
    fn drop_oldest_on_overflow() {
        let (_, payload) = accumulate(SysexOverflowPolicy::DropOldest, 2, &[1, 2, 3, 4]);
        assert_eq!(Some(vec![3, 4]), payload);
    }

    #[test]
    fn restart_discards_unterminated() {
        let mut sysex = SysexAccumulator::new(16, SysexOverflowPolicy::Reject);
        sysex.start();
        sysex.push(1);
        assert!(sysex.start());
        assert_eq!(0, sysex.len());
        sysex.push(2);
        assert_eq!(Some(vec![2]), sysex.finish());
        assert!(!sysex.is_active());
    }

    #[test]
    fn overflow_flag_resets_per_message() {
        let mut sysex = SysexAccumulator::new(1, SysexOverflowPolicy::Reject);
        sysex.start();
        sysex.push(1);
        assert_eq!(PushOutcome::Overflowed, sysex.push(2));
        assert_eq!(None, sysex.finish());
        sysex.start();
        assert_eq!(PushOutcome::Stored, sysex.push(3));
        assert_eq!(Some(vec![3]), sysex.finish());
    }

    #[test]
    fn capacity_stays_bounded() {
        let mut sysex = SysexAccumulator::new(100, SysexOverflowPolicy::Reject);
        sysex.start();
        for byte in 0..200 {
            sysex.push(byte & 0x7f);
        }
        assert_eq!(100, sysex.len());
        assert!(sysex.buffer.capacity() <= 128);
    }
}
