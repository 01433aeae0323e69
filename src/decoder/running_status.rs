// SPDX-FileCopyrightText: The midilink authors
// SPDX-License-Identifier: MPL-2.0

use crate::byte::StatusByte;

/// Latched Channel Voice/Mode status for running status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct RunningStatus(Option<StatusByte>);

impl RunningStatus {
    /// Latch a channel status or clear for any System Common status.
    pub(super) fn update(&mut self, status: StatusByte) {
        if status.is_channel() {
            self.0 = Some(status);
        } else {
            debug_assert!(!status.is_realtime());
            self.clear();
        }
    }

    pub(super) fn clear(&mut self) {
        self.0 = None;
    }

    #[must_use]
    pub(super) const fn get(self) -> Option<StatusByte> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(byte: u8) -> StatusByte {
        StatusByte::new(byte).unwrap()
    }

    #[test]
    fn latch_channel_status() {
        let mut running_status = RunningStatus::default();
        assert_eq!(None, running_status.get());
        running_status.update(status(0x91));
        assert_eq!(Some(status(0x91)), running_status.get());
        running_status.update(status(0xb2));
        assert_eq!(Some(status(0xb2)), running_status.get());
    }

    #[test]
    fn system_common_clears() {
        let mut running_status = RunningStatus::default();
        running_status.update(status(0x91));
        running_status.update(status(0xf3));
        assert_eq!(None, running_status.get());
        running_status.update(status(0x80));
        running_status.update(status(0xf5));
        assert_eq!(None, running_status.get());
    }
}
