// ── Frame bounds ──
//
// Length checks run in a fixed order: address short, address long,
// payload short, payload long. The first failing check names the reason.

use crate::model::InboundFrame;

use super::Rejection;

pub const ADDRESS_LENGTH_MIN: usize = 1;
pub const ADDRESS_LENGTH_MAX: usize = 15;
pub const MESSAGE_LENGTH_MIN: usize = 3;
pub const MESSAGE_LENGTH_MAX: usize = 128;

/// Acceptance window for frame lengths.
///
/// Deployed nodes send addresses up to the message maximum, so by
/// default the long-address check uses `message_max`. Setting
/// `strict_address_length` applies `address_max` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBounds {
    pub address_min: usize,
    pub address_max: usize,
    pub message_min: usize,
    pub message_max: usize,
    pub strict_address_length: bool,
}

impl Default for FrameBounds {
    fn default() -> Self {
        Self {
            address_min: ADDRESS_LENGTH_MIN,
            address_max: ADDRESS_LENGTH_MAX,
            message_min: MESSAGE_LENGTH_MIN,
            message_max: MESSAGE_LENGTH_MAX,
            strict_address_length: false,
        }
    }
}

impl FrameBounds {
    pub fn strict() -> Self {
        Self {
            strict_address_length: true,
            ..Self::default()
        }
    }

    /// Upper bound the address length is actually checked against.
    pub fn effective_address_max(&self) -> usize {
        if self.strict_address_length {
            self.address_max
        } else {
            self.message_max
        }
    }
}

/// Check a frame's address and payload lengths.
pub fn validate(frame: &InboundFrame, bounds: &FrameBounds) -> Result<(), Rejection> {
    let address_len = frame.address.len();
    let message_len = frame.data.len();

    if address_len < bounds.address_min {
        return Err(Rejection::AddressTooShort);
    }
    if address_len > bounds.effective_address_max() {
        return Err(Rejection::AddressTooLong);
    }
    if message_len < bounds.message_min {
        return Err(Rejection::PayloadTooShort);
    }
    if message_len > bounds.message_max {
        return Err(Rejection::PayloadTooLong);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LinkQuality;

    fn frame(address_len: usize, data_len: usize) -> InboundFrame {
        InboundFrame::new(vec![b'a'; address_len], vec![b'x'; data_len], LinkQuality::default())
    }

    #[test]
    fn accepts_lengths_inside_bounds() {
        let bounds = FrameBounds::default();
        for (a, d) in [(1, 3), (15, 128), (8, 64)] {
            assert_eq!(validate(&frame(a, d), &bounds), Ok(()), "address {a}, data {d}");
        }
    }

    #[test]
    fn payload_bounds_are_enforced() {
        let bounds = FrameBounds::default();
        assert_eq!(validate(&frame(4, 0), &bounds), Err(Rejection::PayloadTooShort));
        assert_eq!(validate(&frame(4, 2), &bounds), Err(Rejection::PayloadTooShort));
        assert_eq!(validate(&frame(4, 129), &bounds), Err(Rejection::PayloadTooLong));
    }

    #[test]
    fn empty_address_is_too_short() {
        assert_eq!(
            validate(&frame(0, 10), &FrameBounds::default()),
            Err(Rejection::AddressTooShort)
        );
    }

    #[test]
    fn long_address_is_checked_against_message_max_by_default() {
        let bounds = FrameBounds::default();
        assert_eq!(validate(&frame(16, 10), &bounds), Ok(()));
        assert_eq!(validate(&frame(128, 10), &bounds), Ok(()));
        assert_eq!(validate(&frame(129, 10), &bounds), Err(Rejection::AddressTooLong));
    }

    #[test]
    fn strict_bounds_reject_sixteen_byte_address() {
        let bounds = FrameBounds::strict();
        assert_eq!(validate(&frame(15, 10), &bounds), Ok(()));
        assert_eq!(validate(&frame(16, 10), &bounds), Err(Rejection::AddressTooLong));
    }

    #[test]
    fn address_checks_run_before_payload_checks() {
        assert_eq!(
            validate(&frame(0, 0), &FrameBounds::default()),
            Err(Rejection::AddressTooShort)
        );
        assert_eq!(
            validate(&frame(16, 500), &FrameBounds::strict()),
            Err(Rejection::AddressTooLong)
        );
    }
}
