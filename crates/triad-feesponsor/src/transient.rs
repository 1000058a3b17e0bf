use alloy_primitives::Address;

/// Per-transaction slot recording which sponsorship (if any) is paying this
/// transaction's fees, so the refund path can redirect leftover gas to the
/// sponsor instead of `msg.from`. The host contract owns one instance per
/// in-flight transaction and clears it at end-of-transaction; it is never
/// persisted to the state database.
#[derive(Default)]
pub struct TransientSponsorSlot {
    active: Option<(Box<[u8; 32]>, Address)>,
}

impl TransientSponsorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, sponsorship_id: [u8; 32], sponsor: Address) {
        self.active = Some((Box::new(sponsorship_id), sponsor));
    }

    pub fn sponsor(&self) -> Option<Address> {
        self.active.as_ref().map(|(_, sponsor)| *sponsor)
    }

    pub fn sponsorship_id(&self) -> Option<[u8; 32]> {
        self.active.as_ref().map(|(id, _)| **id)
    }

    pub fn is_set(&self) -> bool {
        self.active.is_some()
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let slot = TransientSponsorSlot::new();
        assert!(!slot.is_set());
        assert_eq!(slot.sponsor(), None);
    }

    #[test]
    fn set_then_clear() {
        let mut slot = TransientSponsorSlot::new();
        let sponsor = Address::repeat_byte(0xab);
        slot.set([1u8; 32], sponsor);
        assert!(slot.is_set());
        assert_eq!(slot.sponsor(), Some(sponsor));
        slot.clear();
        assert!(!slot.is_set());
    }
}
