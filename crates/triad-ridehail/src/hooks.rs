use alloy_primitives::Address;

/// Notified whenever a driver bond is forfeited, so a reputation or
/// governance layer outside this crate can react. The matching engine never
/// depends on a concrete implementation.
pub trait SlashingHook {
    fn on_bond_forfeited(&self, driver: Address, request_id: u64, amount: u128);
}

/// Default hook for call sites that don't wire up reputation tracking.
pub struct NoopSlashingHook;

impl SlashingHook for NoopSlashingHook {
    fn on_bond_forfeited(&self, _driver: Address, _request_id: u64, _amount: u128) {}
}
