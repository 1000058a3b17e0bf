use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Optional narrowing conditions on a sponsorship, checked in
/// `get_active_sponsorship_for` alongside the unconditional rules.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Empty means any contract is allowed.
    pub whitelisted_contracts: Vec<Address>,
    /// Zero means no cap on `tx_value`.
    pub max_tx_value: u128,
    /// Zero means no daily cap.
    pub daily_gas_limit: u64,
}

/// A sponsor's promise to pay transaction fees for a beneficiary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sponsorship {
    pub id: [u8; 32],
    pub sponsor: Address,
    pub beneficiary: Address,
    pub max_gas_per_tx: u64,
    pub total_gas_budget: u64,
    pub expiration_height: u64,
    pub is_active: bool,
    pub gas_used: u64,
    pub transaction_count: u64,
    pub conditions: Option<Conditions>,
    pub creation_height: u64,
}

impl Sponsorship {
    pub fn remaining_budget(&self) -> u64 {
        self.total_gas_budget
    }
}

/// Gas consumed under one sponsorship on one calendar day.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DailyUsage {
    pub gas_used: u64,
}

/// Beneficiary → ids, in creation order. First-match wins on selection.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BeneficiaryIndex {
    pub ids: Vec<[u8; 32]>,
}

#[derive(Clone, Debug)]
pub enum SponsorshipEvent {
    Created {
        id: [u8; 32],
        sponsor: Address,
        beneficiary: Address,
        budget: u64,
    },
    Used {
        id: [u8; 32],
        beneficiary: Address,
        gas_used: u64,
    },
    Cancelled {
        id: [u8; 32],
        refund: u64,
    },
}
