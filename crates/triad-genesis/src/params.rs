use serde::{Deserialize, Serialize};

/// Protocol tunables a deployment may override at genesis. Every field
/// defaults to the corresponding `triad_core::constants` value when absent,
/// so an empty `{}` document is a valid genesis file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisParams {
    pub min_rider_deposit_wei: Option<u128>,
    pub min_driver_bond_wei: Option<u128>,
    pub message_bond_wei: Option<u128>,
    pub commit_duration_secs: Option<u64>,
    pub reveal_duration_secs: Option<u64>,
    pub rider_rate_limit_window_secs: Option<u64>,
    pub rider_rate_limit_max: Option<u32>,
    pub message_rate_limit_window_secs: Option<u64>,
    pub message_rate_limit_max: Option<u32>,
    pub cancel_fee_bps: Option<u32>,
    pub max_header_bytes: Option<u32>,
    pub max_ciphertext_bytes: Option<u32>,
}

/// `GenesisParams` with every field resolved against its protocol default.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ResolvedParams {
    pub min_rider_deposit_wei: u128,
    pub min_driver_bond_wei: u128,
    pub message_bond_wei: u128,
    pub commit_duration_secs: u64,
    pub reveal_duration_secs: u64,
    pub rider_rate_limit_window_secs: u64,
    pub rider_rate_limit_max: u32,
    pub message_rate_limit_window_secs: u64,
    pub message_rate_limit_max: u32,
    pub cancel_fee_bps: u32,
    pub max_header_bytes: u32,
    pub max_ciphertext_bytes: u32,
}

impl GenesisParams {
    pub fn resolve(&self) -> ResolvedParams {
        use triad_core::*;
        ResolvedParams {
            min_rider_deposit_wei: self.min_rider_deposit_wei.unwrap_or(MIN_RIDER_DEPOSIT_WEI),
            min_driver_bond_wei: self.min_driver_bond_wei.unwrap_or(MIN_DRIVER_BOND_WEI),
            message_bond_wei: self.message_bond_wei.unwrap_or(MESSAGE_BOND_WEI),
            commit_duration_secs: self.commit_duration_secs.unwrap_or(COMMIT_DURATION_SECS),
            reveal_duration_secs: self.reveal_duration_secs.unwrap_or(REVEAL_DURATION_SECS),
            rider_rate_limit_window_secs: self
                .rider_rate_limit_window_secs
                .unwrap_or(RIDER_RATE_LIMIT_WINDOW_SECS),
            rider_rate_limit_max: self.rider_rate_limit_max.unwrap_or(RIDER_RATE_LIMIT_MAX),
            message_rate_limit_window_secs: self
                .message_rate_limit_window_secs
                .unwrap_or(MESSAGE_RATE_LIMIT_WINDOW_SECS),
            message_rate_limit_max: self.message_rate_limit_max.unwrap_or(MESSAGE_RATE_LIMIT_MAX),
            cancel_fee_bps: self.cancel_fee_bps.unwrap_or(DEFAULT_CANCEL_FEE_BPS),
            max_header_bytes: self.max_header_bytes.unwrap_or(DEFAULT_MAX_HEADER_BYTES),
            max_ciphertext_bytes: self.max_ciphertext_bytes.unwrap_or(DEFAULT_MAX_CIPHERTEXT_BYTES),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_resolve_to_protocol_defaults() {
        let resolved = GenesisParams::default().resolve();
        assert_eq!(resolved.min_rider_deposit_wei, triad_core::MIN_RIDER_DEPOSIT_WEI);
        assert_eq!(resolved.cancel_fee_bps, triad_core::DEFAULT_CANCEL_FEE_BPS);
    }

    #[test]
    fn override_wins_over_default() {
        let params = GenesisParams { cancel_fee_bps: Some(250), ..Default::default() };
        assert_eq!(params.resolve().cancel_fee_bps, 250);
    }
}
