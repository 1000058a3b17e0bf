//! triad-genesis
//!
//! Loads the module suite's protocol tunables (deposit/bond minimums,
//! commit/reveal windows, rate limits, cancel fee, envelope size caps) at
//! node startup and records them into a fresh `StateDb` — the one and only
//! place in the protocol where these parameters are fixed for the life of
//! the chain. There is no token supply to allocate or vesting schedule to
//! time-lock here; genesis exists purely to pin down the tunables every
//! other crate otherwise reads as compile-time constants, so a deployment
//! can override them without a rebuild.

pub mod params;

pub use params::{GenesisParams, ResolvedParams};

use std::path::Path;

use tracing::{info, warn};
use triad_core::TriadError;
use triad_state::StateDb;

const GENESIS_META_KEY: &str = "genesis-params";

/// Apply genesis to an empty `StateDb`: resolve `params` against protocol
/// defaults and persist the resolved set under a fixed metadata key.
pub fn apply_genesis(db: &StateDb, params: &GenesisParams) -> Result<ResolvedParams, TriadError> {
    info!("applying triad genesis parameters");
    let resolved = params.resolve();
    let encoded = serde_json::to_vec(&resolved)
        .map_err(|e| TriadError::Serialization(e.to_string()))?;
    db.put_meta(GENESIS_META_KEY, &encoded)?;
    info!(
        min_rider_deposit_wei = resolved.min_rider_deposit_wei,
        min_driver_bond_wei = resolved.min_driver_bond_wei,
        cancel_fee_bps = resolved.cancel_fee_bps,
        "genesis parameters applied"
    );
    Ok(resolved)
}

/// Read back the genesis parameters a prior `apply_genesis` call recorded.
pub fn read_genesis_params(db: &StateDb) -> Result<Option<ResolvedParams>, TriadError> {
    let Some(bytes) = db.get_meta(GENESIS_META_KEY)? else { return Ok(None) };
    let resolved = serde_json::from_slice(&bytes).map_err(|e| TriadError::Serialization(e.to_string()))?;
    Ok(Some(resolved))
}

/// Load genesis parameters from a JSON file, or fall back to an empty
/// (all-default) `GenesisParams` if no path is given. This suite's genesis
/// has no keys to generate, so an absent `--genesis-params` path is simply
/// "use protocol defaults."
pub fn load_or_default_genesis_params(path: Option<&Path>) -> anyhow::Result<GenesisParams> {
    let Some(p) = path else {
        warn!("no --genesis-params provided, using protocol default tunables");
        return Ok(GenesisParams::default());
    };
    let json = std::fs::read_to_string(p)
        .map_err(|e| anyhow::anyhow!("reading genesis params from {}: {e}", p.display()))?;
    serde_json::from_str(&json).map_err(|e| anyhow::anyhow!("parsing genesis params JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_genesis_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    #[test]
    fn apply_then_read_round_trips() {
        let db = temp_db("round_trip");
        let params = GenesisParams { cancel_fee_bps: Some(1_000), ..Default::default() };
        let resolved = apply_genesis(&db, &params).unwrap();
        assert_eq!(resolved.cancel_fee_bps, 1_000);

        let read_back = read_genesis_params(&db).unwrap().unwrap();
        assert_eq!(read_back.cancel_fee_bps, 1_000);
        assert_eq!(read_back.min_rider_deposit_wei, triad_core::MIN_RIDER_DEPOSIT_WEI);
    }

    #[test]
    fn unset_params_read_back_as_none() {
        let db = temp_db("unset");
        assert!(read_genesis_params(&db).unwrap().is_none());
    }
}
