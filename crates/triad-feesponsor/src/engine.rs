//! Fee Sponsorship Engine. All operations are deterministic and
//! meant to run inside a host transaction context; rejection of a candidate
//! sponsorship during selection is never an error — see
//! `get_active_sponsorship_for`.

use alloy_primitives::Address;
use triad_core::{day_epoch, TriadError, Timestamp};
use triad_crypto::keccak256_concat;
use triad_state::StateDb;

use crate::types::{BeneficiaryIndex, Conditions, DailyUsage, Sponsorship, SponsorshipEvent};

fn address_bytes(addr: Address) -> [u8; 20] {
    addr.into_array()
}

fn sponsorship_id(sponsor: Address, beneficiary: Address, creation_height: u64) -> [u8; 32] {
    keccak256_concat(&[
        sponsor.as_slice(),
        beneficiary.as_slice(),
        &creation_height.to_be_bytes(),
    ])
}

/// Create a new sponsorship. Errors on zero addresses, zero limits, or an
/// expiration height that is not strictly in the future.
pub fn create_sponsorship(
    db: &StateDb,
    sponsor: Address,
    beneficiary: Address,
    max_gas_per_tx: u64,
    total_gas_budget: u64,
    expiration_height: u64,
    conditions: Option<Conditions>,
    current_height: u64,
) -> Result<([u8; 32], SponsorshipEvent), TriadError> {
    if sponsor.is_zero() || beneficiary.is_zero() {
        return Err(TriadError::ZeroAddress);
    }
    if max_gas_per_tx == 0 || total_gas_budget == 0 {
        return Err(TriadError::ZeroAmount);
    }
    if expiration_height <= current_height {
        return Err(TriadError::ExpirationNotInFuture);
    }

    let id = sponsorship_id(sponsor, beneficiary, current_height);
    let sponsorship = Sponsorship {
        id,
        sponsor,
        beneficiary,
        max_gas_per_tx,
        total_gas_budget,
        expiration_height,
        is_active: true,
        gas_used: 0,
        transaction_count: 0,
        conditions,
        creation_height: current_height,
    };
    db.put_sponsorship(&id, &sponsorship)?;

    let key = address_bytes(beneficiary);
    let mut index: BeneficiaryIndex = db.get_sponsorship_index(&key)?.unwrap_or_default();
    index.ids.push(id);
    db.put_sponsorship_index(&key, &index)?;

    tracing::info!(id = %hex::encode(id), %sponsor, %beneficiary, "sponsorship created");
    Ok((
        id,
        SponsorshipEvent::Created {
            id,
            sponsor,
            beneficiary,
            budget: total_gas_budget,
        },
    ))
}

/// Candidate validation performed by `get_active_sponsorship_for`, applied
/// in spec order. Returns `true` iff every rule passes.
fn candidate_passes(
    db: &StateDb,
    s: &Sponsorship,
    gas_limit: u64,
    target_contract: Option<Address>,
    tx_value: Option<u128>,
    current_height: u64,
    current_base_fee: u128,
    now: Timestamp,
    sponsor_balance: &dyn Fn(Address) -> u128,
) -> Result<bool, TriadError> {
    if !s.is_active {
        return Ok(false);
    }
    if current_height >= s.expiration_height {
        return Ok(false);
    }
    if gas_limit > s.max_gas_per_tx {
        return Ok(false);
    }
    if s.total_gas_budget < gas_limit {
        return Ok(false);
    }
    if sponsor_balance(s.sponsor) < (gas_limit as u128) * current_base_fee {
        return Ok(false);
    }
    if let Some(conditions) = &s.conditions {
        if let Some(target) = target_contract {
            if !conditions.whitelisted_contracts.is_empty()
                && !conditions.whitelisted_contracts.contains(&target)
            {
                return Ok(false);
            }
        }
        if let Some(value) = tx_value {
            if conditions.max_tx_value > 0 && value > conditions.max_tx_value {
                return Ok(false);
            }
        }
        if conditions.daily_gas_limit > 0 {
            let day = day_epoch(now);
            let usage: DailyUsage = db.get_daily_usage(&s.id, day)?.unwrap_or_default();
            if usage.gas_used >= conditions.daily_gas_limit {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// Select the first sponsorship in `beneficiary`'s index that passes every
/// condition. Rejection of any single candidate is not an error; the caller
/// falls back to charging the beneficiary directly.
#[allow(clippy::too_many_arguments)]
pub fn get_active_sponsorship_for(
    db: &StateDb,
    beneficiary: Address,
    gas_limit: u64,
    target_contract: Option<Address>,
    tx_value: Option<u128>,
    current_height: u64,
    current_base_fee: u128,
    now: Timestamp,
    sponsor_balance: &dyn Fn(Address) -> u128,
) -> Result<Option<Sponsorship>, TriadError> {
    let key = address_bytes(beneficiary);
    let index: BeneficiaryIndex = db.get_sponsorship_index(&key)?.unwrap_or_default();
    for id in &index.ids {
        let Some(s) = db.get_sponsorship::<Sponsorship>(id)? else {
            continue;
        };
        if candidate_passes(
            db,
            &s,
            gas_limit,
            target_contract,
            tx_value,
            current_height,
            current_base_fee,
            now,
            sponsor_balance,
        )? {
            return Ok(Some(s));
        }
    }
    Ok(None)
}

/// Record `gas_used` against a sponsorship: deduct from budget (saturating,
/// deactivating on exhaustion), bump counters, and roll today's usage.
pub fn use_sponsorship(
    db: &StateDb,
    id: &[u8; 32],
    gas_used: u64,
    now: Timestamp,
) -> Result<SponsorshipEvent, TriadError> {
    let mut s: Sponsorship = db
        .get_sponsorship(id)?
        .ok_or_else(|| TriadError::UnknownSponsorship(hex::encode(id)))?;

    s.total_gas_budget = s.total_gas_budget.saturating_sub(gas_used);
    if s.total_gas_budget == 0 {
        s.is_active = false;
    }
    s.gas_used += gas_used;
    s.transaction_count += 1;

    if let Some(conditions) = &s.conditions {
        if conditions.daily_gas_limit > 0 {
            let day = day_epoch(now);
            let mut usage: DailyUsage = db.get_daily_usage(id, day)?.unwrap_or_default();
            usage.gas_used += gas_used;
            db.put_daily_usage(id, day, &usage)?;
        }
    }

    let beneficiary = s.beneficiary;
    db.put_sponsorship(id, &s)?;

    Ok(SponsorshipEvent::Used {
        id: *id,
        beneficiary,
        gas_used,
    })
}

/// Cancel a sponsorship. Only the sponsor may do this.
pub fn cancel_sponsorship(
    db: &StateDb,
    id: &[u8; 32],
    caller: Address,
) -> Result<(Address, u64), TriadError> {
    let mut s: Sponsorship = db
        .get_sponsorship(id)?
        .ok_or_else(|| TriadError::UnknownSponsorship(hex::encode(id)))?;
    if caller != s.sponsor {
        return Err(TriadError::NotSponsor);
    }

    let refund = s.total_gas_budget;
    s.is_active = false;
    s.total_gas_budget = 0;
    let sponsor = s.sponsor;
    let beneficiary = s.beneficiary;
    db.put_sponsorship(id, &s)?;

    let key = address_bytes(beneficiary);
    if let Some(mut index) = db.get_sponsorship_index::<BeneficiaryIndex>(&key)? {
        index.ids.retain(|existing| existing != id);
        db.put_sponsorship_index(&key, &index)?;
    }

    Ok((sponsor, refund))
}

pub fn get_sponsorship(db: &StateDb, id: &[u8; 32]) -> Result<Option<Sponsorship>, TriadError> {
    db.get_sponsorship(id)
}

pub fn get_sponsorships_for(db: &StateDb, beneficiary: Address) -> Result<Vec<Sponsorship>, TriadError> {
    let key = address_bytes(beneficiary);
    let index: BeneficiaryIndex = db.get_sponsorship_index(&key)?.unwrap_or_default();
    let mut out = Vec::with_capacity(index.ids.len());
    for id in &index.ids {
        if let Some(s) = db.get_sponsorship(id)? {
            out.push(s);
        }
    }
    Ok(out)
}

pub fn has_active_sponsorship_for(db: &StateDb, beneficiary: Address) -> Result<bool, TriadError> {
    Ok(get_sponsorships_for(db, beneficiary)?.iter().any(|s| s.is_active))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> StateDb {
        let dir = std::env::temp_dir().join(format!("triad_feesponsor_test_{}", name));
        let _ = std::fs::remove_dir_all(&dir);
        StateDb::open(&dir).expect("open temp db")
    }

    fn no_balance_cap(_: Address) -> u128 {
        u128::MAX
    }

    #[test]
    fn create_rejects_zero_address() {
        let db = temp_db("zero_addr");
        let err = create_sponsorship(
            &db,
            Address::ZERO,
            Address::repeat_byte(2),
            1000,
            10_000,
            100,
            None,
            1,
        )
        .unwrap_err();
        assert!(matches!(err, TriadError::ZeroAddress));
    }

    #[test]
    fn create_rejects_expiration_not_in_future() {
        let db = temp_db("expiration");
        let err = create_sponsorship(
            &db,
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            1000,
            10_000,
            5,
            None,
            10,
        )
        .unwrap_err();
        assert!(matches!(err, TriadError::ExpirationNotInFuture));
    }

    #[test]
    fn active_sponsorship_selected_and_used() {
        let db = temp_db("select_and_use");
        let sponsor = Address::repeat_byte(1);
        let beneficiary = Address::repeat_byte(2);
        let (id, _) = create_sponsorship(&db, sponsor, beneficiary, 1000, 10_000, 100, None, 1).unwrap();

        let found = get_active_sponsorship_for(
            &db, beneficiary, 500, None, None, 2, 1, 1_700_000_000, &no_balance_cap,
        )
        .unwrap();
        assert_eq!(found.unwrap().id, id);

        use_sponsorship(&db, &id, 500, 1_700_000_000).unwrap();
        let s = get_sponsorship(&db, &id).unwrap().unwrap();
        assert_eq!(s.total_gas_budget, 9_500);
        assert_eq!(s.gas_used, 500);
        assert_eq!(s.transaction_count, 1);
    }

    #[test]
    fn budget_exhaustion_deactivates() {
        let db = temp_db("exhaustion");
        let sponsor = Address::repeat_byte(1);
        let beneficiary = Address::repeat_byte(2);
        let (id, _) = create_sponsorship(&db, sponsor, beneficiary, 1000, 1000, 100, None, 1).unwrap();
        use_sponsorship(&db, &id, 1000, 1_700_000_000).unwrap();
        let s = get_sponsorship(&db, &id).unwrap().unwrap();
        assert_eq!(s.total_gas_budget, 0);
        assert!(!s.is_active);
    }

    #[test]
    fn rejection_is_silent_not_error() {
        let db = temp_db("silent_reject");
        let sponsor = Address::repeat_byte(1);
        let beneficiary = Address::repeat_byte(2);
        create_sponsorship(&db, sponsor, beneficiary, 100, 10_000, 100, None, 1).unwrap();

        // gas_limit exceeds max_gas_per_tx: candidate is skipped, not an error.
        let found = get_active_sponsorship_for(
            &db, beneficiary, 5_000, None, None, 2, 1, 1_700_000_000, &no_balance_cap,
        )
        .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn only_sponsor_may_cancel() {
        let db = temp_db("cancel_auth");
        let sponsor = Address::repeat_byte(1);
        let beneficiary = Address::repeat_byte(2);
        let (id, _) = create_sponsorship(&db, sponsor, beneficiary, 1000, 10_000, 100, None, 1).unwrap();
        let err = cancel_sponsorship(&db, &id, beneficiary).unwrap_err();
        assert!(matches!(err, TriadError::NotSponsor));

        let (returned_sponsor, refund) = cancel_sponsorship(&db, &id, sponsor).unwrap();
        assert_eq!(returned_sponsor, sponsor);
        assert_eq!(refund, 10_000);
        let s = get_sponsorship(&db, &id).unwrap().unwrap();
        assert!(!s.is_active);
        assert_eq!(s.total_gas_budget, 0);
        assert!(get_sponsorships_for(&db, beneficiary).unwrap().is_empty());
    }

    #[test]
    fn daily_gas_limit_blocks_once_exhausted() {
        let db = temp_db("daily_limit");
        let sponsor = Address::repeat_byte(1);
        let beneficiary = Address::repeat_byte(2);
        let conditions = Conditions {
            whitelisted_contracts: vec![],
            max_tx_value: 0,
            daily_gas_limit: 100,
        };
        let (id, _) =
            create_sponsorship(&db, sponsor, beneficiary, 1000, 10_000, 100, Some(conditions), 1).unwrap();

        let now = 1_700_000_000;
        let found = get_active_sponsorship_for(&db, beneficiary, 100, None, None, 2, 1, now, &no_balance_cap).unwrap();
        assert!(found.is_some());

        use_sponsorship(&db, &id, 100, now).unwrap();

        let found_again = get_active_sponsorship_for(&db, beneficiary, 1, None, None, 2, 1, now, &no_balance_cap).unwrap();
        assert!(found_again.is_none());
    }
}
