//! ABI method dispatch: one `dispatch_*` function per contract, matching
//! on the 4-byte selector and delegating into the corresponding
//! engine. Mirrors the `execute(input, ...) -> PrecompileOutput` shape used
//! by EVM-precompile crates, generalized away from any particular host-chain
//! trait — this workspace has no `fp_evm`/Substrate dependency to implement
//! against, but the output carries return data *and* logs the same way.

use alloy_primitives::{Address, Bytes, LogData, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use triad_core::{TriadError, DEFAULT_CANCEL_FEE_BPS};
use triad_ridehail::hooks::NoopSlashingHook;
use triad_state::StateDb;

use crate::abi::{EnvelopeValidator, FeeSponsor, KeyRegistry, RideHail};
use crate::events;

/// Result of dispatching one precompile call: the ABI return data plus any
/// logs the host should emit against this precompile's address.
#[derive(Debug, Default)]
pub struct PrecompileOutput {
    pub output: Bytes,
    pub logs: Vec<LogData>,
}

impl PrecompileOutput {
    fn data(output: Bytes) -> Self {
        Self { output, logs: Vec::new() }
    }

    fn empty() -> Self {
        Self { output: Bytes::new(), logs: Vec::new() }
    }

    fn with_log(mut self, log: LogData) -> Self {
        self.logs.push(log);
        self
    }
}

fn selector(calldata: &[u8]) -> Result<[u8; 4], TriadError> {
    calldata
        .get(..4)
        .map(|s| [s[0], s[1], s[2], s[3]])
        .ok_or_else(|| TriadError::Other("calldata shorter than a selector".into()))
}

fn decode_err(e: impl std::fmt::Display) -> TriadError {
    TriadError::Other(format!("abi decode: {e}"))
}

// ── RideHail ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn dispatch_ridehail(
    db: &StateDb,
    caller: Address,
    value: u128,
    now: i64,
    calldata: &[u8],
) -> Result<PrecompileOutput, TriadError> {
    use RideHail::*;

    match selector(calldata)? {
        s if s == nextRequestIdCall::SELECTOR => {
            nextRequestIdCall::abi_decode(calldata, true).map_err(decode_err)?;
            let id = db.peek_counter("request_seq")?;
            Ok(PrecompileOutput::data(U256::from(id).abi_encode().into()))
        }
        s if s == nextSessionIdCall::SELECTOR => {
            nextSessionIdCall::abi_decode(calldata, true).map_err(decode_err)?;
            let id = db.peek_counter("session_seq")?;
            Ok(PrecompileOutput::data(U256::from(id).abi_encode().into()))
        }
        s if s == versionCall::SELECTOR => Ok(PrecompileOutput::data(U256::from(1u8).abi_encode().into())),
        s if s == validateCreateRequestCall::SELECTOR => {
            validateCreateRequestCall::abi_decode(calldata, true).map_err(decode_err)?;
            // Pure sanity check ahead of `createRequest`; the deposit itself
            // is validated against `msg.value` only at call time.
            let ret: (bool, String) = if value < triad_core::MIN_RIDER_DEPOSIT_WEI {
                (false, "rider_deposit below minimum".to_string())
            } else {
                (true, String::new())
            };
            Ok(PrecompileOutput::data(ret.abi_encode().into()))
        }
        s if s == requestsCall::SELECTOR => {
            let call = requestsCall::abi_decode(calldata, true).map_err(decode_err)?;
            let request_id: u64 = call.requestId.try_into().map_err(|_| TriadError::Other("requestId overflow".into()))?;
            let ret = match db.get_request::<triad_ridehail::PendingRequest>(request_id)? {
                Some(r) => requestsReturn {
                    requestId: U256::from(r.request_id),
                    rider: r.rider,
                    cellTopic: B256::from(r.cell_topic),
                    regionTopic: B256::from(r.region_topic),
                    paramsHash: B256::from(r.params_hash),
                    pickupCommit: B256::from(r.pickup_commit),
                    dropoffCommit: B256::from(r.dropoff_commit),
                    maxDriverEta: r.max_driver_eta,
                    createdAt: r.created_at as u64,
                    commitEnd: r.commit_end as u64,
                    revealEnd: r.reveal_end as u64,
                    expiresAt: r.expires_at as u64,
                    riderDeposit: U256::from(r.rider_deposit),
                    matched: r.matched,
                    sessionId: U256::ZERO,
                    exists: true,
                },
                None => requestsReturn {
                    requestId: U256::from(request_id),
                    rider: Address::ZERO,
                    cellTopic: B256::ZERO,
                    regionTopic: B256::ZERO,
                    paramsHash: B256::ZERO,
                    pickupCommit: B256::ZERO,
                    dropoffCommit: B256::ZERO,
                    maxDriverEta: 0,
                    createdAt: 0,
                    commitEnd: 0,
                    revealEnd: 0,
                    expiresAt: 0,
                    riderDeposit: U256::ZERO,
                    matched: false,
                    sessionId: U256::ZERO,
                    exists: false,
                },
            };
            Ok(PrecompileOutput::data(ret.abi_encode().into()))
        }
        s if s == createRequestCall::SELECTOR => {
            let call = createRequestCall::abi_decode(calldata, true).map_err(decode_err)?;
            let (request_id, event) = triad_ridehail::create_request(
                db,
                caller,
                call.cellTopic.0,
                call.regionTopic.0,
                call.paramsHash.0,
                call.pickupCommit.0,
                call.dropoffCommit.0,
                call.maxDriverEta,
                call.ttl,
                value,
                now,
            )?;
            tracing::info!(request_id, "ridehail_request_created");
            let out = PrecompileOutput::data(U256::from(request_id).abi_encode().into());
            Ok(match events::ridehail_log(&event) {
                Some(log) => out.with_log(log),
                None => out,
            })
        }
        s if s == acceptCommitCall::SELECTOR => {
            let call = acceptCommitCall::abi_decode(calldata, true).map_err(decode_err)?;
            let request_id: u64 = call.requestId.try_into().map_err(|_| TriadError::Other("requestId overflow".into()))?;
            let event = triad_ridehail::accept_commit(db, caller, request_id, call.commitHash.0, call.eta, value, now)?;
            tracing::info!(request_id, "driver_commit_submitted");
            let out = PrecompileOutput::empty();
            Ok(match events::ridehail_log(&event) {
                Some(log) => out.with_log(log),
                None => out,
            })
        }
        s if s == acceptRevealCall::SELECTOR => {
            let call = acceptRevealCall::abi_decode(calldata, true).map_err(decode_err)?;
            let request_id: u64 = call.requestId.try_into().map_err(|_| TriadError::Other("requestId overflow".into()))?;
            let events = triad_ridehail::accept_reveal(db, caller, request_id, call.eta, call.driverCell.0, call.salt.0, now)?;
            if events.iter().any(|e| matches!(e, triad_ridehail::RideHailEvent::Matched { .. })) {
                tracing::info!(request_id, "ridehail_match");
            }
            let mut out = PrecompileOutput::empty();
            for event in &events {
                if let Some(log) = events::ridehail_log(event) {
                    out = out.with_log(log);
                }
            }
            Ok(out)
        }
        s if s == updateCoarseLocationCall::SELECTOR => {
            let call = updateCoarseLocationCall::abi_decode(calldata, true).map_err(decode_err)?;
            let session_id: u64 = call.sessionId.try_into().map_err(|_| TriadError::Other("sessionId overflow".into()))?;
            let event = triad_ridehail::update_coarse_location(db, session_id, caller, call.cell.0, now)?;
            let out = PrecompileOutput::empty();
            Ok(match events::ridehail_log(&event) {
                Some(log) => out.with_log(log),
                None => out,
            })
        }
        s if s == postEncryptedMessageCall::SELECTOR => {
            let call = postEncryptedMessageCall::abi_decode(calldata, true).map_err(decode_err)?;
            let session_id: u64 = call.sessionId.try_into().map_err(|_| TriadError::Other("sessionId overflow".into()))?;
            let event = triad_ridehail::post_encrypted_message(
                db,
                session_id,
                caller,
                call.msgIndex as u64,
                call.header.to_vec(),
                call.ciphertext.to_vec(),
                value,
                now,
            )?;
            let out = PrecompileOutput::empty();
            Ok(match events::ridehail_log(&event) {
                Some(log) => out.with_log(log),
                None => out,
            })
        }
        _ => Err(TriadError::Other("unknown RideHail selector".into())),
    }
}

/// Run the block-driven matching pass and sweep expired commits the
/// unrevealed-bond-claim path would otherwise need to be called for
/// individually. Not part of the ABI surface — invoked by the node's
/// begin-block hook.
pub fn run_matching_block(db: &StateDb, now: i64) -> Result<Vec<triad_ridehail::RideHailEvent>, TriadError> {
    let events = triad_ridehail::run_matching_block(db, now)?;
    for event in &events {
        if matches!(event, triad_ridehail::RideHailEvent::RequestExpired { .. }) {
            tracing::info!(?event, "ridehail_request_expired");
        }
    }
    Ok(events)
}

pub fn claim_unrevealed_bond(db: &StateDb, request_id: u64, driver: Address, now: i64) -> Result<PrecompileOutput, TriadError> {
    triad_ridehail::claim_unrevealed_bond(db, request_id, driver, now, &NoopSlashingHook)?;
    Ok(PrecompileOutput::empty())
}

pub fn cancel_session(db: &StateDb, session_id: u64, caller: Address, now: i64) -> Result<PrecompileOutput, TriadError> {
    triad_ridehail::cancel_session(db, session_id, caller, now, DEFAULT_CANCEL_FEE_BPS, &NoopSlashingHook)?;
    Ok(PrecompileOutput::empty())
}

// ── KeyRegistry ───────────────────────────────────────────────────────────────

pub fn dispatch_keyregistry(db: &StateDb, caller: Address, now: i64, calldata: &[u8]) -> Result<PrecompileOutput, TriadError> {
    use KeyRegistry::*;

    match selector(calldata)? {
        s if s == publishKeysV2Call::SELECTOR => {
            let call = publishKeysV2Call::abi_decode(calldata, true).map_err(decode_err)?;
            let mut signature = [0u8; 64];
            let sig_bytes = call.signature.as_ref();
            let len = sig_bytes.len().min(64);
            signature[..len].copy_from_slice(&sig_bytes[..len]);
            let registry = triad_keyregistry::KeyRegistry::new(db);
            registry.publish_bundle(
                caller,
                call.identityX25519Pub.0,
                call.identityEd25519Pub.0,
                call.signedPrekeyPub.0,
                signature,
                call.expiresAt as i64,
                now,
            )?;
            Ok(PrecompileOutput::empty())
        }
        s if s == getKeysCall::SELECTOR => {
            let call = getKeysCall::abi_decode(calldata, true).map_err(decode_err)?;
            let registry = triad_keyregistry::KeyRegistry::new(db);
            let bundle = registry.get_bundle(call.owner)?;
            let ret = match bundle {
                Some(b) => getKeysReturn {
                    identityX25519Pub: B256::from(b.identity_x25519_pub),
                    identityEd25519Pub: B256::from(b.identity_ed25519_pub),
                    signedPrekeyPub: B256::from(b.signed_prekey_pub),
                    signature: b.signature.to_vec().into(),
                    expiresAt: b.expires_at as u64,
                    exists: true,
                },
                None => getKeysReturn {
                    identityX25519Pub: B256::ZERO,
                    identityEd25519Pub: B256::ZERO,
                    signedPrekeyPub: B256::ZERO,
                    signature: Bytes::new(),
                    expiresAt: 0,
                    exists: false,
                },
            };
            Ok(PrecompileOutput::data(ret.abi_encode().into()))
        }
        _ => Err(TriadError::Other("unknown KeyRegistry selector".into())),
    }
}

// ── FeeSponsor ────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn dispatch_feesponsor(
    db: &StateDb,
    caller: Address,
    current_height: u64,
    current_base_fee: u128,
    now: i64,
    calldata: &[u8],
    sponsor_balance: &dyn Fn(Address) -> u128,
) -> Result<PrecompileOutput, TriadError> {
    use FeeSponsor::*;

    match selector(calldata)? {
        s if s == createSponsorshipCall::SELECTOR => {
            let call = createSponsorshipCall::abi_decode(calldata, true).map_err(decode_err)?;
            let (id, event) = triad_feesponsor::create_sponsorship(
                db,
                caller,
                call.beneficiary,
                call.maxGasPerTx,
                call.totalGasBudget,
                call.expirationHeight,
                None,
                current_height,
            )?;
            let log = events::sponsorship_log(&event);
            Ok(PrecompileOutput::data(B256::from(id).abi_encode().into()).with_log(log))
        }
        s if s == createSponsorshipWithConditionsCall::SELECTOR => {
            let call = createSponsorshipWithConditionsCall::abi_decode(calldata, true).map_err(decode_err)?;
            let conditions = triad_feesponsor::Conditions {
                whitelisted_contracts: call.whitelistedContracts.clone(),
                max_tx_value: call.maxTxValue,
                daily_gas_limit: call.dailyGasLimit,
            };
            let (id, event) = triad_feesponsor::create_sponsorship(
                db,
                caller,
                call.beneficiary,
                call.maxGasPerTx,
                call.totalGasBudget,
                call.expirationHeight,
                Some(conditions),
                current_height,
            )?;
            let log = events::sponsorship_log(&event);
            Ok(PrecompileOutput::data(B256::from(id).abi_encode().into()).with_log(log))
        }
        s if s == cancelSponsorshipCall::SELECTOR => {
            let call = cancelSponsorshipCall::abi_decode(calldata, true).map_err(decode_err)?;
            let (_, refund) = triad_feesponsor::cancel_sponsorship(db, &call.id.0, caller)?;
            let event = triad_feesponsor::SponsorshipEvent::Cancelled { id: call.id.0, refund };
            let log = events::sponsorship_log(&event);
            Ok(PrecompileOutput::empty().with_log(log))
        }
        s if s == getSponsorshipCall::SELECTOR => {
            let call = getSponsorshipCall::abi_decode(calldata, true).map_err(decode_err)?;
            let ret = match triad_feesponsor::get_sponsorship(db, &call.id.0)? {
                Some(sp) => getSponsorshipReturn {
                    sponsor: sp.sponsor,
                    beneficiary: sp.beneficiary,
                    maxGasPerTx: sp.max_gas_per_tx,
                    totalGasBudget: sp.total_gas_budget,
                    expirationHeight: sp.expiration_height,
                    isActive: sp.is_active,
                    gasUsed: sp.gas_used,
                    transactionCount: sp.transaction_count,
                    exists: true,
                },
                None => getSponsorshipReturn {
                    sponsor: Address::ZERO,
                    beneficiary: Address::ZERO,
                    maxGasPerTx: 0,
                    totalGasBudget: 0,
                    expirationHeight: 0,
                    isActive: false,
                    gasUsed: 0,
                    transactionCount: 0,
                    exists: false,
                },
            };
            Ok(PrecompileOutput::data(ret.abi_encode().into()))
        }
        s if s == getSponsorshipsForCall::SELECTOR => {
            let call = getSponsorshipsForCall::abi_decode(calldata, true).map_err(decode_err)?;
            let ids: Vec<B256> = triad_feesponsor::get_sponsorships_for(db, call.beneficiary)?
                .into_iter()
                .map(|s| B256::from(s.id))
                .collect();
            Ok(PrecompileOutput::data(ids.abi_encode().into()))
        }
        s if s == isSponsoredCall::SELECTOR => {
            let call = isSponsoredCall::abi_decode(calldata, true).map_err(decode_err)?;
            let target = if call.targetContract.is_zero() { None } else { Some(call.targetContract) };
            let tx_value = if call.txValue.is_zero() { None } else { Some(call.txValue.to::<u128>()) };
            let found = triad_feesponsor::get_active_sponsorship_for(
                db,
                call.beneficiary,
                call.gasLimit,
                target,
                tx_value,
                current_height,
                current_base_fee,
                now,
                sponsor_balance,
            )?;
            Ok(PrecompileOutput::data(found.is_some().abi_encode().into()))
        }
        _ => Err(TriadError::Other("unknown FeeSponsor selector".into())),
    }
}

// ── EnvelopeValidator ─────────────────────────────────────────────────────────

pub fn dispatch_envelope_validator(calldata: &[u8]) -> Result<PrecompileOutput, TriadError> {
    use EnvelopeValidator::*;

    match selector(calldata)? {
        s if s == validateEnvelopeCall::SELECTOR => {
            let call = validateEnvelopeCall::abi_decode(calldata, true).map_err(decode_err)?;
            let outcome = triad_envelope::validate_envelope(
                &call.header,
                &call.ciphertext,
                call.maxHeaderBytes,
                call.maxCiphertextBytes,
            );
            let ret = validateEnvelopeReturn {
                valid: outcome.valid,
                envelopeHash: B256::from(outcome.envelope_hash),
                version: outcome.version,
                dhPub: B256::from(outcome.dh_pub),
                pn: outcome.pn,
                n: outcome.n,
                adHash: B256::from(outcome.ad_hash),
            };
            Ok(PrecompileOutput::data(ret.abi_encode().into()))
        }
        _ => Err(TriadError::Other("unknown EnvelopeValidator selector".into())),
    }
}
