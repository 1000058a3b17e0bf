use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriadError {
    // ── Validation ───────────────────────────────────────────────────────────
    #[error("zero address not allowed")]
    ZeroAddress,

    #[error("zero amount not allowed")]
    ZeroAmount,

    #[error("expiration_height must be greater than current height")]
    ExpirationNotInFuture,

    #[error("deposit below minimum: need {need}, got {got}")]
    DepositTooLow { need: u128, got: u128 },

    #[error("bond below minimum: need {need}, got {got}")]
    BondTooLow { need: u128, got: u128 },

    #[error("header length invalid: expected 73, got {got}")]
    InvalidHeaderLength { got: usize },

    #[error("unsupported envelope version: {0}")]
    UnsupportedEnvelopeVersion(u8),

    // ── Authorization ────────────────────────────────────────────────────────
    #[error("caller is not the sponsor of this sponsorship")]
    NotSponsor,

    #[error("caller is not a participant in this session")]
    NotParticipant,

    #[error("caller is not the rider of this request")]
    NotRider,

    // ── Resource ─────────────────────────────────────────────────────────────
    #[error("rate limit exceeded")]
    RateLimited,

    #[error("too many skipped messages in ratchet session: max {max}")]
    TooManySkipped { max: usize },

    #[error("message index must be strictly increasing: last {last}, got {got}")]
    NonMonotonicMsgIndex { last: u64, got: u64 },

    // ── Cryptographic ────────────────────────────────────────────────────────
    #[error("signature verification failed")]
    InvalidSignature,

    #[error("AEAD decryption failed")]
    Undecryptable,

    #[error("key bundle signature verification failed")]
    BadBundle,

    #[error("commit hash mismatch")]
    CommitHashMismatch,

    // ── Bookkeeping ──────────────────────────────────────────────────────────
    #[error("unknown sponsorship: {0}")]
    UnknownSponsorship(String),

    #[error("unknown request: {0}")]
    UnknownRequest(u64),

    #[error("unknown session: {0}")]
    UnknownSession(u64),

    #[error("unknown commit for driver {0} on request {1}")]
    UnknownCommit(String, u64),

    #[error("duplicate commit by driver {0} for request {1}")]
    DuplicateCommit(String, u64),

    #[error("duplicate reveal")]
    DuplicateReveal,

    #[error("request already matched or no longer pending")]
    RequestNotPending,

    #[error("invalid session state transition")]
    InvalidSessionTransition,

    #[error("commit window has closed")]
    CommitWindowClosed,

    #[error("reveal window is not open")]
    RevealWindowNotOpen,

    #[error("reveal window has not yet elapsed")]
    RevealWindowNotElapsed,

    #[error("eta exceeds request's max_driver_eta")]
    EtaTooHigh,

    // ── Serialization / storage ──────────────────────────────────────────────
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}
