//! Read-only JSON-RPC introspection surface for off-chain tooling. No
//! `tower`/`tower-http` CORS middleware layer — outbound HTTP tooling and a
//! permissive-CORS ops surface are outside this suite's scope; `jsonrpsee`
//! serves the bare `Server` builder directly.

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use serde::{Deserialize, Serialize};
use tracing::info;

use triad_feesponsor::Sponsorship;
use triad_ridehail::{PendingRequest, Session};
use triad_state::StateDb;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// JSON-serializable sponsorship summary returned by `triad_getSponsorship`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSponsorship {
    pub id: String,
    pub sponsor: String,
    pub beneficiary: String,
    pub max_gas_per_tx: u64,
    pub total_gas_budget: u64,
    pub expiration_height: u64,
    pub is_active: bool,
    pub gas_used: u64,
    pub transaction_count: u64,
}

impl From<Sponsorship> for RpcSponsorship {
    fn from(s: Sponsorship) -> Self {
        Self {
            id: hex::encode(s.id),
            sponsor: s.sponsor.to_string(),
            beneficiary: s.beneficiary.to_string(),
            max_gas_per_tx: s.max_gas_per_tx,
            total_gas_budget: s.total_gas_budget,
            expiration_height: s.expiration_height,
            is_active: s.is_active,
            gas_used: s.gas_used,
            transaction_count: s.transaction_count,
        }
    }
}

/// JSON-serializable request summary returned by `triad_getRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub request_id: u64,
    pub rider: String,
    pub max_driver_eta: u64,
    pub commit_end: i64,
    pub reveal_end: i64,
    pub expires_at: i64,
    pub matched: bool,
}

impl From<PendingRequest> for RpcRequest {
    fn from(r: PendingRequest) -> Self {
        Self {
            request_id: r.request_id,
            rider: r.rider.to_string(),
            max_driver_eta: r.max_driver_eta,
            commit_end: r.commit_end,
            reveal_end: r.reveal_end,
            expires_at: r.expires_at,
            matched: r.matched,
        }
    }
}

/// JSON-serializable session summary returned by `triad_getSession`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSession {
    pub session_id: u64,
    pub rider: String,
    pub driver: String,
    pub request_id: u64,
    pub state: String,
}

impl From<Session> for RpcSession {
    fn from(s: Session) -> Self {
        Self {
            session_id: s.session_id,
            rider: s.rider.to_string(),
            driver: s.driver.to_string(),
            request_id: s.request_id,
            state: format!("{:?}", s.state),
        }
    }
}

/// Triad JSON-RPC 2.0 API definition. All methods are prefixed with
/// "triad_" via `namespace = "triad"`.
#[rpc(server, namespace = "triad")]
pub trait TriadApi {
    /// Get a sponsorship by its hex-encoded id.
    #[method(name = "getSponsorship")]
    async fn get_sponsorship(&self, id_hex: String) -> RpcResult<Option<RpcSponsorship>>;

    /// Get all sponsorships for a beneficiary (checksummed hex address).
    #[method(name = "getSponsorshipsFor")]
    async fn get_sponsorships_for(&self, beneficiary: String) -> RpcResult<Vec<RpcSponsorship>>;

    /// Get a ride request by id.
    #[method(name = "getRequest")]
    async fn get_request(&self, request_id: u64) -> RpcResult<Option<RpcRequest>>;

    /// Get a ride session by id.
    #[method(name = "getSession")]
    async fn get_session(&self, session_id: u64) -> RpcResult<Option<RpcSession>>;

    /// Return node/protocol version information.
    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<String>;
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub db: Arc<StateDb>,
}

pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl TriadApiServer for RpcServer {
    async fn get_sponsorship(&self, id_hex: String) -> RpcResult<Option<RpcSponsorship>> {
        let bytes = hex::decode(&id_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;
        let id: [u8; 32] = bytes
            .try_into()
            .map_err(|_| rpc_err(-32602, "sponsorship id must be 32 bytes"))?;
        let found = triad_feesponsor::get_sponsorship(&self.state.db, &id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(found.map(RpcSponsorship::from))
    }

    async fn get_sponsorships_for(&self, beneficiary: String) -> RpcResult<Vec<RpcSponsorship>> {
        let addr: alloy_primitives::Address = beneficiary
            .parse()
            .map_err(|e| rpc_err(-32602, format!("invalid address: {e}")))?;
        let found = triad_feesponsor::get_sponsorships_for(&self.state.db, addr)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(found.into_iter().map(RpcSponsorship::from).collect())
    }

    async fn get_request(&self, request_id: u64) -> RpcResult<Option<RpcRequest>> {
        let found: Option<PendingRequest> = self
            .state
            .db
            .get_request(request_id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(found.map(RpcRequest::from))
    }

    async fn get_session(&self, session_id: u64) -> RpcResult<Option<RpcSession>> {
        let found: Option<Session> = self
            .state
            .db
            .get_session(session_id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        Ok(found.map(RpcSession::from))
    }

    async fn get_version(&self) -> RpcResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }
}
