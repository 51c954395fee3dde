//! Mock chain server for local testing of confidential auctions.
//!
//! This provides a JSON-RPC server that simulates on-chain state management
//! for the auction module without requiring a real blockchain. The FHE
//! coprocessor and the payment ledger are in-memory simulators.
//!
//! Every state-changing method holds the chain's write lock for its whole
//! duration, so calls are applied one at a time in a single total order.

use anyhow::{Context, Result};
use clap::Parser;
use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::Server;
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use auction_fhe::{ConfidentialLedger, MockCoprocessor};
use auction_module::{handlers, queries, AuctionGenesisConfig, AuctionState as ModuleState, CallContext};
use auction_types::{parse_address, Address, InputCiphertext};

mod types;
use types::*;

/// Shared chain state.
struct ChainState {
    /// Module state
    module: ModuleState,
    /// Simulated FHE coprocessor
    fhe: MockCoprocessor,
    /// Confidential token balances
    ledger: ConfidentialLedger,
    /// Current block height (simulated)
    block_height: u64,
    /// Current timestamp (simulated, can be advanced)
    timestamp: u64,
}

impl ChainState {
    fn new(module: ModuleState, timestamp: u64) -> Self {
        Self {
            module,
            fhe: MockCoprocessor::new(),
            ledger: ConfidentialLedger::new(),
            block_height: 0,
            timestamp,
        }
    }

    fn advance_block(&mut self) {
        self.block_height += 1;
        self.timestamp += 12; // ~12 second blocks
    }

    fn set_timestamp(&mut self, ts: u64) {
        self.timestamp = ts;
    }

    fn context(&self, sender: Address, value: u128) -> CallContext {
        CallContext {
            sender,
            block_height: self.block_height,
            timestamp: self.timestamp,
            value,
        }
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned>;

    /// Register a confidential payment token.
    #[method(name = "admin_registerToken")]
    async fn admin_register_token(&self, token: String) -> Result<bool, ErrorObjectOwned>;

    /// Credit a confidential balance.
    #[method(name = "admin_mint")]
    async fn admin_mint(&self, params: MintParams) -> Result<bool, ErrorObjectOwned>;

    // ============ Dev Methods ============

    /// Encrypt bid inputs with the simulated coprocessor.
    #[method(name = "dev_encryptInputs")]
    async fn dev_encrypt_inputs(
        &self,
        params: EncryptInputsParams,
    ) -> Result<EncryptedInputsRpc, ErrorObjectOwned>;

    // ============ Auction Methods ============

    /// Create a new auction.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned>;

    /// Place or raise an encrypted bid.
    #[method(name = "auction_placeBid")]
    async fn auction_place_bid(
        &self,
        params: PlaceBidParams,
    ) -> Result<BidReceiptRpc, ErrorObjectOwned>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned>;

    /// List all auctions.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned>;

    /// Get auctions accepting bids at the current timestamp.
    #[method(name = "query_getActiveAuctions")]
    async fn query_get_active_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned>;

    /// Get a bidder's encrypted bid.
    #[method(name = "query_getBid")]
    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<BidRpc>, ErrorObjectOwned>;
}

/// Implementation of the mock chain RPC server.
struct MockChainServer {
    state: Arc<RwLock<ChainState>>,
}

impl MockChainServer {
    fn new(module: ModuleState, timestamp: u64) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState::new(module, timestamp))),
        }
    }

    fn rpc_error(msg: &str) -> ErrorObjectOwned {
        ErrorObjectOwned::owned(-32000, msg.to_string(), None::<()>)
    }

    fn address(field: &str, value: &str) -> Result<Address, ErrorObjectOwned> {
        parse_address(value).ok_or_else(|| Self::rpc_error(&format!("Invalid {} address", field)))
    }

    fn bytes(field: &str, value: &str) -> Result<Vec<u8>, ErrorObjectOwned> {
        hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| Self::rpc_error(&format!("Invalid {}: {}", field, e)))
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_advance_block(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.advance_block();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> Result<bool, ErrorObjectOwned> {
        let mut state = self.state.write();
        state.set_timestamp(timestamp);
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_register_token(&self, token: String) -> Result<bool, ErrorObjectOwned> {
        let token = Self::address("token", &token)?;
        let mut state = self.state.write();
        state.ledger.register_token(token);
        info!("Registered token {}", hex::encode(token));
        Ok(true)
    }

    async fn admin_mint(&self, params: MintParams) -> Result<bool, ErrorObjectOwned> {
        let token = Self::address("token", &params.token)?;
        let owner = Self::address("owner", &params.owner)?;
        let mut state = self.state.write();
        let ChainState { fhe, ledger, .. } = &mut *state;
        ledger
            .mint(fhe, token, owner, params.amount)
            .map_err(|e| Self::rpc_error(&format!("Failed to mint: {}", e)))?;
        info!("Minted {} to {}", params.amount, params.owner);
        Ok(true)
    }

    async fn dev_encrypt_inputs(
        &self,
        params: EncryptInputsParams,
    ) -> Result<EncryptedInputsRpc, ErrorObjectOwned> {
        let sender = Self::address("sender", &params.sender)?;
        let state = self.state.read();
        let (inputs, proof) =
            state
                .fhe
                .encrypt_inputs(&params.values, sender, state.module.module_address);
        Ok(EncryptedInputsRpc {
            inputs: inputs.iter().map(|input| hex::encode(&input.0)).collect(),
            proof: hex::encode(proof),
        })
    }

    async fn auction_create(&self, params: CreateAuctionParams) -> Result<u64, ErrorObjectOwned> {
        let sender = Self::address("sender", &params.sender)?;
        let asset_token = Self::address("asset token", &params.asset_token)?;
        let payment_token = Self::address("payment token", &params.payment_token)?;

        let mut state = self.state.write();
        let ctx = state.context(sender, 0);
        let auction_id = handlers::handle_create_auction(
            &mut state.module,
            &ctx,
            params.start_time,
            params.end_time,
            asset_token,
            params.asset_amount,
            payment_token,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to create auction: {}", e)))?;

        Ok(auction_id)
    }

    async fn auction_place_bid(
        &self,
        params: PlaceBidParams,
    ) -> Result<BidReceiptRpc, ErrorObjectOwned> {
        let sender = Self::address("sender", &params.sender)?;
        let encrypted_amount = InputCiphertext(Self::bytes("amount", &params.encrypted_amount)?);
        let encrypted_price = InputCiphertext(Self::bytes("price", &params.encrypted_price)?);
        let proof = Self::bytes("proof", &params.proof)?;

        let mut state = self.state.write();
        let ctx = state.context(sender, params.value);
        let ChainState {
            module,
            fhe,
            ledger,
            ..
        } = &mut *state;

        let receipt = handlers::handle_place_bid(
            module,
            &ctx,
            fhe,
            ledger,
            params.auction_id,
            &encrypted_amount,
            &encrypted_price,
            &proof,
        )
        .map_err(|e| Self::rpc_error(&format!("Failed to place bid: {}", e)))?;

        Ok(BidReceiptRpc::from(receipt))
    }

    async fn chain_get_block_info(&self) -> Result<BlockInfo, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(BlockInfo {
            height: state.block_height,
            timestamp: state.timestamp,
        })
    }

    async fn query_get_auction(
        &self,
        auction_id: u64,
    ) -> Result<Option<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state.module.get_auction(auction_id).map(AuctionRpc::from))
    }

    async fn query_list_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(state
            .module
            .auctions
            .values()
            .map(AuctionRpc::from)
            .collect())
    }

    async fn query_get_active_auctions(&self) -> Result<Vec<AuctionRpc>, ErrorObjectOwned> {
        let state = self.state.read();
        Ok(queries::get_active_auctions(&state.module, state.timestamp)
            .iter()
            .filter_map(|summary| state.module.get_auction(summary.auction_id))
            .map(AuctionRpc::from)
            .collect())
    }

    async fn query_get_bid(
        &self,
        auction_id: u64,
        bidder: String,
    ) -> Result<Option<BidRpc>, ErrorObjectOwned> {
        let bidder = Self::address("bidder", &bidder)?;
        let state = self.state.read();
        Ok(state.module.get_bid(auction_id, &bidder).map(BidRpc::from))
    }
}

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "JSON-RPC development chain for confidential auctions")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Initial chain timestamp
    #[arg(long, default_value = "0")]
    initial_timestamp: u64,

    /// Genesis configuration (JSON)
    #[arg(long)]
    genesis: Option<PathBuf>,
}

fn load_genesis(path: Option<&PathBuf>) -> Result<AuctionGenesisConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading genesis file {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing genesis config")
        }
        None => Ok(AuctionGenesisConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let args = Args::parse();
    let genesis = load_genesis(args.genesis.as_ref())?;
    let module = ModuleState::from_genesis(&genesis)?;

    info!(
        "Module address {}, escrow account {}",
        hex::encode(module.module_address),
        hex::encode(module.escrow_account)
    );
    info!("Starting mock chain server on {}", args.listen);

    let server = Server::builder().build(args.listen).await?;
    let handle = server.start(MockChainServer::new(module, args.initial_timestamp).into_rpc());

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
