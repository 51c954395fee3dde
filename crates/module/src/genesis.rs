//! Genesis configuration for the auction module.
//!
//! This module defines the initial state and configuration for the auction
//! system when the chain starts.

use auction_types::{sha256, Address, NATIVE_CURRENCY};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Genesis configuration for the auction module.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuctionGenesisConfig {
    /// Address the module acts under; input proofs are bound to it
    #[serde_as(as = "Hex")]
    pub module_address: Address,

    /// Account receiving pulled payments (defaults to the module address)
    #[serde_as(as = "Option<Hex>")]
    #[serde(default)]
    pub escrow_account: Option<Address>,

    /// Identifier assigned to the first auction
    #[serde(default)]
    pub first_auction_id: u64,
}

impl Default for AuctionGenesisConfig {
    fn default() -> Self {
        Self {
            module_address: default_module_address(),
            escrow_account: None,
            first_auction_id: 0,
        }
    }
}

/// Address used when no module address is configured.
pub fn default_module_address() -> Address {
    sha256(b"confidential-auction-module")
}

impl AuctionGenesisConfig {
    /// Account that custodies pulled payments.
    pub fn escrow_account(&self) -> Address {
        self.escrow_account.unwrap_or(self.module_address)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.module_address == NATIVE_CURRENCY {
            return Err(GenesisValidationError::ReservedAddress("module_address"));
        }
        if self.escrow_account == Some(NATIVE_CURRENCY) {
            return Err(GenesisValidationError::ReservedAddress("escrow_account"));
        }
        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("{0} must not be the native currency sentinel")]
    ReservedAddress(&'static str),
}
