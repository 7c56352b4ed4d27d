//! Ethereum infrastructure - Alloy provider implementations

mod provider;

pub use provider::{
    create_provider, parse_raw_transaction, EthereumProvider, ProviderConfig, RawTransaction,
};
