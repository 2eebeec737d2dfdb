//! Chain and token registry
//!
//! Static configuration mapping chain names and token symbols to their
//! connection parameters: LCD/RPC endpoints, IBC channels, gas settings,
//! decimals and per-chain denoms. Every other crate reads it; nothing writes it.

pub mod chains;
pub mod constants;
pub mod registry;
pub mod tokens;

pub use chains::{Chain, Currency, SigningFamily};
pub use registry::Registry;
pub use tokens::{ChannelBinding, ContractInfo, Token, TokenKind};
