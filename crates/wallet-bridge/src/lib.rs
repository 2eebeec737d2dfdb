//! wallet-bridge: browser wallet extension access
//!
//! The extension only exists inside a browser, so requests are parked on a
//! local page server. The user opens the page, the page runs the request
//! against the extension and posts the answer back.

pub mod handlers;
pub mod keplr_page;
pub mod server;
pub mod session;
pub mod signer;
pub mod types;

pub use server::WalletBridgeServer;
pub use session::{request_fee_grant, FeeGrantStatus, SessionSnapshot, WalletSession};
pub use signer::{connect_request, BridgeSigner, WalletPrompt, WalletSigner};
pub use types::*;
