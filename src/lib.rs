//! wasm-stacks: WASM module for Stacks browser-wallet operations
//!
//! This crate provides:
//! - Request verification (ES256K tokens signed with app-scoped keys)
//! - Payload normalization and transaction building/signing
//! - Broadcasting with rejection classification
//! - Submission orchestration (loading state, nonce bookkeeping, feedback)
//!
//! # Architecture
//!
//! The crate follows a two-layer architecture:
//! - **Core layer** (`src/*.rs`): Pure Rust logic, no WASM dependencies
//! - **WASM layer** (`src/wasm/*.rs`): Thin wrappers with `#[wasm_bindgen]`

pub mod address;
pub mod broadcast;
pub mod builder;
pub mod clarity;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod mock;
pub mod network;
pub mod normalize;
pub mod orchestrator;
pub mod payload;
pub mod post_condition;
pub mod request;
pub mod transaction;
pub mod verifier;
pub mod wallet;
pub mod wasm;

// Re-export main types for convenience
pub use address::{validate_address, Principal, StacksAddress};
pub use broadcast::{broadcast_transaction, BroadcastOutcome, RejectionReason};
pub use builder::{build_signed, build_transaction, resolve_network, types::TxOptions};
pub use client::{HttpNodeClient, NodeClient};
pub use config::WalletConfig;
pub use error::WalletError;
pub use network::{NetworkDescriptor, StacksNetwork, TransactionVersion};
pub use normalize::{normalize_payload, NormalizedPayload};
pub use orchestrator::{SubmissionFeedback, SubmissionOrchestrator};
pub use payload::TransactionPayload;
pub use transaction::SignedTransaction;
pub use verifier::verify_request;
pub use wallet::{Account, Wallet};
