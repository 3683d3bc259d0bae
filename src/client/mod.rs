// ABOUTME: SMPP transmitter client: session management, correlation and the public handle
// ABOUTME: Exports the transmitter, its configuration, results and error types

//! SMPP Client Module
//!
//! A transmitter keeps one SMPP session open to an SMSC and lets any number
//! of tasks submit and query messages over it:
//!
//! * **Asynchronous bind** - `bind()` returns a handle immediately, callers
//!   choose how long to wait
//! * **Correlation** - responses are matched to requests by sequence number,
//!   so concurrent calls may complete in any order
//! * **Per-request deadlines** - a missing response fails only its own caller
//! * **Segmentation** - long bodies are split into concatenated submit_sm PDUs
//! * **Keep-alive** - optional periodic enquire_link
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_transmitter::client::{SmppTransmitter, Transmitter, TransmitterConfig};
//! use smpp_transmitter::message::{Raw, ShortMessage};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tx = Transmitter::new(TransmitterConfig::new("localhost:2775", "system_id", "password"));
//!
//! let mut bind = tx.bind();
//! match bind.wait_timeout(Duration::from_secs(5)).await {
//!     Some(outcome) => outcome.into_result()?,
//!     None => return Err("bind still pending".into()),
//! }
//!
//! let result = tx.submit(&ShortMessage::new("root", "foobar", Raw::from("Hello!"))).await?;
//! let state = tx.query_sm("root", &result.message_id).await?;
//! println!("{} is {}", state.message_id, state.message_state);
//!
//! tx.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod correlator;
pub mod error;
pub mod keepalive;
mod session;
pub mod traits;
pub mod transmitter;
pub mod types;

pub use config::{BindCredentials, TransmitterConfig};
pub use error::{SmppError, SmppResult};
pub use keepalive::KeepAliveConfig;
pub use traits::SmppTransmitter;
pub use transmitter::{BindHandle, BindOutcome, Transmitter};
pub use types::{QueryResult, SessionState, SubmitResult};
