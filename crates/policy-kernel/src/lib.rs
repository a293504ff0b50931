//! # policy-kernel — the Pure Decision Function
//!
//! Everything here is pure and synchronous: no network calls, no storage,
//! no clock reads beyond the caller-supplied `Timestamp`. The Decision
//! Engine crate is responsible for I/O (oracle calls, attestor round
//! trips, ledger commits); this crate only ever answers "what does policy
//! say, given this parameter snapshot?"
//!
//! Grounded on spec §4.B and the contractually tested rules and
//! end-to-end scenarios in spec §8, since the kernel's original SQL
//! implementation was not present in the retrieved reference material.

pub mod decision;
pub mod kernel;
pub mod parameters;

pub use decision::Decision;
pub use kernel::{decide, KernelOutput, Request, KERNEL_ID, OBLIGATION_WORLDCHECK_QUERIED};
pub use parameters::{Parameters, KEY_AMOUNT_MAX, KEY_RECENT_ESCALATION};
