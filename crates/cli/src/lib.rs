//! # cli — `cmattest` Operator Tooling
//!
//! Four subcommands, each grounded on one of the original Python
//! `tools/` scripts or service admin surfaces:
//!
//! - [`keys`]: keyring inspection and fresh-seed generation (no direct
//!   Python equivalent — the original derived keys only from
//!   `ATTESTOR_KEYS` at service boot; this gives operators an offline
//!   way to mint a new seed before adding it to that variable).
//! - [`verify_cert`]: offline certificate verification, grounded on
//!   `tools/verify_cert.py`.
//! - [`replay`]: replay/drift detection, grounded on `tools/replay.py`.
//! - [`anchor_worker`]: runs the anchor worker standalone, grounded on
//!   `services/anchor/anchor.py`'s main loop.

pub mod anchor_worker;
pub mod keys;
pub mod replay;
pub mod verify_cert;
