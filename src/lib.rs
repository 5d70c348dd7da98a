//! Scheduled backend jobs for a contact-tracing service.
//!
//! The crate implements the exposure-key export pipeline: read newly reported
//! Temporary Exposure Keys, encode them into the interoperable export format
//! (magic-prefixed protobuf plus a detached ECDSA signature, packaged as a
//! zip archive), upload the artifact, and retire data past the retention
//! window. Sibling jobs of the wider system (authorization, callback relay,
//! statistics publishing) are external collaborators, not part of this crate.

// Public modules
pub mod config;
pub mod db_migration;
pub mod domains;
pub mod errors;
