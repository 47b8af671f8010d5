pub mod chain;
pub mod error;
pub mod fingerprint;
pub mod merge;
pub mod raw;
pub mod resolve;

pub use error::FingerprintError;
pub use fingerprint::{fingerprint, fingerprint_seed, MODSYS_VERSION, PKGMGR_VERSION};
pub use resolve::resolve;
