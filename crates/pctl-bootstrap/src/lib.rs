pub mod synth;

pub use pctl_fingerprint::{MODSYS_VERSION, PKGMGR_VERSION};
pub use synth::{synthesize, BootstrapOptions};
