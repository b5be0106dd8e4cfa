// Wildcard (soft-404) detection: calibration probes before a run and
// false-positive classification during it.

pub mod detector;
pub mod signature;

pub use detector::{calibrate, classify, Sample};
pub use signature::{extract_title, Discriminator, Scope, ScopeSignature, WildcardSignature};
