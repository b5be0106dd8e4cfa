pub mod wayback;
pub mod wordlist;

pub use wayback::{normalize, normalize_file, ParsedUrl};
pub use wordlist::{CandidateStream, Expansion};
