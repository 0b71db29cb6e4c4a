//! Duplicate and coverage detection for article titles.
//!
//! Three policies are offered, each tuned for a different caller:
//!
//! - [`check_exists`] answers "is this exact title already published?" by
//!   comparing slugs and lower-cased titles. It is strict enough to block
//!   draft creation.
//! - The `similar` list returned alongside it is a substring heuristic. It
//!   is advisory only and never blocks anything.
//! - [`CoverageMatcher`] decides whether a candidate topic is already
//!   covered by an existing title using a key-phrase vocabulary and long
//!   word overlap. Schedulers use it to pick which interview to write up
//!   next.

mod error;
mod matcher;
mod phrases;

pub use error::{Error, Result};
pub use matcher::{
    CoverageMatcher, ExistenceCheck, Overlap, check_exists, long_words, slugify,
    MIN_KEY_PHRASE_MATCHES, MIN_WORD_LEN, WORD_OVERLAP_THRESHOLD,
};
pub use phrases::KeyPhrases;
