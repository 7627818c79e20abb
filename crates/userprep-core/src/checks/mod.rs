mod cast;

pub use cast::{cast_mismatch_counts, CastMismatch};
