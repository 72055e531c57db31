pub mod interleave;
pub mod score;
