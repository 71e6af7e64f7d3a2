pub mod engine;
pub mod index;

pub use engine::generate_variants;
pub use index::PermutationIndex;
