pub mod index;
pub mod pipeline;
pub mod ranker;
