//! wordtower-core: Vocabulary graph builder, tower quiz engine, and mistake book.
//!
//! Word lists are parsed into records, the builder turns them into a graph
//! changeset of words, grades and roots, and the importer merges that into
//! any [`traits::GraphStore`]. The quiz engine then reads the graph back to
//! run floor-by-floor multiple-choice sessions, feeding misses into a
//! [`traits::MistakeBook`].

pub mod builder;
pub mod engine;
pub mod error;
pub mod importer;
pub mod mistakes;
pub mod model;
pub mod report;
pub mod source;
pub mod statistics;
pub mod traits;

#[cfg(test)]
mod fixtures;
