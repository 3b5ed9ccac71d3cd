//! JSON loaders for poset universes, episode families and path tables.
//!
//! Three layouts are understood:
//!
//! - universes as a list of square matrices, or as an object mapping a
//!   relation count to the matrices with that many relations;
//! - episode files as a list of `{ "M_c": matrix, "P": { event: [term, ..] } }`
//!   records, where the key order of the first `P` fixes the event order;
//! - shortest-path tables as nested arrays with `null` for unreachable pairs.

mod episodes;
mod errors;
mod paths;
mod universe;

pub use episodes::{EpisodeOptions, episodes_from_reader, episodes_from_str, load_episodes};
pub use errors::JsonProviderError;
pub use paths::{load_path_table, path_table_from_reader, path_table_from_str};
pub use universe::{load_universe, universe_from_reader, universe_from_str};

#[cfg(test)]
mod tests;
