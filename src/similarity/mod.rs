//! Literature co-occurrence similarity: the NGD score and the set stores it reads.

pub mod ngd;
pub mod set_store;

pub use ngd::{calculate_ngd, ngd_from_counts};
pub use set_store::{LiteratureSetStore, MemorySetStore, SqliteSetStore};
