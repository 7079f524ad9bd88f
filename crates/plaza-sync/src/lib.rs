/// Plaza live collections
///
/// Keeps a derived, enriched and ordered copy of a store collection in step
/// with the store. A `LiveCollection` owns exactly one watch at a time; every
/// snapshot is re-derived in full and published as an immutable list.

pub mod collection;
pub mod live;
pub mod slot;

pub use collection::{Collection, EnrichError, derive};
pub use live::{LiveCollection, Published};
pub use slot::{Generation, Slot, SlotState};
