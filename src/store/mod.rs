//! Local persistence

mod decodes;

pub use decodes::{DecodeStore, StoredDecode};
