//! Card system: records, instances, and lookup.
//!
//! ## Key Types
//!
//! - `CardId`: Identifier for card metadata
//! - `CardRecord`: Cached metadata with ranked image candidates
//! - `InstanceId`: Identifier for one copy in a game
//! - `CardInstance`: Runtime card state (tapped, counters, position)
//! - `CardLookup`: `CardId -> CardRecord` resolution
//! - `CardRegistry`: In-memory lookup

pub mod instance;
pub mod record;
pub mod registry;

pub use instance::{CardInstance, InstanceId, Position};
pub use record::{CardFace, CardId, CardRecord, ImageUris};
pub use registry::{CardLookup, CardRegistry};
