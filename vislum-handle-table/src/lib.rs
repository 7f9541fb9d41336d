//! A table of resources addressed by small integer IDs.
//!
//! Hosts hand these IDs to code on the other side of a boundary (a sandboxed
//! guest, a scripting runtime) instead of references to the resources themselves.
//!
//! ```ignore
//! let mut table = ResourceTable::new();
//! let rid = table.add(File::open(path)?);
//!
//! let file = table.require_as::<File>(rid)?;
//!
//! table.remove(rid, None).await?;
//! ```

extern crate self as vislum_handle_table;

mod config;
mod error;
mod id;
mod resource;
mod table;

pub use config::ResourceTableConfig;
pub use error::{BadResourceId, IdSpaceExhausted, RemoveError};
pub use id::{IntoRawResourceId, MAX_ID, RawResourceId, ResourceId, is_valid_resource_id};
pub use resource::{Close, CloseError, Resource, ResourceType};
pub use table::{Iter, IterOf, Removal, ResourceTable};

// Re-export the Resource derive macro.
pub use vislum_handle_table_macros::Resource;
