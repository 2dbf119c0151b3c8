//! Typed, file-backed stores with observable lifecycle events.
//!
//! A [`StoreProvider`] owns a root directory and a converter. It hands out
//! one [`ValueStore`] or [`ListStore`] per key and keeps handing out the same
//! instance, so every caller in the process shares one lock and one event
//! channel per key.
//!
//! # Stores
//!
//! - [`ValueStore`]: a single value, or nothing
//! - [`ListStore`]: an ordered list; an absent file reads as an empty list
//!
//! Every mutation is a read-modify-write under a per-store lock, followed by
//! exactly one event carrying the resulting state. After `delete` a store is
//! permanently dead: every further call fails with
//! [`StoreError::StoreDeleted`] before touching the disk.
//!
//! # Sync and async
//!
//! Each operation exists as a blocking call (`put`) and as an `async`
//! single-shot variant (`observe_put`) that runs the same code on the
//! provider's [`IoScheduler`]. Both produce identical results and events.
//!
//! # Events
//!
//! [`EventStream`] is a fan-out with no replay: subscribers only see events
//! emitted after they subscribed. The stream completes normally right after
//! the `Deleted` event.

mod base;

pub mod config;
pub mod error;
pub mod event;
pub mod list;
pub mod provider;
pub mod schedule;
pub mod stream;
pub mod traits;
pub mod value;

pub use config::ProviderConfig;
pub use error::{StoreError, StoreResult};
pub use event::{ListEventKind, ListStoreEvent, ValueEventKind, ValueStoreEvent};
pub use list::ListStore;
pub use provider::{StoreProvider, StoreProviderBuilder};
pub use schedule::IoScheduler;
pub use stream::{EventStream, TryNext};
pub use traits::StoreItem;
pub use value::ValueStore;

pub use stowage_convert::{BincodeConverter, ConvertError, Converter, JsonConverter, TypeTag};
pub use stowage_slot::{SlotError, SyncMode};

#[cfg(test)]
pub(crate) mod testutil {
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Dino {
        pub name: String,
        pub arm_length: u32,
    }

    pub fn dino(name: &str, arm_length: u32) -> Dino {
        Dino {
            name: name.into(),
            arm_length,
        }
    }
}
