//! Durable file slots for stowage.
//!
//! A [`FileSlot`] is the physical home of one store: a single file whose
//! name is derived from the store key. Writes go to a temporary file in the
//! same directory and are renamed over the target, so a reader or a crash
//! never observes a half-written file.
//!
//! # Rules
//!
//! 1. A missing file and a zero-length file both read as "absent".
//! 2. `write` either replaces the whole file or fails leaving it untouched.
//! 3. `delete` is idempotent.
//! 4. `clear` writes zero bytes; it is not the same as `delete`.
//! 5. Key to file name mapping is deterministic and injective.

pub mod error;
pub mod names;
pub mod slot;

pub use error::{SlotError, SlotResult};
pub use names::{key_from_file_name, slot_file_name};
pub use slot::{is_temp_file_name, FileSlot, SyncMode};
