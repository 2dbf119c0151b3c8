use serde::de::DeserializeOwned;
use serde::Serialize;

/// Bound for anything kept in a store.
///
/// Items are cloned into events and moved onto I/O worker threads, so they
/// must be `Clone + Send + Sync + 'static` in addition to serde-capable.
/// Implemented automatically for every qualifying type.
pub trait StoreItem: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> StoreItem for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
