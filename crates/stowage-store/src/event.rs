use std::fmt;

/// Event published by a [`ValueStore`](crate::ValueStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueStoreEvent<T> {
    /// A value was written; carries the stored value.
    Put(T),
    /// The store was cleared.
    Cleared,
    /// The store was deleted. Always the last event.
    Deleted,
}

/// Classification of [`ValueStoreEvent`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueEventKind {
    Put,
    Cleared,
    Deleted,
}

impl<T> ValueStoreEvent<T> {
    pub fn kind(&self) -> ValueEventKind {
        match self {
            Self::Put(_) => ValueEventKind::Put,
            Self::Cleared => ValueEventKind::Cleared,
            Self::Deleted => ValueEventKind::Deleted,
        }
    }

    /// The stored value for `Put`, `None` otherwise.
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Put(item) => Some(item),
            _ => None,
        }
    }
}

impl fmt::Display for ValueEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Put => "ItemPut",
            Self::Cleared => "StoreCleared",
            Self::Deleted => "StoreDeleted",
        };
        write!(f, "{s}")
    }
}

/// Event published by a [`ListStore`](crate::ListStore).
///
/// List-carrying variants hold the full list after the mutation, not the
/// changed element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListStoreEvent<T> {
    /// The whole list was replaced.
    ListPut(Vec<T>),
    /// An item was appended.
    ItemAdded(Vec<T>),
    /// A remove ran. Fires even when nothing matched.
    ItemRemoved(Vec<T>),
    /// A replace ran. Fires even when nothing matched.
    ItemReplaced(Vec<T>),
    /// The list was cleared.
    Cleared,
    /// The store was deleted. Always the last event.
    Deleted,
}

/// Classification of [`ListStoreEvent`]s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListEventKind {
    ListPut,
    ItemAdded,
    ItemRemoved,
    ItemReplaced,
    Cleared,
    Deleted,
}

impl<T> ListStoreEvent<T> {
    pub fn kind(&self) -> ListEventKind {
        match self {
            Self::ListPut(_) => ListEventKind::ListPut,
            Self::ItemAdded(_) => ListEventKind::ItemAdded,
            Self::ItemRemoved(_) => ListEventKind::ItemRemoved,
            Self::ItemReplaced(_) => ListEventKind::ItemReplaced,
            Self::Cleared => ListEventKind::Cleared,
            Self::Deleted => ListEventKind::Deleted,
        }
    }

    /// The resulting list, or `None` for `Cleared` and `Deleted`.
    pub fn list(&self) -> Option<&[T]> {
        match self {
            Self::ListPut(list)
            | Self::ItemAdded(list)
            | Self::ItemRemoved(list)
            | Self::ItemReplaced(list) => Some(list.as_slice()),
            Self::Cleared | Self::Deleted => None,
        }
    }
}

impl fmt::Display for ListEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ListPut => "ListPut",
            Self::ItemAdded => "ItemAdded",
            Self::ItemRemoved => "ItemRemoved",
            Self::ItemReplaced => "ItemReplaced",
            Self::Cleared => "StoreCleared",
            Self::Deleted => "StoreDeleted",
        };
        write!(f, "{s}")
    }
}
