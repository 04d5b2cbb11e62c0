use std::collections::HashSet;

use crate::envelope::Event;

/// A set of event-type discriminators used to filter a cursor.
///
/// An empty filter matches every event.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    types: HashSet<String>,
}

impl TypeFilter {
    /// A filter that passes all event types.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter that passes only the given event types.
    pub fn of<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Check whether an event passes the filter.
    pub fn matches(&self, event: &Event) -> bool {
        self.types.is_empty() || self.types.contains(&event.event_type)
    }
}
