use serde::{Deserialize, Serialize};

use crate::domain::{AggregateMap, ToggleList};

/// Name under which every widget publishes its change notification.
pub const CHANGE_EVENT: &str = "value-changed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleChanged {
    pub name: String,
    pub value: bool,
}

/// Full ordered state of every rendered row at the time of the interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroupChanged {
    pub value: ToggleList,
}

/// Whole aggregate map, not just the entry that changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsyncGroupChanged {
    pub value: AggregateMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum WidgetEvent {
    Toggle(ToggleChanged),
    ItemGroup(ItemGroupChanged),
    AsyncGroup(AsyncGroupChanged),
}

impl From<ToggleChanged> for WidgetEvent {
    fn from(value: ToggleChanged) -> Self {
        Self::Toggle(value)
    }
}

impl From<ItemGroupChanged> for WidgetEvent {
    fn from(value: ItemGroupChanged) -> Self {
        Self::ItemGroup(value)
    }
}

impl From<AsyncGroupChanged> for WidgetEvent {
    fn from(value: AsyncGroupChanged) -> Self {
        Self::AsyncGroup(value)
    }
}
