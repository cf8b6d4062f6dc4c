use std::sync::Mutex;

use serde_json::Value;
use shared::{
    domain::{ToggleList, ToggleRecord},
    error::{AttributeError, Diagnostic, InteractionError, ValidationError},
    protocol::ItemGroupChanged,
};
use tracing::{debug, error, trace, warn};

use crate::{
    attributes::Attributes,
    emitter::{Emitter, Subscription},
    lock,
    render::{NodeKind, RenderNode, Widget},
};

pub const VALUE_ATTRIBUTE: &str = "value";

/// A validated, ordered list of toggle rows.
///
/// Every assignment is validated as a whole and, on success, replaces the held
/// value and rebuilds every row. Change notifications are derived by scanning
/// the rendered controls, so they report live control state even when it has
/// drifted from the held value.
pub struct ItemGroupWidget {
    state: Mutex<GroupState>,
    changes: Emitter<ItemGroupChanged>,
    diagnostics: Emitter<Diagnostic>,
}

struct GroupState {
    value: ToggleList,
    attributes: Attributes,
    fieldset: RenderNode,
}

impl GroupState {
    fn rebuild(&mut self, value: ToggleList) {
        self.fieldset.clear_children();
        for (index, record) in value.iter().enumerate() {
            self.fieldset.append(row_for(record, index));
        }
        self.value = value;
    }

    fn scan(&self) -> ToggleList {
        self.fieldset
            .checkboxes()
            .into_iter()
            .map(|control| {
                ToggleRecord::new(control.name.clone().unwrap_or_default(), control.checked)
            })
            .collect()
    }
}

fn row_for(record: &ToggleRecord, index: usize) -> RenderNode {
    let id = format!("{}_{index}", record.name);
    RenderNode::new(NodeKind::Container)
        .with_child(RenderNode::checkbox(
            id.clone(),
            record.name.clone(),
            record.checked,
        ))
        .with_child(RenderNode::label(id, record.name.clone()))
}

impl ItemGroupWidget {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GroupState {
                value: ToggleList::default(),
                attributes: Attributes::new(),
                fieldset: RenderNode::new(NodeKind::Fieldset),
            }),
            changes: Emitter::new(),
            diagnostics: Emitter::new(),
        }
    }

    /// Builds a group from its JSON `value` attribute. A malformed attribute
    /// is reported and leaves the group empty.
    pub fn from_attribute(raw: &str) -> Self {
        let group = Self::new();
        let _ = group.set_attribute(VALUE_ATTRIBUTE, raw);
        group
    }

    pub fn value(&self) -> ToggleList {
        lock(&self.state).value.clone()
    }

    /// JSON encoding of the held value.
    pub fn value_attribute(&self) -> String {
        lock(&self.state).value.to_json()
    }

    pub fn set_value(&self, candidate: &Value) -> Result<(), ValidationError> {
        match ToggleList::from_value(candidate) {
            Ok(list) => {
                self.assign(list);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "rejected item group value");
                self.diagnostics.emit(Diagnostic::from(&err));
                Err(err)
            }
        }
    }

    /// Replaces the held value with an already validated list and re-renders
    /// every row.
    pub fn assign(&self, value: ToggleList) {
        let rows = value.len();
        lock(&self.state).rebuild(value);
        debug!(rows, "item group re-rendered");
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        lock(&self.state).attributes.get(name).map(str::to_string)
    }

    pub fn set_attribute(&self, name: &str, raw: &str) -> Result<(), AttributeError> {
        lock(&self.state).attributes.set(name, raw);
        self.attribute_changed(name, Some(raw))
    }

    /// Feeds an observed attribute through the same path as a property
    /// assignment. An absent value is treated as JSON `null`.
    pub fn attribute_changed(
        &self,
        name: &str,
        new_value: Option<&str>,
    ) -> Result<(), AttributeError> {
        if name != VALUE_ATTRIBUTE {
            trace!(attribute = name, "ignoring unobserved item group attribute");
            return Ok(());
        }

        let candidate = match new_value {
            Some(raw) => serde_json::from_str::<Value>(raw).map_err(|err| {
                let err = AttributeError::from(err);
                error!(error = %err, "incorrect item group value attribute");
                self.diagnostics.emit(Diagnostic::from(&err));
                err
            })?,
            None => Value::Null,
        };

        self.set_value(&candidate)?;
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        lock(&self.state).fieldset.children.len()
    }

    /// Current `{name: checked}` state of every rendered control, in
    /// document order.
    pub fn rendered_selection(&self) -> ToggleList {
        lock(&self.state).scan()
    }

    /// Sets the rendered control of `row` as a user would and emits one
    /// aggregated change for the whole group. Returns `false` without
    /// notifying when the control is already in the requested state.
    pub fn interact(&self, row: usize, checked: bool) -> Result<bool, InteractionError> {
        let selection = {
            let mut state = lock(&self.state);
            let rows = state.fieldset.children.len();
            let changed = state.fieldset.nth_checkbox_mut(row).map(|control| {
                let changed = control.checked != checked;
                control.checked = checked;
                changed
            });
            match changed {
                None => Err(InteractionError::NoSuchRow { row, rows }),
                Some(false) => return Ok(false),
                Some(true) => Ok(state.scan()),
            }
        };

        let selection = selection.map_err(|err| {
            warn!(error = %err, "rejected item group interaction");
            self.diagnostics.emit(Diagnostic::from(&err));
            err
        })?;

        debug!(row, checked, "item group row changed");
        self.changes.emit(ItemGroupChanged { value: selection });
        Ok(true)
    }

    /// Flips the rendered control of `row`.
    pub fn click(&self, row: usize) -> Result<(), InteractionError> {
        let current = lock(&self.state)
            .fieldset
            .checkboxes()
            .get(row)
            .map(|control| control.checked);
        self.interact(row, !current.unwrap_or_default())?;
        Ok(())
    }

    pub fn on_diagnostic<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.diagnostics.subscribe(handler)
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ItemGroupChanged> {
        self.changes.subscribe_events()
    }
}

impl Default for ItemGroupWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ItemGroupWidget {
    type Change = ItemGroupChanged;

    fn render(&self) -> RenderNode {
        lock(&self.state).fieldset.clone()
    }

    fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ItemGroupChanged) + Send + Sync + 'static,
    {
        self.changes.subscribe(handler)
    }
}

#[cfg(test)]
#[path = "tests/item_group_tests.rs"]
mod tests;
