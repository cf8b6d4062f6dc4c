use std::sync::Mutex;

use shared::protocol::ToggleChanged;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::{
    attributes::Attributes,
    emitter::{Emitter, Subscription},
    lock,
    render::{NodeKind, RenderNode, Widget},
};

const WRAPPER_CLASS: &str = "checkbox";
const ID_SUFFIX_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObservedAttribute {
    Name,
    Color,
    Value,
}

impl ObservedAttribute {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Self::Name),
            "color" => Some(Self::Color),
            "value" => Some(Self::Value),
            _ => None,
        }
    }
}

/// Only the literal `"true"` checks the control.
fn parse_checked(raw: Option<&str>) -> bool {
    raw == Some("true")
}

fn css_color(hex: &str) -> String {
    format!("#{hex}")
}

fn control_id_for(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{name}_{}", &suffix[..ID_SUFFIX_LEN])
}

/// A single labelled on/off control.
///
/// The typed `value` is authoritative; the rendered checkbox always mirrors
/// the last value assigned, whether it came from an attribute, the property
/// or a user interaction.
pub struct ToggleWidget {
    state: Mutex<ToggleState>,
    changes: Emitter<ToggleChanged>,
}

struct ToggleState {
    value: bool,
    attributes: Attributes,
    control_id: String,
    control: RenderNode,
    label: RenderNode,
}

impl ToggleState {
    fn apply(&mut self, attribute: ObservedAttribute, raw: Option<&str>) {
        match attribute {
            ObservedAttribute::Name => {
                let name = raw.unwrap_or_default();
                self.control.name = Some(name.to_string());
                self.label.text = Some(name.to_string());
            }
            ObservedAttribute::Color => {
                self.label.color = raw.map(css_color);
            }
            ObservedAttribute::Value => {
                self.value = parse_checked(raw);
                self.control.checked = self.value;
            }
        }
    }

    fn name(&self) -> String {
        self.control.name.clone().unwrap_or_default()
    }
}

impl ToggleWidget {
    pub fn new(attributes: Attributes) -> Self {
        let name = attributes.get("name").unwrap_or_default().to_string();
        let value = parse_checked(attributes.get("value"));
        let control_id = control_id_for(&name);

        let mut state = ToggleState {
            value,
            control: RenderNode::checkbox(control_id.clone(), name.clone(), value),
            label: RenderNode::label(control_id.clone(), name),
            control_id,
            attributes: Attributes::new(),
        };
        for (attr_name, raw) in attributes.iter() {
            if let Some(attribute) = ObservedAttribute::parse(attr_name) {
                state.apply(attribute, Some(raw));
            }
        }
        state.attributes = attributes;

        Self {
            state: Mutex::new(state),
            changes: Emitter::new(),
        }
    }

    pub fn with_name_and_color(name: &str, color: &str) -> Self {
        Self::new(Attributes::new().with("name", name).with("color", color))
    }

    pub fn value(&self) -> bool {
        lock(&self.state).value
    }

    pub fn set_value(&self, value: bool) {
        let mut state = lock(&self.state);
        state.value = value;
        state.control.checked = value;
    }

    pub fn name(&self) -> String {
        lock(&self.state).name()
    }

    /// Accent color of the label, `#`-prefixed.
    pub fn color(&self) -> Option<String> {
        lock(&self.state).label.color.clone()
    }

    pub fn control_id(&self) -> String {
        lock(&self.state).control_id.clone()
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        lock(&self.state).attributes.get(name).map(str::to_string)
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        lock(&self.state).attributes.set(name, value);
        self.attribute_changed(name, Some(value));
    }

    pub fn remove_attribute(&self, name: &str) {
        if lock(&self.state).attributes.remove(name).is_some() {
            self.attribute_changed(name, None);
        }
    }

    /// Applies the targeted update for one observed attribute. Unknown names
    /// are ignored.
    pub fn attribute_changed(&self, name: &str, new_value: Option<&str>) {
        let Some(attribute) = ObservedAttribute::parse(name) else {
            trace!(attribute = name, "ignoring unobserved toggle attribute");
            return;
        };
        lock(&self.state).apply(attribute, new_value);
    }

    /// User click: flips the control, adopts its state as the value and
    /// notifies listeners.
    pub fn click(&self) {
        let change = {
            let mut state = lock(&self.state);
            let checked = !state.control.checked;
            state.control.checked = checked;
            state.value = checked;
            ToggleChanged {
                name: state.name(),
                value: checked,
            }
        };
        debug!(name = %change.name, value = change.value, "toggle changed");
        self.changes.emit(change);
    }

    /// Sets the control as a user would. Returns `false` without notifying
    /// when the control is already in the requested state.
    pub fn check(&self, checked: bool) -> bool {
        if lock(&self.state).control.checked == checked {
            return false;
        }
        self.click();
        true
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ToggleChanged> {
        self.changes.subscribe_events()
    }
}

impl Widget for ToggleWidget {
    type Change = ToggleChanged;

    fn render(&self) -> RenderNode {
        let state = lock(&self.state);
        RenderNode::new(NodeKind::Container)
            .with_class(WRAPPER_CLASS)
            .with_child(state.control.clone())
            .with_child(state.label.clone())
    }

    fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ToggleChanged) + Send + Sync + 'static,
    {
        self.changes.subscribe(handler)
    }
}

#[cfg(test)]
#[path = "tests/toggle_tests.rs"]
mod tests;
