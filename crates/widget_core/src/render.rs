use serde::Serialize;

use crate::emitter::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Container,
    Fieldset,
    Checkbox,
    Label,
}

/// A node of a widget's render subtree. Widgets create, mutate and tear down
/// their own nodes; nothing here touches a real display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderNode {
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub checked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderNode>,
}

impl RenderNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            id: None,
            name: None,
            label_for: None,
            text: None,
            color: None,
            class: None,
            checked: false,
            children: Vec::new(),
        }
    }

    pub fn checkbox(id: impl Into<String>, name: impl Into<String>, checked: bool) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            checked,
            ..Self::new(NodeKind::Checkbox)
        }
    }

    pub fn label(label_for: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label_for: Some(label_for.into()),
            text: Some(text.into()),
            ..Self::new(NodeKind::Label)
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_child(mut self, child: RenderNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn append(&mut self, child: RenderNode) {
        self.children.push(child);
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Checkbox nodes of this subtree in document (depth-first) order.
    pub fn checkboxes(&self) -> Vec<&RenderNode> {
        let mut found = Vec::new();
        self.collect_checkboxes(&mut found);
        found
    }

    fn collect_checkboxes<'a>(&'a self, found: &mut Vec<&'a RenderNode>) {
        if self.kind == NodeKind::Checkbox {
            found.push(self);
        }
        for child in &self.children {
            child.collect_checkboxes(found);
        }
    }

    pub fn nth_checkbox_mut(&mut self, n: usize) -> Option<&mut RenderNode> {
        let mut remaining = n;
        self.find_checkbox_mut(&mut remaining)
    }

    fn find_checkbox_mut(&mut self, remaining: &mut usize) -> Option<&mut RenderNode> {
        if self.kind == NodeKind::Checkbox {
            if *remaining == 0 {
                return Some(self);
            }
            *remaining -= 1;
        }
        for child in &mut self.children {
            if let Some(found) = child.find_checkbox_mut(remaining) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_by_id(&self, id: &str) -> Option<&RenderNode> {
        if self.id.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_by_id(id))
    }

    /// Label whose `for` points at `id`, if any.
    pub fn find_label_for(&self, id: &str) -> Option<&RenderNode> {
        if self.kind == NodeKind::Label && self.label_for.as_deref() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_label_for(id))
    }
}

/// Common surface of every widget: a render snapshot plus a typed change
/// channel.
pub trait Widget {
    type Change: Clone + Send + Sync + 'static;

    fn render(&self) -> RenderNode;

    fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Self::Change) + Send + Sync + 'static;
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
