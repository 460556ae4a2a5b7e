//! Arena-backed element tree with generational node handles.
//!
//! A [`NodeId`] is a weak handle: once its node is removed the slot's
//! generation moves on and every lookup through the old id yields nothing.
//! Callers therefore validate handles at use time instead of assuming rows
//! stay put.

use std::collections::BTreeMap;

use thiserror::Error;
use tokio::sync::mpsc;

use super::selector::Selector;

/// Attribute name holding an element's identifier.
const ID_ATTRIBUTE: &str = "id";

/// Weak handle to a node in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

/// Change notification delivered to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationRecord {
    /// An element (with its subtree) was inserted under the connected tree.
    Added(NodeId),
}

/// Errors raised by tree operations.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The handle refers to a node that has been removed.
    #[error("node no longer exists")]
    StaleNode,

    /// The operation needs an element but found a text node.
    #[error("node is not an element")]
    NotAnElement,

    /// Appending would make a node its own ancestor.
    #[error("cannot append a node beneath itself")]
    Cycle,
}

#[derive(Debug)]
struct Element {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
}

#[derive(Debug)]
enum NodeKind {
    Element(Element),
    Text(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    node: Option<Node>,
}

/// Mutable element tree standing in for the host page.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
    observers: Vec<mpsc::UnboundedSender<MutationRecord>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document whose root is an empty `body` element.
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId {
            index: 0,
            generation: 0,
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(Node {
                    kind: NodeKind::Element(Element {
                        tag: "body".to_owned(),
                        classes: Vec::new(),
                        attributes: BTreeMap::new(),
                    }),
                    parent: None,
                    children: Vec::new(),
                }),
            }],
            free: Vec::new(),
            root,
            observers: Vec::new(),
        }
    }

    /// The root element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.node(id)?.kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DocumentError> {
        match &mut self.node_mut(id).ok_or(DocumentError::StaleNode)?.kind {
            NodeKind::Element(element) => Ok(element),
            NodeKind::Text(_) => Err(DocumentError::NotAnElement),
        }
    }

    /// Whether `id` still refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Whether `id` is live and attached beneath the root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return true;
            }
            current = self.node(node_id).and_then(|node| node.parent);
        }
        false
    }

    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };

        if let Some(index) = self.free.pop()
            && let Some(slot) = self.slots.get_mut(index)
        {
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
        }))
    }

    /// Creates a detached element carrying `classes`.
    pub fn create_element_with_classes(&mut self, tag: &str, classes: &[&str]) -> NodeId {
        let id = self.create_element(tag);
        if let Ok(element) = self.element_mut(id) {
            element.classes = classes.iter().map(|class| (*class).to_owned()).collect();
        }
        id
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(NodeKind::Text(text.to_owned()))
    }

    /// Appends `child` as the last child of `parent`, moving it if needed.
    ///
    /// Observers are told about the insertion when `child` is an element and
    /// `parent` is connected.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleNode`] for removed handles,
    /// [`DocumentError::NotAnElement`] when `parent` is text, and
    /// [`DocumentError::Cycle`] when `child` is `parent` or one of its
    /// ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        self.element_mut(parent)?;
        if !self.contains(child) {
            return Err(DocumentError::StaleNode);
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(DocumentError::Cycle);
        }

        self.detach(child)?;
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }

        if self.element(child).is_some() && self.is_connected(parent) {
            self.notify(MutationRecord::Added(child));
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(node_id) = current {
            if node_id == candidate {
                return true;
            }
            current = self.node(node_id).and_then(|entry| entry.parent);
        }
        false
    }

    /// Detaches `node` from its parent, keeping it (and its handle) alive.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleNode`] when `node` was removed.
    pub fn detach(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let parent = self.node(node).ok_or(DocumentError::StaleNode)?.parent;
        if let Some(parent_id) = parent
            && let Some(parent_node) = self.node_mut(parent_id)
        {
            parent_node.children.retain(|child| *child != node);
        }
        if let Some(entry) = self.node_mut(node) {
            entry.parent = None;
        }
        Ok(())
    }

    /// Removes `node` and its subtree, invalidating every handle into it.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::StaleNode`] when `node` was already removed.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.detach(node)?;

        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            let Some(slot) = self.slots.get_mut(current.index) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            if let Some(freed) = slot.node.take() {
                pending.extend(freed.children);
            }
            slot.generation += 1;
            self.free.push(current.index);
        }
        Ok(())
    }

    /// Parent of `node`, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|entry| entry.parent)
    }

    /// Children of `node` in order; empty for removed handles.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.node(node)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
    }

    /// Lower-case tag name of an element.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag.as_str())
    }

    /// Attribute value of an element. Classes are exposed via
    /// [`Document::has_class`] instead.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)
            .and_then(|element| element.attributes.get(name))
            .map(String::as_str)
    }

    /// Sets an attribute on an element.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for removed handles and text nodes.
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &str,
    ) -> Result<(), DocumentError> {
        self.element_mut(node)?
            .attributes
            .insert(name.to_owned(), value.to_owned());
        Ok(())
    }

    /// Removes an attribute from an element; absent attributes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for removed handles and text nodes.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        self.element_mut(node)?.attributes.remove(name);
        Ok(())
    }

    /// Element identifier (`id` attribute).
    #[must_use]
    pub fn element_id(&self, node: NodeId) -> Option<&str> {
        self.attribute(node, ID_ATTRIBUTE)
    }

    /// Whether an element carries `class`.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node)
            .is_some_and(|element| element.classes.iter().any(|c| c == class))
    }

    /// Adds `class` when `enabled`, removes it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for removed handles and text nodes.
    pub fn toggle_class(
        &mut self,
        node: NodeId,
        class: &str,
        enabled: bool,
    ) -> Result<(), DocumentError> {
        let element = self.element_mut(node)?;
        let present = element.classes.iter().any(|c| c == class);
        if enabled && !present {
            element.classes.push(class.to_owned());
        } else if !enabled && present {
            element.classes.retain(|c| c != class);
        }
        Ok(())
    }

    /// Removes every child of `node`, invalidating their handles.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for removed handles and text nodes.
    pub fn clear_children(&mut self, node: NodeId) -> Result<(), DocumentError> {
        self.element_mut(node)?;
        let children = self.children(node).to_vec();
        for child in children {
            self.remove(child)?;
        }
        Ok(())
    }

    /// Replaces the children of `node` with a single text node.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for removed handles and text nodes.
    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        self.clear_children(node)?;
        let text_node = self.create_text(text);
        self.append_child(node, text_node)
    }

    /// Concatenated text of `node` and its descendants.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        self.collect_text(node, &mut text);
        text
    }

    fn collect_text(&self, node: NodeId, text: &mut String) {
        let Some(entry) = self.node(node) else {
            return;
        };
        match &entry.kind {
            NodeKind::Text(value) => text.push_str(value),
            NodeKind::Element(_) => {
                for child in &entry.children {
                    self.collect_text(*child, text);
                }
            }
        }
    }

    /// Whether the element `node` satisfies `selector`.
    #[must_use]
    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };

        if selector
            .tag_name()
            .is_some_and(|tag| !tag.eq_ignore_ascii_case(&element.tag))
        {
            return false;
        }
        if selector
            .id()
            .is_some_and(|id| element.attributes.get(ID_ATTRIBUTE).map(String::as_str) != Some(id))
        {
            return false;
        }
        if !selector
            .classes()
            .iter()
            .all(|class| element.classes.iter().any(|c| c == class))
        {
            return false;
        }
        selector.attributes().iter().all(|test| {
            test.accepts(element.attributes.get(test.name()).map(String::as_str))
        })
    }

    /// Descendants of `root` matching `selector`, in document order.
    ///
    /// `root` itself is never included.
    #[must_use]
    pub fn query_selector_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            if self.matches(node, selector) {
                found.push(node);
            }
            pending.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    /// First descendant of `root` matching `selector`.
    #[must_use]
    pub fn query_selector(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut pending: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(node) = pending.pop() {
            if self.matches(node, selector) {
                return Some(node);
            }
            pending.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Subscribes to insertions. Dropping the receiver disconnects.
    pub fn observe(&mut self) -> mpsc::UnboundedReceiver<MutationRecord> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.push(sender);
        receiver
    }

    fn notify(&mut self, record: MutationRecord) {
        self.observers
            .retain(|observer| observer.send(record).is_ok());
    }
}
