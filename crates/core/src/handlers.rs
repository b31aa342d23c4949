//! Interaction handlers attached to committed shapes.
//!
//! Each committed segment gets an entry in an ownership table when it is
//! committed; the entry goes away with the segment.

use crate::annotation::SegmentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeHandler {
    /// Primary click selects the shape.
    Select,
    /// Secondary click removes it.
    Remove,
    /// Hover reports its measurements.
    Inspect,
}

impl ShapeHandler {
    pub const ALL: [ShapeHandler; 3] =
        [ShapeHandler::Select, ShapeHandler::Remove, ShapeHandler::Inspect];

    fn respond(self, id: SegmentId, event: ShapeEvent) -> Option<ShapeAction> {
        match (self, event) {
            (ShapeHandler::Select, ShapeEvent::Click) => Some(ShapeAction::Select(id)),
            (ShapeHandler::Remove, ShapeEvent::SecondaryClick) => Some(ShapeAction::Remove(id)),
            (ShapeHandler::Inspect, ShapeEvent::Hover) => Some(ShapeAction::Inspect(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeEvent {
    Click,
    SecondaryClick,
    Hover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeAction {
    Select(SegmentId),
    Remove(SegmentId),
    Inspect(SegmentId),
}

#[derive(Debug)]
pub struct ShapeHandlerRegistry {
    defaults: Vec<ShapeHandler>,
    table: HashMap<SegmentId, Vec<ShapeHandler>>,
}

impl Default for ShapeHandlerRegistry {
    fn default() -> Self {
        Self::with_defaults(&ShapeHandler::ALL)
    }
}

impl ShapeHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose newly committed shapes receive `defaults`.
    pub fn with_defaults(defaults: &[ShapeHandler]) -> Self {
        let mut unique = Vec::with_capacity(defaults.len());
        for handler in defaults {
            if !unique.contains(handler) {
                unique.push(*handler);
            }
        }
        Self { defaults: unique, table: HashMap::new() }
    }

    /// Called when a shape is committed.
    pub fn register_shape(&mut self, id: SegmentId) {
        self.table.insert(id, self.defaults.clone());
    }

    /// Adds one handler to an existing shape. Returns `false` for unknown
    /// shapes or if the handler is already attached.
    pub fn attach(&mut self, id: SegmentId, handler: ShapeHandler) -> bool {
        match self.table.get_mut(&id) {
            Some(handlers) if !handlers.contains(&handler) => {
                handlers.push(handler);
                true
            }
            _ => false,
        }
    }

    pub fn detach(&mut self, id: SegmentId, handler: ShapeHandler) -> bool {
        let Some(handlers) = self.table.get_mut(&id) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|existing| *existing != handler);
        handlers.len() != before
    }

    /// Drops every handler owned by the shape.
    pub fn remove_shape(&mut self, id: SegmentId) -> bool {
        self.table.remove(&id).is_some()
    }

    pub fn handlers(&self, id: SegmentId) -> &[ShapeHandler] {
        self.table.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.table.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Runs the event through the shape's handlers in attachment order.
    pub fn dispatch(&self, id: SegmentId, event: ShapeEvent) -> Vec<ShapeAction> {
        self.handlers(id).iter().filter_map(|handler| handler.respond(id, event)).collect()
    }
}
