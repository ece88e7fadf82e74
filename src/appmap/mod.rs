//! In-memory AppMap: an arena of events linked into a call tree.
//!
//! Events are stored in recording order. Parent, child and return links are
//! indexes into that arena, so navigation never takes ownership and an
//! [`EventRef`] is a cheap `Copy` handle.

mod code_object;
mod event;
mod event_ref;
mod hash;
mod metadata;
pub mod sql;

pub use code_object::{ClassMapEntry, CodeObject, CodeObjectKind};
pub use event::{
    Event, EventKind, Exception, HttpClientRequest, HttpResponse, HttpServerRequest, Parameter,
    SqlQuery,
};
pub use event_ref::{Ancestors, Descendants, EventRef};
pub use hash::sha256_hex;
pub use metadata::{Client, Framework, Git, Language, Metadata, Recorder};

use code_object::ClassMapIndex;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::ScanError;

#[derive(Deserialize)]
struct RawAppMap {
    #[serde(default)]
    metadata: Metadata,
    #[serde(default, rename = "classMap")]
    class_map: Vec<ClassMapEntry>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Clone)]
pub struct AppMap {
    pub metadata: Metadata,
    events: Vec<Event>,
    code_objects: Vec<CodeObject>,
}

impl AppMap {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: RawAppMap = serde_json::from_str(json)?;
        Ok(Self::build(raw))
    }

    pub fn from_file(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path).map_err(|e| ScanError::ReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content).map_err(|e| ScanError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn build(raw: RawAppMap) -> Self {
        let RawAppMap {
            metadata,
            class_map,
            mut events,
        } = raw;

        link_events(&mut events);

        let index = ClassMapIndex::build(&class_map);
        let mut code_objects = Vec::new();
        let mut by_fqid: FxHashMap<String, usize> = FxHashMap::default();
        for position in 0..events.len() {
            let source = match events[position].call {
                Some(call) if events[position].is_return() => call,
                _ => position,
            };
            if source != position {
                events[position].code_object = events[source].code_object;
                continue;
            }
            let code_object = index.resolve(&events[position]);
            let slot = *by_fqid.entry(code_object.fqid()).or_insert_with(|| {
                code_objects.push(code_object);
                code_objects.len() - 1
            });
            events[position].code_object = slot;
        }

        Self {
            metadata,
            events,
            code_objects,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<EventRef<'_>> {
        (index < self.events.len()).then(|| EventRef::new(self, index))
    }

    pub fn events(&self) -> impl Iterator<Item = EventRef<'_>> {
        (0..self.events.len()).map(move |index| EventRef::new(self, index))
    }

    pub fn call_events(&self) -> impl Iterator<Item = EventRef<'_>> {
        self.events().filter(|event| event.is_call())
    }

    pub fn find_by_id(&self, id: u64) -> Option<EventRef<'_>> {
        self.events().find(|event| event.id() == id)
    }

    pub(crate) fn add_label(&mut self, index: usize, label: &str) {
        if let Some(event) = self.events.get_mut(index) {
            event.labels.insert(label.to_string());
        }
    }

    pub(crate) fn raw_event(&self, index: usize) -> &Event {
        &self.events[index]
    }

    pub(crate) fn code_object_at(&self, index: usize) -> &CodeObject {
        &self.code_objects[index]
    }
}

/// Assign parents with a per-thread call stack and pair each return with its
/// call through `parent_id`.
fn link_events(events: &mut [Event]) {
    let mut stacks: FxHashMap<u64, Vec<usize>> = FxHashMap::default();
    let mut calls_by_id: FxHashMap<u64, usize> = FxHashMap::default();

    for position in 0..events.len() {
        let thread = events[position].thread_id.unwrap_or_default();
        if events[position].is_call() {
            let stack = stacks.entry(thread).or_default();
            let parent = stack.last().copied();
            if let Some(parent) = parent {
                events[parent].children.push(position);
            }
            events[position].parent = parent;
            stack.push(position);
            calls_by_id.insert(events[position].id, position);
            continue;
        }

        let Some(call) = events[position]
            .parent_id
            .and_then(|id| calls_by_id.get(&id).copied())
        else {
            debug!(
                event = events[position].id,
                "Return event has no matching call"
            );
            continue;
        };
        if events[call].return_event.is_some() {
            debug!(event = events[position].id, call = events[call].id, "Call already returned");
            continue;
        }
        events[call].return_event = Some(position);
        events[position].call = Some(call);
        events[position].parent = events[call].parent;

        let call_thread = events[call].thread_id.unwrap_or_default();
        if let Some(stack) = stacks.get_mut(&call_thread)
            && let Some(depth) = stack.iter().rposition(|&open| open == call)
        {
            for &unreturned in &stack[depth + 1..] {
                debug!(event = events[unreturned].id, "Call has no return event");
            }
            stack.truncate(depth);
        }
    }
}
