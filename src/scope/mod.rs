//! Partitioning of an AppMap into checkable scopes.
//!
//! Event scopes are anchored at one call event and cover its subtree. Scopes
//! produced by one iterator never share an anchor: once a scope is opened the
//! cursor skips past the anchor's matching return, so nested candidates are
//! absorbed into the enclosing scope.

mod all;
mod context;
mod cursor;
mod data;
mod event_scope;

pub use context::AppMapContext;
pub use cursor::EventCursor;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::appmap::EventRef;
use crate::configuration::ConfigError;
use crate::labels::DataObjectSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeName {
    All,
    Root,
    Command,
    HttpServerRequest,
    HttpClientRequest,
    Data,
}

impl ScopeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeName::All => "all",
            ScopeName::Root => "root",
            ScopeName::Command => "command",
            ScopeName::HttpServerRequest => "http_server_request",
            ScopeName::HttpClientRequest => "http_client_request",
            ScopeName::Data => "data",
        }
    }

    pub fn iterator(&self) -> &'static dyn ScopeIterator {
        match self {
            ScopeName::All => &all::AllScope,
            ScopeName::Root => &event_scope::RootScope,
            ScopeName::Command => &event_scope::CommandScope,
            ScopeName::HttpServerRequest => &event_scope::HttpServerRequestScope,
            ScopeName::HttpClientRequest => &event_scope::HttpClientRequestScope,
            ScopeName::Data => &data::DataScope,
        }
    }
}

impl fmt::Display for ScopeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(ScopeName::All),
            "root" => Ok(ScopeName::Root),
            "command" => Ok(ScopeName::Command),
            "http_server_request" => Ok(ScopeName::HttpServerRequest),
            "http_client_request" => Ok(ScopeName::HttpClientRequest),
            "data" => Ok(ScopeName::Data),
            other => Err(ConfigError::UnknownScope(other.to_string())),
        }
    }
}

/// An anchor event and the lazily produced events of its scope, anchor first.
pub struct EventScope<'a> {
    anchor: EventRef<'a>,
    events: Box<dyn Iterator<Item = EventRef<'a>> + 'a>,
}

impl<'a> EventScope<'a> {
    pub fn new(anchor: EventRef<'a>, events: Box<dyn Iterator<Item = EventRef<'a>> + 'a>) -> Self {
        Self { anchor, events }
    }

    /// The anchor and every call beneath it.
    pub fn subtree(anchor: EventRef<'a>) -> Self {
        Self::new(
            anchor,
            Box::new(std::iter::once(anchor).chain(anchor.descendants())),
        )
    }

    pub fn anchor(&self) -> EventRef<'a> {
        self.anchor
    }

    pub fn into_events(self) -> Box<dyn Iterator<Item = EventRef<'a>> + 'a> {
        self.events
    }
}

pub enum Scope<'a> {
    Event(EventScope<'a>),
    Data(&'a DataObjectSummary),
}

pub type Scopes<'a> = Box<dyn Iterator<Item = Scope<'a>> + 'a>;

pub trait ScopeIterator: Send + Sync {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a>;
}
