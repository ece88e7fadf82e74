use tracing::debug;

use super::{AppMapContext, EventCursor, EventScope, Scope, ScopeIterator, Scopes};
use crate::appmap::EventRef;

const COMMAND_LABELS: [&str; 2] = ["command", "job"];

/// Walks the stream and opens a subtree scope at each call accepted by
/// `is_anchor`, then skips to that call's return.
struct AnchoredScopes<'a> {
    cursor: EventCursor<'a>,
    is_anchor: fn(EventRef<'_>) -> bool,
}

impl<'a> Iterator for AnchoredScopes<'a> {
    type Item = Scope<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(event) = self.cursor.next_call() {
            if !(self.is_anchor)(event) {
                continue;
            }
            if !self.cursor.skip_to_matching_return(event) {
                debug!(event = event.id(), "Scope anchor has no return event");
            }
            return Some(Scope::Event(EventScope::subtree(event)));
        }
        None
    }
}

fn anchored<'a>(context: &'a AppMapContext, is_anchor: fn(EventRef<'_>) -> bool) -> Scopes<'a> {
    Box::new(AnchoredScopes {
        cursor: context.cursor(),
        is_anchor,
    })
}

pub(crate) fn is_command(event: EventRef<'_>) -> bool {
    event.http_server_request().is_some()
        || COMMAND_LABELS.iter().any(|label| event.has_label(label))
}

pub struct RootScope;

impl ScopeIterator for RootScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        anchored(context, |event| event.parent().is_none())
    }
}

pub struct CommandScope;

impl ScopeIterator for CommandScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        anchored(context, is_command)
    }
}

pub struct HttpServerRequestScope;

impl ScopeIterator for HttpServerRequestScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        anchored(context, |event| event.http_server_request().is_some())
    }
}

pub struct HttpClientRequestScope;

impl ScopeIterator for HttpClientRequestScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        anchored(context, |event| event.http_client_request().is_some())
    }
}
