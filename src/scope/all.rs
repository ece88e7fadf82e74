use super::{AppMapContext, EventScope, Scope, ScopeIterator, Scopes};

/// One scope for the whole AppMap, anchored at the first call.
pub struct AllScope;

impl ScopeIterator for AllScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        let mut cursor = context.cursor();
        let Some(first) = cursor.next_call() else {
            return Box::new(std::iter::empty());
        };
        let events = std::iter::once(first).chain(cursor);
        Box::new(std::iter::once(Scope::Event(EventScope::new(
            first,
            Box::new(events),
        ))))
    }
}
