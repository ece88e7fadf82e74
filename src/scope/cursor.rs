use crate::appmap::{AppMap, EventRef};

/// Single forward pass over the full call/return stream of an AppMap.
pub struct EventCursor<'a> {
    appmap: &'a AppMap,
    position: usize,
}

impl<'a> EventCursor<'a> {
    pub fn new(appmap: &'a AppMap) -> Self {
        Self {
            appmap,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Advance to the next call event.
    pub fn next_call(&mut self) -> Option<EventRef<'a>> {
        while let Some(event) = self.appmap.get(self.position) {
            self.position += 1;
            if event.is_call() {
                return Some(event);
            }
        }
        None
    }

    /// Consume events up to and including the return whose parent is `anchor`.
    /// Returns `false` when the stream ran out first.
    pub fn skip_to_matching_return(&mut self, anchor: EventRef<'a>) -> bool {
        while let Some(event) = self.appmap.get(self.position) {
            self.position += 1;
            if event.is_return() && event.event().parent_id == Some(anchor.id()) {
                return true;
            }
        }
        false
    }
}

impl<'a> Iterator for EventCursor<'a> {
    type Item = EventRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_call()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::AppMapBuilder;

    #[test]
    fn test_next_call_skips_returns() {
        let appmap = AppMapBuilder::new()
            .call(1, "A", "a")
            .ret(2, 1)
            .call(3, "B", "b")
            .ret(4, 3)
            .build();
        let ids: Vec<u64> = EventCursor::new(&appmap).map(|e| e.id()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_skip_to_matching_return() {
        let appmap = AppMapBuilder::new()
            .call(1, "A", "a")
            .call(2, "B", "b")
            .ret(3, 2)
            .ret(4, 1)
            .call(5, "C", "c")
            .ret(6, 5)
            .build();
        let mut cursor = EventCursor::new(&appmap);
        let anchor = cursor.next_call().unwrap();
        assert!(cursor.skip_to_matching_return(anchor));
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.next_call().unwrap().id(), 5);
    }

    #[test]
    fn test_missing_return_exhausts_stream() {
        let appmap = AppMapBuilder::new()
            .call(1, "A", "a")
            .call(2, "B", "b")
            .ret(3, 2)
            .build();
        let mut cursor = EventCursor::new(&appmap);
        let anchor = cursor.next_call().unwrap();
        assert!(!cursor.skip_to_matching_return(anchor));
        assert!(cursor.next_call().is_none());
    }
}
