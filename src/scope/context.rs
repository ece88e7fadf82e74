use crate::appmap::{AppMap, EventRef};
use crate::labels::{DataObjectSummary, process_labels};

use super::cursor::EventCursor;

/// A labeled AppMap together with its data-object summaries. Immutable once
/// built and shared by every check evaluated against the file.
#[derive(Debug)]
pub struct AppMapContext {
    appmap: AppMap,
    data_objects: Vec<DataObjectSummary>,
}

impl AppMapContext {
    pub fn new(mut appmap: AppMap) -> Self {
        let data_objects = process_labels(&mut appmap);
        Self {
            appmap,
            data_objects,
        }
    }

    pub fn appmap(&self) -> &AppMap {
        &self.appmap
    }

    pub fn into_appmap(self) -> AppMap {
        self.appmap
    }

    pub fn data_objects(&self) -> &[DataObjectSummary] {
        &self.data_objects
    }

    pub fn event(&self, index: usize) -> Option<EventRef<'_>> {
        self.appmap.get(index)
    }

    pub fn cursor(&self) -> EventCursor<'_> {
        EventCursor::new(&self.appmap)
    }
}
