//! Event labels and the data-object graph.

mod data_object;
mod graph;

pub use data_object::{
    CONTENT_API_KEY, CONTENT_PASSWORD, CONTENT_PRIVATE_KEY, CRYPTO_BCRYPT, DataObject, HEXADECIMAL,
    SECRET, SOURCE_USER, STORAGE_DATABASE, data_object_labels,
};
pub(crate) use data_object::BCRYPT;
pub use graph::DataObjectSummary;

use graph::DataObjectGraphCollection;
use tracing::trace;

use crate::appmap::AppMap;

pub const SQL: &str = "sql";

/// Attach derived event labels and group every recorded value into
/// data-object summaries.
pub fn process_labels(appmap: &mut AppMap) -> Vec<DataObjectSummary> {
    let sql_events: Vec<usize> = appmap
        .call_events()
        .filter(|event| event.sql_query().is_some())
        .map(|event| event.index())
        .collect();
    for &index in &sql_events {
        appmap.add_label(index, SQL);
    }

    let appmap = &*appmap;
    let mut collection = DataObjectGraphCollection::default();
    for event in appmap.call_events() {
        for parameter in event.data_objects() {
            collection.add(appmap, event.index(), parameter);
        }
    }

    // References are attached once all groups exist so that a query can refer
    // to a value recorded after it.
    for &index in &sql_events {
        if let Some(sql) = appmap.get(index).and_then(|event| event.sql_query()) {
            collection.add_event_reference(index, sql);
        }
    }

    let summaries = collection.summarize(appmap);
    trace!(groups = summaries.len(), "Summarized data objects");
    summaries
}
