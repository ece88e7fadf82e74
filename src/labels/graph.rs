use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use super::data_object::{DataObject, STORAGE_DATABASE, data_object_labels};
use crate::appmap::{AppMap, Parameter, sql};

/// Roll-up of one group of related data objects: every value the group took,
/// the events it passed through, and the union of the labels found on it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataObjectSummary {
    pub values: Vec<String>,
    /// Event indexes in first-seen order.
    pub events: Vec<usize>,
    pub data_objects: Vec<DataObject>,
    pub labels: BTreeSet<String>,
}

impl DataObjectSummary {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

#[derive(Debug, Default)]
struct DataObjectGraph {
    values: Vec<String>,
    data_objects: Vec<DataObject>,
    /// Events that mention one of the values, e.g. SQL embedding it.
    references: Vec<usize>,
}

impl DataObjectGraph {
    fn add(&mut self, object: DataObject) {
        if !self.values.contains(&object.value) {
            self.values.push(object.value.clone());
        }
        self.data_objects.push(object);
    }

    fn add_reference(&mut self, event: usize, text: &str) {
        if self
            .values
            .iter()
            .any(|value| !value.is_empty() && text.contains(value.as_str()))
        {
            self.references.push(event);
        }
    }

    fn summarize(self, appmap: &AppMap) -> DataObjectSummary {
        let mut labels = BTreeSet::new();
        let mut events = Vec::new();
        for object in &self.data_objects {
            labels.extend(object.labels.iter().cloned());
            if !events.contains(&object.event) {
                events.push(object.event);
            }
        }
        for &reference in &self.references {
            if let Some(event) = appmap.get(reference)
                && event.sql_query().is_some_and(sql::is_write)
            {
                labels.insert(STORAGE_DATABASE.to_string());
            }
            if !events.contains(&reference) {
                events.push(reference);
            }
        }
        DataObjectSummary {
            values: self.values,
            events,
            data_objects: self.data_objects,
            labels,
        }
    }
}

/// Groups data objects by object id, falling back to value equality.
#[derive(Debug, Default)]
pub(crate) struct DataObjectGraphCollection {
    graphs: Vec<DataObjectGraph>,
    by_value: FxHashMap<String, usize>,
    by_object_id: FxHashMap<u64, usize>,
}

impl DataObjectGraphCollection {
    fn graph_for(&mut self, object: &DataObject) -> usize {
        if let Some(id) = object.object_id
            && let Some(&graph) = self.by_object_id.get(&id)
        {
            self.by_value.entry(object.value.clone()).or_insert(graph);
            return graph;
        }
        if let Some(&graph) = self.by_value.get(&object.value) {
            if let Some(id) = object.object_id {
                self.by_object_id.insert(id, graph);
            }
            return graph;
        }

        self.graphs.push(DataObjectGraph::default());
        let graph = self.graphs.len() - 1;
        self.by_value.insert(object.value.clone(), graph);
        if let Some(id) = object.object_id {
            self.by_object_id.insert(id, graph);
        }
        graph
    }

    pub(crate) fn add(&mut self, appmap: &AppMap, event: usize, parameter: &Parameter) {
        let Some(mut object) = DataObject::from_parameter(event, parameter) else {
            return;
        };
        if let Some(event_ref) = appmap.get(event) {
            object.labels = data_object_labels(&object, event_ref);
        }
        let graph = self.graph_for(&object);
        self.graphs[graph].add(object);
    }

    pub(crate) fn add_event_reference(&mut self, event: usize, sql: &str) {
        for graph in &mut self.graphs {
            graph.add_reference(event, sql);
        }
    }

    pub(crate) fn summarize(self, appmap: &AppMap) -> Vec<DataObjectSummary> {
        self.graphs
            .into_iter()
            .map(|graph| graph.summarize(appmap))
            .collect()
    }
}
