#[cfg(test)]
pub mod fixtures {
    use serde_json::{Value, json};
    use std::sync::Arc;

    use crate::appmap::AppMap;
    use crate::check::Check;
    use crate::configuration::{Configuration, load_config};
    use crate::finding::Finding;
    use crate::report::ScanResults;
    use crate::rule_checker::RuleChecker;
    use crate::rules::find_rule;
    use crate::scope::AppMapContext;

    /// Builds AppMap JSON event by event; ids and parent ids are explicit so
    /// tests read like the recordings they stand for.
    #[derive(Default)]
    pub struct AppMapBuilder {
        metadata: Value,
        class_map: Vec<Value>,
        events: Vec<Value>,
    }

    impl AppMapBuilder {
        pub fn new() -> Self {
            Self {
                metadata: json!({"name": "test appmap"}),
                ..Default::default()
            }
        }

        pub fn metadata(mut self, metadata: Value) -> Self {
            self.metadata = metadata;
            self
        }

        pub fn raw(mut self, event: Value) -> Self {
            self.events.push(event);
            self
        }

        /// Merge `fields` into the most recently added event.
        pub fn with(mut self, fields: Value) -> Self {
            if let (Some(Value::Object(event)), Value::Object(fields)) =
                (self.events.last_mut(), fields)
            {
                event.extend(fields);
            }
            self
        }

        pub fn call(self, id: u64, class: &str, method: &str) -> Self {
            self.raw(json!({
                "id": id,
                "event": "call",
                "thread_id": 1,
                "defined_class": class,
                "method_id": method,
                "path": format!("app/{}.rb", class.to_lowercase()),
                "lineno": id,
                "static": false
            }))
        }

        /// A call whose function carries `labels` in the class map.
        pub fn labeled_call(mut self, id: u64, class: &str, method: &str, labels: &[&str]) -> Self {
            self.class_map.push(json!({
                "name": class,
                "type": "class",
                "children": [{
                    "name": method,
                    "type": "function",
                    "static": false,
                    "location": format!("app/{}.rb:{}", class.to_lowercase(), id),
                    "labels": labels
                }]
            }));
            self.call(id, class, method)
        }

        pub fn ret(self, id: u64, parent_id: u64) -> Self {
            self.raw(json!({
                "id": id,
                "event": "return",
                "thread_id": 1,
                "parent_id": parent_id,
                "elapsed": 0.001
            }))
        }

        pub fn ret_value(self, id: u64, parent_id: u64, class: &str, value: &str) -> Self {
            self.raw(json!({
                "id": id,
                "event": "return",
                "thread_id": 1,
                "parent_id": parent_id,
                "elapsed": 0.001,
                "return_value": {"class": class, "value": value}
            }))
        }

        pub fn ret_elapsed(self, id: u64, parent_id: u64, elapsed: f64) -> Self {
            self.raw(json!({
                "id": id,
                "event": "return",
                "thread_id": 1,
                "parent_id": parent_id,
                "elapsed": elapsed
            }))
        }

        pub fn request(self, id: u64, method: &str, path: &str) -> Self {
            self.raw(json!({
                "id": id,
                "event": "call",
                "thread_id": 1,
                "http_server_request": {
                    "request_method": method,
                    "path_info": path,
                    "normalized_path_info": path
                }
            }))
        }

        pub fn response(self, id: u64, parent_id: u64, status: u16, elapsed: f64) -> Self {
            self.raw(json!({
                "id": id,
                "event": "return",
                "thread_id": 1,
                "parent_id": parent_id,
                "elapsed": elapsed,
                "http_server_response": {
                    "status": status,
                    "headers": {"Content-Type": "text/html"}
                }
            }))
        }

        pub fn sql(self, id: u64, sql: &str) -> Self {
            self.raw(json!({
                "id": id,
                "event": "call",
                "thread_id": 1,
                "sql_query": {"sql": sql, "database_type": "postgres"}
            }))
        }

        pub fn to_json(&self) -> String {
            json!({
                "metadata": self.metadata,
                "classMap": self.class_map,
                "events": self.events
            })
            .to_string()
        }

        pub fn build(self) -> AppMap {
            AppMap::from_json(&self.to_json()).unwrap()
        }

        pub fn context(self) -> AppMapContext {
            AppMapContext::new(self.build())
        }
    }

    /// Run the built-in rule `rule_id` with `properties` over `context`.
    pub fn run_rule(rule_id: &str, properties: Value, context: &AppMapContext) -> Vec<Finding> {
        let check = Check::new(find_rule(rule_id).unwrap()).with_options(properties);
        let mut instance = check.instantiate().unwrap();
        let mut findings = Vec::new();
        RuleChecker::new()
            .check("fixture.appmap.json", context, &mut instance, &mut findings)
            .unwrap();
        findings
    }

    /// A single HTTP server request (id 1) answered with `status` (id 2).
    pub fn request_appmap(method: &str, path: &str, status: u16) -> AppMap {
        request_builder(method, path, status).build()
    }

    /// [`request_appmap`] as file content.
    pub fn request_appmap_json(method: &str, path: &str, status: u16) -> String {
        request_builder(method, path, status).to_json()
    }

    fn request_builder(method: &str, path: &str, status: u16) -> AppMapBuilder {
        AppMapBuilder::new()
            .request(1, method, path)
            .response(2, 1, status, 0.01)
    }

    /// Results of a scan with the default checks over `files` (path, metadata).
    pub fn scan_results(findings: Vec<Finding>, files: &[(&str, Value)]) -> ScanResults {
        let loaded = load_config(Configuration::default(), true).unwrap();
        let metadata = files
            .iter()
            .map(|(file, metadata)| {
                (file.to_string(), serde_json::from_value(metadata.clone()).unwrap())
            })
            .collect();
        ScanResults::new(
            Arc::new(loaded.configuration),
            Arc::new(metadata),
            findings,
            Arc::new(loaded.checks),
        )
    }
}
