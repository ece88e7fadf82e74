use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::event::Event;
use super::sql::normalize_sql;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeObjectKind {
    Function,
    Route,
    Query,
    ExternalService,
}

impl CodeObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeObjectKind::Function => "function",
            CodeObjectKind::Route => "route",
            CodeObjectKind::Query => "query",
            CodeObjectKind::ExternalService => "external-route",
        }
    }
}

/// The code construct an event executed: a function from the class map, or a
/// route, query or external service synthesized from the event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub kind: CodeObjectKind,
    pub id: String,
    pub package: Option<String>,
    pub class: Option<String>,
    pub method: Option<String>,
    pub location: Option<String>,
    pub labels: BTreeSet<String>,
}

impl CodeObject {
    pub fn fqid(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    fn synthetic(kind: CodeObjectKind, id: String) -> Self {
        Self {
            kind,
            id,
            package: None,
            class: None,
            method: None,
            location: None,
            labels: BTreeSet::new(),
        }
    }
}

/// Raw `classMap` entry as recorded in the AppMap file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassMapEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub children: Vec<ClassMapEntry>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
struct FunctionEntry {
    package: Option<String>,
    class: String,
    location: Option<String>,
    labels: BTreeSet<String>,
}

type FunctionKey = (String, String, bool);

/// Function lookup table built from the class map.
///
/// Recorders name classes differently (`Foo::Bar` for Ruby, `com.acme.Foo` for
/// Java), so each function is reachable under every spelling of its class.
#[derive(Debug, Default)]
pub(crate) struct ClassMapIndex {
    functions: FxHashMap<FunctionKey, FunctionEntry>,
}

impl ClassMapIndex {
    pub(crate) fn build(entries: &[ClassMapEntry]) -> Self {
        let mut index = Self::default();
        let mut packages = Vec::new();
        let mut classes = Vec::new();
        for entry in entries {
            index.walk(entry, &mut packages, &mut classes);
        }
        index
    }

    fn walk<'e>(
        &mut self,
        entry: &'e ClassMapEntry,
        packages: &mut Vec<&'e str>,
        classes: &mut Vec<&'e str>,
    ) {
        match entry.kind.as_str() {
            "package" => {
                packages.push(&entry.name);
                for child in &entry.children {
                    self.walk(child, packages, classes);
                }
                packages.pop();
            }
            "class" => {
                classes.push(&entry.name);
                for child in &entry.children {
                    self.walk(child, packages, classes);
                }
                classes.pop();
            }
            "function" => self.insert_function(entry, packages, classes),
            _ => {}
        }
    }

    fn insert_function(&mut self, entry: &ClassMapEntry, packages: &[&str], classes: &[&str]) {
        let Some(last_class) = classes.last() else {
            return;
        };
        let ruby_name = classes.join("::");
        let function = FunctionEntry {
            package: (!packages.is_empty()).then(|| packages.join("/")),
            class: ruby_name.clone(),
            location: entry.location.clone(),
            labels: entry.labels.iter().cloned().collect(),
        };

        let mut spellings = vec![ruby_name, classes.join(".")];
        if !packages.is_empty() {
            spellings.push(format!("{}.{}", packages.join("."), classes.join(".")));
        }
        spellings.push((*last_class).to_string());

        for class_name in spellings {
            self.functions
                .entry((class_name, entry.name.clone(), entry.is_static))
                .or_insert_with(|| function.clone());
        }
    }

    fn lookup(&self, defined_class: &str, method: &str, is_static: bool) -> Option<&FunctionEntry> {
        let key = |class: &str| (class.to_string(), method.to_string(), is_static);
        self.functions.get(&key(defined_class)).or_else(|| {
            let simple = defined_class
                .rsplit(['.', ':'])
                .find(|segment| !segment.is_empty())?;
            self.functions.get(&key(simple))
        })
    }

    /// Resolve the code object an event executed.
    pub(crate) fn resolve(&self, event: &Event) -> CodeObject {
        if let Some(request) = &event.http_server_request {
            let path = request
                .normalized_path_info
                .as_deref()
                .unwrap_or(&request.path_info);
            return CodeObject::synthetic(
                CodeObjectKind::Route,
                format!("{} {}", request.request_method, path),
            );
        }
        if let Some(query) = &event.sql_query {
            return CodeObject::synthetic(CodeObjectKind::Query, normalize_sql(&query.sql));
        }
        if let Some(request) = &event.http_client_request {
            let url = request.url.split('?').next().unwrap_or_default();
            return CodeObject::synthetic(
                CodeObjectKind::ExternalService,
                format!("{} {}", request.request_method, url),
            );
        }

        let defined_class = event.defined_class.clone().unwrap_or_default();
        let method = event.method_id.clone().unwrap_or_default();
        let separator = if event.is_static { '.' } else { '#' };

        if let Some(function) = self.lookup(&defined_class, &method, event.is_static) {
            let id = match &function.package {
                Some(package) => format!("{package}/{}{separator}{method}", function.class),
                None => format!("{}{separator}{method}", function.class),
            };
            return CodeObject {
                kind: CodeObjectKind::Function,
                id,
                package: function.package.clone(),
                class: Some(function.class.clone()),
                method: Some(method),
                location: function.location.clone().or_else(|| event_location(event)),
                labels: function.labels.clone(),
            };
        }

        let (package, class) = split_defined_class(&defined_class);
        let id = match &package {
            Some(package) => format!("{package}/{class}{separator}{method}"),
            None => format!("{class}{separator}{method}"),
        };
        CodeObject {
            kind: CodeObjectKind::Function,
            id,
            package,
            class: Some(class),
            method: Some(method),
            location: event_location(event),
            labels: BTreeSet::new(),
        }
    }
}

fn event_location(event: &Event) -> Option<String> {
    let path = event.path.as_deref()?;
    Some(match event.lineno {
        Some(line) => format!("{path}:{line}"),
        None => path.to_string(),
    })
}

/// `com.acme.Foo` splits into package `com/acme` and class `Foo`; Ruby style
/// `Acme::Foo` names carry no package.
fn split_defined_class(defined_class: &str) -> (Option<String>, String) {
    if defined_class.contains("::") {
        return (None, defined_class.to_string());
    }
    match defined_class.rsplit_once('.') {
        Some((package, class)) => (Some(package.replace('.', "/")), class.to_string()),
        None => (None, defined_class.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_map() -> Vec<ClassMapEntry> {
        serde_json::from_str(
            r#"[{
                "name": "app", "type": "package", "children": [{
                    "name": "models", "type": "package", "children": [{
                        "name": "User", "type": "class", "children": [{
                            "name": "authenticate", "type": "function", "static": false,
                            "location": "app/models/user.rb:10",
                            "labels": ["security.authentication"]
                        }]
                    }]
                }]
            }]"#,
        )
        .unwrap()
    }

    fn function_event(defined_class: &str, method: &str) -> Event {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "event": "call",
            "defined_class": defined_class,
            "method_id": method,
            "path": "lib/other.rb",
            "lineno": 3
        }))
        .unwrap()
    }

    #[test]
    fn test_resolve_function_from_class_map() {
        let index = ClassMapIndex::build(&class_map());
        let code_object = index.resolve(&function_event("User", "authenticate"));
        assert_eq!(code_object.kind, CodeObjectKind::Function);
        assert_eq!(code_object.id, "app/models/User#authenticate");
        assert_eq!(code_object.package.as_deref(), Some("app/models"));
        assert_eq!(code_object.location.as_deref(), Some("app/models/user.rb:10"));
        assert!(code_object.has_label("security.authentication"));
        assert_eq!(code_object.fqid(), "function:app/models/User#authenticate");
    }

    #[test]
    fn test_resolve_function_by_dotted_name() {
        let index = ClassMapIndex::build(&class_map());
        let code_object = index.resolve(&function_event("app.models.User", "authenticate"));
        assert_eq!(code_object.id, "app/models/User#authenticate");
    }

    #[test]
    fn test_synthesize_unknown_function() {
        let index = ClassMapIndex::build(&class_map());
        let code_object = index.resolve(&function_event("com.acme.Billing", "charge"));
        assert_eq!(code_object.id, "com/acme/Billing#charge");
        assert_eq!(code_object.package.as_deref(), Some("com/acme"));
        assert_eq!(code_object.location.as_deref(), Some("lib/other.rb:3"));
        assert!(code_object.labels.is_empty());
    }

    #[test]
    fn test_resolve_route_prefers_normalized_path() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": 1,
            "event": "call",
            "http_server_request": {
                "request_method": "GET",
                "path_info": "/users/5",
                "normalized_path_info": "/users/{id}"
            }
        }))
        .unwrap();
        let code_object = ClassMapIndex::default().resolve(&event);
        assert_eq!(code_object.kind, CodeObjectKind::Route);
        assert_eq!(code_object.fqid(), "route:GET /users/{id}");
    }

    #[test]
    fn test_resolve_query_is_normalized() {
        let event: Event = serde_json::from_value(serde_json::json!({
            "id": 1,
            "event": "call",
            "sql_query": {"sql": "SELECT * FROM users WHERE id = 5", "database_type": "postgres"}
        }))
        .unwrap();
        let code_object = ClassMapIndex::default().resolve(&event);
        assert_eq!(code_object.id, "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn test_split_defined_class() {
        assert_eq!(
            split_defined_class("Acme::Foo"),
            (None, "Acme::Foo".to_string())
        );
        assert_eq!(
            split_defined_class("org.example.Foo"),
            (Some("org/example".to_string()), "Foo".to_string())
        );
    }
}
