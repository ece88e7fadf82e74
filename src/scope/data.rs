use super::{AppMapContext, Scope, ScopeIterator, Scopes};

/// One scope per data-object group.
pub struct DataScope;

impl ScopeIterator for DataScope {
    fn scopes<'a>(&self, context: &'a AppMapContext) -> Scopes<'a> {
        Box::new(context.data_objects().iter().map(Scope::Data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::AppMapBuilder;
    use serde_json::json;

    #[test]
    fn test_one_scope_per_group() {
        let context = AppMapBuilder::new()
            .raw(json!({
                "id": 1, "event": "call", "thread_id": 1,
                "defined_class": "Session", "method_id": "create",
                "parameters": [
                    {"name": "login", "value": "alice"},
                    {"name": "password", "value": "hunter22"}
                ]
            }))
            .ret(2, 1)
            .context();
        let scopes: Vec<_> = DataScope.scopes(&context).collect();
        assert_eq!(scopes.len(), 2);
        assert!(scopes.iter().all(|scope| matches!(scope, Scope::Data(_))));
    }
}
