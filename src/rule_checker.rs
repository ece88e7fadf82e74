//! Evaluates one check against one AppMap.

use tracing::{debug, trace};

use crate::appmap::EventRef;
use crate::check::{Check, CheckInstance};
use crate::error::RuleError;
use crate::finding::{Finding, FindingEvent};
use crate::rules::MatchResult;
use crate::scope::{AppMapContext, Scope};

#[derive(Debug, Default, Clone, Copy)]
pub struct RuleChecker;

impl RuleChecker {
    pub fn new() -> Self {
        Self
    }

    /// Append the findings of `instance` on `context` to `findings`.
    pub fn check(
        &self,
        file: &str,
        context: &AppMapContext,
        instance: &mut CheckInstance<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), RuleError> {
        let check = instance.check;
        debug!(
            file,
            appmap = context.appmap().name().unwrap_or_default(),
            check = %check.id,
            scope = %check.scope,
            "Checking AppMap"
        );

        for scope in check.scope.iterator().scopes(context) {
            match scope {
                Scope::Event(scope) => {
                    let anchor = scope.anchor();
                    trace!(scope = %anchor, "Scope");
                    if !check.filter_scope(anchor) {
                        continue;
                    }
                    if instance.enumerate_scope() {
                        for event in scope.into_events() {
                            self.check_event(file, event, anchor, context, instance, findings)?;
                        }
                    } else {
                        self.check_event(file, anchor, anchor, context, instance, findings)?;
                    }
                }
                Scope::Data(summary) => {
                    let Some(anchor) = summary.events.first().and_then(|&i| context.event(i))
                    else {
                        continue;
                    };
                    if !check.filter_scope(anchor) {
                        continue;
                    }
                    let result = instance.logic.data_matcher(summary, context)?;
                    self.record(file, result, anchor, anchor, context, instance, findings)?;
                }
            }
        }
        Ok(())
    }

    fn check_event(
        &self,
        file: &str,
        event: EventRef<'_>,
        scope: EventRef<'_>,
        context: &AppMapContext,
        instance: &mut CheckInstance<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), RuleError> {
        if !event.is_call() {
            return Ok(());
        }
        trace!(
            rule = instance.rule_id(),
            event = event.id(),
            code_object = %event.code_object().fqid(),
            "Asserting"
        );
        if event.return_event().is_none() {
            trace!(event = event.id(), "Event has no return event, skipping");
            return Ok(());
        }

        let check = instance.check;
        if !instance.logic.where_clause(event, context) || !check.filter_event(event) {
            return Ok(());
        }

        let filter = |candidate: EventRef<'_>| check.filter_event(candidate);
        let result = instance.logic.matcher(event, context, &filter)?;
        self.record(file, result, event, scope, context, instance, findings)
    }

    #[allow(clippy::too_many_arguments)]
    fn record(
        &self,
        file: &str,
        result: MatchResult,
        event: EventRef<'_>,
        scope: EventRef<'_>,
        context: &AppMapContext,
        instance: &CheckInstance<'_>,
        findings: &mut Vec<Finding>,
    ) -> Result<(), RuleError> {
        let check = instance.check;
        let before = findings.len();
        match result {
            MatchResult::NoMatch => {}
            MatchResult::Match { message } => {
                let message = message.or_else(|| instance.logic.message(scope, event));
                findings.push(
                    FindingBuilder::new(file, check, event, scope)
                        .message(message)
                        .build(),
                );
            }
            MatchResult::Matches(records) => {
                let lookup = |index: usize| {
                    context.event(index).ok_or_else(|| RuleError::UnknownEvent {
                        rule: check.rule.id.to_string(),
                        index,
                    })
                };
                for record in records {
                    let matched = lookup(record.event)?;
                    let related = record
                        .related_events
                        .iter()
                        .map(|&index| lookup(index).map(FindingEvent::from_event))
                        .collect::<Result<Vec<_>, _>>()?;
                    let mut finding = FindingBuilder::new(file, check, matched, scope)
                        .message(record.message)
                        .build();
                    finding.group_message = record.group_message;
                    finding.occurrence_count = record.occurrence_count;
                    finding.related_events = related;
                    findings.push(finding);
                }
            }
        }
        for finding in &findings[before..] {
            debug!(rule = %finding.rule_id, message = %finding.message, "Finding");
        }
        Ok(())
    }
}

struct FindingBuilder<'a, 'e> {
    file: &'a str,
    check: &'a Check,
    event: EventRef<'e>,
    scope: EventRef<'e>,
    message: Option<String>,
}

impl<'a, 'e> FindingBuilder<'a, 'e> {
    fn new(file: &'a str, check: &'a Check, event: EventRef<'e>, scope: EventRef<'e>) -> Self {
        Self {
            file,
            check,
            event,
            scope,
            message: None,
        }
    }

    fn message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    fn build(self) -> Finding {
        let rule = self.check.rule;
        let event = FindingEvent::from_event(self.event);
        Finding {
            app_map_file: Some(self.file.to_string()),
            check_id: self.check.id.clone(),
            rule_id: rule.id.to_string(),
            rule_title: rule.title.to_string(),
            impact_domain: rule.impact_domain,
            hash: Finding::identity_hash(&event.hash, rule.id),
            stack: Finding::stack_of(self.event),
            scope: FindingEvent::from_event(self.scope),
            event,
            message: self.message.unwrap_or_else(|| rule.title.to_string()),
            group_message: None,
            occurrence_count: None,
            related_events: Vec::new(),
        }
    }
}
