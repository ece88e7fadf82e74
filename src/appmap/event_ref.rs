use std::fmt;

use super::AppMap;
use super::code_object::{CodeObject, CodeObjectKind};
use super::event::{
    Event, Exception, HttpClientRequest, HttpResponse, HttpServerRequest, Parameter,
};

/// Borrowed handle to one event of an [`AppMap`].
#[derive(Clone, Copy)]
pub struct EventRef<'a> {
    appmap: &'a AppMap,
    index: usize,
}

impl<'a> EventRef<'a> {
    pub(crate) fn new(appmap: &'a AppMap, index: usize) -> Self {
        Self { appmap, index }
    }

    pub fn index(self) -> usize {
        self.index
    }

    pub fn appmap(self) -> &'a AppMap {
        self.appmap
    }

    pub fn event(self) -> &'a Event {
        self.appmap.raw_event(self.index)
    }

    pub fn id(self) -> u64 {
        self.event().id
    }

    pub fn is_call(self) -> bool {
        self.event().is_call()
    }

    pub fn is_return(self) -> bool {
        self.event().is_return()
    }

    pub fn code_object(self) -> &'a CodeObject {
        self.appmap.code_object_at(self.event().code_object)
    }

    pub fn parent(self) -> Option<EventRef<'a>> {
        self.event().parent.map(|index| Self::new(self.appmap, index))
    }

    /// For a return event, the call it closes.
    pub fn call_event(self) -> Option<EventRef<'a>> {
        self.event().call.map(|index| Self::new(self.appmap, index))
    }

    pub fn return_event(self) -> Option<EventRef<'a>> {
        self.event()
            .return_event
            .map(|index| Self::new(self.appmap, index))
    }

    pub fn children(self) -> impl Iterator<Item = EventRef<'a>> {
        let appmap = self.appmap;
        self.event()
            .children
            .iter()
            .map(move |&index| Self::new(appmap, index))
    }

    pub fn ancestors(self) -> Ancestors<'a> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Every call beneath this one, depth first in recording order.
    pub fn descendants(self) -> Descendants<'a> {
        let mut stack: Vec<usize> = self.event().children.clone();
        stack.reverse();
        Descendants {
            appmap: self.appmap,
            stack,
        }
    }

    fn call_side(self) -> &'a Event {
        match self.call_event() {
            Some(call) => call.event(),
            None => self.event(),
        }
    }

    fn return_side(self) -> Option<&'a Event> {
        if self.is_return() {
            return Some(self.event());
        }
        self.return_event().map(|ret| ret.event())
    }

    pub fn elapsed(self) -> Option<f64> {
        self.return_side().and_then(|ret| ret.elapsed)
    }

    pub fn http_server_request(self) -> Option<&'a HttpServerRequest> {
        self.call_side().http_server_request.as_ref()
    }

    pub fn http_server_response(self) -> Option<&'a HttpResponse> {
        self.return_side()
            .and_then(|ret| ret.http_server_response.as_ref())
            .or(self.event().http_server_response.as_ref())
    }

    pub fn http_client_request(self) -> Option<&'a HttpClientRequest> {
        self.call_side().http_client_request.as_ref()
    }

    pub fn http_client_response(self) -> Option<&'a HttpResponse> {
        self.return_side()
            .and_then(|ret| ret.http_client_response.as_ref())
            .or(self.event().http_client_response.as_ref())
    }

    pub fn sql_query(self) -> Option<&'a str> {
        self.call_side().sql_query.as_ref().map(|q| q.sql.as_str())
    }

    pub fn database_type(self) -> Option<&'a str> {
        self.call_side()
            .sql_query
            .as_ref()
            .and_then(|q| q.database_type.as_deref())
    }

    /// `METHOD /normalized/path` of an HTTP server request.
    pub fn route(self) -> Option<&'a str> {
        let code_object = self.code_object();
        (code_object.kind == CodeObjectKind::Route).then_some(code_object.id.as_str())
    }

    pub fn is_function(self) -> bool {
        let call = self.call_side();
        call.http_server_request.is_none()
            && call.http_client_request.is_none()
            && call.sql_query.is_none()
    }

    pub fn location(self) -> Option<&'a str> {
        self.code_object().location.as_deref()
    }

    /// Labels of the code object together with labels attached to this event.
    pub fn labels(self) -> impl Iterator<Item = &'a str> {
        self.code_object()
            .labels
            .iter()
            .chain(self.call_side().labels.iter())
            .map(String::as_str)
    }

    pub fn has_label(self, label: &str) -> bool {
        self.code_object().has_label(label) || self.call_side().labels.contains(label)
    }

    pub fn receiver(self) -> Option<&'a Parameter> {
        self.call_side().receiver.as_ref()
    }

    pub fn parameters(self) -> &'a [Parameter] {
        &self.call_side().parameters
    }

    pub fn return_value(self) -> Option<&'a Parameter> {
        self.return_side().and_then(|ret| ret.return_value.as_ref())
    }

    pub fn exceptions(self) -> &'a [Exception] {
        self.return_side()
            .map(|ret| ret.exceptions.as_slice())
            .unwrap_or_default()
    }

    /// Values that flowed through this call.
    pub fn data_objects(self) -> Vec<&'a Parameter> {
        let call = self.call_side();
        call.parameters
            .iter()
            .chain(call.receiver.iter())
            .chain(call.message.iter())
            .chain(self.return_value())
            .collect()
    }
}

impl PartialEq for EventRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.appmap, other.appmap) && self.index == other.index
    }
}

impl Eq for EventRef<'_> {}

impl fmt::Debug for EventRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRef")
            .field("id", &self.id())
            .field("index", &self.index)
            .finish()
    }
}

impl fmt::Display for EventRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sql) = self.sql_query() {
            return write!(f, "{sql}");
        }
        write!(f, "{}", self.code_object().id)?;
        if let Some(response) = self.http_server_response()
            && self.http_server_request().is_some()
        {
            write!(f, " ({})", response.status)?;
        }
        Ok(())
    }
}

pub struct Ancestors<'a> {
    next: Option<EventRef<'a>>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = EventRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

pub struct Descendants<'a> {
    appmap: &'a AppMap,
    stack: Vec<usize>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = EventRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let event = EventRef::new(self.appmap, index);
        self.stack.extend(event.event().children.iter().rev());
        Some(event)
    }
}
