use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::appmap::{EventRef, Parameter, sql};
use crate::secrets::looks_secret;

/// A value observed flowing through an event, with the labels derived for it.
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    pub event: usize,
    pub name: Option<String>,
    pub class: Option<String>,
    pub value: String,
    pub object_id: Option<u64>,
    pub labels: BTreeSet<String>,
}

impl DataObject {
    /// `None` for parameters recorded without a value.
    pub(crate) fn from_parameter(event: usize, parameter: &Parameter) -> Option<Self> {
        Some(Self {
            event,
            name: parameter.name.clone(),
            class: parameter.class.clone(),
            value: parameter.value.clone()?,
            object_id: parameter.object_id,
            labels: BTreeSet::new(),
        })
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

pub const HEXADECIMAL: &str = "hexadecimal";
pub const SECRET: &str = "secret";
pub const CONTENT_PASSWORD: &str = "content.password";
pub const CONTENT_API_KEY: &str = "content.api_key";
pub const CONTENT_PRIVATE_KEY: &str = "content.private_key";
pub const CRYPTO_BCRYPT: &str = "crypto.bcrypt";
pub const SOURCE_USER: &str = "source.user";
pub const STORAGE_DATABASE: &str = "storage.database";

static HEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-fA-F\d]+$").expect("hexadecimal regex"));
static PASSWORD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)password").expect("password regex"));
static API_KEY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)api_?key").expect("api key regex"));
static PRIVATE_KEY_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)private_?key").expect("private key regex"));
pub(crate) static BCRYPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$2[abxy]?\$(?:0[4-9]|[12][0-9]|3[01])\$[./0-9a-zA-Z]{53}$").expect("bcrypt regex")
});

fn name_matches(object: &DataObject, regex: &Regex) -> bool {
    object.name.as_deref().is_some_and(|name| regex.is_match(name))
}

/// Labels for a data object observed on `event`.
pub fn data_object_labels(object: &DataObject, event: EventRef<'_>) -> BTreeSet<String> {
    let resolvers: [(&str, bool); 8] = [
        (HEXADECIMAL, HEX.is_match(&object.value)),
        (SECRET, looks_secret(&object.value)),
        (CONTENT_PASSWORD, name_matches(object, &PASSWORD_NAME)),
        (CONTENT_API_KEY, name_matches(object, &API_KEY_NAME)),
        (CONTENT_PRIVATE_KEY, name_matches(object, &PRIVATE_KEY_NAME)),
        (CRYPTO_BCRYPT, BCRYPT.is_match(&object.value)),
        (SOURCE_USER, event.http_server_request().is_some()),
        (STORAGE_DATABASE, event.sql_query().is_some_and(sql::is_write)),
    ];
    resolvers
        .into_iter()
        .filter(|(_, matched)| *matched)
        .map(|(label, _)| label.to_string())
        .collect()
}
