//! PROV-JSON encoder.
//!
//! Produces one JSON object per graph. Records are grouped under their
//! keyword (`entity`, `wasGeneratedBy`, ...) and keyed by their display id.
//! Agents appear under `entity` and are listed again by id under `agent`.
//! Nested accounts go under `account`, keyed by their resolved id, and carry
//! their `asserter`. The root object also carries the `prefix` table.

use indexmap::IndexMap;
use log::{debug, info};
use serde_json::{json, Map, Value};

use crate::bundle::Bundle;
use crate::document::Document;
use crate::error::{ProvError, Result};
use crate::identifier::QualifiedName;
use crate::namespaces;
use crate::record::{FieldValue, Record, RecordKind};
use crate::resolver::{build_prefix_table, PrefixTable};
use crate::serializer::ids::IdMap;
use crate::value::{AttributeKey, AttributeValue, Attributes, LiteralValue};

/// Encodes `document` as a PROV-JSON tree.
///
/// The document is not modified; ids and prefixes are computed afresh on
/// every call and are identical across calls on an unchanged document.
///
/// # Errors
///
/// Returns [`ProvError::DanglingReference`] if a relation references a record
/// that is not part of `document`, and [`ProvError::DuplicateIdentifier`] if
/// two records of one graph, or two sibling accounts, render to the same id.
pub fn to_prov_json(document: &Document) -> Result<Value> {
    let table = build_prefix_table(document);
    let ids = IdMap::assign(document.root(), &table)?;
    let encoder = Encoder::new(&table, &ids);

    let mut out = encoder.encode_bundle(document.root())?;
    out.insert("prefix".to_owned(), table.to_json());
    info!(records = ids.len(), prefixes = table.len(); "Encoded PROV-JSON document");
    Ok(Value::Object(out))
}

/// Shared state of one encode call.
struct Encoder<'a> {
    table: &'a PrefixTable,
    ids: &'a IdMap,
    // Datatype tags, resolved once.
    xsd_integer: String,
    xsd_float: String,
    xsd_date_time: String,
    prov_array: String,
}

impl<'a> Encoder<'a> {
    fn new(table: &'a PrefixTable, ids: &'a IdMap) -> Self {
        Self {
            table,
            ids,
            xsd_integer: table.resolve(&namespaces::xsd_integer()),
            xsd_float: table.resolve(&namespaces::xsd_float()),
            xsd_date_time: table.resolve(&namespaces::xsd_date_time()),
            prov_array: table.resolve(&namespaces::prov_array()),
        }
    }

    fn encode_bundle(&self, bundle: &Bundle) -> Result<Map<String, Value>> {
        let mut sections: IndexMap<&'static str, Map<String, Value>> = IndexMap::new();
        let mut agents = Vec::new();

        for record in bundle.elements().chain(bundle.relations()) {
            let id = self.id_of(record)?;
            if record.kind() == RecordKind::Agent {
                agents.push(Value::String(id.clone()));
            }
            let body = self.encode_record(record, &id)?;
            sections
                .entry(record.kind().keyword())
                .or_default()
                .insert(id, Value::Object(body));
        }

        let mut out = Map::new();
        for (keyword, records) in sections {
            out.insert(keyword.to_owned(), Value::Object(records));
        }
        if !agents.is_empty() {
            out.insert("agent".to_owned(), Value::Array(agents));
        }

        if !bundle.sub_graphs().is_empty() {
            let mut accounts = Map::new();
            for account in bundle.sub_graphs() {
                let mut fragment = self.encode_bundle(account)?;
                if let Some(asserter) = account.asserter() {
                    fragment.insert("asserter".to_owned(), json!(self.table.resolve(asserter)));
                }
                self.encode_attributes(account.attributes(), &mut fragment);
                accounts.insert(self.table.resolve(account.id()), Value::Object(fragment));
            }
            out.insert("account".to_owned(), Value::Object(accounts));
        }

        debug!(bundle:% = bundle.id(), keys = out.len(); "Encoded graph");
        Ok(out)
    }

    fn id_of(&self, record: &Record) -> Result<String> {
        self.ids
            .get(record.key())
            .map(str::to_owned)
            .ok_or_else(|| ProvError::DanglingReference {
                record: record.kind().to_string(),
                field: "id",
                target: record.key(),
            })
    }

    fn encode_record(&self, record: &Record, id: &str) -> Result<Map<String, Value>> {
        let mut body = Map::new();
        for field in record.fields() {
            let value = match field.value {
                FieldValue::Ref(target) => {
                    let target_id =
                        self.ids
                            .get(target)
                            .ok_or_else(|| ProvError::DanglingReference {
                                record: id.to_owned(),
                                field: field.key,
                                target,
                            })?;
                    json!(target_id)
                }
                FieldValue::Time(time) => json!([time.to_iso8601(), self.xsd_date_time]),
            };
            body.insert(field.key.to_owned(), value);
        }
        self.encode_attributes(record.attributes(), &mut body);
        Ok(body)
    }

    /// Appends `attributes` to `out`. Keys already present are kept.
    fn encode_attributes(&self, attributes: &Attributes, out: &mut Map<String, Value>) {
        for (key, value) in attributes {
            let key = match key {
                AttributeKey::Name(name) => self.table.resolve(name),
                AttributeKey::Plain(key) => key.clone(),
            };
            if out.contains_key(&key) {
                continue;
            }
            out.insert(key, self.encode_value(value));
        }
    }

    fn encode_value(&self, value: &AttributeValue) -> Value {
        match value {
            AttributeValue::String(s) => json!(s),
            AttributeValue::Boolean(b) => json!(b),
            AttributeValue::Integer(i) => json!([i.to_string(), self.xsd_integer]),
            AttributeValue::Float(f) => json!([format!("{f:?}"), self.xsd_float]),
            AttributeValue::Timestamp(t) => json!([t.to_iso8601(), self.xsd_date_time]),
            AttributeValue::Name(name) => self.encode_name(name),
            AttributeValue::Literal(literal) => {
                let lexical = match &literal.value {
                    LiteralValue::Lexical(s) => s.clone(),
                    LiteralValue::Name(name) => self.table.resolve(name),
                };
                json!([lexical, self.table.resolve(&literal.datatype)])
            }
            AttributeValue::Array(items) => {
                let encoded: Vec<Value> = items.iter().map(|item| self.encode_value(item)).collect();
                // An array of arrays is emitted as a plain list of its encoded items.
                if items.iter().any(|item| matches!(item, AttributeValue::Array(_))) {
                    Value::Array(encoded)
                } else {
                    json!([encoded, self.prov_array])
                }
            }
        }
    }

    fn encode_name(&self, name: &QualifiedName) -> Value {
        let display = self.table.resolve(name);
        let tag = if display == name.full_name() {
            "xsd:anyURI"
        } else {
            "xsd:QName"
        };
        json!([display, tag])
    }
}
