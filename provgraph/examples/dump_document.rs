//! Builds a small provenance document and prints it as PROV-JSON.
//!
//! Run with: `RUST_LOG=debug cargo run --example dump_document -p provgraph`

use chrono::{TimeZone, Utc};
use provgraph::{AttributeValue, Document, Namespace, Record, Timestamp};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let ex = Namespace::new("ex", "http://example.org/");
    let tools = Namespace::new("ex", "http://tools.example.org/");

    let mut doc = Document::new();
    doc.add_namespace("ex", ex.uri())?;

    let started: Timestamp = Utc
        .with_ymd_and_hms(2012, 3, 31, 9, 0, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("invalid start time"))?
        .into();
    let report = doc.add(
        Record::entity()
            .with_id(ex.name("report"))?
            .with_attribute(ex.name("pages"), 12)
            .with_attribute(ex.name("draft"), false),
    )?;
    let compile = doc.add(
        Record::activity()
            .with_id(ex.name("compile"))?
            .started_at(started)
            .with_attribute(tools.name("compiler"), AttributeValue::Name(tools.name("latex"))),
    )?;
    let alice = doc.add_agent(Some(ex.name("alice")))?;
    doc.add_generation(report, compile, Some(started))?;
    doc.add_association(compile, alice)?;

    let review = doc.add_sub_graph(ex.name("review"), ex.name("bob"))?;
    review.set_attribute(ex.name("verdict"), "approved");
    let copy = review.add_entity(None)?;
    let read = review.add_activity(None, None, None)?;
    review.add_usage(read, copy, None)?;

    let json = doc.to_prov_json()?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
