//! The closed record catalogue: elements, relations, and their typed fields.
//!
//! Every record kind is one variant of [`RecordBody`]; the encoder is driven
//! by [`Record::fields`] and [`RecordKind::keyword`] rather than by
//! per-kind serialisation code.
//!
//! Relations point at other records through [`RecordKey`]s. A key is a
//! non-owning handle: the referenced record lives in exactly one bundle of the
//! same document, possibly a different (nested) one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;
use crate::identifier::{IntoIdentifier, QualifiedName};
use crate::value::{AttributeKey, AttributeValue, Attributes, Timestamp};

static NEXT_NODE: AtomicU64 = AtomicU64::new(0);

/// Mints a process-unique node number. Only construction draws from it.
pub(crate) fn next_node() -> u64 {
    NEXT_NODE.fetch_add(1, Ordering::Relaxed)
}

/// Stable handle of a record, valid for as long as the record exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(u64);

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record #{}", self.0)
    }
}

/// The kind of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A thing, physical or digital.
    Entity,
    /// Something that occurs over time and acts upon entities.
    Activity,
    /// Something that bears responsibility.
    Agent,
    /// A set of annotations.
    Note,
    /// An entity was generated by an activity.
    Generation,
    /// An activity used an entity.
    Usage,
    /// An agent was associated with an activity.
    Association,
    /// An activity was started by an agent.
    Start,
    /// An activity was ended by an agent.
    End,
    /// An agent acted on behalf of another.
    Responsibility,
    /// An entity was derived from another.
    Derivation,
    /// Two entities are alternates of each other.
    Alternate,
    /// One entity specialises another.
    Specialization,
    /// A record is annotated by a note.
    Annotation,
}

impl RecordKind {
    /// Whether records of this kind are elements (as opposed to relations).
    #[must_use]
    pub fn is_element(self) -> bool {
        matches!(
            self,
            RecordKind::Entity | RecordKind::Activity | RecordKind::Agent | RecordKind::Note
        )
    }

    /// The top-level document key records of this kind are grouped under.
    ///
    /// Agents share the `entity` keyword and are listed again under `agent`.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            RecordKind::Entity | RecordKind::Agent => "entity",
            RecordKind::Activity => "activity",
            RecordKind::Note => "note",
            RecordKind::Generation => "wasGeneratedBy",
            RecordKind::Usage => "used",
            RecordKind::Association => "wasAssociatedWith",
            RecordKind::Start => "wasStartedBy",
            RecordKind::End => "wasEndedBy",
            RecordKind::Responsibility => "actedOnBehalfOf",
            RecordKind::Derivation => "wasDerivedFrom",
            RecordKind::Alternate => "alternateOf",
            RecordKind::Specialization => "specializationOf",
            RecordKind::Annotation => "hasAnnotation",
        }
    }

    /// Human-readable notation of the kind.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RecordKind::Entity => "Entity",
            RecordKind::Activity => "Activity",
            RecordKind::Agent => "Agent",
            RecordKind::Note => "Note",
            RecordKind::Generation => "Generation",
            RecordKind::Usage => "Usage",
            RecordKind::Association => "ActivityAssociation",
            RecordKind::Start => "Start",
            RecordKind::End => "End",
            RecordKind::Responsibility => "Responsibility",
            RecordKind::Derivation => "Derivation",
            RecordKind::Alternate => "Alternate",
            RecordKind::Specialization => "Specialization",
            RecordKind::Annotation => "Annotation",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The kind-specific, typed fields of a record.
///
/// Reference fields are [`RecordKey`]s of records elsewhere in the same
/// document; they never own their target.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    /// An entity; no typed fields.
    Entity,
    /// An activity, optionally bounded in time.
    Activity {
        /// When the activity started (`prov:starttime`).
        start_time: Option<Timestamp>,
        /// When the activity ended (`prov:endtime`).
        end_time: Option<Timestamp>,
    },
    /// An agent; no typed fields.
    Agent,
    /// A note; no typed fields.
    Note,
    /// `entity` was generated by `activity`.
    Generation {
        /// The generated entity.
        entity: RecordKey,
        /// The generating activity.
        activity: RecordKey,
        /// When the generation happened.
        time: Option<Timestamp>,
    },
    /// `activity` used `entity`.
    Usage {
        /// The using activity.
        activity: RecordKey,
        /// The used entity.
        entity: RecordKey,
        /// When the usage happened.
        time: Option<Timestamp>,
    },
    /// `agent` was associated with `activity`.
    Association {
        /// The activity.
        activity: RecordKey,
        /// The associated agent.
        agent: RecordKey,
    },
    /// `activity` was started by `agent`.
    Start {
        /// The started activity.
        activity: RecordKey,
        /// The starting agent.
        agent: RecordKey,
    },
    /// `activity` was ended by `agent`.
    End {
        /// The ended activity.
        activity: RecordKey,
        /// The ending agent.
        agent: RecordKey,
    },
    /// `subordinate` acted on behalf of `responsible`.
    Responsibility {
        /// The agent doing the acting.
        subordinate: RecordKey,
        /// The agent bearing responsibility.
        responsible: RecordKey,
    },
    /// `generated_entity` was derived from `used_entity`.
    Derivation {
        /// The derived entity.
        generated_entity: RecordKey,
        /// The entity it was derived from.
        used_entity: RecordKey,
        /// The activity performing the derivation, if known.
        activity: Option<RecordKey>,
        /// The generation of `generated_entity`, if known.
        generation: Option<RecordKey>,
        /// The usage of `used_entity`, if known.
        usage: Option<RecordKey>,
    },
    /// `subject` and `alternate` present aspects of the same thing.
    Alternate {
        /// One entity.
        subject: RecordKey,
        /// Its alternate.
        alternate: RecordKey,
    },
    /// `subject` is a more specific form of `specialization`.
    Specialization {
        /// The specific entity.
        subject: RecordKey,
        /// The general entity.
        specialization: RecordKey,
    },
    /// `note` annotates `record`.
    Annotation {
        /// The annotated record.
        record: RecordKey,
        /// The note.
        note: RecordKey,
    },
}

impl RecordBody {
    /// The kind this body belongs to.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordBody::Entity => RecordKind::Entity,
            RecordBody::Activity { .. } => RecordKind::Activity,
            RecordBody::Agent => RecordKind::Agent,
            RecordBody::Note => RecordKind::Note,
            RecordBody::Generation { .. } => RecordKind::Generation,
            RecordBody::Usage { .. } => RecordKind::Usage,
            RecordBody::Association { .. } => RecordKind::Association,
            RecordBody::Start { .. } => RecordKind::Start,
            RecordBody::End { .. } => RecordKind::End,
            RecordBody::Responsibility { .. } => RecordKind::Responsibility,
            RecordBody::Derivation { .. } => RecordKind::Derivation,
            RecordBody::Alternate { .. } => RecordKind::Alternate,
            RecordBody::Specialization { .. } => RecordKind::Specialization,
            RecordBody::Annotation { .. } => RecordKind::Annotation,
        }
    }
}

/// Value of a typed field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Reference to another record.
    Ref(RecordKey),
    /// A point in time.
    Time(&'a Timestamp),
}

/// One typed field of a record, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypedField<'a> {
    /// Key used in the encoded document (e.g. `prov:generatedentity`).
    pub key: &'static str,
    /// Attribute name in the record model (e.g. `generatedEntity`).
    pub name: &'static str,
    /// The value.
    pub value: FieldValue<'a>,
}

impl<'a> TypedField<'a> {
    fn reference(key: &'static str, name: &'static str, target: RecordKey) -> Self {
        Self {
            key,
            name,
            value: FieldValue::Ref(target),
        }
    }

    fn time(key: &'static str, name: &'static str, time: &'a Timestamp) -> Self {
        Self {
            key,
            name,
            value: FieldValue::Time(time),
        }
    }
}

/// A provenance record: an element or a relation.
///
/// Records are created detached and then moved into exactly one
/// [`Bundle`](crate::bundle::Bundle). They are deliberately not `Clone`: a
/// copy would share the original's [`RecordKey`].
#[derive(Debug)]
pub struct Record {
    key: RecordKey,
    id: Option<QualifiedName>,
    body: RecordBody,
    attributes: Attributes,
    container: Option<QualifiedName>,
}

impl Record {
    /// Creates an anonymous, detached record.
    #[must_use]
    pub fn new(body: RecordBody) -> Self {
        Self {
            key: RecordKey(next_node()),
            id: None,
            body,
            attributes: Attributes::new(),
            container: None,
        }
    }

    /// An entity.
    #[must_use]
    pub fn entity() -> Self {
        Self::new(RecordBody::Entity)
    }

    /// An activity with no start or end time.
    #[must_use]
    pub fn activity() -> Self {
        Self::new(RecordBody::Activity {
            start_time: None,
            end_time: None,
        })
    }

    /// An agent.
    #[must_use]
    pub fn agent() -> Self {
        Self::new(RecordBody::Agent)
    }

    /// A note.
    #[must_use]
    pub fn note() -> Self {
        Self::new(RecordBody::Note)
    }

    /// `entity` was generated by `activity`.
    #[must_use]
    pub fn generation(entity: RecordKey, activity: RecordKey) -> Self {
        Self::new(RecordBody::Generation {
            entity,
            activity,
            time: None,
        })
    }

    /// `activity` used `entity`.
    #[must_use]
    pub fn usage(activity: RecordKey, entity: RecordKey) -> Self {
        Self::new(RecordBody::Usage {
            activity,
            entity,
            time: None,
        })
    }

    /// `activity` was associated with `agent`.
    #[must_use]
    pub fn association(activity: RecordKey, agent: RecordKey) -> Self {
        Self::new(RecordBody::Association { activity, agent })
    }

    /// `activity` was started by `agent`.
    #[must_use]
    pub fn start(activity: RecordKey, agent: RecordKey) -> Self {
        Self::new(RecordBody::Start { activity, agent })
    }

    /// `activity` was ended by `agent`.
    #[must_use]
    pub fn end(activity: RecordKey, agent: RecordKey) -> Self {
        Self::new(RecordBody::End { activity, agent })
    }

    /// `subordinate` acted on behalf of `responsible`.
    #[must_use]
    pub fn responsibility(subordinate: RecordKey, responsible: RecordKey) -> Self {
        Self::new(RecordBody::Responsibility {
            subordinate,
            responsible,
        })
    }

    /// `generated_entity` was derived from `used_entity`.
    #[must_use]
    pub fn derivation(generated_entity: RecordKey, used_entity: RecordKey) -> Self {
        Self::new(RecordBody::Derivation {
            generated_entity,
            used_entity,
            activity: None,
            generation: None,
            usage: None,
        })
    }

    /// `subject` is an alternate of `alternate`.
    #[must_use]
    pub fn alternate(subject: RecordKey, alternate: RecordKey) -> Self {
        Self::new(RecordBody::Alternate { subject, alternate })
    }

    /// `subject` is a specialization of `specialization`.
    #[must_use]
    pub fn specialization(subject: RecordKey, specialization: RecordKey) -> Self {
        Self::new(RecordBody::Specialization {
            subject,
            specialization,
        })
    }

    /// `record` is annotated by `note`.
    #[must_use]
    pub fn annotation(record: RecordKey, note: RecordKey) -> Self {
        Self::new(RecordBody::Annotation { record, note })
    }

    /// Sets the explicit identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ProvError::InvalidIdentifier`](crate::ProvError::InvalidIdentifier)
    /// if `id` is unusable identifier text.
    pub fn with_id(mut self, id: impl IntoIdentifier) -> Result<Self> {
        self.id = Some(id.into_identifier()?);
        Ok(self)
    }

    /// Adds an extra attribute, replacing any previous value under `key`.
    #[must_use]
    pub fn with_attribute(
        mut self,
        key: impl Into<AttributeKey>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Sets the start time of an activity. Ignored for other kinds.
    #[must_use]
    pub fn started_at(mut self, time: impl Into<Timestamp>) -> Self {
        if let RecordBody::Activity { start_time, .. } = &mut self.body {
            *start_time = Some(time.into());
        }
        self
    }

    /// Sets the end time of an activity. Ignored for other kinds.
    #[must_use]
    pub fn ended_at(mut self, time: impl Into<Timestamp>) -> Self {
        if let RecordBody::Activity { end_time, .. } = &mut self.body {
            *end_time = Some(time.into());
        }
        self
    }

    /// Sets the time of a generation or usage. Ignored for other kinds.
    #[must_use]
    pub fn at(mut self, when: impl Into<Timestamp>) -> Self {
        match &mut self.body {
            RecordBody::Generation { time, .. } | RecordBody::Usage { time, .. } => {
                *time = Some(when.into());
            }
            _ => {}
        }
        self
    }

    /// Sets the activity of a derivation. Ignored for other kinds.
    #[must_use]
    pub fn via_activity(mut self, key: RecordKey) -> Self {
        if let RecordBody::Derivation { activity, .. } = &mut self.body {
            *activity = Some(key);
        }
        self
    }

    /// Sets the generation of a derivation. Ignored for other kinds.
    #[must_use]
    pub fn via_generation(mut self, key: RecordKey) -> Self {
        if let RecordBody::Derivation { generation, .. } = &mut self.body {
            *generation = Some(key);
        }
        self
    }

    /// Sets the usage of a derivation. Ignored for other kinds.
    #[must_use]
    pub fn via_usage(mut self, key: RecordKey) -> Self {
        if let RecordBody::Derivation { usage, .. } = &mut self.body {
            *usage = Some(key);
        }
        self
    }

    /// The record's handle.
    #[must_use]
    pub fn key(&self) -> RecordKey {
        self.key
    }

    /// The explicit identifier, or `None` for an anonymous record.
    #[must_use]
    pub fn id(&self) -> Option<&QualifiedName> {
        self.id.as_ref()
    }

    /// The record's kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.body.kind()
    }

    /// Whether this record is an element.
    #[must_use]
    pub fn is_element(&self) -> bool {
        self.kind().is_element()
    }

    /// The typed fields.
    #[must_use]
    pub fn body(&self) -> &RecordBody {
        &self.body
    }

    /// The extra attributes.
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Mutable access to the extra attributes.
    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Id of the bundle this record is attached to, if any.
    #[must_use]
    pub fn container(&self) -> Option<&QualifiedName> {
        self.container.as_ref()
    }

    pub(crate) fn set_container(&mut self, container: Option<QualifiedName>) {
        self.container = container;
    }

    /// The typed fields that are set, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<TypedField<'_>> {
        use TypedField as F;

        let mut fields = Vec::new();
        match &self.body {
            RecordBody::Entity | RecordBody::Agent | RecordBody::Note => {}
            RecordBody::Activity {
                start_time,
                end_time,
            } => {
                if let Some(t) = start_time {
                    fields.push(F::time("prov:starttime", "startTime", t));
                }
                if let Some(t) = end_time {
                    fields.push(F::time("prov:endtime", "endTime", t));
                }
            }
            RecordBody::Generation {
                entity,
                activity,
                time,
            } => {
                fields.push(F::reference("prov:entity", "entity", *entity));
                fields.push(F::reference("prov:activity", "activity", *activity));
                if let Some(t) = time {
                    fields.push(F::time("prov:time", "time", t));
                }
            }
            RecordBody::Usage {
                activity,
                entity,
                time,
            } => {
                fields.push(F::reference("prov:activity", "activity", *activity));
                fields.push(F::reference("prov:entity", "entity", *entity));
                if let Some(t) = time {
                    fields.push(F::time("prov:time", "time", t));
                }
            }
            RecordBody::Association { activity, agent }
            | RecordBody::Start { activity, agent }
            | RecordBody::End { activity, agent } => {
                fields.push(F::reference("prov:activity", "activity", *activity));
                fields.push(F::reference("prov:agent", "agent", *agent));
            }
            RecordBody::Responsibility {
                subordinate,
                responsible,
            } => {
                fields.push(F::reference("prov:subordinate", "subordinate", *subordinate));
                fields.push(F::reference("prov:responsible", "responsible", *responsible));
            }
            RecordBody::Derivation {
                generated_entity,
                used_entity,
                activity,
                generation,
                usage,
            } => {
                fields.push(F::reference(
                    "prov:generatedentity",
                    "generatedEntity",
                    *generated_entity,
                ));
                fields.push(F::reference("prov:usedentity", "usedEntity", *used_entity));
                if let Some(k) = activity {
                    fields.push(F::reference("prov:activity", "activity", *k));
                }
                if let Some(k) = generation {
                    fields.push(F::reference("prov:generation", "generation", *k));
                }
                if let Some(k) = usage {
                    fields.push(F::reference("prov:usage", "usage", *k));
                }
            }
            RecordBody::Alternate { subject, alternate } => {
                fields.push(F::reference("prov:subject", "subject", *subject));
                fields.push(F::reference("prov:alternate", "alternate", *alternate));
            }
            RecordBody::Specialization {
                subject,
                specialization,
            } => {
                fields.push(F::reference("prov:subject", "subject", *subject));
                fields.push(F::reference(
                    "prov:specialization",
                    "specialization",
                    *specialization,
                ));
            }
            RecordBody::Annotation { record, note } => {
                fields.push(F::reference("prov:record", "record", *record));
                fields.push(F::reference("prov:note", "note", *note));
            }
        }
        fields
    }

    /// The typed fields as (record-model name, value) pairs.
    #[must_use]
    pub fn record_attributes(&self) -> Vec<(&'static str, FieldValue<'_>)> {
        self.fields().into_iter().map(|f| (f.name, f.value)).collect()
    }
}
