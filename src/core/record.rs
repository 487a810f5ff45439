use ahash::AHashMap;

/// Incident columns the relay reads from a record. `name()` gives the
/// platform column name, which is not always the payload key (the
/// connectivity columns are custom `u_` fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncidentField {
    Number,
    CallerId,
    OpenedAt,
    Impact,
    Urgency,
    ShortDescription,
    Description,
    Category,
    Priority,
    SysId,
    Subcategory,
    State,
    SourceIp,
    DestinationIp,
}

impl IncidentField {
    pub const ALL: [IncidentField; 14] = [
        IncidentField::Number,
        IncidentField::CallerId,
        IncidentField::OpenedAt,
        IncidentField::Impact,
        IncidentField::Urgency,
        IncidentField::ShortDescription,
        IncidentField::Description,
        IncidentField::Category,
        IncidentField::Priority,
        IncidentField::SysId,
        IncidentField::Subcategory,
        IncidentField::State,
        IncidentField::SourceIp,
        IncidentField::DestinationIp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IncidentField::Number => "number",
            IncidentField::CallerId => "caller_id",
            IncidentField::OpenedAt => "opened_at",
            IncidentField::Impact => "impact",
            IncidentField::Urgency => "urgency",
            IncidentField::ShortDescription => "short_description",
            IncidentField::Description => "description",
            IncidentField::Category => "category",
            IncidentField::Priority => "priority",
            IncidentField::SysId => "sys_id",
            IncidentField::Subcategory => "subcategory",
            IncidentField::State => "state",
            IncidentField::SourceIp => "u_source_ip",
            IncidentField::DestinationIp => "u_destination_ip",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

/// Point-in-time view of one incident record as handed over by the
/// triggering platform. A field that is absent reads as null; the relay
/// treats null and absent identically.
#[derive(Debug, Clone, Default)]
pub struct RecordSnapshot {
    fields: AHashMap<IncidentField, String>,
}

impl RecordSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: IncidentField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: IncidentField, value: impl Into<String>) {
        self.fields.insert(field, value.into());
    }

    pub fn value(&self, field: IncidentField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Build from raw (column, value) pairs, e.g. a trigger row. Columns the
    /// relay does not know are ignored.
    pub fn from_named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut snap = Self::new();
        for (name, value) in pairs {
            if let Some(field) = IncidentField::from_name(name.as_ref()) {
                snap.set(field, value);
            }
        }
        snap
    }
}

/// One record-change delivery: the row as it is now, plus the pre-change
/// row when the trigger runs synchronously. Async triggers carry no
/// previous state.
#[derive(Debug, Clone, Default)]
pub struct RecordEvent {
    pub current: RecordSnapshot,
    pub previous: Option<RecordSnapshot>,
}

impl RecordEvent {
    pub fn new(current: RecordSnapshot) -> Self {
        Self { current, previous: None }
    }

    pub fn with_previous(current: RecordSnapshot, previous: RecordSnapshot) -> Self {
        Self { current, previous: Some(previous) }
    }
}
