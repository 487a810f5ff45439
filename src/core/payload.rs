use crate::core::record::{IncidentField, RecordSnapshot};
use serde::{Deserialize, Serialize};

/// Flat webhook body for one incident. Declaration order is wire order, and
/// every key is always present: a missing record field serializes as JSON
/// null, never as an omitted key. `reported_by_email` is the one enriched
/// field; the record's own `caller_id` never travels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentPayload {
    pub number: Option<String>,
    pub reported_by_email: Option<String>,
    pub opened_at: Option<String>,
    pub impact: Option<String>,
    pub urgency: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub sys_id: Option<String>,
    pub subcategory: Option<String>,
    pub state: Option<String>,
    pub source_ip: Option<String>,
    pub destination_ip: Option<String>,
}

impl IncidentPayload {
    pub fn from_record(record: &RecordSnapshot, reported_by_email: Option<String>) -> Self {
        let take = |field: IncidentField| record.value(field).map(str::to_string);
        Self {
            number: take(IncidentField::Number),
            reported_by_email,
            opened_at: take(IncidentField::OpenedAt),
            impact: take(IncidentField::Impact),
            urgency: take(IncidentField::Urgency),
            short_description: take(IncidentField::ShortDescription),
            description: take(IncidentField::Description),
            category: take(IncidentField::Category),
            priority: take(IncidentField::Priority),
            sys_id: take(IncidentField::SysId),
            subcategory: take(IncidentField::Subcategory),
            state: take(IncidentField::State),
            source_ip: take(IncidentField::SourceIp),
            destination_ip: take(IncidentField::DestinationIp),
        }
    }
}
