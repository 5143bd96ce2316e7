use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Read-only view of a deceased case, as supplied by the case provider.
///
/// Every attribute except `id` is optional; the compiler fills only the
/// placeholders whose attribute is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseRecord {
    pub id: String,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub death_date: Option<NaiveDate>,
    pub death_time: Option<NaiveTime>,
    pub death_place: Option<String>,
    pub requester_name: Option<String>,
    pub requester_phone: Option<String>,
    pub requester_email: Option<String>,
    pub case_number: Option<String>,
}

impl CaseRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_full_name(mut self, name: impl Into<String>) -> Self {
        self.full_name = Some(name.into());
        self
    }

    pub fn with_case_number(mut self, number: impl Into<String>) -> Self {
        self.case_number = Some(number.into());
        self
    }
}
