use chrono::{DateTime, Utc};

/// A fundraising drive (stream, event) a donation was made during.
#[derive(Debug, Clone, PartialEq)]
pub struct Drive {
    pub id: String,
    pub name: String,
    pub source_url: String,
    pub created_at: DateTime<Utc>,
}

impl Drive {
    pub fn generate_id() -> String {
        format!("drive::{}", uuid::Uuid::new_v4().simple())
    }
}
