use chrono::{DateTime, Utc};

/// A charity donations can be made to.
#[derive(Debug, Clone, PartialEq)]
pub struct Charity {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    /// The charity's numeric id on JustGiving
    pub justgiving_charity_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Charity {
    pub fn generate_id() -> String {
        format!("charity::{}", uuid::Uuid::new_v4().simple())
    }
}
