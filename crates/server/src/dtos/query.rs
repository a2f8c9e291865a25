use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PageQuery {
    /// 1-based page number; out-of-range values are clamped
    #[serde(default = "default_page")]
    pub page: u64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CourseListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Department id to filter by
    pub department: Option<String>,
    /// Case-insensitive match on course name or code
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive match on names, email or registration number
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
