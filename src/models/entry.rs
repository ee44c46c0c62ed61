use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::mood::MoodType;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub mood: MoodType,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for both create and update; updates replace every field.
#[derive(Debug, Deserialize, Validate)]
pub struct EntryRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    pub mood: MoodType,

    pub tags: Option<Vec<String>>,
}

impl EntryRequest {
    /// Trim text fields and drop blank tags before validation.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            mood: self.mood,
            tags: self.tags.map(|tags| {
                tags.into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            }),
        }
    }

    pub fn tags_or_empty(&self) -> Vec<String> {
        self.tags.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
pub enum EntrySortField {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "updatedAt")]
    UpdatedAt,
    #[serde(rename = "title")]
    Title,
}

impl EntrySortField {
    pub fn column(self) -> &'static str {
        match self {
            EntrySortField::CreatedAt => "created_at",
            EntrySortField::UpdatedAt => "updated_at",
            EntrySortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub mood: Option<MoodType>,
    #[serde(default)]
    pub sort_by: EntrySortField,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl EntryListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(15).clamp(1, 100)
    }

    /// Saturates for absurd pages; Postgres then just returns an empty page.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// ILIKE pattern for the search term, or None when no search was given.
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, content: &str) -> EntryRequest {
        EntryRequest {
            title: title.into(),
            content: content.into(),
            mood: MoodType::Calm,
            tags: None,
        }
    }

    #[test]
    fn test_whitespace_only_title_fails_after_normalizing() {
        let req = request("   ", "body").normalized();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_title_length_limit() {
        assert!(request(&"t".repeat(200), "body").normalized().validate().is_ok());
        assert!(request(&"t".repeat(201), "body").normalized().validate().is_err());
    }

    #[test]
    fn test_normalized_drops_blank_tags() {
        let req = EntryRequest {
            title: " Morning ".into(),
            content: " pages ".into(),
            mood: MoodType::Focused,
            tags: Some(vec![" work ".into(), "".into(), "  ".into(), "gym".into()]),
        }
        .normalized();
        assert_eq!(req.title, "Morning");
        assert_eq!(req.content, "pages");
        assert_eq!(req.tags_or_empty(), vec!["work", "gym"]);
    }

    #[test]
    fn test_list_query_defaults() {
        let q: EntryListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 15);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.sort_by.column(), "created_at");
        assert_eq!(q.sort_order.keyword(), "DESC");
        assert!(q.search_pattern().is_none());
    }

    #[test]
    fn test_list_query_sort_whitelist() {
        let q: EntryListQuery =
            serde_json::from_str(r#"{"sortBy":"title","sortOrder":"asc","page":3,"limit":10}"#)
                .unwrap();
        assert_eq!(q.sort_by.column(), "title");
        assert_eq!(q.sort_order.keyword(), "ASC");
        assert_eq!(q.offset(), 20);

        let bad = serde_json::from_str::<EntryListQuery>(r#"{"sortBy":"password_hash"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_huge_page_offset_saturates() {
        let q: EntryListQuery =
            serde_json::from_str(r#"{"page":9223372036854775807,"limit":100}"#).unwrap();
        assert_eq!(q.page(), i64::MAX);
        assert_eq!(q.offset(), i64::MAX);

        let q: EntryListQuery = serde_json::from_str(r#"{"page":-4}"#).unwrap();
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let q = EntryListQuery {
            page: None,
            limit: None,
            search: Some(" 100%_done ".into()),
            mood: None,
            sort_by: EntrySortField::default(),
            sort_order: SortOrder::default(),
        };
        assert_eq!(q.search_pattern().unwrap(), "%100\\%\\_done%");
    }

    #[test]
    fn test_pagination_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 15, 0).pages, 0);
        assert_eq!(Pagination::new(1, 15, 15).pages, 1);
        assert_eq!(Pagination::new(1, 15, 16).pages, 2);
    }
}
