//! Home-page sections and audience capture (newsletter, partner enquiries).

use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::{authorize, Action, Viewer};
use crate::db::{self as queries, PageSection};
use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: &str = "home";
const DEFAULT_SECTION_TYPE: &str = "custom";

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn order(value: Option<&Value>) -> i64 {
    let n = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(f64::from(u8::from(*b))),
        _ => None,
    };
    n.filter(|n| n.is_finite()).map_or(0, |n| n.trunc() as i64)
}

fn visible(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
        None | Some(Value::Null) => false,
    }
}

/// Lenient section parsing for admin edits. Entries without an id are skipped.
#[must_use]
pub fn coerce_section(item: &Value) -> Option<PageSection> {
    let id = text(item.get("id")).filter(|id| !id.trim().is_empty())?;
    Some(PageSection {
        id,
        page: text(item.get("page"))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE.to_string()),
        kind: text(item.get("type"))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_SECTION_TYPE.to_string()),
        title: text(item.get("title")),
        body: text(item.get("body")),
        sort_order: order(item.get("order")),
        visible: visible(item.get("visible")),
    })
}

/// Visible sections of a page, in display order.
pub async fn page_sections(pool: &SqlitePool, page: &str) -> AppResult<Vec<PageSection>> {
    Ok(queries::list_page_sections(pool, page, false).await?)
}

/// Upsert a batch of sections in one transaction. Returns how many were saved.
pub async fn save_sections(pool: &SqlitePool, admin: &Viewer, sections: &[Value]) -> AppResult<usize> {
    authorize(Some(admin), Action::ManageSections)?;

    let sections: Vec<PageSection> = sections.iter().filter_map(coerce_section).collect();

    let mut tx = queries::begin_write(pool).await?;
    for section in &sections {
        queries::upsert_page_section(&mut *tx, section).await?;
    }
    tx.commit().await?;

    info!(admin_id = admin.user_id, count = sections.len(), "Saved page sections");
    Ok(sections.len())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "wants_to_post")]
    pub wants_to_post: bool,
}

/// Newsletter signup. Repeating an email only updates the posting flag.
pub async fn subscribe(pool: &SqlitePool, request: &SubscribeRequest) -> AppResult<()> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    queries::upsert_subscription(pool, email, request.wants_to_post).await?;
    info!(wants_to_post = request.wants_to_post, "Recorded subscription");
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub company: Option<String>,
    pub message: Option<String>,
}

/// Record a partnership enquiry.
pub async fn partner_interest(pool: &SqlitePool, request: &PartnerRequest) -> AppResult<i64> {
    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::validation("Name and email are required"));
    }

    let blank_to_none = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let id = queries::create_partner_interest(
        pool,
        name,
        email,
        blank_to_none(&request.company).as_deref(),
        blank_to_none(&request.message).as_deref(),
    )
    .await?;
    info!(partner_interest_id = id, "Recorded partner interest");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_section_defaults() {
        let section = coerce_section(&json!({ "id": "home-map" })).unwrap();
        assert_eq!(section.page, "home");
        assert_eq!(section.kind, "custom");
        assert_eq!(section.sort_order, 0);
        assert!(!section.visible);
        assert_eq!(section.title, None);
    }

    #[test]
    fn test_coerce_section_loose_values() {
        let section = coerce_section(&json!({
            "id": 12,
            "type": "hero",
            "order": "3",
            "visible": "yes",
            "title": "Hi"
        }))
        .unwrap();
        assert_eq!(section.id, "12");
        assert_eq!(section.kind, "hero");
        assert_eq!(section.sort_order, 3);
        assert!(section.visible);

        assert_eq!(coerce_section(&json!({ "order": "x" })), None);
        assert_eq!(
            coerce_section(&json!({ "id": "a", "order": "x" })).unwrap().sort_order,
            0
        );
    }
}
