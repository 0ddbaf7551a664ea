use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use super::models::{PageSection, UserRole};
use super::queries::{self, Taxonomy};
use crate::auth::hash_password;

const DEFAULT_CATEGORIES: [&str; 4] = ["Adventure", "Culture", "Food", "Nature"];

const HOME_SECTIONS: [(&str, &str, &str); 7] = [
    ("hero", "Field Notes", "Stories from roads less traveled."),
    ("featured", "Featured Essays", "Editor picks and community favorites."),
    ("field-notes", "Field Notes", "Browse essays by category and place."),
    (
        "about",
        "About Us",
        "We collect travel narratives grounded in place, people, and culture.",
    ),
    ("subscribe", "Subscribe", "Get new essays in your inbox."),
    (
        "partner",
        "Partner Interest",
        "Vendors can propose collaborations and partnerships.",
    ),
    ("footer", "Footer", "Field Notes"),
];

/// Default home-page sections, ids `home-{type}`, ordered as listed.
#[must_use]
pub fn default_home_sections() -> Vec<PageSection> {
    HOME_SECTIONS
        .iter()
        .zip(0_i64..)
        .map(|((kind, title, body), order)| PageSection {
            id: format!("home-{kind}"),
            page: "home".to_string(),
            kind: (*kind).to_string(),
            title: Some((*title).to_string()),
            body: Some((*body).to_string()),
            sort_order: order,
            visible: true,
        })
        .collect()
}

/// Create the default categories, plus the home sections when the home page
/// has none yet. Existing admin edits are left alone.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<()> {
    for name in DEFAULT_CATEGORIES {
        queries::ensure_term(pool, Taxonomy::Categories, name).await?;
    }

    if queries::list_page_sections(pool, "home", true).await?.is_empty() {
        for section in default_home_sections() {
            queries::upsert_page_section(pool, &section).await?;
        }
        info!(count = HOME_SECTIONS.len(), "Seeded home page sections");
    }

    Ok(())
}

/// Create or reset the bootstrap admin account. Returns its id.
pub async fn upsert_admin(pool: &SqlitePool, name: &str, email: &str, password: &str) -> Result<i64> {
    let email = email.trim().to_lowercase();
    let password_hash = hash_password(password)?;

    if let Some(user) = queries::get_user_by_email(pool, &email).await? {
        queries::update_user_credentials(pool, user.id, name, &password_hash, UserRole::Admin)
            .await?;
        info!(user_id = user.id, "Updated bootstrap admin account");
        return Ok(user.id);
    }

    let id = queries::create_user(pool, name, &email, &password_hash, UserRole::Admin).await?;
    info!(user_id = id, "Created bootstrap admin account");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_home_sections_ids_and_order() {
        let sections = default_home_sections();
        assert_eq!(sections.len(), 7);
        assert_eq!(sections[0].id, "home-hero");
        assert_eq!(sections[6].id, "home-footer");
        assert!(sections.iter().zip(0..).all(|(s, i)| s.sort_order == i));
        assert!(sections.iter().all(|s| s.visible && s.page == "home"));
    }
}
