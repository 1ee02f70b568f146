//! Expense category record.

use chrono::{DateTime, Utc};

use spendtrack_core::{CategoryId, DomainError, DomainResult, TenantId};
use spendtrack_tenancy::TenantScoped;

const DEFAULT_COLOR: &str = "#000000";

/// A tenant-scoped expense category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    /// `#RRGGBB` display color.
    pub color_code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Validate caller input and build an active category.
    ///
    /// As with expenses, the `tenant_id` argument is advisory only — the
    /// scoped write path re-stamps it from the active context.
    pub fn create(
        tenant_id: TenantId,
        name: &str,
        description: Option<String>,
        color_code: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }

        let color_code = match color_code {
            Some(code) => validate_color(&code)?,
            None => DEFAULT_COLOR.to_string(),
        };

        Ok(Self {
            id: CategoryId::new(),
            tenant_id,
            name: name.trim().to_string(),
            description,
            color_code,
            is_active: true,
            created_at: now,
            updated_at: None,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Apply a partial edit; absent fields are left untouched.
    pub fn update_details(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        color_code: Option<String>,
    ) -> DomainResult<()> {
        if let Some(name) = name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("category name cannot be empty"));
            }
            self.name = name.trim().to_string();
        }
        if let Some(description) = description {
            self.description = Some(description);
        }
        if let Some(code) = color_code {
            self.color_code = validate_color(&code)?;
        }
        Ok(())
    }
}

fn validate_color(code: &str) -> DomainResult<String> {
    let code = code.trim().to_uppercase();
    let valid = code.len() == 7
        && code.starts_with('#')
        && code.chars().skip(1).all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(DomainError::validation("color must be #RRGGBB"));
    }
    Ok(code)
}

impl TenantScoped for Category {
    type Id = CategoryId;

    fn id(&self) -> CategoryId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn assign_tenant(&mut self, tenant_id: TenantId) {
        self.tenant_id = tenant_id;
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = None;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_defaults_color_and_activates() {
        let category = Category::create(TenantId::new(), "Travel", None, None, Utc::now()).unwrap();
        assert_eq!(category.color_code, "#000000");
        assert!(category.is_active);
    }

    #[test]
    fn color_is_uppercased() {
        let category = Category::create(
            TenantId::new(),
            "Travel",
            None,
            Some("#3b82f6".into()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(category.color_code, "#3B82F6");
    }

    #[test]
    fn invalid_colors_are_rejected() {
        for bad in ["3B82F6", "#3B82F", "#GGGGGG", "#3B82F6AA"] {
            assert!(
                Category::create(TenantId::new(), "Travel", None, Some(bad.into()), Utc::now())
                    .is_err(),
                "accepted: {bad}"
            );
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(Category::create(TenantId::new(), " ", None, None, Utc::now()).is_err());
    }
}
