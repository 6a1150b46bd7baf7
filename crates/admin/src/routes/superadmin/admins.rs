//! Back-office account management (superadmin only).

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use bazaar_backend::ApiError;
use bazaar_core::account::{AdminAccount, NewAdminAccount};
use bazaar_core::{ShopId, UserId, UserRole};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireSuperAdmin;
use crate::models::CurrentAdmin;
use crate::state::AppState;
use crate::views::{AdminUserView, flash, take_flash};

/// Account row for templates.
#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role_label: &'static str,
    pub shop: String,
    pub is_self: bool,
}

impl AccountRow {
    fn new(account: &AdminAccount, me: UserId) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            role_label: account.role.label(),
            shop: account
                .shop_id
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
            is_self: account.id == me,
        }
    }
}

/// Create-account form as submitted. The password is never echoed back.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub shop_id: String,
}

impl AccountForm {
    fn account(&self) -> std::result::Result<NewAdminAccount, String> {
        let role = self.role.parse::<UserRole>()?;
        let shop_id = match self.shop_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<ShopId>()
                    .map_err(|_| "Shop ID must be a number.".to_string())?,
            ),
        };
        Ok(NewAdminAccount {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            role,
            shop_id,
        })
    }

    fn without_password(self) -> Self {
        Self {
            password: String::new(),
            ..self
        }
    }
}

/// Accounts page template.
#[derive(Template)]
#[template(path = "superadmin/admins.html")]
pub struct AdminsTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub flash: Option<String>,
    pub accounts: Vec<AccountRow>,
    pub form: AccountForm,
    pub error: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/superadmin/admins", get(index).post(create))
        .route("/superadmin/admins/{id}/delete", post(delete))
}

async fn render(
    admin: &CurrentAdmin,
    state: &AppState,
    session: &Session,
    form: AccountForm,
    error: Option<String>,
) -> Result<Html<String>> {
    let (accounts, load_error) = match state.backend().admin_accounts(admin.token()).await {
        Ok(accounts) => (accounts, None),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            tracing::error!("Failed to fetch admin accounts: {e}");
            (
                Vec::new(),
                Some("Accounts could not be loaded right now.".to_string()),
            )
        }
    };

    let template = AdminsTemplate {
        admin_user: AdminUserView::from(admin),
        current_path: "/superadmin/admins".to_string(),
        flash: take_flash(session).await,
        accounts: accounts
            .iter()
            .map(|a| AccountRow::new(a, admin.id))
            .collect(),
        form,
        error: error.or(load_error),
    };

    Ok(Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    })))
}

/// Account list and create form.
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let form = AccountForm {
        role: UserRole::Merchant.to_string(),
        ..AccountForm::default()
    };
    render(&admin, &state, &session, form, None).await
}

/// Create a merchant or superadmin account.
#[instrument(skip(admin, state, session, form))]
pub async fn create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AccountForm>,
) -> Result<Response> {
    let input = match form
        .account()
        .and_then(|account| account.validate().map_err(|e| e.to_string()))
    {
        Ok(input) => input,
        Err(message) => {
            let page = render(&admin, &state, &session, form.without_password(), Some(message));
            return Ok(page.await?.into_response());
        }
    };

    match state
        .backend()
        .create_admin_account(admin.token(), &input)
        .await
    {
        Ok(account) => {
            flash(
                &session,
                format!("{} account created for {}.", account.role.label(), account.email),
            )
            .await;
            Ok(Redirect::to("/superadmin/admins").into_response())
        }
        Err(ApiError::Validation(message)) => {
            let page = render(&admin, &state, &session, form.without_password(), Some(message));
            Ok(page.await?.into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove an account. Superadmins cannot remove themselves.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<UserId>,
) -> Result<Redirect> {
    let back = Redirect::to("/superadmin/admins");
    if id == admin.id {
        flash(&session, "You cannot delete your own account.").await;
        return Ok(back);
    }

    match state.backend().delete_admin_account(admin.token(), id).await {
        Ok(()) => {
            tracing::info!(account = %id, "Admin account deleted");
            flash(&session, "Account deleted.").await;
        }
        Err(e @ (ApiError::Validation(_) | ApiError::NotFound(_))) => {
            flash(&session, e.user_message()).await;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(back)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(role: &str, shop: &str) -> AccountForm {
        AccountForm {
            name: "Sam".to_string(),
            email: "sam@shop.example".to_string(),
            password: "correct horse".to_string(),
            role: role.to_string(),
            shop_id: shop.to_string(),
        }
    }

    #[test]
    fn test_merchant_account_needs_shop() {
        let account = form("merchant", "").account().unwrap();
        assert_eq!(account.shop_id, None);
        assert!(account.validate().is_err());

        let account = form("merchant", " 4 ").account().unwrap();
        assert_eq!(account.validate().unwrap().shop_id, Some(ShopId::new(4)));
    }

    #[test]
    fn test_superadmin_without_shop() {
        let input = form("superadmin", "").account().unwrap().validate().unwrap();
        assert_eq!(input.role, UserRole::SuperAdmin);
    }

    #[test]
    fn test_bad_fields() {
        assert!(form("owner", "").account().is_err());
        assert!(form("merchant", "x").account().is_err());
        assert!(form("customer", "").account().unwrap().validate().is_err());
    }

    #[test]
    fn test_password_not_echoed() {
        assert_eq!(form("merchant", "1").without_password().password, "");
    }

    #[test]
    fn test_row_marks_self() {
        let account = AdminAccount {
            id: UserId::new(3),
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            role: UserRole::SuperAdmin,
            shop_id: None,
        };
        let row = AccountRow::new(&account, UserId::new(3));
        assert!(row.is_self);
        assert_eq!(row.shop, "-");
        assert_eq!(row.role_label, "Superadmin");
    }
}
