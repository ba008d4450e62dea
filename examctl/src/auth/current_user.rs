use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{errors::DbError, handlers::Users, models::users::UserCreateDBRequest},
    errors::Error,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::debug;

/// Extract the authenticated user from the trusted proxy header.
///
/// The header carries the user's email as verified by the proxy. Unknown
/// users are created on first sight when `auth.proxy_header.auto_create_users`
/// is enabled, otherwise rejected with 401.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let config = &state.config.auth.proxy_header;
        if !config.enabled {
            return Err(Error::Unauthenticated { message: None });
        }

        let email = parts
            .headers
            .get(&config.header_name)
            .and_then(|h| h.to_str().ok())
            .ok_or(Error::Unauthenticated { message: None })?
            .to_string();

        let mut tx = state.db.begin().await.map_err(DbError::from)?;
        let mut users = Users::new(&mut tx);

        let user = match users.get_by_email(&email).await? {
            Some(user) => user,
            None if config.auto_create_users => {
                debug!("Auto-creating user for {email}");
                users
                    .create(&UserCreateDBRequest {
                        username: email.clone(),
                        email: email.clone(),
                        display_name: None,
                    })
                    .await?
            }
            None => {
                return Err(Error::Unauthenticated {
                    message: Some("Unknown user".to_string()),
                });
            }
        };
        tx.commit().await.map_err(DbError::from)?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
        })
    }
}
