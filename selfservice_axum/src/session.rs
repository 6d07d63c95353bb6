use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Response},
};
use axum_extra::{TypedHeader, headers};
use http::{StatusCode, request::Parts};

use selfservice::{CompositeId, Identity, open_identity};

use super::error::NOT_AUTHENTICATED;
use super::state::AppState;

/// Rejection of [`AuthUser`] when no valid identity ticket is presented
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED).into_response()
    }
}

/// Authenticated user, available as an Axum extractor
///
/// The identity is read from the signed identity ticket cookie. Use
/// `Option<AuthUser>` where an anonymous request is not an error.
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use selfservice_axum::{AppState, AuthUser};
///
/// async fn whoami(user: AuthUser) -> String {
///     format!("Hello, {}!", user.identity.login)
/// }
///
/// let app: Router<AppState> = Router::new().route("/whoami", get(whoami));
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub identity: Identity,
}

impl AuthUser {
    pub fn composite_id(&self) -> &CompositeId {
        &self.identity.composite_id
    }
}

async fn identity_from_parts(parts: &mut Parts, state: &AppState) -> Option<AuthUser> {
    let config = state.config();
    let cookies: TypedHeader<headers::Cookie> = parts.extract().await.ok()?;
    let ticket = cookies.get(&config.identity_cookie)?;

    match open_identity(&config.identity_secret, ticket) {
        Ok(composite_id) => Some(AuthUser {
            identity: Identity::new(composite_id),
        }),
        Err(e) => {
            tracing::error!("Rejected identity ticket: {}", e);
            None
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        identity_from_parts(parts, &state).await.ok_or_else(|| {
            tracing::debug!("No valid identity for {}", parts.uri.path());
            AuthRejection
        })
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(identity_from_parts(parts, &state).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, Request, header::COOKIE};
    use selfservice::{SelfServiceConfig, seal_identity};

    fn state() -> AppState {
        AppState::new(
            SelfServiceConfig::builder("http://localhost:5000")
                .identity_secret(b"extractor-secret".to_vec())
                .build()
                .unwrap(),
        )
    }

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/selfservice");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_valid_ticket() {
        let state = state();
        let ticket = seal_identity(
            &state.config().identity_secret,
            &CompositeId::parse("alice@corp;userauthcookie=abc"),
        )
        .unwrap();
        let mut parts = parts_with_cookie(Some(&format!("selfservice_auth={ticket}")));

        let user = <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.identity.login, "alice@corp");
        assert_eq!(user.identity.realm.as_deref(), Some("corp"));
        assert_eq!(user.composite_id().session_value(), Some("abc"));
    }

    #[tokio::test]
    async fn test_missing_ticket_rejected() {
        let state = state();
        let mut parts = parts_with_cookie(None);
        let result =
            <AuthUser as FromRequestParts<AppState>>::from_request_parts(&mut parts, &state).await;
        assert!(result.is_err());
        assert_eq!(
            AuthRejection.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_forged_ticket_is_anonymous() {
        let state = state();
        let forged = seal_identity(b"other-secret", &CompositeId::parse("admin")).unwrap();
        let mut parts = parts_with_cookie(Some(&format!("selfservice_auth={forged}")));

        let user = <AuthUser as OptionalFromRequestParts<AppState>>::from_request_parts(
            &mut parts, &state,
        )
        .await
        .unwrap();
        assert!(user.is_none());
    }
}
