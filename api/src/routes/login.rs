//! Session routes. The session cookie only stores the user id; whether the
//! user may see admin pages is decided per request.

use actix_identity::Identity;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, post, web};
use sqlx::PgPool;

use crate::password::{AuthError, Credentials, validate_credentials};

use super::{APIError, get_user_id};

impl From<AuthError> for APIError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) => Self::AuthError(e.into()),
            AuthError::UnexpectedError(_) => Self::UnexpectedError(e.into()),
        }
    }
}

#[tracing::instrument(
    skip_all,
    fields(username = %credentials.username, user_id = tracing::field::Empty),
    ret,
)]
#[post("/login")]
pub async fn login(
    request: HttpRequest,
    credentials: web::Json<Credentials>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, APIError> {
    let user_id = validate_credentials(credentials.into_inner(), &pool).await?;
    tracing::Span::current()
        .record("user_id", tracing::field::display(&user_id));
    Identity::login(&request.extensions(), user_id.to_string())
        .map_err(|e| APIError::UnexpectedError(e.into()))?;
    Ok(HttpResponse::Ok().finish())
}

/// 200 with a session cookie, 401 without one.
#[tracing::instrument(skip(user), fields(user_id = tracing::field::Empty))]
#[post("/login_check")]
pub async fn login_check(user: Identity) -> Result<HttpResponse, APIError> {
    get_user_id(&user)?;
    Ok(HttpResponse::Ok().finish())
}

/// Always succeeds, so a client can log out without checking first.
#[tracing::instrument(skip(user), fields(user_id = tracing::field::Empty))]
#[post("/logout")]
pub async fn logout(user: Option<Identity>) -> Result<HttpResponse, APIError> {
    if let Some(user) = user {
        // records the user id on the span
        let _ = get_user_id(&user);
        user.logout();
    }
    Ok(HttpResponse::Ok().finish())
}
