pub mod admin;
pub mod login;

use actix_identity::Identity;
use actix_web::{
    HttpResponse, Responder, ResponseError, body::BoxBody,
    dev::HttpServiceFactory, get, middleware::DefaultHeaders, web,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{self, SessionUser, StoreError};

pub fn api_services() -> impl HttpServiceFactory {
    web::scope("/api")
        .service(health_check)
        .service(login::login)
        .service(login::login_check)
        .service(login::logout)
        .service(
            web::scope("/admin")
                .wrap(no_store_headers())
                .service(admin::get_group_details)
                .service(admin::get_group_members),
        )
}

/// Admin pages carry member details; keep them out of shared caches.
fn no_store_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Cache-Control", "no-store, no-cache, must-revalidate, private"))
        .add(("Pragma", "no-cache"))
        .add(("Expires", "0"))
}

#[get("/health_check")]
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().body("healthy")
}

#[derive(Debug, thiserror::Error)]
pub enum APIError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),
    #[error("Bad request")]
    BadRequest(#[source] anyhow::Error),
    #[error("Not found")]
    NotFound(#[source] anyhow::Error),
    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::AuthError(e) => {
                HttpResponse::Unauthorized().body(format!("{self}: {e}"))
            }
            Self::BadRequest(e) => {
                HttpResponse::BadRequest().body(format!("{self}: {e}"))
            }
            // the cause stays in the logs; callers can't tell a missing
            // page from one they may not see
            Self::NotFound(e) => {
                tracing::debug!("not found: {e:#}");
                HttpResponse::NotFound().body(self.to_string())
            }
            Self::UnexpectedError(e) => {
                crate::telemetry::log_error(e);
                HttpResponse::InternalServerError().body(self.to_string())
            }
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(_) => APIError::UnexpectedError(e.into()),
            StoreError::UnexpectedError(_) => {
                APIError::UnexpectedError(e.into())
            }
            StoreError::UserNotFound => APIError::NotFound(e.into()),
            StoreError::GroupNotFound => APIError::NotFound(e.into()),
            StoreError::GroupUserRoleNotFound => APIError::NotFound(e.into()),
            StoreError::LookupTypeNotFound(_) => APIError::NotFound(e.into()),
            _ => APIError::BadRequest(e.into()),
        }
    }
}

fn get_user_id(user: &Identity) -> Result<payloads::UserId, APIError> {
    let id_str = user.id().map_err(|e| {
        APIError::AuthError(
            anyhow::Error::from(e).context("Invalid login session"),
        )
    })?;
    // special case: since this is used in so many routes, the user_id is
    // recorded here, but attaches to the span for the api route itself
    tracing::Span::current()
        .record("user_id", tracing::field::display(&id_str));
    Ok(payloads::UserId(
        Uuid::parse_str(&id_str).map_err(anyhow::Error::from)?,
    ))
}

/// Turn an optional login cookie into the caller's session.
///
/// Anything short of a valid session for a live user yields `None` rather
/// than an error, so that protected routes can answer uniformly.
async fn get_session_user(
    user: Option<&Identity>,
    pool: &PgPool,
) -> Result<Option<SessionUser>, APIError> {
    let Some(user) = user else {
        return Ok(None);
    };
    let user_id = match get_user_id(user) {
        Ok(user_id) => user_id,
        Err(e) => {
            tracing::debug!("ignoring invalid session: {e:#}");
            return Ok(None);
        }
    };
    Ok(store::read_session_user(&user_id, pool).await?)
}
