use actix_identity::Identity;
use actix_session::Session;
use actix_web::{HttpMessage, HttpRequest, HttpResponse, get, post, web};
use serde::Deserialize;

use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::services::ServiceError;

#[derive(Deserialize)]
struct CallbackQuery {
    token: String,
}

/// Logs in the identity carried by a token issued by the auth service.
#[get("/auth/callback")]
pub async fn callback(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
    server_config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServiceError> {
    let token = query.into_inner().token;
    let user = AuthenticatedUser::from_jwt(&token, &server_config.secret).map_err(|err| {
        log::warn!("Rejected callback token: {err}");
        ServiceError::Unauthorized
    })?;
    Identity::login(&req.extensions(), token)
        .map_err(|err| ServiceError::Internal(err.to_string()))?;
    log::info!("User {} logged in", user.email);
    Ok(HttpResponse::Ok().json(user))
}

#[post("/logout")]
pub async fn logout(identity: Option<Identity>, session: Session) -> HttpResponse {
    if let Some(identity) = identity {
        identity.logout();
    }
    session.purge();
    HttpResponse::NoContent().finish()
}
