use actix_web::{HttpResponse, get, web};

use crate::models::auth::AuthenticatedUser;
use crate::repository::{DieselRepository, now};
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, dashboard as dashboard_service};

#[get("/dashboard")]
pub async fn show_dashboard(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let dashboard = dashboard_service::dashboard(repo.get_ref(), &user, clinic.id(), now().date())?;
    Ok(HttpResponse::Ok().json(dashboard))
}
