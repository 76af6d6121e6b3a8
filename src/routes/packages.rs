use actix_web::{HttpResponse, get, post, web};
use serde_json::json;

use crate::forms::packages::PackageForm;
use crate::models::auth::AuthenticatedUser;
use crate::repository::{DieselRepository, now};
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, packages as packages_service};

/// Packages of a patient with their remaining sessions.
#[get("/patients/{patient_id}/packages")]
pub async fn list_packages(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let packages = packages_service::list_packages(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(packages))
}

#[post("/packages")]
pub async fn create_package(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PackageForm>,
) -> Result<HttpResponse, ServiceError> {
    let (package, receivable) =
        packages_service::create_package(repo.get_ref(), &user, clinic.id(), form, now().date())?;
    Ok(HttpResponse::Created().json(json!({
        "package": package,
        "receivable": receivable,
    })))
}

#[get("/packages/{package_id}")]
pub async fn show_package(
    package_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let package = packages_service::get_package(
        repo.get_ref(),
        &user,
        clinic.id(),
        package_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(package))
}

#[post("/packages/{package_id}/deactivate")]
pub async fn deactivate_package(
    package_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let package = packages_service::deactivate_package(
        repo.get_ref(),
        &user,
        clinic.id(),
        package_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(package))
}
