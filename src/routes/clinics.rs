use actix_session::Session;
use actix_web::{HttpResponse, get, post, put, web};

use crate::forms::clinics::{CreateClinicForm, SelectClinicForm, SettingsForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::{ActiveClinic, remember_clinic};
use crate::services::{ServiceError, clinics as clinics_service};

/// Clinics the user belongs to, with the role held in each.
#[get("/clinics")]
pub async fn list_clinics(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let clinics = clinics_service::list_my_clinics(repo.get_ref(), &user)?;
    Ok(HttpResponse::Ok().json(clinics))
}

/// Creates a clinic owned by the caller and selects it.
#[post("/clinics")]
pub async fn create_clinic(
    user: AuthenticatedUser,
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CreateClinicForm>,
) -> Result<HttpResponse, ServiceError> {
    let membership = clinics_service::create_clinic(repo.get_ref(), &user, form)?;
    remember_clinic(&session, membership.clinic.id)?;
    Ok(HttpResponse::Created().json(membership))
}

#[post("/clinics/select")]
pub async fn select_clinic(
    user: AuthenticatedUser,
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<SelectClinicForm>,
) -> Result<HttpResponse, ServiceError> {
    let membership = clinics_service::select_clinic(repo.get_ref(), &user, form.clinic_id)?;
    remember_clinic(&session, membership.clinic.id)?;
    Ok(HttpResponse::Ok().json(membership))
}

/// The clinic selected in the session, re-checked against the membership.
#[get("/clinic")]
pub async fn current_clinic(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let membership = clinics_service::select_clinic(repo.get_ref(), &user, clinic.id().get())?;
    Ok(HttpResponse::Ok().json(membership))
}

#[get("/clinic/settings")]
pub async fn show_settings(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let settings = clinics_service::get_settings(repo.get_ref(), &user, clinic.id())?;
    Ok(HttpResponse::Ok().json(settings))
}

#[put("/clinic/settings")]
pub async fn save_settings(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<SettingsForm>,
) -> Result<HttpResponse, ServiceError> {
    let settings = clinics_service::update_settings(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Ok().json(settings))
}
