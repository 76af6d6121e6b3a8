use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, get, post, put, web};

use crate::dto::patients::PatientsQuery;
use crate::forms::patients::{ImportPatientsForm, PatientForm};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::{DieselRepository, now};
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, patients as patients_service};

#[get("/patients")]
pub async fn list_patients(
    query: web::Query<PatientsQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServiceError> {
    let page = patients_service::list_patients(
        repo.get_ref(),
        &user,
        clinic.id(),
        query.into_inner(),
        server_config.items_per_page,
    )?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("/patients")]
pub async fn create_patient(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PatientForm>,
) -> Result<HttpResponse, ServiceError> {
    let patient = patients_service::create_patient(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(patient))
}

/// Bulk import from a CSV upload; nothing is stored when any row is invalid.
#[post("/patients/import")]
pub async fn import_patients(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    MultipartForm(form): MultipartForm<ImportPatientsForm>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = patients_service::import_patients(
        repo.get_ref(),
        &user,
        clinic.id(),
        form.csv.file.as_file(),
    )?;
    Ok(HttpResponse::Created().json(outcome))
}

#[get("/patients/{patient_id}")]
pub async fn show_patient(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let patient =
        patients_service::get_patient(repo.get_ref(), &user, clinic.id(), patient_id.into_inner())?;
    Ok(HttpResponse::Ok().json(patient))
}

#[put("/patients/{patient_id}")]
pub async fn update_patient(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PatientForm>,
) -> Result<HttpResponse, ServiceError> {
    let patient = patients_service::update_patient(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(patient))
}

#[post("/patients/{patient_id}/deactivate")]
pub async fn deactivate_patient(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let patient = patients_service::deactivate_patient(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(patient))
}

#[post("/patients/{patient_id}/reactivate")]
pub async fn reactivate_patient(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let patient = patients_service::reactivate_patient(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
    )?;
    Ok(HttpResponse::Ok().json(patient))
}

#[get("/patients/{patient_id}/history")]
pub async fn patient_history(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let history = patients_service::patient_history(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
        now().date(),
    )?;
    Ok(HttpResponse::Ok().json(history))
}
