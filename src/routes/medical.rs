use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::forms::medical::{EvolutionForm, MedicalRecordForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, medical as medical_service};

/// The patient's medical record, `null` until one is saved.
#[get("/patients/{patient_id}/record")]
pub async fn show_record(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let record =
        medical_service::get_record(repo.get_ref(), &user, clinic.id(), patient_id.into_inner())?;
    Ok(HttpResponse::Ok().json(record))
}

#[put("/patients/{patient_id}/record")]
pub async fn save_record(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<MedicalRecordForm>,
) -> Result<HttpResponse, ServiceError> {
    let record = medical_service::save_record(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(record))
}

#[get("/patients/{patient_id}/evolutions")]
pub async fn list_evolutions(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let evolutions =
        medical_service::list_evolutions(repo.get_ref(), &user, clinic.id(), patient_id.into_inner())?;
    Ok(HttpResponse::Ok().json(evolutions))
}

#[post("/patients/{patient_id}/evolutions")]
pub async fn create_evolution(
    patient_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<EvolutionForm>,
) -> Result<HttpResponse, ServiceError> {
    let evolution = medical_service::create_evolution(
        repo.get_ref(),
        &user,
        clinic.id(),
        patient_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Created().json(evolution))
}

#[put("/evolutions/{evolution_id}")]
pub async fn update_evolution(
    evolution_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<EvolutionForm>,
) -> Result<HttpResponse, ServiceError> {
    let evolution = medical_service::update_evolution(
        repo.get_ref(),
        &user,
        clinic.id(),
        evolution_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(evolution))
}

#[delete("/evolutions/{evolution_id}")]
pub async fn delete_evolution(
    evolution_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    medical_service::delete_evolution(repo.get_ref(), &user, clinic.id(), evolution_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
