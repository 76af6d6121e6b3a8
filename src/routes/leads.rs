use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::Deserialize;
use serde_json::json;

use crate::domain::lead::LeadStatus;
use crate::forms::leads::{LeadForm, LeadStatusForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::ActiveClinic;
use crate::services::{ServiceError, leads as leads_service};

#[derive(Deserialize)]
struct LeadsQuery {
    status: Option<LeadStatus>,
}

#[get("/leads")]
pub async fn list_leads(
    query: web::Query<LeadsQuery>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let leads = leads_service::list_leads(repo.get_ref(), &user, clinic.id(), query.status)?;
    Ok(HttpResponse::Ok().json(leads))
}

#[post("/leads")]
pub async fn create_lead(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<LeadForm>,
) -> Result<HttpResponse, ServiceError> {
    let lead = leads_service::create_lead(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Created().json(lead))
}

#[get("/leads/{lead_id}")]
pub async fn show_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let lead = leads_service::get_lead(repo.get_ref(), &user, clinic.id(), lead_id.into_inner())?;
    Ok(HttpResponse::Ok().json(lead))
}

#[put("/leads/{lead_id}")]
pub async fn update_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<LeadForm>,
) -> Result<HttpResponse, ServiceError> {
    let lead =
        leads_service::update_lead(repo.get_ref(), &user, clinic.id(), lead_id.into_inner(), form)?;
    Ok(HttpResponse::Ok().json(lead))
}

#[post("/leads/{lead_id}/status")]
pub async fn set_lead_status(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<LeadStatusForm>,
) -> Result<HttpResponse, ServiceError> {
    let lead =
        leads_service::set_status(repo.get_ref(), &user, clinic.id(), lead_id.into_inner(), form)?;
    Ok(HttpResponse::Ok().json(lead))
}

/// Creates a patient from the lead and marks the lead converted.
#[post("/leads/{lead_id}/convert")]
pub async fn convert_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let (lead, patient) =
        leads_service::convert_to_patient(repo.get_ref(), &user, clinic.id(), lead_id.into_inner())?;
    Ok(HttpResponse::Created().json(json!({ "lead": lead, "patient": patient })))
}

#[delete("/leads/{lead_id}")]
pub async fn delete_lead(
    lead_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    leads_service::delete_lead(repo.get_ref(), &user, clinic.id(), lead_id.into_inner())?;
    Ok(HttpResponse::NoContent().finish())
}
