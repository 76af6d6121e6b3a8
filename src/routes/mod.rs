//! HTTP layer: `/api/v1` JSON endpoints over the service functions.
//!
//! Handlers extract the [`AuthenticatedUser`](crate::models::auth::AuthenticatedUser)
//! and, for clinic-scoped endpoints, the [`ActiveClinic`] stored in the
//! session. Service errors become JSON responses through [`ResponseError`].

use std::future::{Ready, ready};

use actix_session::SessionExt;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError, dev::Payload, web};
use serde_json::json;

use crate::domain::types::ClinicId;
use crate::services::ServiceError;

pub mod appointments;
pub mod auth;
pub mod clinics;
pub mod dashboard;
pub mod finance;
pub mod leads;
pub mod medical;
pub mod members;
pub mod packages;
pub mod patients;
pub mod professionals;
pub mod reports;

/// Session key holding the selected clinic.
pub const CLINIC_SESSION_KEY: &str = "clinic_id";

const NO_CLINIC_SELECTED: &str = "Nenhuma clínica selecionada";

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Form(_) | ServiceError::TypeConstraint(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Repository(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {self}");
            "Erro interno do servidor".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

/// Malformed JSON bodies answer 422 with the usual error body.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::Form(format!("JSON inválido: {err}")).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::Form(format!("Parâmetros inválidos: {err}")).into()
}

/// The clinic selected in the current session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveClinic(pub ClinicId);

impl ActiveClinic {
    pub fn id(&self) -> ClinicId {
        self.0
    }
}

fn active_clinic(req: &HttpRequest) -> Result<ActiveClinic, ServiceError> {
    let stored = req
        .get_session()
        .get::<i32>(CLINIC_SESSION_KEY)
        .map_err(|err| ServiceError::Internal(err.to_string()))?
        .ok_or_else(|| ServiceError::Conflict(NO_CLINIC_SELECTED.to_string()))?;
    let clinic_id = ClinicId::new(stored)
        .map_err(|_| ServiceError::Conflict(NO_CLINIC_SELECTED.to_string()))?;
    Ok(ActiveClinic(clinic_id))
}

impl FromRequest for ActiveClinic {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(active_clinic(req))
    }
}

/// Remembers `clinic_id` as the active clinic of the session.
pub(crate) fn remember_clinic(
    session: &actix_session::Session,
    clinic_id: ClinicId,
) -> Result<(), ServiceError> {
    session
        .insert(CLINIC_SESSION_KEY, clinic_id.get())
        .map_err(|err| ServiceError::Internal(err.to_string()))
}

/// Query flag shared by the catalogue listings.
#[derive(serde::Deserialize, Default)]
pub struct InactiveQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Registers the auth endpoints and every `/api/v1` endpoint.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::callback).service(auth::logout).service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .service(clinics::list_clinics)
            .service(clinics::create_clinic)
            .service(clinics::select_clinic)
            .service(clinics::current_clinic)
            .service(clinics::show_settings)
            .service(clinics::save_settings)
            .service(members::list_members)
            .service(members::change_role)
            .service(members::deactivate_member)
            .service(members::list_invitations)
            .service(members::accept_invitation)
            .service(members::create_invitation)
            .service(members::revoke_invitation)
            .service(members::list_permissions)
            .service(members::update_permission)
            .service(patients::list_patients)
            .service(patients::import_patients)
            .service(patients::create_patient)
            .service(patients::show_patient)
            .service(patients::update_patient)
            .service(patients::deactivate_patient)
            .service(patients::reactivate_patient)
            .service(patients::patient_history)
            .service(packages::list_packages)
            .service(packages::create_package)
            .service(packages::show_package)
            .service(packages::deactivate_package)
            .service(medical::show_record)
            .service(medical::save_record)
            .service(medical::list_evolutions)
            .service(medical::create_evolution)
            .service(medical::update_evolution)
            .service(medical::delete_evolution)
            .service(professionals::list_professionals)
            .service(professionals::create_professional)
            .service(professionals::show_professional)
            .service(professionals::update_professional)
            .service(professionals::deactivate_professional)
            .service(professionals::list_rooms)
            .service(professionals::create_room)
            .service(professionals::show_room)
            .service(professionals::update_room)
            .service(professionals::deactivate_room)
            .service(appointments::list_appointments)
            .service(appointments::create_recurring)
            .service(appointments::create_appointment)
            .service(appointments::cancel_series)
            .service(appointments::show_appointment)
            .service(appointments::update_appointment)
            .service(appointments::delete_appointment)
            .service(appointments::reschedule)
            .service(appointments::set_status)
            .service(appointments::day_view)
            .service(appointments::week_view)
            .service(appointments::available_slots)
            .service(finance::summary)
            .service(finance::list_payables)
            .service(finance::create_payable)
            .service(finance::show_payable)
            .service(finance::update_payable)
            .service(finance::pay_payable)
            .service(finance::unpay_payable)
            .service(finance::delete_payable)
            .service(finance::list_receivables)
            .service(finance::create_receivable)
            .service(finance::show_receivable)
            .service(finance::update_receivable)
            .service(finance::pay_receivable)
            .service(finance::unpay_receivable)
            .service(finance::delete_receivable)
            .service(leads::list_leads)
            .service(leads::create_lead)
            .service(leads::show_lead)
            .service(leads::update_lead)
            .service(leads::set_lead_status)
            .service(leads::convert_lead)
            .service(leads::delete_lead)
            .service(dashboard::show_dashboard)
            .service(reports::financial_csv)
            .service(reports::financial_report)
            .service(reports::appointments_report),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::body::to_bytes;

    use super::*;
    use crate::repository::errors::RepositoryError;

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(ServiceError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::TypeConstraint("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let err = ServiceError::Repository(RepositoryError::DatabaseError(
            "no such table: patients".into(),
        ));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Erro interno do servidor");
    }

    #[actix_web::test]
    async fn form_errors_carry_message() {
        let response = ServiceError::Form("Nome obrigatório".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "Nome obrigatório");
    }
}
