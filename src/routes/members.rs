use actix_session::Session;
use actix_web::{HttpResponse, get, post, put, web};

use crate::forms::members::{AcceptInvitationForm, ChangeRoleForm, InvitationForm, PermissionForm};
use crate::models::auth::AuthenticatedUser;
use crate::models::config::ServerConfig;
use crate::repository::{DieselRepository, now};
use crate::routes::{ActiveClinic, remember_clinic};
use crate::services::{ServiceError, members as members_service};

#[get("/members")]
pub async fn list_members(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let members = members_service::list_members(repo.get_ref(), &user, clinic.id())?;
    Ok(HttpResponse::Ok().json(members))
}

#[put("/members/{member_id}/role")]
pub async fn change_role(
    member_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ChangeRoleForm>,
) -> Result<HttpResponse, ServiceError> {
    let member = members_service::change_role(
        repo.get_ref(),
        &user,
        clinic.id(),
        member_id.into_inner(),
        form,
    )?;
    Ok(HttpResponse::Ok().json(member))
}

#[post("/members/{member_id}/deactivate")]
pub async fn deactivate_member(
    member_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let member =
        members_service::deactivate_member(repo.get_ref(), &user, clinic.id(), member_id.into_inner())?;
    Ok(HttpResponse::Ok().json(member))
}

#[get("/invitations")]
pub async fn list_invitations(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let invitations = members_service::list_invitations(repo.get_ref(), &user, clinic.id(), now())?;
    Ok(HttpResponse::Ok().json(invitations))
}

/// Returns the new invitation including its token, the only time it is shown.
#[post("/invitations")]
pub async fn create_invitation(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    server_config: web::Data<ServerConfig>,
    web::Json(form): web::Json<InvitationForm>,
) -> Result<HttpResponse, ServiceError> {
    let invitation = members_service::create_invitation(
        repo.get_ref(),
        &user,
        clinic.id(),
        form,
        now(),
        server_config.invitation_ttl_days,
    )?;
    Ok(HttpResponse::Created().json(invitation))
}

#[post("/invitations/{invitation_id}/revoke")]
pub async fn revoke_invitation(
    invitation_id: web::Path<i32>,
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let invitation = members_service::revoke_invitation(
        repo.get_ref(),
        &user,
        clinic.id(),
        invitation_id.into_inner(),
        now(),
    )?;
    Ok(HttpResponse::Ok().json(invitation))
}

/// Joins the inviting clinic and selects it.
#[post("/invitations/accept")]
pub async fn accept_invitation(
    user: AuthenticatedUser,
    session: Session,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<AcceptInvitationForm>,
) -> Result<HttpResponse, ServiceError> {
    let membership = members_service::accept_invitation(repo.get_ref(), &user, form, now())?;
    remember_clinic(&session, membership.clinic.id)?;
    Ok(HttpResponse::Ok().json(membership))
}

#[get("/permissions")]
pub async fn list_permissions(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let matrices = members_service::list_permissions(repo.get_ref(), &user, clinic.id())?;
    Ok(HttpResponse::Ok().json(matrices))
}

#[put("/permissions")]
pub async fn update_permission(
    user: AuthenticatedUser,
    clinic: ActiveClinic,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PermissionForm>,
) -> Result<HttpResponse, ServiceError> {
    let matrix = members_service::update_permission(repo.get_ref(), &user, clinic.id(), form)?;
    Ok(HttpResponse::Ok().json(matrix))
}
