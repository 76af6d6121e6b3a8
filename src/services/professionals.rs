use crate::domain::permission::{Action, Module};
use crate::domain::professional::{
    NewProfessional, NewRoom, Professional, ProfessionalDetails, Room, RoomDetails,
};
use crate::domain::types::{ClinicId, ProfessionalId, RoomId};
use crate::forms::professionals::{ProfessionalForm, RoomForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{MemberReader, PermissionReader, ProfessionalReader, ProfessionalWriter};
use crate::services::access::ensure_permission;
use crate::services::{ServiceError, ServiceResult, log_failure};

pub fn list_professionals<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    include_inactive: bool,
) -> ServiceResult<Vec<Professional>>
where
    R: ProfessionalReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let professionals = repo
        .list_professionals(clinic_id, include_inactive)
        .map_err(log_failure("Failed to list professionals"))?;
    Ok(professionals)
}

pub fn get_professional<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    professional_id: i32,
) -> ServiceResult<Professional>
where
    R: ProfessionalReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    repo.get_professional(clinic_id, ProfessionalId::new(professional_id)?)
        .map_err(log_failure("Failed to load professional"))?
        .ok_or(ServiceError::NotFound)
}

pub fn create_professional<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: ProfessionalForm,
) -> ServiceResult<Professional>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Create)?;
    let details = ProfessionalDetails::try_from(form)?;
    let professional = repo
        .create_professional(&NewProfessional { clinic_id, details })
        .map_err(log_failure("Failed to create professional"))?;
    Ok(professional)
}

pub fn update_professional<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    professional_id: i32,
    form: ProfessionalForm,
) -> ServiceResult<Professional>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Edit)?;
    let details = ProfessionalDetails::try_from(form)?;
    let professional = repo
        .update_professional(clinic_id, ProfessionalId::new(professional_id)?, &details)
        .map_err(log_failure("Failed to update professional"))?;
    Ok(professional)
}

/// Soft delete; past appointments keep pointing at the professional.
pub fn deactivate_professional<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    professional_id: i32,
) -> ServiceResult<Professional>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Delete)?;
    let professional = repo
        .set_professional_active(clinic_id, ProfessionalId::new(professional_id)?, false)
        .map_err(log_failure("Failed to deactivate professional"))?;
    Ok(professional)
}

pub fn list_rooms<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    include_inactive: bool,
) -> ServiceResult<Vec<Room>>
where
    R: ProfessionalReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let rooms = repo
        .list_rooms(clinic_id, include_inactive)
        .map_err(log_failure("Failed to list rooms"))?;
    Ok(rooms)
}

pub fn get_room<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    room_id: i32,
) -> ServiceResult<Room>
where
    R: ProfessionalReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    repo.get_room(clinic_id, RoomId::new(room_id)?)
        .map_err(log_failure("Failed to load room"))?
        .ok_or(ServiceError::NotFound)
}

pub fn create_room<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: RoomForm,
) -> ServiceResult<Room>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Create)?;
    let details = RoomDetails::try_from(form)?;
    let room = repo
        .create_room(&NewRoom { clinic_id, details })
        .map_err(log_failure("Failed to create room"))?;
    Ok(room)
}

pub fn update_room<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    room_id: i32,
    form: RoomForm,
) -> ServiceResult<Room>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Edit)?;
    let details = RoomDetails::try_from(form)?;
    let room = repo
        .update_room(clinic_id, RoomId::new(room_id)?, &details)
        .map_err(log_failure("Failed to update room"))?;
    Ok(room)
}

pub fn deactivate_room<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    room_id: i32,
) -> ServiceResult<Room>
where
    R: ProfessionalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Delete)?;
    let room = repo
        .set_room_active(clinic_id, RoomId::new(room_id)?, false)
        .map_err(log_failure("Failed to deactivate room"))?;
    Ok(room)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::member::Role;
    use crate::domain::types::{HexColor, PersonName};
    use crate::services::access::test_support::*;

    fn professional(id: ProfessionalId, details: &ProfessionalDetails) -> Professional {
        Professional {
            id,
            clinic_id: clinic(),
            name: details.name.clone(),
            specialty: details.specialty.clone(),
            registration: details.registration.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            color: details.color.clone(),
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn form() -> ProfessionalForm {
        ProfessionalForm {
            name: "Dra. Bruna".into(),
            specialty: Some("Ortopedia".into()),
            registration: Some("CREFITO-3 12345-F".into()),
            email: None,
            phone: None,
            color: None,
        }
    }

    #[test]
    fn physiotherapist_reads_but_cannot_write() {
        let mut repo = repo_as(Role::Physiotherapist);
        repo.expect_list_professionals().returning(|_, _| Ok(vec![]));
        repo.expect_create_professional().never();

        assert!(list_professionals(&repo, &user(), clinic(), false).is_ok());
        assert!(matches!(
            create_professional(&repo, &user(), clinic(), form()),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn admin_creates_with_default_color() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_create_professional().returning(|new| {
            Ok(professional(ProfessionalId::new(3).unwrap(), &new.details))
        });

        let created = create_professional(&repo, &user(), clinic(), form()).unwrap();
        assert_eq!(created.color, HexColor::default());
        assert_eq!(created.name, PersonName::new("Dra. Bruna").unwrap());
    }

    #[test]
    fn missing_room_is_not_found() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_room().returning(|_, _| Ok(None));

        assert!(matches!(
            get_room(&repo, &user(), clinic(), 9),
            Err(ServiceError::NotFound)
        ));
    }
}
