use serde::Deserialize;
use validator::Validate;

use crate::domain::member::Role;
use crate::domain::permission::{Module, PermissionFlags};
use crate::domain::types::Email;
use crate::forms::FormError;

#[derive(Deserialize)]
pub struct ChangeRoleForm {
    pub role: Role,
}

#[derive(Deserialize, Validate)]
pub struct InvitationForm {
    #[validate(email)]
    pub email: String,
    pub role: Role,
}

pub struct InvitationPayload {
    pub email: Email,
    pub role: Role,
}

impl TryFrom<InvitationForm> for InvitationPayload {
    type Error = FormError;

    fn try_from(form: InvitationForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(Self {
            email: Email::new(form.email)?,
            role: form.role,
        })
    }
}

#[derive(Deserialize)]
pub struct AcceptInvitationForm {
    pub token: String,
}

/// Flags for one (role, module) cell of the permission matrix.
#[derive(Deserialize)]
pub struct PermissionForm {
    pub role: Role,
    pub module: Module,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl PermissionForm {
    pub fn flags(&self) -> PermissionFlags {
        PermissionFlags::new(self.can_view, self.can_create, self.can_edit, self.can_delete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invitation_email_is_normalized() {
        let payload = InvitationPayload::try_from(InvitationForm {
            email: "Bia@Clinica.COM".into(),
            role: Role::Receptionist,
        })
        .unwrap();
        assert_eq!(payload.email.as_str(), "bia@clinica.com");
    }

    #[test]
    fn invitation_requires_email() {
        let form = InvitationForm {
            email: "bia".into(),
            role: Role::Receptionist,
        };
        assert!(matches!(
            InvitationPayload::try_from(form),
            Err(FormError::Validation(_))
        ));
    }

    #[test]
    fn permission_form_deserializes_wire_names() {
        let form: PermissionForm = serde_json::from_str(
            r#"{"role":"recepcionista","module":"financeiro","can_view":true,
                "can_create":false,"can_edit":false,"can_delete":false}"#,
        )
        .unwrap();
        assert_eq!(form.module, Module::Financial);
        assert_eq!(form.flags(), PermissionFlags::VIEW);
    }
}
