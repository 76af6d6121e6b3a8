//! Role based permission matrix with per-clinic overrides.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::member::Role;
use crate::domain::types::{ClinicId, TypeConstraintError};

/// Application areas guarded by permissions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Module {
    #[serde(rename = "pacientes")]
    Patients,
    #[serde(rename = "agenda")]
    Agenda,
    #[serde(rename = "prontuarios")]
    MedicalRecords,
    #[serde(rename = "financeiro")]
    Financial,
    #[serde(rename = "relatorios")]
    Reports,
    #[serde(rename = "leads")]
    Leads,
    #[serde(rename = "configuracoes")]
    Settings,
    #[serde(rename = "usuarios")]
    Users,
}

impl Module {
    pub const ALL: [Module; 8] = [
        Module::Patients,
        Module::Agenda,
        Module::MedicalRecords,
        Module::Financial,
        Module::Reports,
        Module::Leads,
        Module::Settings,
        Module::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Patients => "pacientes",
            Module::Agenda => "agenda",
            Module::MedicalRecords => "prontuarios",
            Module::Financial => "financeiro",
            Module::Reports => "relatorios",
            Module::Leads => "leads",
            Module::Settings => "configuracoes",
            Module::Users => "usuarios",
        }
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Module {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|module| module.as_str() == s)
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("module {s}")))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionFlags {
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl PermissionFlags {
    pub const ALL: PermissionFlags = PermissionFlags::new(true, true, true, true);
    pub const NONE: PermissionFlags = PermissionFlags::new(false, false, false, false);
    pub const VIEW: PermissionFlags = PermissionFlags::new(true, false, false, false);

    pub const fn new(can_view: bool, can_create: bool, can_edit: bool, can_delete: bool) -> Self {
        Self {
            can_view,
            can_create,
            can_edit,
            can_delete,
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::View => self.can_view,
            Action::Create => self.can_create,
            Action::Edit => self.can_edit,
            Action::Delete => self.can_delete,
        }
    }
}

/// Stored override of the default flags for one (role, module) pair in a clinic.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Permission {
    pub clinic_id: ClinicId,
    pub role: Role,
    pub module: Module,
    pub flags: PermissionFlags,
}

/// Built-in flags used when a clinic has not customised a role.
pub fn default_flags(role: Role, module: Module) -> PermissionFlags {
    use Module::*;

    let view_create_edit = PermissionFlags::new(true, true, true, false);
    match role {
        Role::Admin => PermissionFlags::ALL,
        Role::Physiotherapist => match module {
            Patients => view_create_edit,
            Agenda | MedicalRecords => PermissionFlags::ALL,
            Leads => PermissionFlags::VIEW,
            _ => PermissionFlags::NONE,
        },
        Role::Receptionist => match module {
            Patients => view_create_edit,
            Agenda | Leads => PermissionFlags::ALL,
            Financial => PermissionFlags::new(true, true, false, false),
            _ => PermissionFlags::NONE,
        },
        Role::Financial => match module {
            Patients | Agenda | Reports => PermissionFlags::VIEW,
            Financial => PermissionFlags::ALL,
            _ => PermissionFlags::NONE,
        },
    }
}

/// Effective flags of a role for every module.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PermissionMatrix {
    pub role: Role,
    pub modules: BTreeMap<Module, PermissionFlags>,
}

impl PermissionMatrix {
    /// Merges stored overrides over the defaults. Admins always keep full access.
    pub fn resolve(role: Role, overrides: &[Permission]) -> Self {
        let modules = Module::ALL
            .into_iter()
            .map(|module| {
                let flags = if role == Role::Admin {
                    PermissionFlags::ALL
                } else {
                    overrides
                        .iter()
                        .find(|p| p.role == role && p.module == module)
                        .map(|p| p.flags)
                        .unwrap_or_else(|| default_flags(role, module))
                };
                (module, flags)
            })
            .collect();
        Self { role, modules }
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.modules
            .get(&module)
            .is_some_and(|flags| flags.allows(action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn override_for(role: Role, module: Module, flags: PermissionFlags) -> Permission {
        Permission {
            clinic_id: ClinicId::new(1).unwrap(),
            role,
            module,
            flags,
        }
    }

    #[test]
    fn defaults_follow_role_profiles() {
        let physio = PermissionMatrix::resolve(Role::Physiotherapist, &[]);
        assert!(physio.allows(Module::MedicalRecords, Action::Delete));
        assert!(!physio.allows(Module::Financial, Action::View));
        assert!(!physio.allows(Module::Patients, Action::Delete));

        let reception = PermissionMatrix::resolve(Role::Receptionist, &[]);
        assert!(reception.allows(Module::Financial, Action::Create));
        assert!(!reception.allows(Module::Financial, Action::Edit));
        assert!(!reception.allows(Module::MedicalRecords, Action::View));

        let finance = PermissionMatrix::resolve(Role::Financial, &[]);
        assert!(finance.allows(Module::Reports, Action::View));
        assert!(!finance.allows(Module::Users, Action::View));
    }

    #[test]
    fn overrides_replace_defaults_for_their_pair_only() {
        let overrides = [override_for(
            Role::Receptionist,
            Module::MedicalRecords,
            PermissionFlags::VIEW,
        )];
        let matrix = PermissionMatrix::resolve(Role::Receptionist, &overrides);
        assert!(matrix.allows(Module::MedicalRecords, Action::View));
        assert!(!matrix.allows(Module::MedicalRecords, Action::Edit));
        assert!(matrix.allows(Module::Agenda, Action::Delete));
    }

    #[test]
    fn admin_ignores_restrictive_overrides() {
        let overrides = [override_for(Role::Admin, Module::Users, PermissionFlags::NONE)];
        let matrix = PermissionMatrix::resolve(Role::Admin, &overrides);
        for module in Module::ALL {
            assert!(matrix.allows(module, Action::Delete));
        }
    }

    #[test]
    fn module_names_parse() {
        for module in Module::ALL {
            assert_eq!(module.as_str().parse::<Module>(), Ok(module));
        }
        assert!("estoque".parse::<Module>().is_err());
    }
}
