use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::patient::{
    NewPatient as DomainNewPatient, Patient as DomainPatient, PatientDetails,
};
use crate::domain::types::{
    ClinicId, Cpf, Email, PatientId, PersonName, PhoneNumber, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::patients)]
/// Diesel model for [`crate::domain::patient::Patient`].
pub struct Patient {
    pub id: i32,
    pub clinic_id: i32,
    pub name: String,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub health_insurance: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::patients)]
pub struct NewPatient<'a> {
    pub clinic_id: i32,
    pub name: &'a str,
    pub cpf: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub health_insurance: Option<&'a str>,
    pub emergency_contact: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::patients)]
#[diesel(treat_none_as_null = true)]
/// Full replacement of the editable patient columns.
pub struct UpdatePatient<'a> {
    pub name: &'a str,
    pub cpf: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub health_insurance: Option<&'a str>,
    pub emergency_contact: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Patient> for DomainPatient {
    type Error = TypeConstraintError;

    fn try_from(patient: Patient) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PatientId::try_from(patient.id)?,
            clinic_id: ClinicId::try_from(patient.clinic_id)?,
            name: PersonName::new(patient.name)?,
            cpf: patient.cpf.map(Cpf::new).transpose()?,
            birth_date: patient.birth_date,
            phone: patient.phone.map(PhoneNumber::new).transpose()?,
            email: patient.email.map(Email::new).transpose()?,
            address: patient.address,
            health_insurance: patient.health_insurance,
            emergency_contact: patient.emergency_contact,
            notes: patient.notes,
            is_active: patient.is_active,
            created_at: patient.created_at,
            updated_at: patient.updated_at,
        })
    }
}

impl<'a> NewPatient<'a> {
    pub fn from_domain(patient: &'a DomainNewPatient, now: NaiveDateTime) -> Self {
        let d = &patient.details;
        Self {
            clinic_id: patient.clinic_id.get(),
            name: d.name.as_str(),
            cpf: d.cpf.as_ref().map(Cpf::as_str),
            birth_date: d.birth_date,
            phone: d.phone.as_ref().map(PhoneNumber::as_str),
            email: d.email.as_ref().map(Email::as_str),
            address: d.address.as_deref(),
            health_insurance: d.health_insurance.as_deref(),
            emergency_contact: d.emergency_contact.as_deref(),
            notes: d.notes.as_deref(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> UpdatePatient<'a> {
    pub fn from_domain(d: &'a PatientDetails, now: NaiveDateTime) -> Self {
        Self {
            name: d.name.as_str(),
            cpf: d.cpf.as_ref().map(Cpf::as_str),
            birth_date: d.birth_date,
            phone: d.phone.as_ref().map(PhoneNumber::as_str),
            email: d.email.as_ref().map(Email::as_str),
            address: d.address.as_deref(),
            health_insurance: d.health_insurance.as_deref(),
            emergency_contact: d.emergency_contact.as_deref(),
            notes: d.notes.as_deref(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_patient_borrows_normalized_values() {
        let mut details = PatientDetails::named(PersonName::new("Lia").unwrap());
        details.cpf = Some(Cpf::new("529.982.247-25").unwrap());
        details.email = Some(Email::new("LIA@x.com").unwrap());
        let domain = DomainNewPatient::new(ClinicId::new(1).unwrap(), details);

        let now = chrono::Local::now().naive_local();
        let row = NewPatient::from_domain(&domain, now);
        assert_eq!(row.cpf, Some("52998224725"));
        assert_eq!(row.email, Some("lia@x.com"));
        assert!(row.is_active);
    }

    #[test]
    fn stored_row_with_bad_cpf_fails_conversion() {
        let now = chrono::Local::now().naive_local();
        let row = Patient {
            id: 1,
            clinic_id: 1,
            name: "Lia".into(),
            cpf: Some("11111111111".into()),
            birth_date: None,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            DomainPatient::try_from(row),
            Err(TypeConstraintError::InvalidCpf)
        );
    }
}
