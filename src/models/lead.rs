use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::lead::{Lead as DomainLead, LeadDetails, NewLead as DomainNewLead};
use crate::domain::types::{
    ClinicId, Email, LeadId, PatientId, PersonName, PhoneNumber, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::leads)]
pub struct Lead {
    pub id: i32,
    pub clinic_id: i32,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub notes: Option<String>,
    pub converted_patient_id: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::leads)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateLead<'a> {
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub source: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::leads)]
pub struct NewLead<'a> {
    pub clinic_id: i32,
    pub status: &'a str,
    #[diesel(embed)]
    pub details: UpdateLead<'a>,
    pub created_at: NaiveDateTime,
}

impl TryFrom<Lead> for DomainLead {
    type Error = TypeConstraintError;

    fn try_from(row: Lead) -> Result<Self, Self::Error> {
        Ok(Self {
            id: LeadId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            name: PersonName::new(row.name)?,
            phone: row.phone.map(PhoneNumber::new).transpose()?,
            email: row.email.map(Email::new).transpose()?,
            source: row.source,
            status: row.status.parse()?,
            notes: row.notes,
            converted_patient_id: row.converted_patient_id.map(PatientId::try_from).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> UpdateLead<'a> {
    pub fn from_domain(d: &'a LeadDetails, now: NaiveDateTime) -> Self {
        Self {
            name: d.name.as_str(),
            phone: d.phone.as_ref().map(PhoneNumber::as_str),
            email: d.email.as_ref().map(Email::as_str),
            source: d.source.as_deref(),
            notes: d.notes.as_deref(),
            updated_at: now,
        }
    }
}

impl<'a> NewLead<'a> {
    pub fn from_domain(lead: &'a DomainNewLead, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: lead.clinic_id.get(),
            status: lead.status.as_str(),
            details: UpdateLead::from_domain(&lead.details, now),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::LeadStatus;

    #[test]
    fn new_lead_starts_as_novo() {
        let details = LeadDetails {
            name: PersonName::new("Rita").unwrap(),
            phone: None,
            email: Some(Email::new("rita@x.com").unwrap()),
            source: Some("site".into()),
            notes: None,
        };
        let lead = DomainNewLead::new(ClinicId::new(1).unwrap(), details);
        let row = NewLead::from_domain(&lead, chrono::Local::now().naive_local());
        assert_eq!(row.status, LeadStatus::New.as_str());
        assert_eq!(row.details.email, Some("rita@x.com"));
    }
}
