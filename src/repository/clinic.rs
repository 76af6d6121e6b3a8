use diesel::prelude::*;

use crate::domain::clinic::{Clinic, ClinicSettings, NewClinic};
use crate::domain::member::{Member, NewMember, Role};
use crate::domain::types::{ClinicId, Email, PersonName};
use crate::models::clinic::{
    Clinic as DbClinic, ClinicSettings as DbClinicSettings, NewClinic as DbNewClinic,
};
use crate::models::member::{Member as DbMember, NewMember as DbNewMember};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ClinicReader, ClinicWriter, DieselRepository, now};
use crate::schema::{clinic_settings, clinics, members};

impl ClinicReader for DieselRepository {
    fn get_clinic(&self, id: ClinicId) -> RepositoryResult<Option<Clinic>> {
        let mut conn = self.conn()?;
        let clinic = clinics::table
            .find(id.get())
            .first::<DbClinic>(&mut conn)
            .optional()?;

        clinic
            .map(Clinic::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }

    fn list_clinics_for_email(&self, email: &Email) -> RepositoryResult<Vec<(Clinic, Member)>> {
        let mut conn = self.conn()?;
        let rows = clinics::table
            .inner_join(members::table)
            .filter(members::email.eq(email.as_str()))
            .filter(members::is_active.eq(true))
            .order(clinics::name.asc())
            .select((DbClinic::as_select(), DbMember::as_select()))
            .load::<(DbClinic, DbMember)>(&mut conn)?;

        rows.into_iter()
            .map(|(clinic, member)| -> RepositoryResult<(Clinic, Member)> {
                Ok((Clinic::try_from(clinic)?, Member::try_from(member)?))
            })
            .collect()
    }

    fn get_settings(&self, clinic_id: ClinicId) -> RepositoryResult<Option<ClinicSettings>> {
        let mut conn = self.conn()?;
        let settings = clinic_settings::table
            .find(clinic_id.get())
            .select(DbClinicSettings::as_select())
            .first::<DbClinicSettings>(&mut conn)
            .optional()?;

        settings
            .map(ClinicSettings::try_from)
            .transpose()
            .map_err(RepositoryError::from)
    }
}

impl ClinicWriter for DieselRepository {
    fn create_clinic(
        &self,
        clinic: &NewClinic,
        admin_email: &Email,
        admin_name: &PersonName,
    ) -> RepositoryResult<(Clinic, Member)> {
        let mut conn = self.conn()?;
        let created_at = now();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let db_clinic = diesel::insert_into(clinics::table)
                .values(&DbNewClinic::from_domain(clinic, created_at))
                .get_result::<DbClinic>(conn)?;
            let clinic = Clinic::try_from(db_clinic)?;

            let settings = DbClinicSettings::from(&ClinicSettings::defaults(clinic.id));
            diesel::insert_into(clinic_settings::table)
                .values(&settings)
                .execute(conn)?;

            let admin = NewMember::new(clinic.id, admin_email.clone(), admin_name.clone(), Role::Admin);
            let db_member = diesel::insert_into(members::table)
                .values(&DbNewMember::from_domain(&admin, created_at))
                .get_result::<DbMember>(conn)?;

            Ok((clinic, Member::try_from(db_member)?))
        })
    }

    fn update_settings(&self, settings: &ClinicSettings) -> RepositoryResult<ClinicSettings> {
        let mut conn = self.conn()?;
        let row = DbClinicSettings::from(settings);

        let updated = diesel::update(clinic_settings::table.find(row.clinic_id))
            .set(&row)
            .get_result::<DbClinicSettings>(&mut conn)?;

        Ok(ClinicSettings::try_from(updated)?)
    }
}
