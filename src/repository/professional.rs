//! Professionals and rooms.

use diesel::prelude::*;

use crate::domain::professional::{
    NewProfessional, NewRoom, Professional, ProfessionalDetails, Room, RoomDetails,
};
use crate::domain::types::{ClinicId, ProfessionalId, RoomId};
use crate::models::professional::{
    NewProfessional as DbNewProfessional, NewRoom as DbNewRoom, Professional as DbProfessional,
    Room as DbRoom, UpdateProfessional as DbUpdateProfessional, UpdateRoom as DbUpdateRoom,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, ProfessionalReader, ProfessionalWriter, now};
use crate::schema::{professionals, rooms};

impl ProfessionalReader for DieselRepository {
    fn get_professional(
        &self,
        clinic_id: ClinicId,
        id: ProfessionalId,
    ) -> RepositoryResult<Option<Professional>> {
        let mut conn = self.conn()?;
        let professional = professionals::table
            .filter(professionals::clinic_id.eq(clinic_id.get()))
            .filter(professionals::id.eq(id.get()))
            .first::<DbProfessional>(&mut conn)
            .optional()?;

        Ok(professional.map(Professional::try_from).transpose()?)
    }

    fn list_professionals(
        &self,
        clinic_id: ClinicId,
        include_inactive: bool,
    ) -> RepositoryResult<Vec<Professional>> {
        let mut conn = self.conn()?;
        let mut query = professionals::table
            .filter(professionals::clinic_id.eq(clinic_id.get()))
            .into_boxed();
        if !include_inactive {
            query = query.filter(professionals::is_active.eq(true));
        }
        let rows = query
            .order(professionals::name.asc())
            .load::<DbProfessional>(&mut conn)?;

        rows.into_iter()
            .map(|row| Professional::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    fn get_room(&self, clinic_id: ClinicId, id: RoomId) -> RepositoryResult<Option<Room>> {
        let mut conn = self.conn()?;
        let room = rooms::table
            .filter(rooms::clinic_id.eq(clinic_id.get()))
            .filter(rooms::id.eq(id.get()))
            .first::<DbRoom>(&mut conn)
            .optional()?;

        Ok(room.map(Room::try_from).transpose()?)
    }

    fn list_rooms(&self, clinic_id: ClinicId, include_inactive: bool) -> RepositoryResult<Vec<Room>> {
        let mut conn = self.conn()?;
        let mut query = rooms::table
            .filter(rooms::clinic_id.eq(clinic_id.get()))
            .into_boxed();
        if !include_inactive {
            query = query.filter(rooms::is_active.eq(true));
        }
        let rows = query.order(rooms::name.asc()).load::<DbRoom>(&mut conn)?;

        rows.into_iter()
            .map(|row| Room::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl ProfessionalWriter for DieselRepository {
    fn create_professional(
        &self,
        professional: &NewProfessional,
    ) -> RepositoryResult<Professional> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(professionals::table)
            .values(&DbNewProfessional::from_domain(professional, now()))
            .get_result::<DbProfessional>(&mut conn)?;

        Ok(Professional::try_from(created)?)
    }

    fn update_professional(
        &self,
        clinic_id: ClinicId,
        id: ProfessionalId,
        details: &ProfessionalDetails,
    ) -> RepositoryResult<Professional> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            professionals::table
                .filter(professionals::clinic_id.eq(clinic_id.get()))
                .filter(professionals::id.eq(id.get())),
        )
        .set(&DbUpdateProfessional::from(details))
        .get_result::<DbProfessional>(&mut conn)?;

        Ok(Professional::try_from(updated)?)
    }

    fn set_professional_active(
        &self,
        clinic_id: ClinicId,
        id: ProfessionalId,
        is_active: bool,
    ) -> RepositoryResult<Professional> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            professionals::table
                .filter(professionals::clinic_id.eq(clinic_id.get()))
                .filter(professionals::id.eq(id.get())),
        )
        .set(professionals::is_active.eq(is_active))
        .get_result::<DbProfessional>(&mut conn)?;

        Ok(Professional::try_from(updated)?)
    }

    fn create_room(&self, room: &NewRoom) -> RepositoryResult<Room> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(rooms::table)
            .values(&DbNewRoom::from_domain(room, now()))
            .get_result::<DbRoom>(&mut conn)?;

        Ok(Room::try_from(created)?)
    }

    fn update_room(
        &self,
        clinic_id: ClinicId,
        id: RoomId,
        details: &RoomDetails,
    ) -> RepositoryResult<Room> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            rooms::table
                .filter(rooms::clinic_id.eq(clinic_id.get()))
                .filter(rooms::id.eq(id.get())),
        )
        .set(&DbUpdateRoom::from(details))
        .get_result::<DbRoom>(&mut conn)?;

        Ok(Room::try_from(updated)?)
    }

    fn set_room_active(
        &self,
        clinic_id: ClinicId,
        id: RoomId,
        is_active: bool,
    ) -> RepositoryResult<Room> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            rooms::table
                .filter(rooms::clinic_id.eq(clinic_id.get()))
                .filter(rooms::id.eq(id.get())),
        )
        .set(rooms::is_active.eq(is_active))
        .get_result::<DbRoom>(&mut conn)?;

        Ok(Room::try_from(updated)?)
    }
}
