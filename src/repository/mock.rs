//! Mock repository for isolating services in tests.

use chrono::{NaiveDate, NaiveDateTime};
use mockall::mock;

use crate::domain::appointment::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentStatus, AppointmentView,
    NewAppointment,
};
use crate::domain::clinic::{Clinic, ClinicSettings, NewClinic};
use crate::domain::finance::{
    FinanceFilter, NewPayable, NewReceivable, Payable, PayableDetails, Receivable,
    ReceivableDetails, Settlement,
};
use crate::domain::invitation::{Invitation, NewInvitation};
use crate::domain::lead::{Lead, LeadDetails, LeadStatus, NewLead};
use crate::domain::medical::{
    Evolution, EvolutionDetails, MedicalRecord, MedicalRecordContent, NewEvolution,
};
use crate::domain::member::{Member, Role};
use crate::domain::package::{NewSessionPackage, SessionPackage};
use crate::domain::patient::{NewPatient, Patient, PatientDetails, PatientListQuery};
use crate::domain::permission::Permission;
use crate::domain::professional::{
    NewProfessional, NewRoom, Professional, ProfessionalDetails, Room, RoomDetails,
};
use crate::domain::report::PaidEntry;
use crate::domain::types::{
    AppointmentId, ClinicId, Cpf, Email, EvolutionId, InvitationId, LeadId, MemberId, PackageId,
    PatientId, PayableId, PersonName, ProfessionalId, ReceivableId, RoomId,
};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AppointmentReader, AppointmentWriter, ClinicReader, ClinicWriter, FinanceReader,
    FinanceWriter, InvitationReader, InvitationWriter, LeadReader, LeadWriter, MedicalReader,
    MedicalWriter, MemberReader, MemberWriter, PackageReader, PackageWriter, PatientReader,
    PatientWriter, PermissionReader, PermissionWriter, ProfessionalReader, ProfessionalWriter,
};

mock! {
    pub Repository {}

    impl ClinicReader for Repository {
        fn get_clinic(&self, id: ClinicId) -> RepositoryResult<Option<Clinic>>;
        fn list_clinics_for_email(&self, email: &Email) -> RepositoryResult<Vec<(Clinic, Member)>>;
        fn get_settings(&self, clinic_id: ClinicId) -> RepositoryResult<Option<ClinicSettings>>;
    }

    impl ClinicWriter for Repository {
        fn create_clinic(
            &self,
            clinic: &NewClinic,
            admin_email: &Email,
            admin_name: &PersonName,
        ) -> RepositoryResult<(Clinic, Member)>;
        fn update_settings(&self, settings: &ClinicSettings) -> RepositoryResult<ClinicSettings>;
    }

    impl MemberReader for Repository {
        fn get_member(&self, clinic_id: ClinicId, id: MemberId) -> RepositoryResult<Option<Member>>;
        fn get_member_by_email(
            &self,
            clinic_id: ClinicId,
            email: &Email,
        ) -> RepositoryResult<Option<Member>>;
        fn list_members(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Member>>;
        fn count_active_admins(&self, clinic_id: ClinicId) -> RepositoryResult<usize>;
    }

    impl MemberWriter for Repository {
        fn set_member_role(
            &self,
            clinic_id: ClinicId,
            id: MemberId,
            role: Role,
        ) -> RepositoryResult<Member>;
        fn set_member_active(
            &self,
            clinic_id: ClinicId,
            id: MemberId,
            is_active: bool,
        ) -> RepositoryResult<Member>;
    }

    impl InvitationReader for Repository {
        fn get_invitation(
            &self,
            clinic_id: ClinicId,
            id: InvitationId,
        ) -> RepositoryResult<Option<Invitation>>;
        fn get_invitation_by_token(&self, token: &str) -> RepositoryResult<Option<Invitation>>;
        fn list_invitations(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Invitation>>;
        fn find_open_invitation(
            &self,
            clinic_id: ClinicId,
            email: &Email,
            now: NaiveDateTime,
        ) -> RepositoryResult<Option<Invitation>>;
    }

    impl InvitationWriter for Repository {
        fn create_invitation(&self, invitation: &NewInvitation) -> RepositoryResult<Invitation>;
        fn revoke_invitation(
            &self,
            clinic_id: ClinicId,
            id: InvitationId,
        ) -> RepositoryResult<Invitation>;
        fn accept_invitation(
            &self,
            invitation: &Invitation,
            name: &PersonName,
            now: NaiveDateTime,
        ) -> RepositoryResult<Member>;
    }

    impl PermissionReader for Repository {
        fn list_permission_overrides(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Permission>>;
    }

    impl PermissionWriter for Repository {
        fn upsert_permission(&self, permission: &Permission) -> RepositoryResult<Permission>;
    }

    impl PatientReader for Repository {
        fn get_patient(&self, clinic_id: ClinicId, id: PatientId) -> RepositoryResult<Option<Patient>>;
        fn list_patients(
            &self,
            clinic_id: ClinicId,
            query: &PatientListQuery,
        ) -> RepositoryResult<(usize, Vec<Patient>)>;
        fn find_patient_by_cpf(
            &self,
            clinic_id: ClinicId,
            cpf: &Cpf,
        ) -> RepositoryResult<Option<Patient>>;
        fn count_active_patients(&self, clinic_id: ClinicId) -> RepositoryResult<i64>;
    }

    impl PatientWriter for Repository {
        fn create_patient(&self, patient: &NewPatient) -> RepositoryResult<Patient>;
        fn create_patients(&self, patients: &[NewPatient]) -> RepositoryResult<usize>;
        fn update_patient(
            &self,
            clinic_id: ClinicId,
            id: PatientId,
            details: &PatientDetails,
        ) -> RepositoryResult<Patient>;
        fn set_patient_active(
            &self,
            clinic_id: ClinicId,
            id: PatientId,
            is_active: bool,
        ) -> RepositoryResult<Patient>;
    }

    impl ProfessionalReader for Repository {
        fn get_professional(
            &self,
            clinic_id: ClinicId,
            id: ProfessionalId,
        ) -> RepositoryResult<Option<Professional>>;
        fn list_professionals(
            &self,
            clinic_id: ClinicId,
            include_inactive: bool,
        ) -> RepositoryResult<Vec<Professional>>;
        fn get_room(&self, clinic_id: ClinicId, id: RoomId) -> RepositoryResult<Option<Room>>;
        fn list_rooms(&self, clinic_id: ClinicId, include_inactive: bool) -> RepositoryResult<Vec<Room>>;
    }

    impl ProfessionalWriter for Repository {
        fn create_professional(&self, professional: &NewProfessional)
        -> RepositoryResult<Professional>;
        fn update_professional(
            &self,
            clinic_id: ClinicId,
            id: ProfessionalId,
            details: &ProfessionalDetails,
        ) -> RepositoryResult<Professional>;
        fn set_professional_active(
            &self,
            clinic_id: ClinicId,
            id: ProfessionalId,
            is_active: bool,
        ) -> RepositoryResult<Professional>;
        fn create_room(&self, room: &NewRoom) -> RepositoryResult<Room>;
        fn update_room(
            &self,
            clinic_id: ClinicId,
            id: RoomId,
            details: &RoomDetails,
        ) -> RepositoryResult<Room>;
        fn set_room_active(
            &self,
            clinic_id: ClinicId,
            id: RoomId,
            is_active: bool,
        ) -> RepositoryResult<Room>;
    }

    impl AppointmentReader for Repository {
        fn get_appointment(
            &self,
            clinic_id: ClinicId,
            id: AppointmentId,
        ) -> RepositoryResult<Option<Appointment>>;
        fn list_appointments(
            &self,
            clinic_id: ClinicId,
            filter: &AppointmentFilter,
        ) -> RepositoryResult<Vec<AppointmentView>>;
        fn list_patient_appointments(
            &self,
            clinic_id: ClinicId,
            patient_id: PatientId,
        ) -> RepositoryResult<Vec<AppointmentView>>;
        fn busy_intervals(
            &self,
            clinic_id: ClinicId,
            professional_id: ProfessionalId,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> RepositoryResult<Vec<(NaiveDateTime, NaiveDateTime)>>;
    }

    impl AppointmentWriter for Repository {
        fn create_appointment(&self, appointment: &NewAppointment) -> RepositoryResult<Appointment>;
        fn create_appointments(
            &self,
            appointments: &[NewAppointment],
        ) -> RepositoryResult<Vec<Appointment>>;
        fn update_appointment(
            &self,
            clinic_id: ClinicId,
            id: AppointmentId,
            details: &AppointmentDetails,
        ) -> RepositoryResult<Appointment>;
        fn change_appointment_status(
            &self,
            clinic_id: ClinicId,
            id: AppointmentId,
            from: AppointmentStatus,
            to: AppointmentStatus,
            credit_change: i32,
        ) -> RepositoryResult<Appointment>;
        fn cancel_series(
            &self,
            clinic_id: ClinicId,
            recurrence_group: &str,
            from: NaiveDateTime,
        ) -> RepositoryResult<usize>;
        fn delete_appointment(
            &self,
            clinic_id: ClinicId,
            id: AppointmentId,
            return_credit: bool,
        ) -> RepositoryResult<()>;
    }

    impl PackageReader for Repository {
        fn get_package(
            &self,
            clinic_id: ClinicId,
            id: PackageId,
        ) -> RepositoryResult<Option<SessionPackage>>;
        fn list_packages(
            &self,
            clinic_id: ClinicId,
            patient_id: PatientId,
        ) -> RepositoryResult<Vec<SessionPackage>>;
    }

    impl PackageWriter for Repository {
        fn create_package<'a>(
            &self,
            package: &NewSessionPackage,
            receivable: Option<&'a ReceivableDetails>,
        ) -> RepositoryResult<(SessionPackage, Option<Receivable>)>;
        fn set_package_active(
            &self,
            clinic_id: ClinicId,
            id: PackageId,
            is_active: bool,
        ) -> RepositoryResult<SessionPackage>;
    }

    impl MedicalReader for Repository {
        fn get_medical_record(
            &self,
            clinic_id: ClinicId,
            patient_id: PatientId,
        ) -> RepositoryResult<Option<MedicalRecord>>;
        fn get_evolution(
            &self,
            clinic_id: ClinicId,
            id: EvolutionId,
        ) -> RepositoryResult<Option<Evolution>>;
        fn list_evolutions(
            &self,
            clinic_id: ClinicId,
            patient_id: PatientId,
        ) -> RepositoryResult<Vec<Evolution>>;
    }

    impl MedicalWriter for Repository {
        fn save_medical_record(
            &self,
            clinic_id: ClinicId,
            patient_id: PatientId,
            content: &MedicalRecordContent,
        ) -> RepositoryResult<MedicalRecord>;
        fn create_evolution(&self, evolution: &NewEvolution) -> RepositoryResult<Evolution>;
        fn update_evolution(
            &self,
            clinic_id: ClinicId,
            id: EvolutionId,
            details: &EvolutionDetails,
        ) -> RepositoryResult<Evolution>;
        fn delete_evolution(&self, clinic_id: ClinicId, id: EvolutionId) -> RepositoryResult<()>;
    }

    impl FinanceReader for Repository {
        fn get_payable(&self, clinic_id: ClinicId, id: PayableId) -> RepositoryResult<Option<Payable>>;
        fn list_payables(
            &self,
            clinic_id: ClinicId,
            filter: &FinanceFilter,
        ) -> RepositoryResult<Vec<Payable>>;
        fn get_receivable(
            &self,
            clinic_id: ClinicId,
            id: ReceivableId,
        ) -> RepositoryResult<Option<Receivable>>;
        fn list_receivables(
            &self,
            clinic_id: ClinicId,
            filter: &FinanceFilter,
        ) -> RepositoryResult<Vec<Receivable>>;
        fn list_paid_entries(
            &self,
            clinic_id: ClinicId,
            from: NaiveDate,
            to: NaiveDate,
        ) -> RepositoryResult<Vec<PaidEntry>>;
    }

    impl FinanceWriter for Repository {
        fn create_payable(&self, payable: &NewPayable) -> RepositoryResult<Payable>;
        fn update_payable(
            &self,
            clinic_id: ClinicId,
            id: PayableId,
            details: &PayableDetails,
        ) -> RepositoryResult<Payable>;
        fn settle_payable<'a>(
            &self,
            clinic_id: ClinicId,
            id: PayableId,
            settlement: Option<&'a Settlement>,
        ) -> RepositoryResult<Payable>;
        fn delete_payable(&self, clinic_id: ClinicId, id: PayableId) -> RepositoryResult<()>;
        fn create_receivable(&self, receivable: &NewReceivable) -> RepositoryResult<Receivable>;
        fn update_receivable(
            &self,
            clinic_id: ClinicId,
            id: ReceivableId,
            details: &ReceivableDetails,
        ) -> RepositoryResult<Receivable>;
        fn settle_receivable<'a>(
            &self,
            clinic_id: ClinicId,
            id: ReceivableId,
            settlement: Option<&'a Settlement>,
        ) -> RepositoryResult<Receivable>;
        fn delete_receivable(&self, clinic_id: ClinicId, id: ReceivableId) -> RepositoryResult<()>;
    }

    impl LeadReader for Repository {
        fn get_lead(&self, clinic_id: ClinicId, id: LeadId) -> RepositoryResult<Option<Lead>>;
        fn list_leads(
            &self,
            clinic_id: ClinicId,
            status: Option<LeadStatus>,
        ) -> RepositoryResult<Vec<Lead>>;
        fn count_leads_created_between(
            &self,
            clinic_id: ClinicId,
            from: NaiveDateTime,
            to: NaiveDateTime,
        ) -> RepositoryResult<i64>;
    }

    impl LeadWriter for Repository {
        fn create_lead(&self, lead: &NewLead) -> RepositoryResult<Lead>;
        fn update_lead(
            &self,
            clinic_id: ClinicId,
            id: LeadId,
            details: &LeadDetails,
        ) -> RepositoryResult<Lead>;
        fn set_lead_status(
            &self,
            clinic_id: ClinicId,
            id: LeadId,
            status: LeadStatus,
        ) -> RepositoryResult<Lead>;
        fn delete_lead(&self, clinic_id: ClinicId, id: LeadId) -> RepositoryResult<()>;
        fn convert_lead(
            &self,
            clinic_id: ClinicId,
            id: LeadId,
            patient: &NewPatient,
        ) -> RepositoryResult<(Lead, Patient)>;
    }
}
