use fisio_clinic::domain::patient::{NewPatient, PatientDetails};
use fisio_clinic::domain::types::{ClinicId, PersonName};
use fisio_clinic::repository::errors::RepositoryError;
use fisio_clinic::repository::{DieselRepository, PatientWriter};

mod common;

#[test]
fn test_pool_hands_out_connections() {
    let test_db = common::TestDb::new("test_pool_connection.db");
    let conn = test_db.pool().get();
    assert!(conn.is_ok());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let test_db = common::TestDb::new("test_foreign_keys.db");
    let repo = DieselRepository::new(test_db.pool());

    let orphan = NewPatient::new(
        ClinicId::new(999).unwrap(),
        PatientDetails::named(PersonName::new("Sem Clínica").unwrap()),
    );
    let err = repo.create_patient(&orphan).unwrap_err();
    assert!(matches!(err, RepositoryError::ConstraintViolation(_)));
}
