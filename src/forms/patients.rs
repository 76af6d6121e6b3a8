use std::io::Read;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::patient::PatientDetails;
use crate::domain::types::{Cpf, PersonName, clean_optional};
use crate::forms::{FormError, optional_email, optional_phone};

#[derive(Deserialize, Validate)]
pub struct PatientForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub health_insurance: Option<String>,
    pub emergency_contact: Option<String>,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
}

impl TryFrom<PatientForm> for PatientDetails {
    type Error = FormError;

    fn try_from(form: PatientForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(PatientDetails {
            name: PersonName::new(form.name)?,
            cpf: clean_optional(form.cpf).map(Cpf::new).transpose()?,
            birth_date: form.birth_date,
            phone: optional_phone(form.phone)?,
            email: optional_email(form.email)?,
            address: clean_optional(form.address),
            health_insurance: clean_optional(form.health_insurance),
            emergency_contact: clean_optional(form.emergency_contact),
            notes: clean_optional(form.notes),
        })
    }
}

#[derive(MultipartForm)]
pub struct ImportPatientsForm {
    #[multipart(limit = "10MB")]
    pub csv: TempFile,
}

#[derive(Deserialize)]
struct PatientCsvRow {
    #[serde(default)]
    name: String,
    cpf: Option<String>,
    birth_date: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    health_insurance: Option<String>,
}

/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`.
fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d/%m/%Y"))
        .ok()
}

impl PatientCsvRow {
    fn into_details(self, line: u64) -> Result<PatientDetails, FormError> {
        let at_line = |err: FormError| FormError::Csv(format!("linha {line}: {err}"));

        let name = PersonName::new(self.name)
            .map_err(|_| FormError::Csv(format!("linha {line}: nome obrigatório")))?;
        let birth_date = match clean_optional(self.birth_date) {
            Some(value) => Some(parse_birth_date(&value).ok_or_else(|| {
                FormError::Csv(format!("linha {line}: data de nascimento inválida"))
            })?),
            None => None,
        };

        Ok(PatientDetails {
            name,
            cpf: clean_optional(self.cpf)
                .map(Cpf::new)
                .transpose()
                .map_err(|err| at_line(err.into()))?,
            birth_date,
            phone: optional_phone(self.phone).map_err(at_line)?,
            email: optional_email(self.email).map_err(at_line)?,
            address: clean_optional(self.address),
            health_insurance: clean_optional(self.health_insurance),
            emergency_contact: None,
            notes: None,
        })
    }
}

/// Reads patients from a CSV with a `name` column and optional contact columns.
/// Any invalid row rejects the whole file, naming the offending line.
pub fn parse_patients_csv<R: Read>(reader: R) -> Result<Vec<PatientDetails>, FormError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| FormError::Csv(e.to_string()))?
        .clone();
    if !headers.iter().any(|h| h == "name") {
        return Err(FormError::Csv("coluna \"name\" ausente".to_string()));
    }

    let mut patients = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| FormError::Csv(e.to_string()))?;
        let line = record.position().map_or(0, |position| position.line());
        let row: PatientCsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| FormError::Csv(format!("linha {line}: {e}")))?;
        patients.push(row.into_details(line)?);
    }
    Ok(patients)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_normalizes_optional_fields() {
        let form = PatientForm {
            name: " Maria Souza ".into(),
            cpf: Some("529.982.247-25".into()),
            birth_date: NaiveDate::from_ymd_opt(1980, 5, 1),
            phone: Some("".into()),
            email: Some("MARIA@mail.com".into()),
            address: Some("   ".into()),
            health_insurance: None,
            emergency_contact: None,
            notes: None,
        };
        let details = PatientDetails::try_from(form).unwrap();
        assert_eq!(details.name.as_str(), "Maria Souza");
        assert_eq!(details.cpf.unwrap().as_str(), "52998224725");
        assert_eq!(details.phone, None);
        assert_eq!(details.email.unwrap().as_str(), "maria@mail.com");
        assert_eq!(details.address, None);
    }

    #[test]
    fn form_rejects_invalid_cpf() {
        let form = PatientForm {
            name: "Maria".into(),
            cpf: Some("111.111.111-11".into()),
            birth_date: None,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
        };
        assert!(matches!(
            PatientDetails::try_from(form),
            Err(FormError::InvalidCpf)
        ));
    }

    #[test]
    fn csv_import_reads_rows() {
        let data = "name,cpf,birth_date,phone\n\
                    Ana Lima,,15/03/1990,11987654321\n\
                    Bruno Reis,529.982.247-25,1985-01-20,\n";
        let patients = parse_patients_csv(data.as_bytes()).unwrap();
        assert_eq!(patients.len(), 2);
        assert_eq!(patients[0].birth_date, NaiveDate::from_ymd_opt(1990, 3, 15));
        assert!(patients[0].phone.is_some());
        assert!(patients[1].cpf.is_some());
    }

    #[test]
    fn csv_import_reports_row_without_name() {
        let data = "name,phone\nAna,\n ,11987654321\n";
        let err = parse_patients_csv(data.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Arquivo CSV inválido: linha 3: nome obrigatório");
    }

    #[test]
    fn csv_import_counts_blank_and_multiline_rows() {
        let data = "name,address\n\
                    Ana,\"Rua A,\n10\"\n\
                    \n\
                    ,Rua B\n";
        let err = parse_patients_csv(data.as_bytes()).unwrap_err();
        assert_eq!(err.to_string(), "Arquivo CSV inválido: linha 5: nome obrigatório");
    }

    #[test]
    fn csv_import_requires_name_column() {
        let data = "nome,telefone\nAna,1199\n";
        assert!(matches!(
            parse_patients_csv(data.as_bytes()),
            Err(FormError::Csv(_))
        ));
    }
}
