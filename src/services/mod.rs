//! Business operations behind the HTTP routes.
//!
//! Every clinic-scoped operation starts with
//! [`access::ensure_permission`], which resolves the caller's membership and
//! checks the role's effective permission before any data is touched.

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

pub mod access;
pub mod appointments;
pub mod clinics;
pub mod dashboard;
pub mod finance;
pub mod leads;
pub mod medical;
pub mod members;
pub mod packages;
pub mod patients;
pub mod professionals;
pub mod reports;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Sessão expirada ou usuário não autenticado")]
    Unauthorized,

    #[error("Você não tem permissão para esta ação")]
    Forbidden,

    #[error("Registro não encontrado")]
    NotFound,

    #[error("{0}")]
    Form(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Dados inválidos: {0}")]
    TypeConstraint(String),

    #[error("Erro de banco de dados: {0}")]
    Repository(RepositoryError),

    #[error("Erro interno: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::Conflict(message) => ServiceError::Conflict(message),
            err if err.is_unique_violation() => {
                ServiceError::Conflict("Já existe um registro com estes dados".to_string())
            }
            err => ServiceError::Repository(err),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Form(err.to_string())
    }
}

/// Logs a repository failure before it is propagated.
pub(crate) fn log_failure<E: std::fmt::Display>(context: &'static str) -> impl Fn(E) -> E {
    move |err| {
        log::error!("{context}: {err}");
        err
    }
}
