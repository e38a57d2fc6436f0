use rocket::http::Status;
use thiserror::Error;

use super::store::StoreError;

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("error {context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

pub(crate) fn store_error(context: &'static str) -> impl FnOnce(StoreError) -> RepoError {
    move |source| RepoError::Store { context, source }
}

impl RepoError {
    pub fn status(&self) -> Status {
        match self {
            RepoError::NotFound(_) => Status::NotFound,
            RepoError::Validation(_) => Status::BadRequest,
            RepoError::Store { .. } => Status::InternalServerError,
        }
    }
}
