pub mod client;
pub mod design;
pub mod error;
pub mod models;
pub mod qanda;
pub mod store;

pub use client::CouchClient;
pub use error::{DataError, DataErrorKind, DataResult};
pub use models::{Answer, Lecture, Question, User};
pub use qanda::{LoginOutcome, QandaApi};
pub use store::{DocumentStore, ViewParams, ViewResult, ViewRow};
