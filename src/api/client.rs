use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::error::{DataError, DataErrorKind, DataResult};
use super::store::{DocumentStore, ViewParams, ViewResult};

/// CouchDB HTTP client with connection pooling
#[derive(Clone)]
pub struct CouchClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl CouchClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DataResult<Self> {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("lecture-qanda/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_custom_client(base_url, http_client))
    }

    pub fn with_custom_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.http_client
            .request(method, url)
            .header(ACCEPT, "application/json")
    }
}

#[derive(Deserialize)]
struct CreatedDocument {
    id: String,
}

#[async_trait]
impl DocumentStore for CouchClient {
    async fn create_database(&self, db: &str) -> DataResult<()> {
        let response = self.request(Method::PUT, &encode_segment(db)).send().await?;
        create_database_status(response.status(), db).inspect_err(log_failure)
    }

    async fn put_document(&self, db: &str, id: Option<&str>, doc: &Value) -> DataResult<Option<String>> {
        let body = serde_json::to_vec(doc)?;
        let request = match id {
            Some(id) => self.request(Method::PUT, &format!("{}/{}", encode_segment(db), document_path(id))),
            None => self.request(Method::POST, &encode_segment(db)),
        };

        let response = request
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        put_document_status(response.status()).inspect_err(log_failure)?;

        if id.is_some() {
            return Ok(None);
        }
        let text = response.text().await?;
        let created: CreatedDocument = serde_json::from_str(&text)?;
        Ok(Some(created.id))
    }

    async fn get_document(&self, db: &str, id: &str) -> DataResult<Value> {
        let path = format!("{}/{}", encode_segment(db), document_path(id));
        let response = self.request(Method::GET, &path).send().await?;
        read_status(response.status()).inspect_err(log_failure)?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn execute_view(&self, db: &str, design: &str, view: &str, params: &ViewParams) -> DataResult<ViewResult> {
        let path = format!(
            "{}/_design/{}/_view/{}{}",
            encode_segment(db),
            encode_segment(design),
            encode_segment(view),
            params.to_query()
        );
        let response = self.request(Method::GET, &path).send().await?;
        read_status(response.status()).inspect_err(log_failure)?;

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn update(&self, db: &str, design: &str, function: &str, target: &str, body: &str) -> DataResult<()> {
        let path = format!(
            "{}/_design/{}/_update/{}/{}",
            encode_segment(db),
            encode_segment(design),
            encode_segment(function),
            document_path(target)
        );
        let response = self
            .request(Method::PUT, &path)
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send()
            .await?;
        update_status(response.status()).inspect_err(log_failure)
    }
}

fn log_failure(err: &DataError) {
    warn!("Data request failed ({}): {}", err.kind, err.message);
}

fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Design documents keep their `_design/` separator unescaped.
fn document_path(id: &str) -> String {
    match id.strip_prefix("_design/") {
        Some(name) => format!("_design/{}", encode_segment(name)),
        None => encode_segment(id),
    }
}

fn create_database_status(status: StatusCode, db: &str) -> DataResult<()> {
    match status.as_u16() {
        201 => Ok(()),
        400 => Err(DataError::new(
            DataErrorKind::InvalidName,
            format!("Invalid database name: '{}'", db),
        )),
        401 => Err(DataError::new(DataErrorKind::Unauthorized, "Insufficient privileges")),
        412 => Err(DataError::new(
            DataErrorKind::AlreadyExists,
            format!("Database already exists: '{}'", db),
        )),
        other => Err(DataError::new(
            DataErrorKind::Server(other),
            format!("Unknown error: {}", other),
        )),
    }
}

fn put_document_status(status: StatusCode) -> DataResult<()> {
    match status.as_u16() {
        201 | 202 => Ok(()),
        400 => Err(DataError::new(DataErrorKind::InvalidParameters, "Invalid parameters")),
        401 => Err(DataError::new(DataErrorKind::Unauthorized, "Insufficient privileges")),
        404 => Err(DataError::new(DataErrorKind::NotFound, "Not found")),
        other => Err(DataError::new(
            DataErrorKind::Server(other),
            format!("Unknown error: {}", other),
        )),
    }
}

fn read_status(status: StatusCode) -> DataResult<()> {
    match status.as_u16() {
        200 => Ok(()),
        404 => Err(DataError::new(DataErrorKind::NotFound, "Server returned code 404")),
        other => Err(DataError::server(other)),
    }
}

fn update_status(status: StatusCode) -> DataResult<()> {
    match status.as_u16() {
        200 | 201 => Ok(()),
        other => Err(DataError::server(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> StatusCode {
        StatusCode::from_u16(code).unwrap()
    }

    #[test]
    fn test_create_database_status_mapping() {
        assert!(create_database_status(status(201), "qanda").is_ok());

        let kinds: Vec<DataErrorKind> = [400, 401, 412, 500]
            .into_iter()
            .map(|code| create_database_status(status(code), "qanda").unwrap_err().kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                DataErrorKind::InvalidName,
                DataErrorKind::Unauthorized,
                DataErrorKind::AlreadyExists,
                DataErrorKind::Server(500),
            ]
        );
    }

    #[test]
    fn test_already_exists_message_names_database() {
        let err = create_database_status(status(412), "hci-qanda").unwrap_err();
        assert_eq!(err.message, "Database already exists: 'hci-qanda'");
    }

    #[test]
    fn test_put_document_status_mapping() {
        assert!(put_document_status(status(201)).is_ok());
        assert!(put_document_status(status(202)).is_ok());
        assert_eq!(put_document_status(status(400)).unwrap_err().kind, DataErrorKind::InvalidParameters);
        assert_eq!(put_document_status(status(404)).unwrap_err().kind, DataErrorKind::NotFound);
        assert_eq!(put_document_status(status(409)).unwrap_err().kind, DataErrorKind::Server(409));
    }

    #[test]
    fn test_update_accepts_200_and_201_only() {
        assert!(update_status(status(200)).is_ok());
        assert!(update_status(status(201)).is_ok());
        assert_eq!(update_status(status(202)).unwrap_err().kind, DataErrorKind::Server(202));
    }

    #[test]
    fn test_read_status_maps_missing_document() {
        assert!(read_status(status(200)).is_ok());
        assert_eq!(read_status(status(404)).unwrap_err().kind, DataErrorKind::NotFound);
        assert_eq!(read_status(status(500)).unwrap_err().kind, DataErrorKind::Server(500));
    }

    #[test]
    fn test_design_document_path_keeps_separator() {
        assert_eq!(document_path("_design/users"), "_design/users");
        assert_eq!(document_path("a b"), "a%20b");
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = CouchClient::with_custom_client("http://127.0.0.1:5984/", reqwest::Client::new());
        assert_eq!(client.base_url(), "http://127.0.0.1:5984");
    }
}
