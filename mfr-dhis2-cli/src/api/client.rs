//! HTTP client for the DHIS2 Web API
//!
//! Every call goes through [`Dhis2Client::send`], which applies basic auth,
//! the per-request timeout and the fixed-delay retry policy.

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, trace, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;
use super::resilience::{MonitoringConfig, ResilienceConfig, RetryPolicy};
use super::traits::{DataStoreApi, OrgUnitApi};
use crate::config::Dhis2Config;
use crate::models::org_unit::ORG_UNIT_FIELDS;
use crate::models::{OrgUnit, OrgUnitPayload};

/// Authenticated DHIS2 API client
#[derive(Debug, Clone)]
pub struct Dhis2Client {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    retry: RetryPolicy,
    monitoring: MonitoringConfig,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgUnitList {
    #[serde(default)]
    organisation_units: Vec<OrgUnit>,
}

impl Dhis2Client {
    pub fn new(config: &Dhis2Config, resilience: ResilienceConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(resilience.request_timeout)
            .build()
            .context("Failed to build HTTP client")?;

        debug!(
            "DHIS2 client for {} ({} attempt(s), {:?} apart, worst case {:?} per call)",
            config.base_url,
            resilience.retry.max_attempts,
            resilience.retry.delay,
            resilience.max_call_duration()
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: RetryPolicy::new(resilience.retry),
            monitoring: resilience.monitoring,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, retrying transport failures and 5xx responses.
    ///
    /// Returns the response only for success statuses; everything else comes
    /// back as an [`ApiError`] carrying the number of attempts made.
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let max_attempts = self.retry.config().max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self
                .http
                .request(method.clone(), &url)
                .basic_auth(&self.username, Some(&self.password))
                .header(ACCEPT, "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(json_body) = body {
                request = request.header(CONTENT_TYPE, "application/json").json(json_body);
            }

            if self.monitoring.request_logging {
                debug!("{} {} (attempt {}/{})", method, url, attempt, max_attempts);
            }
            if self.monitoring.log_bodies {
                if let Some(json_body) = body {
                    trace!("Request body: {}", json_body);
                }
            }

            let error = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    if self.monitoring.request_logging {
                        debug!("{} {} -> {}", method, url, response.status());
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    ApiError::Status {
                        url: url.clone(),
                        status,
                        body,
                        attempts: attempt,
                    }
                }
                Err(e) => ApiError::Transport {
                    url: url.clone(),
                    message: e.to_string(),
                    attempts: attempt,
                },
            };

            if !self.retry.should_retry(&error, attempt) {
                return Err(error);
            }

            warn!(
                "{} {} failed (attempt {}/{}), retrying in {:?}: {}",
                method,
                url,
                attempt,
                max_attempts,
                self.retry.delay(),
                error
            );
            tokio::time::sleep(self.retry.delay()).await;
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Pull the new uid out of a DHIS2 import response.
    ///
    /// Newer servers nest it under `response.uid`, older ones return it at the
    /// top level.
    fn created_uid(url: &str, body: &Value) -> Result<String, ApiError> {
        body.pointer("/response/uid")
            .or_else(|| body.get("uid"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode {
                url: url.to_string(),
                message: format!("no uid in import response: {}", body),
            })
    }

    fn to_body(url: &str, payload: &OrgUnitPayload) -> Result<Value, ApiError> {
        serde_json::to_value(payload).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn datastore_path(namespace: &str, key: &str) -> String {
        format!(
            "dataStore/{}/{}",
            urlencoding::encode(namespace),
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl OrgUnitApi for Dhis2Client {
    async fn get_by_id(&self, id: &str) -> Result<Option<OrgUnit>, ApiError> {
        let path = format!("organisationUnits/{}", urlencoding::encode(id));
        match self
            .send(Method::GET, &path, &[("fields", ORG_UNIT_FIELDS)], None)
            .await
        {
            Ok(response) => Ok(Some(Self::read_json(response).await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<OrgUnit>, ApiError> {
        let filter = format!("code:eq:{}", code);
        let response = self
            .send(
                Method::GET,
                "organisationUnits",
                &[
                    ("filter", filter.as_str()),
                    ("fields", ORG_UNIT_FIELDS),
                    ("paging", "false"),
                ],
                None,
            )
            .await?;

        let list: OrgUnitList = Self::read_json(response).await?;
        if list.organisation_units.len() > 1 {
            warn!(
                "{} org units share code '{}', using the first",
                list.organisation_units.len(),
                code
            );
        }
        Ok(list.organisation_units.into_iter().next())
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<OrgUnit>, ApiError> {
        let filter = format!("name:eq:{}", name);
        let response = self
            .send(
                Method::GET,
                "organisationUnits",
                &[
                    ("filter", filter.as_str()),
                    ("fields", ORG_UNIT_FIELDS),
                    ("paging", "false"),
                ],
                None,
            )
            .await?;

        let list: OrgUnitList = Self::read_json(response).await?;
        Ok(list.organisation_units)
    }

    async fn create(&self, payload: &OrgUnitPayload, parent_id: &str) -> Result<String, ApiError> {
        let url = self.url("organisationUnits");
        let body = Self::to_body(&url, &payload.clone().with_parent(parent_id))?;

        let response = self
            .send(Method::POST, "organisationUnits", &[], Some(&body))
            .await?;
        let result: Value = Self::read_json(response).await?;
        Self::created_uid(&url, &result)
    }

    async fn update(&self, id: &str, payload: &OrgUnitPayload) -> Result<String, ApiError> {
        let path = format!("organisationUnits/{}", urlencoding::encode(id));
        let body = Self::to_body(&self.url(&path), payload)?;

        self.send(Method::PUT, &path, &[], Some(&body)).await?;
        Ok(id.to_string())
    }
}

#[async_trait]
impl DataStoreApi for Dhis2Client {
    async fn get_entry(&self, namespace: &str, key: &str) -> Result<Option<Value>, ApiError> {
        let path = Self::datastore_path(namespace, key);
        match self.send(Method::GET, &path, &[], None).await {
            Ok(response) => Ok(Some(Self::read_json(response).await?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn put_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError> {
        let path = Self::datastore_path(namespace, key);
        self.send(Method::PUT, &path, &[], Some(value)).await?;
        Ok(())
    }

    async fn post_entry(&self, namespace: &str, key: &str, value: &Value) -> Result<(), ApiError> {
        let path = Self::datastore_path(namespace, key);
        self.send(Method::POST, &path, &[], Some(value)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::resilience::RetryConfig;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{basic_auth, body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, attempts: u32) -> Dhis2Client {
        let config = Dhis2Config {
            base_url: format!("{}/api/", server.uri()),
            username: "admin".to_string(),
            password: "district".to_string(),
        };
        let resilience = ResilienceConfig::builder()
            .retry_config(RetryConfig::fixed(attempts, Duration::ZERO))
            .request_timeout(Duration::from_secs(5))
            .build();
        Dhis2Client::new(&config, resilience).unwrap()
    }

    fn payload() -> OrgUnitPayload {
        OrgUnitPayload {
            name: "Kebele Clinic".to_string(),
            short_name: "Kebele Clinic".to_string(),
            code: "F1".to_string(),
            opening_date: None,
            closed_date: None,
            geometry: None,
            phone_number: None,
            email: None,
            parent: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits/ou1"))
            .and(basic_auth("admin", "district"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "ou1",
                "code": "F1",
                "name": "Kebele Clinic",
                "parent": { "id": "ouWoreda", "name": "Woreda A" }
            })))
            .mount(&server)
            .await;

        let org_unit = client_for(&server, 1).get_by_id("ou1").await.unwrap().unwrap();
        assert_eq!(org_unit.id, "ou1");
        assert_eq!(org_unit.parent_id(), Some("ouWoreda"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_is_none_and_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server, 5).get_by_id("missing").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_by_code_uses_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits"))
            .and(query_param("filter", "code:eq:F1"))
            .and(query_param("paging", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organisationUnits": [{ "id": "ou1", "code": "F1", "name": "Kebele Clinic" }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits"))
            .and(query_param("filter", "code:eq:F2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organisationUnits": []
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let found = client.get_by_code("F1").await.unwrap().unwrap();
        assert_eq!(found.id, "ou1");
        assert!(client.get_by_code("F2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_name_returns_all_matches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits"))
            .and(query_param("filter", "name:eq:District A"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organisationUnits": [
                    { "id": "ou1", "name": "District A" },
                    { "id": "ou2", "name": "District A" }
                ]
            })))
            .mount(&server)
            .await;

        let found = client_for(&server, 1).find_by_name("District A").await.unwrap();
        let ids: Vec<&str> = found.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["ou1", "ou2"]);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits/ou1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits/ou1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "id": "ou1", "name": "X" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let org_unit = client_for(&server, 3).get_by_id("ou1").await.unwrap();
        assert_eq!(org_unit.map(|o| o.id), Some("ou1".to_string()));
    }

    #[tokio::test]
    async fn test_retry_budget_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/organisationUnits/ou1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let error = client_for(&server, 3).get_by_id("ou1").await.unwrap_err();
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.attempts(), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/organisationUnits"))
            .respond_with(ResponseTemplate::new(409).set_body_string("code already exists"))
            .expect(1)
            .mount(&server)
            .await;

        let error = client_for(&server, 5)
            .create(&payload(), "ouWoreda")
            .await
            .unwrap_err();
        assert_eq!(error.status(), Some(409));
        assert_eq!(error.attempts(), 1);
    }

    #[tokio::test]
    async fn test_create_sends_parent_and_reads_uid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/organisationUnits"))
            .and(body_partial_json(json!({
                "code": "F1",
                "parent": { "id": "ouWoreda" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "httpStatus": "Created",
                "response": { "uid": "ouNew" }
            })))
            .mount(&server)
            .await;

        let uid = client_for(&server, 1)
            .create(&payload(), "ouWoreda")
            .await
            .unwrap();
        assert_eq!(uid, "ouNew");
    }

    #[tokio::test]
    async fn test_create_without_uid_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/organisationUnits"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "OK" })))
            .mount(&server)
            .await;

        let error = client_for(&server, 1)
            .create(&payload(), "ouWoreda")
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_update_puts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/organisationUnits/ou1"))
            .and(body_partial_json(json!({ "name": "Kebele Clinic" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "OK" })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client_for(&server, 1).update("ou1", &payload()).await.unwrap();
        assert_eq!(id, "ou1");
    }

    #[tokio::test]
    async fn test_datastore_roundtrip_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/dataStore/Dhis2-MFRApproval/mfr-1"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/dataStore/Dhis2-MFRApproval/mfr-1"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        let existing = client.get_entry("Dhis2-MFRApproval", "mfr-1").await.unwrap();
        assert!(existing.is_none());
        client
            .post_entry("Dhis2-MFRApproval", "mfr-1", &json!({ "resource.id": "mfr-1" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let config = Dhis2Config {
            base_url: "http://127.0.0.1:1/api".to_string(),
            username: "admin".to_string(),
            password: "district".to_string(),
        };
        let resilience = ResilienceConfig::builder()
            .retry_config(RetryConfig::fixed(2, Duration::ZERO))
            .build();
        let client = Dhis2Client::new(&config, resilience).unwrap();

        let error = client.get_by_id("ou1").await.unwrap_err();
        assert!(matches!(error, ApiError::Transport { attempts: 2, .. }));
    }
}
