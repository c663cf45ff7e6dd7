//! PostgREST-dialect HTTP backend.
//!
//! The hosted deployment keeps the registry and ledger behind a PostgREST
//! endpoint; this store speaks that dialect with a service key. Uniqueness
//! pre-checks run client-side the same way the in-memory store does, with the
//! backend's unique constraint (409) as the backstop.

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use uuid::Uuid;

use async_trait::async_trait;
use chrono::Utc;

use shared_config::AppConfig;
use shared_models::records::{PatientRecord, VisitRecord};

use crate::store::{
    DayWindow, PatientChanges, PatientStore, StoreError, StoreResult, VisitChanges, VisitStore,
};

pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.backend_url.clone(),
            api_key: config.backend_api_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        headers
    }

    async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> StoreResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Storage request {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(representation));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage backend error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StoreError::Conflict(error_text),
                _ => StoreError::Backend(format!("backend error ({}): {}", status, error_text)),
            });
        }

        let data = response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Backend(format!("invalid backend payload: {}", e)))?;
        Ok(data)
    }

    fn first_or_backend_error<T>(&self, rows: Vec<T>, what: &str) -> StoreResult<T> {
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("backend returned no {} row", what)))
    }
}

fn encoded(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn window_filter(window: &DayWindow) -> String {
    format!(
        "createdAt=gte.{}&createdAt=lt.{}",
        encoded(&window.start.to_rfc3339()),
        encoded(&window.end.to_rfc3339())
    )
}

#[async_trait]
impl PatientStore for RestStore {
    async fn insert_patient(&self, patient: PatientRecord) -> StoreResult<PatientRecord> {
        if self
            .find_patient_by_phone(&patient.phone, None)
            .await?
            .is_some()
        {
            return Err(StoreError::Conflict(format!(
                "phone {} already registered",
                patient.phone
            )));
        }

        let rows: Vec<PatientRecord> = self
            .request(
                Method::POST,
                "/rest/v1/patients",
                Some(json!(patient)),
                true,
            )
            .await?;
        self.first_or_backend_error(rows, "patient")
    }

    async fn update_patient(
        &self,
        id: Uuid,
        changes: PatientChanges,
    ) -> StoreResult<Option<PatientRecord>> {
        if let Some(phone) = &changes.phone {
            if self.find_patient_by_phone(phone, Some(id)).await?.is_some() {
                return Err(StoreError::Conflict(format!(
                    "phone {} already registered",
                    phone
                )));
            }
        }

        let mut update = Map::new();
        if let Some(name) = changes.name {
            update.insert("name".to_string(), json!(name));
        }
        if let Some(phone) = changes.phone {
            update.insert("phone".to_string(), json!(phone));
        }
        if let Some(email) = changes.email {
            update.insert("email".to_string(), json!(email));
        }
        if let Some(birth_date) = changes.birth_date {
            update.insert("birthDate".to_string(), json!(birth_date));
        }
        if let Some(gender) = changes.gender {
            update.insert("gender".to_string(), json!(gender));
        }
        if let Some(address) = changes.address {
            update.insert("address".to_string(), json!(address));
        }
        update.insert("updatedAt".to_string(), json!(Utc::now()));

        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let rows: Vec<PatientRecord> = self
            .request(Method::PATCH, &path, Some(Value::Object(update)), true)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_patient(&self, id: Uuid) -> StoreResult<bool> {
        // Visits first so a crash between the two deletes can only leave an
        // orphan-free ledger behind.
        let visits_path = format!("/rest/v1/visits?patientId=eq.{}", id);
        let removed_visits: Vec<VisitRecord> = self
            .request(Method::DELETE, &visits_path, None, true)
            .await?;
        debug!(
            "Cascade removed {} visit(s) for patient {}",
            removed_visits.len(),
            id
        );

        let path = format!("/rest/v1/patients?id=eq.{}", id);
        let rows: Vec<PatientRecord> = self.request(Method::DELETE, &path, None, true).await?;
        Ok(!rows.is_empty())
    }

    async fn get_patient(&self, id: Uuid) -> StoreResult<Option<PatientRecord>> {
        let path = format!("/rest/v1/patients?id=eq.{}&limit=1", id);
        let rows: Vec<PatientRecord> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_patients(&self) -> StoreResult<Vec<PatientRecord>> {
        self.request(
            Method::GET,
            "/rest/v1/patients?order=createdAt.desc",
            None,
            false,
        )
        .await
    }

    async fn find_patient_by_phone(
        &self,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> StoreResult<Option<PatientRecord>> {
        let mut path = format!("/rest/v1/patients?phone=eq.{}", encoded(phone));
        if let Some(excluded_id) = exclude {
            path.push_str(&format!("&id=neq.{}", excluded_id));
        }
        path.push_str("&limit=1");

        let rows: Vec<PatientRecord> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl VisitStore for RestStore {
    async fn insert_visit(&self, visit: VisitRecord) -> StoreResult<VisitRecord> {
        let rows: Vec<VisitRecord> = self
            .request(Method::POST, "/rest/v1/visits", Some(json!(visit)), true)
            .await?;
        self.first_or_backend_error(rows, "visit")
    }

    async fn update_visit(
        &self,
        id: Uuid,
        changes: VisitChanges,
    ) -> StoreResult<Option<VisitRecord>> {
        let mut update = Map::new();
        if let Some(status) = changes.status {
            update.insert("status".to_string(), json!(status));
        }
        if let Some(reason) = changes.reason {
            update.insert("reason".to_string(), json!(reason));
        }
        if let Some(patient_name) = changes.patient_name {
            update.insert("patientName".to_string(), json!(patient_name));
        }
        if let Some(patient_phone) = changes.patient_phone {
            update.insert("patientPhone".to_string(), json!(patient_phone));
        }
        update.insert("updatedAt".to_string(), json!(Utc::now()));

        let path = format!("/rest/v1/visits?id=eq.{}", id);
        let rows: Vec<VisitRecord> = self
            .request(Method::PATCH, &path, Some(Value::Object(update)), true)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_visit(&self, id: Uuid) -> StoreResult<bool> {
        let path = format!("/rest/v1/visits?id=eq.{}", id);
        let rows: Vec<VisitRecord> = self.request(Method::DELETE, &path, None, true).await?;
        Ok(!rows.is_empty())
    }

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<VisitRecord>> {
        let path = format!("/rest/v1/visits?id=eq.{}&limit=1", id);
        let rows: Vec<VisitRecord> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_visits(&self, window: Option<DayWindow>) -> StoreResult<Vec<VisitRecord>> {
        let path = match window {
            Some(window) => format!(
                "/rest/v1/visits?{}&order=createdAt.asc",
                window_filter(&window)
            ),
            None => "/rest/v1/visits?order=createdAt.asc".to_string(),
        };
        self.request(Method::GET, &path, None, false).await
    }

    async fn max_queue_number(&self, window: DayWindow) -> StoreResult<u32> {
        let path = format!(
            "/rest/v1/visits?{}&order=queueNumber.desc&limit=1",
            window_filter(&window)
        );
        let rows: Vec<VisitRecord> = self.request(Method::GET, &path, None, false).await?;
        Ok(rows.first().map(|v| v.queue_number).unwrap_or(0))
    }

    async fn list_visits_for_patient(&self, patient_id: Uuid) -> StoreResult<Vec<VisitRecord>> {
        let path = format!(
            "/rest/v1/visits?patientId=eq.{}&order=createdAt.desc",
            patient_id
        );
        self.request(Method::GET, &path, None, false).await
    }
}
