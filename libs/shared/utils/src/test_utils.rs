use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Admin;
use shared_models::records::{PatientRecord, VisitRecord, VisitStatus};
use shared_storage::AppState;

pub struct TestConfig {
    pub jwt_secret: String,
    pub backend_url: String,
    pub backend_api_key: String,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-token-validation-must-be-long-enough".to_string(),
            backend_url: String::new(),
            backend_api_key: String::new(),
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jwt_secret: self.jwt_secret.clone(),
            backend_url: self.backend_url.clone(),
            backend_api_key: self.backend_api_key.clone(),
            clinic_utc_offset_minutes: self.clinic_utc_offset_minutes,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }

    /// In-memory application state ready for service and handler tests.
    pub fn to_state(&self) -> AppState {
        AppState::in_memory(self.to_app_config())
    }
}

pub struct TestAdmin {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
}

impl Default for TestAdmin {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "admin@clinic.example".to_string(),
            name: "Admin Principal".to_string(),
            role: "admin".to_string(),
        }
    }
}

impl TestAdmin {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            name: "Test Admin".to_string(),
            role: role.to_string(),
        }
    }

    pub fn to_admin(&self) -> Admin {
        Admin {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            name: Some(self.name.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(admin: &TestAdmin, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": admin.id,
            "email": admin.email,
            "name": admin.name,
            "role": admin.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(admin: &TestAdmin, secret: &str) -> String {
        Self::create_test_token(admin, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(admin: &TestAdmin) -> String {
        Self::create_test_token(admin, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Record builders shared across cell tests.
pub struct Fixtures;

impl Fixtures {
    pub fn patient(name: &str, phone: &str) -> PatientRecord {
        let now = Utc::now();
        PatientRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: None,
            birth_date: None,
            gender: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn visit(patient: &PatientRecord, queue_number: u32) -> VisitRecord {
        Self::visit_at(patient, queue_number, Utc::now())
    }

    pub fn visit_at(
        patient: &PatientRecord,
        queue_number: u32,
        created_at: DateTime<Utc>,
    ) -> VisitRecord {
        VisitRecord {
            id: Uuid::new_v4(),
            queue_number,
            patient_id: patient.id,
            patient_name: patient.name.clone(),
            patient_phone: patient.phone.clone(),
            status: VisitStatus::Waiting,
            reason: None,
            created_at,
            updated_at: created_at,
        }
    }
}
