//! `Link` response headers pointing at related resources.

use axum::http::header::LINK;
use axum::http::{HeaderMap, HeaderValue};

use crate::api::error::ApiError;
use crate::domain::{PatientId, ProviderId, TreatmentId};

pub const REL_TREATMENT: &str = "treatment";
pub const REL_PATIENT: &str = "patient";
pub const REL_PROVIDER: &str = "provider";

/// Accumulates `Link` headers relative to a public base URI.
#[derive(Debug)]
pub struct Links<'a> {
    base: &'a str,
    headers: HeaderMap,
}

impl<'a> Links<'a> {
    pub fn new(base: &'a str) -> Self {
        Self {
            base: base.trim_end_matches('/'),
            headers: HeaderMap::new(),
        }
    }

    pub fn patient_uri(&self, patient: PatientId) -> String {
        format!("{}/patient/{patient}", self.base)
    }

    pub fn provider_uri(&self, provider: ProviderId) -> String {
        format!("{}/provider/{provider}", self.base)
    }

    pub fn treatment_uri(&self, provider: ProviderId, treatment: TreatmentId) -> String {
        format!("{}/provider/{provider}/treatment/{treatment}", self.base)
    }

    pub fn patient(mut self, patient: PatientId) -> Result<Self, ApiError> {
        let uri = self.patient_uri(patient);
        self.push(&uri, REL_PATIENT)?;
        Ok(self)
    }

    pub fn provider(mut self, provider: ProviderId) -> Result<Self, ApiError> {
        let uri = self.provider_uri(provider);
        self.push(&uri, REL_PROVIDER)?;
        Ok(self)
    }

    pub fn treatment(
        mut self,
        provider: ProviderId,
        treatment: TreatmentId,
    ) -> Result<Self, ApiError> {
        let uri = self.treatment_uri(provider, treatment);
        self.push(&uri, REL_TREATMENT)?;
        Ok(self)
    }

    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }

    fn push(&mut self, uri: &str, rel: &str) -> Result<(), ApiError> {
        let value = HeaderValue::try_from(format!("<{uri}>; rel=\"{rel}\""))?;
        self.headers.append(LINK, value);
        Ok(())
    }
}
