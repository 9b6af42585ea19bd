use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use tracing::{debug, info};

use crate::api::links::Links;
use crate::api::{
    vendor_json, ApiError, SharedState, PROVIDERS_MEDIA_TYPE, TREATMENTS_MEDIA_TYPE,
};
use crate::application::services::UploadSummary;
use crate::domain::{ProviderId, TreatmentId};

/// `GET /provider/:id`: the provider with the treatments they administer.
pub async fn get_provider(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: ProviderId = id.parse()?;
    debug!("GET provider {id}");
    let provider = state.providers.get_provider(id, true)?;

    let mut links = Links::new(state.settings.server.base_url());
    for treatment in &provider.treatments {
        links = links.treatment(treatment.provider_id, treatment.id)?;
    }
    vendor_json(PROVIDERS_MEDIA_TYPE, links.into_headers(), &provider)
}

/// `GET /provider/:id/treatment/:tid`: one treatment with its follow-ups,
/// linked to its patient and provider.
pub async fn get_treatment(
    State(state): State<SharedState>,
    Path((id, tid)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let provider: ProviderId = id.parse()?;
    let treatment: TreatmentId = tid.parse()?;
    debug!("GET treatment {treatment} of provider {provider}");
    let dto = state.providers.get_treatment(provider, treatment)?;

    let links = Links::new(state.settings.server.base_url())
        .patient(dto.patient_id)?
        .provider(dto.provider_id)?;
    vendor_json(TREATMENTS_MEDIA_TYPE, links.into_headers(), &dto)
}

/// `POST /provider`: bulk upload of providers, patients and treatments.
pub async fn upload(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Json<UploadSummary>, ApiError> {
    info!("receiving upload of {} bytes", body.len());
    let summary = state.uploads.upload(&body)?;
    Ok(Json(summary))
}
