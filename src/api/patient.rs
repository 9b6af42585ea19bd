use axum::extract::{Path, State};
use axum::response::Response;
use tracing::debug;

use crate::api::links::Links;
use crate::api::{vendor_json, ApiError, SharedState, PATIENTS_MEDIA_TYPE};
use crate::domain::PatientId;

/// `GET /patient/:id`: the patient with their treatments, one `treatment`
/// link per top-level treatment.
pub async fn get_patient(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: PatientId = id.parse()?;
    debug!("GET patient {id}");
    let patient = state.patients.get_patient(id, true)?;

    let mut links = Links::new(state.settings.server.base_url());
    for treatment in &patient.treatments {
        links = links.treatment(treatment.provider_id, treatment.id)?;
    }
    vendor_json(PATIENTS_MEDIA_TYPE, links.into_headers(), &patient)
}
