//! Certification application routes.
//!
//! Submissions and inspection reports are `multipart/form-data`; every other
//! endpoint speaks JSON.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::AuthUser,
};
use firecert_core::application::{
    Application, ApplicationFilter, ApplicationService, ApplicationWithDocuments, DecisionInput,
    DocumentDownload, DocumentUpload, ReinspectInput, ScheduleInput, SubmitApplicationInput,
};
use firecert_core::inspection::{
    ChecklistData, ImageUpload, InspectionChecklist, InspectionService, RecordInspectionInput,
};
use firecert_core::storage::sanitize_filename;
use firecert_core::workflow::CertificateType;
use firecert_db::{ApplicationRepository, InspectionRepository};
use firecert_shared::types::{PageRequest, PageResponse};

/// Content type assumed for file parts that do not declare one.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Creates the application routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/applications",
            get(list_applications).post(submit_application),
        )
        .route("/applications/{application_id}", get(get_application))
        .route(
            "/applications/{application_id}/documents",
            get(list_documents),
        )
        .route(
            "/applications/{application_id}/checklists",
            get(list_checklists),
        )
        .route(
            "/applications/{application_id}/schedule",
            post(schedule_inspection),
        )
        .route(
            "/applications/{application_id}/reinspect",
            post(order_reinspection),
        )
        .route(
            "/applications/{application_id}/decision",
            post(decide_application),
        )
        .route(
            "/applications/{application_id}/inspection",
            post(record_inspection),
        )
        .route("/documents/{document_id}/download", get(download_document))
}

fn service(state: &AppState) -> ApplicationService<ApplicationRepository> {
    ApplicationService::new(
        Arc::new(ApplicationRepository::new((*state.db).clone())),
        state.storage.clone(),
    )
}

/// A file part read from a multipart body.
struct FilePart {
    field: String,
    filename: String,
    content_type: String,
    data: Bytes,
}

/// Text fields and file parts of a multipart body.
#[derive(Default)]
struct MultipartForm {
    text: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartForm {
    /// Drains the request body. Parts with a file name are files.
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match field.file_name().map(String::from) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or(FALLBACK_CONTENT_TYPE)
                        .to_string();
                    let data = field.bytes().await?;
                    form.files.push(FilePart {
                        field: name,
                        filename,
                        content_type,
                        data,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.text.push((name, value));
                }
            }
        }
        Ok(form)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.text
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn require_text(&self, name: &str) -> ApiResult<&str> {
        self.text(name)
            .ok_or_else(|| ApiError::validation(format!("{name} is required")))
    }
}

/// Builds the submission from form fields `establishment_id` and
/// `certificate_type`. Each file part's field name is its document type.
fn submission_from_form(form: MultipartForm) -> ApiResult<SubmitApplicationInput> {
    let establishment_id = Uuid::parse_str(form.require_text("establishment_id")?)
        .map_err(|_| ApiError::validation("establishment_id must be a UUID"))?;
    let certificate_type = form.require_text("certificate_type")?;
    let certificate_type = CertificateType::parse(certificate_type).ok_or_else(|| {
        ApiError::validation(format!("unknown certificate_type '{certificate_type}'"))
    })?;

    let documents = form
        .files
        .into_iter()
        .map(|part| DocumentUpload {
            document_type: part.field,
            filename: part.filename,
            content_type: part.content_type,
            data: part.data,
        })
        .collect();

    Ok(SubmitApplicationInput {
        establishment_id,
        certificate_type,
        documents,
    })
}

/// Builds an inspection report from the `checklist` JSON field, an optional
/// `inspection_date`, and photo parts.
fn inspection_from_form(form: MultipartForm) -> ApiResult<RecordInspectionInput> {
    let checklist: ChecklistData = serde_json::from_str(form.require_text("checklist")?)
        .map_err(|e| ApiError::validation(format!("checklist is not valid: {e}")))?;
    let inspection_date = form
        .text("inspection_date")
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| ApiError::validation("inspection_date must be YYYY-MM-DD"))
        })
        .transpose()?;

    let images = form
        .files
        .into_iter()
        .map(|part| ImageUpload {
            filename: part.filename,
            content_type: part.content_type,
            data: part.data,
        })
        .collect();

    Ok(RecordInspectionInput {
        checklist,
        images,
        inspection_date,
    })
}

/// POST /applications - Submit an application with its documents.
async fn submit_application(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let input = submission_from_form(MultipartForm::read(multipart).await?)?;
    let submitted = service(&state).submit(&auth.actor(), input).await?;

    Ok((StatusCode::CREATED, Json(submitted)))
}

/// GET /applications - Scoped to the caller's role.
async fn list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ApplicationFilter>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<Application>>> {
    let applications = service(&state).list(&auth.actor(), filter, page).await?;
    Ok(Json(applications))
}

/// GET /applications/{application_id} - The application with its documents.
async fn get_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
) -> ApiResult<Json<ApplicationWithDocuments>> {
    let found = service(&state)
        .get_with_documents(&auth.actor(), application_id)
        .await?;
    Ok(Json(found))
}

/// GET /applications/{application_id}/documents
async fn list_documents(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let documents = service(&state)
        .documents(&auth.actor(), application_id)
        .await?;
    Ok(Json(json!({ "data": documents })))
}

/// GET /applications/{application_id}/checklists
async fn list_checklists(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let checklists = service(&state)
        .checklists(&auth.actor(), application_id)
        .await?;
    Ok(Json(json!({ "data": checklists })))
}

/// GET /documents/{document_id}/download
///
/// Answers with a presigned URL, or with the file itself when the storage
/// provider cannot presign.
async fn download_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<Uuid>,
) -> ApiResult<Response> {
    match service(&state).download(&auth.actor(), document_id).await? {
        DocumentDownload::Presigned(url) => Ok(Json(url).into_response()),
        DocumentDownload::Inline { document, data } => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                sanitize_filename(&document.file_name)
            );
            Response::builder()
                .header(CONTENT_TYPE, document.mime_type)
                .header(CONTENT_DISPOSITION, disposition)
                .body(Body::from(data))
                .map_err(|e| ApiError::new(500, "INTERNAL_ERROR", e.to_string()))
        }
    }
}

/// POST /applications/{application_id}/schedule - Assign an inspector.
async fn schedule_inspection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<ScheduleInput>,
) -> ApiResult<Json<Application>> {
    let application = service(&state)
        .schedule(&auth.actor(), application_id, payload)
        .await?;

    Ok(Json(application))
}

/// POST /applications/{application_id}/reinspect
async fn order_reinspection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<ReinspectInput>,
) -> ApiResult<Json<Application>> {
    let application = service(&state)
        .reinspect(&auth.actor(), application_id, payload)
        .await?;

    Ok(Json(application))
}

/// POST /applications/{application_id}/decision - Approve or reject.
async fn decide_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<DecisionInput>,
) -> ApiResult<Json<Application>> {
    let application = service(&state)
        .decide(&auth.actor(), application_id, payload)
        .await?;

    Ok(Json(application))
}

/// POST /applications/{application_id}/inspection - Record the checklist
/// and site photos of an assigned inspection.
async fn record_inspection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(application_id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<InspectionChecklist>)> {
    let input = inspection_from_form(MultipartForm::read(multipart).await?)?;
    let service = InspectionService::new(
        Arc::new(InspectionRepository::new((*state.db).clone())),
        state.storage.clone(),
    );
    let checklist = service.record(&auth.actor(), application_id, input).await?;

    Ok((StatusCode::CREATED, Json(checklist)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &[(&str, &str)], files: &[(&str, &str)]) -> MultipartForm {
        MultipartForm {
            text: text
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            files: files
                .iter()
                .map(|(field, filename)| FilePart {
                    field: (*field).to_string(),
                    filename: (*filename).to_string(),
                    content_type: "application/pdf".to_string(),
                    data: Bytes::from_static(b"%PDF-1.7"),
                })
                .collect(),
        }
    }

    #[test]
    fn test_submission_uses_field_name_as_document_type() {
        let id = Uuid::new_v4().to_string();
        let input = submission_from_form(form(
            &[("establishment_id", id.as_str()), ("certificate_type", "fsic_business")],
            &[("business_permit", "permit.pdf"), ("fire_insurance", "policy.pdf")],
        ))
        .unwrap();

        assert_eq!(input.certificate_type, CertificateType::FsicBusiness);
        let types: Vec<_> = input.documents.iter().map(|d| d.document_type.as_str()).collect();
        assert_eq!(types, ["business_permit", "fire_insurance"]);
    }

    #[test]
    fn test_submission_requires_known_certificate_type() {
        let id = Uuid::new_v4().to_string();
        let err = submission_from_form(form(
            &[("establishment_id", id.as_str()), ("certificate_type", "building_permit")],
            &[],
        ))
        .err()
        .unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = submission_from_form(form(&[("certificate_type", "fsec")], &[]))
            .err()
            .unwrap();
        assert_eq!(err.message(), "establishment_id is required");
    }

    #[test]
    fn test_inspection_form_parses_checklist_and_date() {
        let checklist = r#"{"sections":[{"title":"Exits","items":[{"label":"Exit signs lit","result":"pass"}]}]}"#;
        let input = inspection_from_form(form(
            &[("checklist", checklist), ("inspection_date", "2026-03-14")],
            &[],
        ))
        .unwrap();

        assert_eq!(input.checklist.sections.len(), 1);
        assert_eq!(input.inspection_date, NaiveDate::from_ymd_opt(2026, 3, 14));
    }

    #[test]
    fn test_inspection_form_rejects_bad_date() {
        let err = inspection_from_form(form(
            &[("checklist", r#"{"sections":[]}"#), ("inspection_date", "14/03/2026")],
            &[],
        ))
        .err()
        .unwrap();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
