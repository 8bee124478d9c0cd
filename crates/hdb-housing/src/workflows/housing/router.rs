use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::controllers::ProjectDraft;
use super::domain::{Application, Enquiry, EnquiryId, Nric, OfficerRegistration, Project, User};
use super::error::{ErrorKind, HousingError, HousingResult};
use super::portal::HousingPortal;
use super::views::BookingReceipt;

type PortalState = State<Arc<HousingPortal>>;

/// Router exposing the portal controllers. Actors are named by NRIC in the
/// request and resolved against the user directory.
pub fn housing_router(portal: Arc<HousingPortal>) -> Router {
    Router::new()
        .route(
            "/api/v1/projects",
            get(visible_projects_handler).post(create_project_handler),
        )
        .route("/api/v1/applications", post(apply_handler))
        .route("/api/v1/applications/:nric/withdraw", post(withdraw_handler))
        .route("/api/v1/applications/:nric/approve", post(approve_handler))
        .route("/api/v1/applications/:nric/reject", post(reject_handler))
        .route("/api/v1/applications/:nric/book", post(book_handler))
        .route("/api/v1/applications/:nric/receipt", get(receipt_handler))
        .route("/api/v1/enquiries", post(submit_enquiry_handler))
        .route("/api/v1/enquiries/:id/replies", post(reply_handler))
        .route("/api/v1/registrations", post(register_handler))
        .with_state(portal)
}

impl IntoResponse for HousingError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = match kind {
            ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::AuthorizationError => StatusCode::FORBIDDEN,
            ErrorKind::BusinessRuleError => StatusCode::CONFLICT,
            ErrorKind::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = json!({
            "error": self.to_string(),
            "kind": kind.label(),
        });
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsQuery {
    pub(crate) applicant: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProjectRequest {
    pub(crate) manager: String,
    #[serde(flatten)]
    pub(crate) project: ProjectDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyRequest {
    pub(crate) applicant: String,
    pub(crate) project: String,
    pub(crate) flat_type: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorRequest {
    pub(crate) actor: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitEnquiryRequest {
    pub(crate) applicant: String,
    pub(crate) project: String,
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyRequest {
    pub(crate) actor: String,
    pub(crate) content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegisterRequest {
    pub(crate) officer: String,
    pub(crate) project: String,
    #[serde(default)]
    pub(crate) today: Option<NaiveDate>,
}

fn resolve_actor(portal: &HousingPortal, raw: &str) -> HousingResult<User> {
    portal.user(&Nric::parse(raw)?)
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn visible_projects_handler(
    State(portal): PortalState,
    Query(query): Query<ProjectsQuery>,
) -> HousingResult<Json<Vec<Project>>> {
    let applicant = resolve_actor(&portal, &query.applicant)?;
    let projects = portal
        .projects()
        .visible_projects(&applicant, today_or_now(query.today))?;
    Ok(Json(projects))
}

pub(crate) async fn create_project_handler(
    State(portal): PortalState,
    Json(request): Json<CreateProjectRequest>,
) -> HousingResult<(StatusCode, Json<Project>)> {
    let manager = resolve_actor(&portal, &request.manager)?;
    let project = portal.projects().create_project(&manager, request.project)?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub(crate) async fn apply_handler(
    State(portal): PortalState,
    Json(request): Json<ApplyRequest>,
) -> HousingResult<(StatusCode, Json<Application>)> {
    let applicant = resolve_actor(&portal, &request.applicant)?;
    let application = portal.applications().apply_for_project(
        &applicant,
        &request.project,
        &request.flat_type,
        today_or_now(request.today),
    )?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn withdraw_handler(
    State(portal): PortalState,
    Path(nric): Path<String>,
) -> HousingResult<Json<Application>> {
    let applicant = resolve_actor(&portal, &nric)?;
    Ok(Json(portal.applications().withdraw_application(&applicant)?))
}

pub(crate) async fn approve_handler(
    State(portal): PortalState,
    Path(nric): Path<String>,
    Json(request): Json<ActorRequest>,
) -> HousingResult<Json<Application>> {
    let manager = resolve_actor(&portal, &request.actor)?;
    let applicant = Nric::parse(&nric)?;
    Ok(Json(
        portal
            .applications()
            .approve_application(&manager, &applicant)?,
    ))
}

pub(crate) async fn reject_handler(
    State(portal): PortalState,
    Path(nric): Path<String>,
    Json(request): Json<ActorRequest>,
) -> HousingResult<Json<Application>> {
    let manager = resolve_actor(&portal, &request.actor)?;
    let applicant = Nric::parse(&nric)?;
    Ok(Json(
        portal
            .applications()
            .reject_application(&manager, &applicant)?,
    ))
}

pub(crate) async fn book_handler(
    State(portal): PortalState,
    Path(nric): Path<String>,
    Json(request): Json<ActorRequest>,
) -> HousingResult<Json<Application>> {
    let officer = resolve_actor(&portal, &request.actor)?;
    let applicant = Nric::parse(&nric)?;
    Ok(Json(portal.applications().complete_booking(
        &officer,
        &applicant,
        today_or_now(request.today),
    )?))
}

pub(crate) async fn receipt_handler(
    State(portal): PortalState,
    Path(nric): Path<String>,
) -> HousingResult<Json<BookingReceipt>> {
    let applicant = Nric::parse(&nric)?;
    Ok(Json(
        portal
            .applications()
            .generate_booking_receipt(&applicant)?,
    ))
}

pub(crate) async fn submit_enquiry_handler(
    State(portal): PortalState,
    Json(request): Json<SubmitEnquiryRequest>,
) -> HousingResult<(StatusCode, Json<Enquiry>)> {
    let applicant = resolve_actor(&portal, &request.applicant)?;
    let enquiry = portal.enquiries().submit(
        &applicant,
        &request.project,
        &request.message,
        today_or_now(request.today),
    )?;
    Ok((StatusCode::CREATED, Json(enquiry)))
}

pub(crate) async fn reply_handler(
    State(portal): PortalState,
    Path(id): Path<String>,
    Json(request): Json<ReplyRequest>,
) -> HousingResult<Json<Enquiry>> {
    let respondent = resolve_actor(&portal, &request.actor)?;
    let enquiry = portal
        .enquiries()
        .add_reply(&EnquiryId(id), &respondent, &request.content)?;
    Ok(Json(enquiry))
}

pub(crate) async fn register_handler(
    State(portal): PortalState,
    Json(request): Json<RegisterRequest>,
) -> HousingResult<(StatusCode, Json<OfficerRegistration>)> {
    let officer = resolve_actor(&portal, &request.officer)?;
    let registration = portal.registrations().register_for_project(
        &officer,
        &request.project,
        today_or_now(request.today),
    )?;
    Ok((StatusCode::CREATED, Json(registration)))
}
