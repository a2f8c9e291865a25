use crate::{
    access::STUDENT_HOME,
    auth::extract::CurrentActor,
    dtos::{
        forms::{ProfileSubmission, PurchaseForm, StudentDashboardAction},
        query::PageQuery,
        views::{ProfileView, PurchaseView, StudentDashboardView},
    },
    error::AppResult,
    routes::{parse_id, report},
    session::Session,
    state::AppState,
};
use axum::{
    Extension, Form, Json,
    extract::{Query, State},
    response::Redirect,
};
use chrono::{Datelike, Utc};
use database::services::{
    course::CourseService, enrollment::EnrollmentService, error::ServiceError,
    student::StudentService,
};

const COURSES_PATH: &str = "/student/courses";
const PROFILE_PATH: &str = "/student/profile";

/// Approved, pending and rejected requests with the amount spent
#[utoipa::path(
    get,
    path = "/student/dashboard",
    responses((status = 200, description = "Student dashboard", body = StudentDashboardView)),
    tag = "Student"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<StudentDashboardView>> {
    let summary = EnrollmentService::student_summary(&state.db, actor.id).await?;

    Ok(Json(StudentDashboardView::new(
        session.take_notices().await,
        summary,
    )))
}

/// `remove_course` withdraws one of the student's own requests
#[utoipa::path(
    post,
    path = "/student/dashboard",
    responses((status = 303, description = "Back to the dashboard")),
    tag = "Student"
)]
pub async fn dashboard_action(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Form(form): Form<StudentDashboardAction>,
) -> Redirect {
    if form.action != "remove_course" {
        return Redirect::to(STUDENT_HOME);
    }

    let result = match parse_id(&form.student_course_id) {
        Some(id) => EnrollmentService::withdraw(&state.db, id, &actor).await,
        None => Err(ServiceError::not_found(
            "Course not found or you do not have permission to remove it.",
        )),
    };

    match result {
        Ok(course) => {
            session
                .success(format!("Course \"{}\" removed successfully!", course.name))
                .await
        }
        Err(err) => report(&session, err).await,
    }

    Redirect::to(STUDENT_HOME)
}

/// The catalog, five courses per page, with the student's status on each
#[utoipa::path(
    get,
    path = "/student/courses",
    params(PageQuery),
    responses((status = 200, description = "Courses available for request", body = PurchaseView)),
    tag = "Student"
)]
pub async fn courses(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PurchaseView>> {
    let (courses, student_courses) = futures::try_join!(
        CourseService::list_paginated(&state.db, query.page, None, None),
        EnrollmentService::course_status_map(&state.db, actor.id),
    )?;

    Ok(Json(PurchaseView {
        notices: session.take_notices().await,
        courses,
        student_courses,
    }))
}

/// Requests every course listed in the repeated `selected_courses` field
#[utoipa::path(
    post,
    path = "/student/courses",
    request_body(content = PurchaseForm, content_type = "application/x-www-form-urlencoded"),
    responses((status = 303, description = "Dashboard on success, catalog otherwise")),
    tag = "Student"
)]
pub async fn purchase(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Form(fields): Form<Vec<(String, String)>>,
) -> Redirect {
    let selected: Vec<_> = fields
        .iter()
        .filter(|(name, _)| name == "selected_courses")
        .filter_map(|(_, value)| parse_id(value))
        .collect();

    match EnrollmentService::request_enrollment(&state.db, &actor, &selected).await {
        Ok(0) => {
            session
                .info("All selected courses were already requested.")
                .await;
            Redirect::to(STUDENT_HOME)
        }
        Ok(created) => {
            session
                .success(format!("{created} course(s) requested for approval!"))
                .await;
            Redirect::to(STUDENT_HOME)
        }
        Err(err) => {
            report(&session, err).await;
            Redirect::to(COURSES_PATH)
        }
    }
}

#[utoipa::path(
    get,
    path = "/student/profile",
    responses(
        (status = 200, description = "The student's profile", body = ProfileView),
        (status = 404, description = "Account no longer exists")
    ),
    tag = "Student"
)]
pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
) -> AppResult<Json<ProfileView>> {
    let student = StudentService::find_student(&state.db, actor.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Student not found."))?;

    Ok(Json(ProfileView {
        notices: session.take_notices().await,
        student,
    }))
}

/// Updates profile details, or the picture when `update_type` is `profile_pic`
#[utoipa::path(
    post,
    path = "/student/profile",
    responses((status = 303, description = "Back to the profile")),
    tag = "Student"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Form(submission): Form<ProfileSubmission>,
) -> Redirect {
    let result = if submission.is_picture() {
        match submission.picture().clean() {
            Ok(picture) => StudentService::update_picture(&state.db, actor.id, picture)
                .await
                .map(|_| "Profile picture updated successfully!"),
            Err(errors) => Err(errors.into()),
        }
    } else {
        match submission.profile().clean(Utc::now().year()) {
            Ok(profile) => StudentService::update_profile(&state.db, actor.id, profile)
                .await
                .map(|_| "Profile information updated successfully!"),
            Err(errors) => Err(errors.into()),
        }
    };

    match result {
        Ok(message) => session.success(message).await,
        Err(err) => report(&session, err).await,
    }

    Redirect::to(PROFILE_PATH)
}
