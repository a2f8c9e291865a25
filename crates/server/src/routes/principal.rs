use crate::{
    access::PRINCIPAL_HOME,
    auth::extract::CurrentActor,
    dtos::{
        forms::{DepartmentAction, PrincipalAction, PurchaseAction},
        query::{CourseListQuery, SearchQuery},
        views::{
            CourseEditView, CourseListView, DepartmentListView, PrincipalDashboardView,
            StudentDetailView, StudentListView,
        },
    },
    error::AppResult,
    routes::{parse_id, report},
    session::Session,
    state::AppState,
};
use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::Redirect,
};
use database::services::{
    course::CourseService, dashboard::DashboardService, department::DepartmentService,
    enrollment::EnrollmentService, error::ServiceError, student::StudentService,
};
use models::{
    actor::Actor, course_form::CourseForm, department_form::DepartmentForm,
    enrollment_status::Decision,
};
use uuid::Uuid;

const COURSES_PATH: &str = "/principal/courses";
const DEPARTMENTS_PATH: &str = "/principal/departments";
const STUDENTS_PATH: &str = "/principal/students";

fn decision_for(action: &str) -> Option<Decision> {
    match action {
        "approve_course" | "approve_purchase" => Some(Decision::Approve),
        "reject_course" | "reject_purchase" => Some(Decision::Reject),
        _ => None,
    }
}

/// Applies `decision` and queues the outcome; `not_found` names the missing record
async fn decide(
    state: &AppState,
    session: &Session,
    actor: &Actor,
    raw_id: &str,
    decision: Decision,
    not_found: &str,
) {
    let result = match parse_id(raw_id) {
        Some(id) => EnrollmentService::decide(&state.db, id, decision, actor).await,
        None => Err(ServiceError::not_found(not_found)),
    };

    match result {
        Ok(outcome) => {
            session
                .success(format!(
                    "Course \"{}\" {} for {}",
                    outcome.course_name,
                    decision.verb(),
                    outcome.student_first_name
                ))
                .await
        }
        Err(ServiceError::NotFound(_)) => session.error(not_found).await,
        Err(err) => report(session, err).await,
    }
}

async fn delete_course(state: &AppState, session: &Session, raw_id: &str) {
    let result = match parse_id(raw_id) {
        Some(id) => CourseService::delete(&state.db, id).await,
        None => Err(ServiceError::not_found("Course not found.")),
    };

    match result {
        Ok(course) => {
            session
                .success(format!("Course \"{}\" deleted successfully!", course.name))
                .await
        }
        Err(err) => report(session, err).await,
    }
}

/// Totals, revenue, recent students, pending approvals and departments
#[utoipa::path(
    get,
    path = "/principal/dashboard",
    responses((status = 200, description = "Principal dashboard", body = PrincipalDashboardView)),
    tag = "Principal"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<PrincipalDashboardView>> {
    let overview = DashboardService::principal_overview(&state.db).await?;

    Ok(Json(PrincipalDashboardView {
        notices: session.take_notices().await,
        overview,
    }))
}

/// `approve_course` / `reject_course` (with `approval_id`) or `delete_course` (with `course_id`)
#[utoipa::path(
    post,
    path = "/principal/dashboard",
    responses((status = 303, description = "Back to the dashboard")),
    tag = "Principal"
)]
pub async fn dashboard_action(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Form(form): Form<PrincipalAction>,
) -> Redirect {
    match (form.action.as_str(), decision_for(&form.action)) {
        ("approve_course" | "reject_course", Some(decision)) if !form.approval_id.is_empty() => {
            decide(
                &state,
                &session,
                &actor,
                &form.approval_id,
                decision,
                "Approval request not found.",
            )
            .await
        }
        ("delete_course", _) => delete_course(&state, &session, &form.course_id).await,
        _ => {}
    }

    Redirect::to(PRINCIPAL_HOME)
}

/// Course catalog filtered by department and search, five per page
#[utoipa::path(
    get,
    path = "/principal/courses",
    params(CourseListQuery),
    responses((status = 200, description = "Course catalog", body = CourseListView)),
    tag = "Principal"
)]
pub async fn courses(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<CourseListQuery>,
) -> AppResult<Json<CourseListView>> {
    let selected_department = query.department.as_deref().and_then(parse_id);
    let search_query = query.search.unwrap_or_default();

    let (courses, departments) = futures::try_join!(
        CourseService::list_paginated(
            &state.db,
            query.page,
            selected_department,
            Some(search_query.as_str()),
        ),
        DepartmentService::list(&state.db),
    )?;

    Ok(Json(CourseListView {
        notices: session.take_notices().await,
        courses,
        departments,
        selected_department,
        search_query,
    }))
}

/// `delete_course` with `course_id`
#[utoipa::path(
    post,
    path = "/principal/courses",
    responses((status = 303, description = "Back to the catalog")),
    tag = "Principal"
)]
pub async fn courses_action(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<PrincipalAction>,
) -> Redirect {
    if form.action == "delete_course" {
        delete_course(&state, &session, &form.course_id).await;
    }
    Redirect::to(COURSES_PATH)
}

/// Adds a course; refused while no department exists
#[utoipa::path(
    post,
    path = "/principal/courses/new",
    responses((status = 303, description = "Dashboard on success, catalog otherwise")),
    tag = "Principal"
)]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<CourseForm>,
) -> Redirect {
    match DepartmentService::count(&state.db).await {
        Ok(0) => {
            session
                .warning("Please create a department first before adding courses.")
                .await;
            return Redirect::to(PRINCIPAL_HOME);
        }
        Ok(_) => {}
        Err(err) => {
            report(&session, err).await;
            return Redirect::to(PRINCIPAL_HOME);
        }
    }

    match CourseService::create(&state.db, &form).await {
        Ok(course) => {
            session
                .success(format!("Course \"{}\" added successfully!", course.name))
                .await;
            Redirect::to(PRINCIPAL_HOME)
        }
        Err(err) => {
            report(&session, err).await;
            Redirect::to(COURSES_PATH)
        }
    }
}

/// One course with the departments it may move to
#[utoipa::path(
    get,
    path = "/principal/courses/{id}",
    params(("id" = Uuid, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course found", body = CourseEditView),
        (status = 404, description = "Course not found")
    ),
    tag = "Principal"
)]
pub async fn course(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CourseEditView>> {
    let course = CourseService::find(&state.db, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course not found."))?;
    let departments = DepartmentService::list(&state.db).await?;

    Ok(Json(CourseEditView {
        notices: session.take_notices().await,
        course,
        departments,
    }))
}

/// Saves an edited course
#[utoipa::path(
    post,
    path = "/principal/courses/{id}",
    params(("id" = String, Path, description = "Course ID")),
    responses((status = 303, description = "Catalog on success, edit page otherwise")),
    tag = "Principal"
)]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(raw_id): Path<String>,
    Form(form): Form<CourseForm>,
) -> Redirect {
    let Some(id) = parse_id(&raw_id) else {
        session.error("Course not found.").await;
        return Redirect::to(COURSES_PATH);
    };

    match CourseService::update(&state.db, id, &form).await {
        Ok(course) => {
            session
                .success(format!("Course \"{}\" updated successfully!", course.name))
                .await;
            Redirect::to(COURSES_PATH)
        }
        Err(err @ ServiceError::NotFound(_)) => {
            report(&session, err).await;
            Redirect::to(COURSES_PATH)
        }
        Err(err) => {
            report(&session, err).await;
            Redirect::to(&format!("{COURSES_PATH}/{id}"))
        }
    }
}

/// Departments with the number of courses each offers
#[utoipa::path(
    get,
    path = "/principal/departments",
    responses((status = 200, description = "Departments", body = DepartmentListView)),
    tag = "Principal"
)]
pub async fn departments(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> AppResult<Json<DepartmentListView>> {
    let departments = DepartmentService::list_with_course_counts(&state.db).await?;

    Ok(Json(DepartmentListView {
        notices: session.take_notices().await,
        departments,
    }))
}

/// `create_department` (with `dept_name`, `dept_description`) or `delete_department` (with `department_id`)
#[utoipa::path(
    post,
    path = "/principal/departments",
    responses((status = 303, description = "Back to the departments")),
    tag = "Principal"
)]
pub async fn departments_action(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<DepartmentAction>,
) -> Redirect {
    let result = match form.action.as_str() {
        "create_department" => {
            let department = DepartmentForm {
                dept_name: form.dept_name,
                dept_description: form.dept_description,
            };
            DepartmentService::create(&state.db, &department)
                .await
                .map(|d| format!("Department \"{}\" created successfully!", d.name))
        }
        "delete_department" => match parse_id(&form.department_id) {
            Some(id) => DepartmentService::delete(&state.db, id)
                .await
                .map(|d| format!("Department \"{}\" deleted successfully!", d.name)),
            None => Err(ServiceError::not_found("Department not found.")),
        },
        _ => return Redirect::to(DEPARTMENTS_PATH),
    };

    match result {
        Ok(message) => session.success(message).await,
        Err(err) => report(&session, err).await,
    }

    Redirect::to(DEPARTMENTS_PATH)
}

/// Students, newest first
#[utoipa::path(
    get,
    path = "/principal/students",
    params(SearchQuery),
    responses((status = 200, description = "Students", body = StudentListView)),
    tag = "Principal"
)]
pub async fn students(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<StudentListView>> {
    let search_query = query.search.unwrap_or_default();
    let students = StudentService::list(&state.db, Some(search_query.as_str())).await?;

    Ok(Json(StudentListView {
        notices: session.take_notices().await,
        total_students: students.len(),
        students,
        search_query,
    }))
}

/// One student's requests split by status, with the amount spent
#[utoipa::path(
    get,
    path = "/principal/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found", body = StudentDetailView),
        (status = 404, description = "Student not found")
    ),
    tag = "Principal"
)]
pub async fn student(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StudentDetailView>> {
    let student = StudentService::find_student(&state.db, id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Student not found."))?;
    let summary = EnrollmentService::student_summary(&state.db, id).await?;

    Ok(Json(StudentDetailView {
        notices: session.take_notices().await,
        student,
        approved_count: summary.approved.len(),
        pending_count: summary.pending.len(),
        rejected_count: summary.rejected.len(),
        summary,
    }))
}

/// `approve_purchase` / `reject_purchase` with `purchase_id`
#[utoipa::path(
    post,
    path = "/principal/students/{id}",
    params(("id" = String, Path, description = "Student ID")),
    responses((status = 303, description = "Back to the student")),
    tag = "Principal"
)]
pub async fn student_action(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    CurrentActor(actor): CurrentActor,
    Path(raw_id): Path<String>,
    Form(form): Form<PurchaseAction>,
) -> Redirect {
    if let ("approve_purchase" | "reject_purchase", Some(decision)) =
        (form.action.as_str(), decision_for(&form.action))
        && !form.purchase_id.is_empty()
    {
        decide(
            &state,
            &session,
            &actor,
            &form.purchase_id,
            decision,
            "Course purchase not found.",
        )
        .await;
    }

    match parse_id(&raw_id) {
        Some(id) => Redirect::to(&format!("{STUDENTS_PATH}/{id}")),
        None => Redirect::to(STUDENTS_PATH),
    }
}
