use crate::session::Notice;
use database::{
    entities::{add_on_courses, departments},
    services::{
        Page,
        course::CourseWithDepartment,
        dashboard::PrincipalOverview,
        department::DepartmentWithCourseCount,
        enrollment::StudentSummary,
        student::StudentWithDepartment,
    },
};
use models::{actor::Actor, enrollment_status::EnrollmentStatus};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct LandingView {
    pub notices: Vec<Notice>,
    pub actor: Option<Actor>,
    /// Dashboard of the logged-in actor
    #[schema(value_type = Option<String>)]
    pub home: Option<&'static str>,
}

/// Login and registration pages
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Vec<Object>)]
    pub departments: Vec<departments::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDashboardView {
    pub notices: Vec<Notice>,
    pub approved_courses: usize,
    pub pending_courses: usize,
    pub rejected_courses: usize,
    pub total_amount_spent: i64,
    /// `approved`, `pending` and `rejected` requests plus `total_spent`
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub summary: StudentSummary,
}

impl StudentDashboardView {
    pub fn new(notices: Vec<Notice>, summary: StudentSummary) -> Self {
        Self {
            notices,
            approved_courses: summary.approved.len(),
            pending_courses: summary.pending.len(),
            rejected_courses: summary.rejected.len(),
            total_amount_spent: summary.total_spent,
            summary,
        }
    }
}

/// Course catalog with the student's request status per course
#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Object)]
    pub courses: Page<CourseWithDepartment>,
    pub student_courses: HashMap<Uuid, EnrollmentStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Object)]
    pub student: StudentWithDepartment,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalDashboardView {
    pub notices: Vec<Notice>,
    /// Counts, revenue, recent students, pending approvals and departments
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub overview: PrincipalOverview,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseListView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Object)]
    pub courses: Page<CourseWithDepartment>,
    #[schema(value_type = Vec<Object>)]
    pub departments: Vec<departments::Model>,
    pub selected_department: Option<Uuid>,
    pub search_query: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseEditView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Object)]
    pub course: add_on_courses::Model,
    #[schema(value_type = Vec<Object>)]
    pub departments: Vec<departments::Model>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentListView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Vec<Object>)]
    pub departments: Vec<DepartmentWithCourseCount>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentListView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Vec<Object>)]
    pub students: Vec<StudentWithDepartment>,
    pub search_query: String,
    pub total_students: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentDetailView {
    pub notices: Vec<Notice>,
    #[schema(value_type = Object)]
    pub student: StudentWithDepartment,
    pub approved_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
    /// `approved`, `pending` and `rejected` requests plus `total_spent`
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub summary: StudentSummary,
}
