use crate::routes::{auth, health, principal, root, student};
use axum::Json;
use utoipa::OpenApi;

/// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        root::landing,
        health::health,
        auth::login_page,
        auth::login,
        auth::logout,
        auth::registration_page,
        auth::register,
        student::dashboard,
        student::dashboard_action,
        student::courses,
        student::purchase,
        student::profile,
        student::update_profile,
        principal::dashboard,
        principal::dashboard_action,
        principal::courses,
        principal::courses_action,
        principal::create_course,
        principal::course,
        principal::update_course,
        principal::departments,
        principal::departments_action,
        principal::students,
        principal::student,
        principal::student_action
    ),
    tags(
        (name = "Pages", description = "Public pages"),
        (name = "Health", description = "Service health"),
        (name = "Authentication", description = "Login, logout and registration"),
        (name = "Student", description = "Student dashboard, course requests and profile"),
        (name = "Principal", description = "Approvals, catalog, departments and students"),
    ),
    info(
        title = "Add-on Course Portal API",
        version = "1.0.0",
        description = "Form posts answer with 303 redirects; views return JSON with queued notices",
        license(
            name = "MIT OR Apache-2.0",
        )
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_describes_forms_and_views() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();

        let schemas = &doc["components"]["schemas"];
        for name in [
            "LoginForm",
            "RegistrationForm",
            "CourseForm",
            "PurchaseForm",
            "StudentDashboardView",
            "PrincipalDashboardView",
        ] {
            assert!(schemas.get(name).is_some(), "{name} missing");
        }

        let purchase = &doc["paths"]["/student/courses"]["post"]["requestBody"]["content"];
        assert!(purchase.get("application/x-www-form-urlencoded").is_some());
    }
}
