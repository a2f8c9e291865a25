use models::student_form::{ProfileForm, ProfilePictureForm};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// `action` submissions on the student dashboard
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StudentDashboardAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub student_course_id: String,
}

/// Schema of the course purchase form; the handler reads the repeated
/// `selected_courses` pairs itself
#[derive(Debug, ToSchema)]
pub struct PurchaseForm {
    pub selected_courses: Vec<Uuid>,
}

/// `action` submissions on the principal dashboard and course list
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PrincipalAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub approval_id: String,
    #[serde(default)]
    pub course_id: String,
}

/// `action` submissions on the principal's per-student page
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PurchaseAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub purchase_id: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DepartmentAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub dept_name: String,
    #[serde(default)]
    pub dept_description: String,
    #[serde(default)]
    pub department_id: String,
}

/// Either profile form, told apart by `update_type`
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProfileSubmission {
    #[serde(default)]
    pub update_type: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub std_age: String,
    #[serde(default)]
    pub std_phone_no: String,
    #[serde(default)]
    pub std_year_of_admission: String,
    #[serde(default)]
    pub std_pic: String,
    #[serde(default)]
    pub size: String,
}

impl ProfileSubmission {
    pub fn is_picture(&self) -> bool {
        self.update_type == "profile_pic"
    }

    pub fn profile(self) -> ProfileForm {
        ProfileForm {
            first_name: self.first_name,
            last_name: self.last_name,
            std_age: self.std_age,
            std_phone_no: self.std_phone_no,
            std_year_of_admission: self.std_year_of_admission,
        }
    }

    /// A size that is not a number is treated as too large
    pub fn picture(self) -> ProfilePictureForm {
        let size = match self.size.trim() {
            "" => 0,
            raw => raw.parse().unwrap_or(u64::MAX),
        };

        ProfilePictureForm {
            std_pic: self.std_pic,
            size,
        }
    }
}
