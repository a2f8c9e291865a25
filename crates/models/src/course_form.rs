use crate::validation::{ValidationErrors, required};
use serde::Deserialize;
use uuid::Uuid;

pub const COURSE_CODE_MAX_LEN: usize = 20;
pub const COURSE_NAME_MAX_LEN: usize = 100;

/// Raw add-on course form as submitted by a principal
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CourseForm {
    #[serde(default)]
    pub course_id: String,
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub course_description: String,
    #[serde(default)]
    pub course_price: String,
}

/// A course form that passed every check that does not need storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanCourse {
    /// Uppercased course code
    pub code: String,
    pub name: String,
    pub department_id: Uuid,
    pub description: String,
    pub price: i32,
}

/// Course codes compare case-insensitively, so they are stored uppercased
pub fn normalize_course_code(code: &str) -> String {
    code.trim().to_uppercase()
}

impl CourseForm {
    /// Validates required fields, code length and price.
    ///
    /// Code uniqueness is left to the storage layer.
    pub fn clean(&self) -> Result<CleanCourse, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let code = normalize_course_code(&self.course_id);
        if code.is_empty() {
            errors.add("course_id", "Course ID is required");
        } else if code.chars().count() > COURSE_CODE_MAX_LEN {
            errors.add(
                "course_id",
                format!("Course ID must be at most {COURSE_CODE_MAX_LEN} characters"),
            );
        }

        let name = required(
            &mut errors,
            "course_name",
            &self.course_name,
            "Course name is required",
        );
        if name.chars().count() > COURSE_NAME_MAX_LEN {
            errors.add(
                "course_name",
                format!("Course name must be at most {COURSE_NAME_MAX_LEN} characters"),
            );
        }

        let department_id = match self.department.trim() {
            "" => {
                errors.add("department", "Department is required");
                None
            }
            raw => match Uuid::parse_str(raw) {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("department", "Select a valid department");
                    None
                }
            },
        };

        let description = required(
            &mut errors,
            "course_description",
            &self.course_description,
            "Course description is required",
        );

        let price = match self.course_price.trim() {
            "" => 0,
            raw => match raw.parse::<i32>() {
                Ok(price) if price < 0 => {
                    errors.add("course_price", "Price cannot be negative");
                    price
                }
                Ok(price) => price,
                Err(_) => {
                    errors.add("course_price", "Enter a whole number");
                    0
                }
            },
        };

        match department_id {
            Some(department_id) if errors.is_empty() => Ok(CleanCourse {
                code,
                name,
                department_id,
                description,
                price,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CourseForm {
        CourseForm {
            course_id: "  cs101 ".to_string(),
            course_name: "Introduction to Programming".to_string(),
            department: Uuid::nil().to_string(),
            course_description: "Variables, loops and functions".to_string(),
            course_price: "500".to_string(),
        }
    }

    #[test]
    fn test_clean_normalizes_code() {
        let clean = form().clean().unwrap();
        assert_eq!(clean.code, "CS101");
        assert_eq!(clean.price, 500);
        assert_eq!(clean.department_id, Uuid::nil());
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut form = form();
        form.course_price = "-1".to_string();
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("course_price"), ["Price cannot be negative"]);
    }

    #[test]
    fn test_empty_price_defaults_to_zero() {
        let mut form = form();
        form.course_price = String::new();
        assert_eq!(form.clean().unwrap().price, 0);
    }

    #[test]
    fn test_required_fields() {
        let errors = CourseForm::default().clean().unwrap_err();
        assert!(!errors.field("course_id").is_empty());
        assert!(!errors.field("course_name").is_empty());
        assert!(!errors.field("department").is_empty());
        assert!(!errors.field("course_description").is_empty());
        assert!(errors.field("course_price").is_empty());
    }

    #[test]
    fn test_bad_department_id() {
        let mut form = form();
        form.department = "not-a-uuid".to_string();
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("department"), ["Select a valid department"]);
    }
}
