use crate::validation::{ValidationErrors, required};
use serde::Deserialize;

pub const DEPARTMENT_NAME_MAX_LEN: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentForm {
    #[serde(default)]
    pub dept_name: String,
    #[serde(default)]
    pub dept_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanDepartment {
    pub name: String,
    pub description: String,
}

impl DepartmentForm {
    pub fn clean(&self) -> Result<CleanDepartment, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = required(
            &mut errors,
            "dept_name",
            &self.dept_name,
            "Department name is required",
        );
        if name.chars().count() > DEPARTMENT_NAME_MAX_LEN {
            errors.add(
                "dept_name",
                format!("Department name must be at most {DEPARTMENT_NAME_MAX_LEN} characters"),
            );
        }

        let description = required(
            &mut errors,
            "dept_description",
            &self.dept_description,
            "Department description is required",
        );

        errors.into_result(CleanDepartment { name, description })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length_limit() {
        let form = DepartmentForm {
            dept_name: "Computer Science and Engineering".to_string(),
            dept_description: "CSE".to_string(),
        };
        let errors = form.clean().unwrap_err();
        assert_eq!(errors.field("dept_name").len(), 1);

        let form = DepartmentForm {
            dept_name: " Physics ".to_string(),
            dept_description: "Matter and energy".to_string(),
        };
        assert_eq!(form.clean().unwrap().name, "Physics");
    }
}
