use crate::validation::{ValidationErrors, required};
use serde::Deserialize;
use uuid::Uuid;
use validator::ValidateEmail;

pub const REG_NO_MAX_LEN: usize = 12;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_AGE: i32 = 16;
pub const MAX_AGE: i32 = 50;
pub const FIRST_ADMISSION_YEAR: i32 = 2000;
pub const MAX_PICTURE_BYTES: u64 = 5 * 1024 * 1024;
pub const PICTURE_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".gif", ".avif", ".webp"];

/// Self-registration form; the role is always forced to student
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub std_reg_no: String,
    #[serde(default)]
    pub std_dept: String,
    #[serde(default)]
    pub std_year_of_admission: String,
    #[serde(default)]
    pub std_phone_no: String,
    #[serde(default)]
    pub std_age: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRegistration {
    pub first_name: String,
    pub last_name: String,
    /// Lowercased, doubles as the login name
    pub email: String,
    pub reg_no: String,
    pub department_id: Option<Uuid>,
    pub year_of_admission: i32,
    pub phone: Option<String>,
    pub age: Option<i32>,
    pub password: String,
}

/// Profile details a student may edit after registration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanProfile {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub phone: Option<String>,
    pub year_of_admission: i32,
}

/// Reference to an already uploaded profile picture
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePictureForm {
    #[serde(default)]
    pub std_pic: String,
    #[serde(default)]
    pub size: u64,
}

impl RegistrationForm {
    pub fn clean(&self, current_year: i32) -> Result<CleanRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = required(
            &mut errors,
            "first_name",
            &self.first_name,
            "First name is required",
        );
        let last_name = required(
            &mut errors,
            "last_name",
            &self.last_name,
            "Last name is required",
        );

        let email = required(&mut errors, "email", &self.email, "Email is required").to_lowercase();
        if !email.is_empty() && !email.validate_email() {
            errors.add("email", "Enter a valid email address");
        }

        let reg_no = required(
            &mut errors,
            "std_reg_no",
            &self.std_reg_no,
            "Register number is required",
        );
        if reg_no.chars().count() > REG_NO_MAX_LEN {
            errors.add(
                "std_reg_no",
                format!("Register number must be at most {REG_NO_MAX_LEN} characters"),
            );
        }

        let department_id = match self.std_dept.trim() {
            "" => None,
            raw => Uuid::parse_str(raw)
                .map_err(|_| errors.add("std_dept", "Select a valid department"))
                .ok(),
        };

        let year_of_admission = match self.std_year_of_admission.trim() {
            "" => current_year,
            raw => clean_year(&mut errors, raw, current_year),
        };
        let phone = clean_phone(&mut errors, &self.std_phone_no);
        let age = clean_age(&mut errors, &self.std_age);

        if self.password1.is_empty() {
            errors.add("password1", "Password is required");
        } else if self.password1.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password1",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters long"),
            );
        }
        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match");
        }

        errors.into_result(CleanRegistration {
            first_name,
            last_name,
            email,
            reg_no,
            department_id,
            year_of_admission,
            phone,
            age,
            password: self.password1.clone(),
        })
    }
}

impl ProfileForm {
    pub fn clean(&self, current_year: i32) -> Result<CleanProfile, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let first_name = required(
            &mut errors,
            "first_name",
            &self.first_name,
            "First name is required",
        );
        let last_name = required(
            &mut errors,
            "last_name",
            &self.last_name,
            "Last name is required",
        );
        let age = clean_age(&mut errors, &self.std_age);
        let phone = clean_phone(&mut errors, &self.std_phone_no);

        let year_of_admission = match self.std_year_of_admission.trim() {
            "" => {
                errors.add("std_year_of_admission", "Year of admission is required");
                0
            }
            raw => clean_year(&mut errors, raw, current_year),
        };

        errors.into_result(CleanProfile {
            first_name,
            last_name,
            age,
            phone,
            year_of_admission,
        })
    }
}

impl ProfilePictureForm {
    /// Returns the picture reference once its extension and size check out
    pub fn clean(&self) -> Result<String, ValidationErrors> {
        let name = self.std_pic.trim();
        if name.is_empty() {
            return Err(ValidationErrors::single("std_pic", "Please choose a picture"));
        }

        let lower = name.to_lowercase();
        if !PICTURE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            return Err(ValidationErrors::single(
                "std_pic",
                "Unsupported file format. Please upload JPG, PNG, GIF, AVIF, or WebP.",
            ));
        }

        if self.size > MAX_PICTURE_BYTES {
            return Err(ValidationErrors::single(
                "std_pic",
                "Image file too large (maximum 5MB).",
            ));
        }

        Ok(name.to_string())
    }
}

/// Strips everything but digits; the rest must be exactly ten digits
fn clean_phone(errors: &mut ValidationErrors, raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }

    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 10 {
        errors.add("std_phone_no", "Phone number must be exactly 10 digits.");
        return None;
    }

    Some(digits)
}

fn clean_age(errors: &mut ValidationErrors, raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match raw.parse::<i32>() {
        Ok(age) if (MIN_AGE..=MAX_AGE).contains(&age) => Some(age),
        Ok(_) => {
            errors.add(
                "std_age",
                format!("Age must be between {MIN_AGE} and {MAX_AGE}."),
            );
            None
        }
        Err(_) => {
            errors.add("std_age", "Enter a whole number");
            None
        }
    }
}

fn clean_year(errors: &mut ValidationErrors, raw: &str, current_year: i32) -> i32 {
    let latest = current_year + 1;
    match raw.parse::<i32>() {
        Ok(year) if (FIRST_ADMISSION_YEAR..=latest).contains(&year) => year,
        Ok(year) => {
            errors.add(
                "std_year_of_admission",
                format!("Year of admission must be between {FIRST_ADMISSION_YEAR} and {latest}."),
            );
            year
        }
        Err(_) => {
            errors.add("std_year_of_admission", "Enter a whole number");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegistrationForm {
        RegistrationForm {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "Asha.Rao@Example.com".to_string(),
            std_reg_no: "21CS042".to_string(),
            std_year_of_admission: "2024".to_string(),
            std_phone_no: "98765-43210".to_string(),
            password1: "s3cret-pass".to_string(),
            password2: "s3cret-pass".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_registration_cleans_fields() {
        let clean = registration().clean(2025).unwrap();
        assert_eq!(clean.email, "asha.rao@example.com");
        assert_eq!(clean.phone.as_deref(), Some("9876543210"));
        assert_eq!(clean.year_of_admission, 2024);
        assert_eq!(clean.department_id, None);
        assert_eq!(clean.age, None);
    }

    #[test]
    fn test_registration_password_mismatch() {
        let mut form = registration();
        form.password2 = "different-pass".to_string();
        let errors = form.clean(2025).unwrap_err();
        assert_eq!(errors.field("password2").len(), 1);
        assert!(errors.field("password1").is_empty());
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        for email in ["asha", "asha@", "@example.com", "a b@example.com", "asha@example..com"] {
            let mut form = registration();
            form.email = email.to_string();
            assert!(form.clean(2025).is_err(), "{email} should be rejected");
        }
    }

    #[test]
    fn test_registration_defaults_year() {
        let mut form = registration();
        form.std_year_of_admission = String::new();
        assert_eq!(form.clean(2025).unwrap().year_of_admission, 2025);
    }

    #[test]
    fn test_profile_ranges() {
        let form = ProfileForm {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            std_age: "12".to_string(),
            std_phone_no: "12345".to_string(),
            std_year_of_admission: "2027".to_string(),
        };
        let errors = form.clean(2025).unwrap_err();
        assert_eq!(errors.field("std_age"), ["Age must be between 16 and 50."]);
        assert_eq!(
            errors.field("std_phone_no"),
            ["Phone number must be exactly 10 digits."]
        );
        assert_eq!(
            errors.field("std_year_of_admission"),
            ["Year of admission must be between 2000 and 2026."]
        );
    }

    #[test]
    fn test_profile_accepts_next_year() {
        let form = ProfileForm {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            std_age: "19".to_string(),
            std_phone_no: String::new(),
            std_year_of_admission: "2026".to_string(),
        };
        let clean = form.clean(2025).unwrap();
        assert_eq!(clean.age, Some(19));
        assert_eq!(clean.phone, None);
    }

    #[test]
    fn test_picture_checks() {
        let ok = ProfilePictureForm {
            std_pic: "student_pic/me.PNG".to_string(),
            size: 1024,
        };
        assert_eq!(ok.clean().unwrap(), "student_pic/me.PNG");

        let wrong_ext = ProfilePictureForm {
            std_pic: "me.bmp".to_string(),
            size: 1024,
        };
        assert!(wrong_ext.clean().is_err());

        let too_big = ProfilePictureForm {
            std_pic: "me.jpg".to_string(),
            size: MAX_PICTURE_BYTES + 1,
        };
        assert!(too_big.clean().is_err());
    }
}
