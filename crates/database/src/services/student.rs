use crate::{
    entities::{departments, students},
    services::{
        error::{ServiceError, unique_violation},
        icontains,
    },
};
use chrono::{Datelike, Utc};
use log::{info, warn};
use models::{
    role::Role,
    student_form::{CleanProfile, CleanRegistration},
    validation::ValidationErrors,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use uuid::Uuid;

const DUPLICATE_EMAIL: &str = "A user with that email already exists.";
const DUPLICATE_REG_NO: &str = "Student with this Register No already exists.";

/// How `uq_students_reg_no` shows up in a violation on Postgres and on SQLite
const REG_NO_CONSTRAINT: [&str; 2] = ["uq_students_reg_no", "students.reg_no"];

#[derive(Debug, Clone, Serialize)]
pub struct StudentWithDepartment {
    #[serde(flatten)]
    pub student: students::Model,
    pub department: Option<departments::Model>,
}

pub struct StudentService;

impl StudentService {
    /// Creates a student account from a cleaned registration form.
    ///
    /// The role is always `STUDENT`; principals only come from
    /// [`StudentService::ensure_principal`].
    pub async fn register(
        db: &DatabaseConnection,
        registration: CleanRegistration,
        password_hash: String,
    ) -> Result<students::Model, ServiceError> {
        if let Some(department_id) = registration.department_id
            && departments::Entity::find_by_id(department_id)
                .one(db)
                .await?
                .is_none()
        {
            return Err(ValidationErrors::single("std_dept", "Select a valid department").into());
        }

        if Self::find_by_email(db, &registration.email).await?.is_some() {
            return Err(ServiceError::duplicate("email", DUPLICATE_EMAIL));
        }
        if Self::reg_no_taken(db, &registration.reg_no).await? {
            return Err(ServiceError::duplicate("std_reg_no", DUPLICATE_REG_NO));
        }

        let student = students::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(registration.email),
            password_hash: Set(password_hash),
            first_name: Set(registration.first_name),
            last_name: Set(registration.last_name),
            role: Set(Role::Student),
            reg_no: Set(registration.reg_no),
            department_id: Set(registration.department_id),
            year_of_admission: Set(registration.year_of_admission),
            phone_no: Set(registration.phone),
            age: Set(registration.age),
            picture: Set(None),
            date_joined: Set(Utc::now()),
        };

        // Lost a race with a concurrent registration
        let student = student.insert(db).await.map_err(registration_conflict)?;

        info!("Registered student {} ({})", student.email, student.id);
        Ok(student)
    }

    async fn reg_no_taken(db: &DatabaseConnection, reg_no: &str) -> Result<bool, ServiceError> {
        Ok(students::Entity::find()
            .filter(students::Column::RegNo.eq(reg_no))
            .count(db)
            .await?
            > 0)
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<students::Model>, ServiceError> {
        Ok(students::Entity::find_by_id(id).one(db).await?)
    }

    /// Looks up an account by its (case-insensitive) login email
    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<students::Model>, ServiceError> {
        Ok(students::Entity::find()
            .filter(students::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await?)
    }

    /// A student with their department, if the account is a student
    pub async fn find_student(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<StudentWithDepartment>, ServiceError> {
        let found = students::Entity::find_by_id(id)
            .filter(students::Column::Role.eq(Role::Student))
            .find_also_related(departments::Entity)
            .one(db)
            .await?;

        Ok(found.map(|(student, department)| StudentWithDepartment {
            student,
            department,
        }))
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        id: Uuid,
        profile: CleanProfile,
    ) -> Result<students::Model, ServiceError> {
        let existing = Self::find(db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student not found."))?;

        let mut student: students::ActiveModel = existing.into();
        student.first_name = Set(profile.first_name);
        student.last_name = Set(profile.last_name);
        student.age = Set(profile.age);
        student.phone_no = Set(profile.phone);
        student.year_of_admission = Set(profile.year_of_admission);

        let student = student.update(db).await?;
        info!("Updated profile of {}", student.id);
        Ok(student)
    }

    pub async fn update_picture(
        db: &DatabaseConnection,
        id: Uuid,
        picture: String,
    ) -> Result<students::Model, ServiceError> {
        let existing = Self::find(db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Student not found."))?;

        let mut student: students::ActiveModel = existing.into();
        student.picture = Set(Some(picture));
        Ok(student.update(db).await?)
    }

    /// Students newest first, optionally narrowed by a case-insensitive
    /// search over names, email and registration number
    pub async fn list(
        db: &DatabaseConnection,
        search: Option<&str>,
    ) -> Result<Vec<StudentWithDepartment>, ServiceError> {
        let mut query = students::Entity::find().filter(students::Column::Role.eq(Role::Student));

        if let Some(search) = search.map(str::trim)
            && !search.is_empty()
        {
            let mut any = Condition::any();
            for column in [
                students::Column::FirstName,
                students::Column::LastName,
                students::Column::Email,
                students::Column::RegNo,
            ] {
                any = any.add(icontains((students::Entity, column), search));
            }
            query = query.filter(any);
        }

        let rows = query
            .order_by_desc(students::Column::DateJoined)
            .find_also_related(departments::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(student, department)| StudentWithDepartment {
                student,
                department,
            })
            .collect())
    }

    /// The most recently joined students
    pub async fn recent(
        db: &DatabaseConnection,
        limit: u64,
    ) -> Result<Vec<students::Model>, ServiceError> {
        Ok(students::Entity::find()
            .filter(students::Column::Role.eq(Role::Student))
            .order_by_desc(students::Column::DateJoined)
            .limit(limit)
            .all(db)
            .await?)
    }

    pub async fn count_students(db: &DatabaseConnection) -> Result<u64, ServiceError> {
        Ok(students::Entity::find()
            .filter(students::Column::Role.eq(Role::Student))
            .count(db)
            .await?)
    }

    /// Creates the configured principal account unless the email is taken.
    ///
    /// Returns `true` when an account was created.
    pub async fn ensure_principal(
        db: &DatabaseConnection,
        email: &str,
        password_hash: String,
    ) -> Result<bool, ServiceError> {
        let email = email.trim().to_lowercase();
        if let Some(existing) = Self::find_by_email(db, &email).await? {
            if existing.role != Role::Principal {
                warn!("Bootstrap email {email} belongs to a student account, skipping");
            }
            return Ok(false);
        }

        let id = Uuid::new_v4();
        students::ActiveModel {
            id: Set(id),
            email: Set(email.clone()),
            password_hash: Set(password_hash),
            first_name: Set("Principal".to_string()),
            last_name: Set(String::new()),
            role: Set(Role::Principal),
            reg_no: Set(format!("P-{}", &id.simple().to_string()[..10])),
            department_id: Set(None),
            year_of_admission: Set(Utc::now().year()),
            phone_no: Set(None),
            age: Set(None),
            picture: Set(None),
            date_joined: Set(Utc::now()),
        }
        .insert(db)
        .await?;

        info!("Created principal account {email}");
        Ok(true)
    }
}

/// Tells which unique index a registration insert collided with
fn registration_conflict(err: DbErr) -> ServiceError {
    match unique_violation(&err) {
        Some(detail) if REG_NO_CONSTRAINT.iter().any(|name| detail.contains(name)) => {
            ServiceError::duplicate("std_reg_no", DUPLICATE_REG_NO)
        }
        Some(_) => ServiceError::duplicate("email", DUPLICATE_EMAIL),
        None => ServiceError::Database(err),
    }
}
