use crate::{
    entities::{add_on_courses, departments, students},
    services::{course::CourseService, department::DepartmentService},
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use models::{
    course_form::CourseForm, department_form::DepartmentForm, role::Role,
};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

/// Fresh in-memory database with the full schema applied
pub async fn setup() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);

    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn department(db: &DatabaseConnection, name: &str) -> departments::Model {
    let form = DepartmentForm {
        dept_name: name.to_string(),
        dept_description: format!("{name} department"),
    };
    DepartmentService::create(db, &form).await.unwrap()
}

pub async fn course(
    db: &DatabaseConnection,
    department: &departments::Model,
    code: &str,
    price: i32,
) -> add_on_courses::Model {
    let form = CourseForm {
        course_id: code.to_string(),
        course_name: format!("Course {code}"),
        department: department.id.to_string(),
        course_description: "An add-on course".to_string(),
        course_price: price.to_string(),
    };
    CourseService::create(db, &form).await.unwrap()
}

pub async fn account(db: &DatabaseConnection, first_name: &str, role: Role) -> students::Model {
    let id = Uuid::new_v4();
    students::ActiveModel {
        id: Set(id),
        email: Set(format!("{}@example.com", first_name.to_lowercase())),
        password_hash: Set("not-a-real-hash".to_string()),
        first_name: Set(first_name.to_string()),
        last_name: Set("Tester".to_string()),
        role: Set(role),
        reg_no: Set(id.simple().to_string()[..12].to_uppercase()),
        department_id: Set(None),
        year_of_admission: Set(2024),
        phone_no: Set(None),
        age: Set(None),
        picture: Set(None),
        date_joined: Set(Utc::now()),
    }
    .insert(db)
    .await
    .unwrap()
}
