use crate::{
    entities::{add_on_courses, departments, student_courses},
    services::{Page, clamp_page, error::ServiceError, icontains},
};
use chrono::Utc;
use log::info;
use models::{
    course_form::{CleanCourse, CourseForm},
    validation::ValidationErrors,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CourseWithDepartment {
    #[serde(flatten)]
    pub course: add_on_courses::Model,
    pub department: Option<departments::Model>,
}

pub struct CourseService;

impl CourseService {
    /// Courses per page in catalog listings
    pub const PAGE_SIZE: u64 = 5;

    pub async fn create(
        db: &DatabaseConnection,
        form: &CourseForm,
    ) -> Result<add_on_courses::Model, ServiceError> {
        let clean = Self::validate(db, form, None).await?;
        let duplicate_message = duplicate_code_message(&clean.code);

        let course = add_on_courses::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(Some(clean.code)),
            name: Set(clean.name),
            department_id: Set(Some(clean.department_id)),
            description: Set(clean.description),
            price: Set(clean.price),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::from_insert(e, "course_id", duplicate_message))?;

        info!("Created course {} ({})", course.name, course.id);
        Ok(course)
    }

    pub async fn update(
        db: &DatabaseConnection,
        id: Uuid,
        form: &CourseForm,
    ) -> Result<add_on_courses::Model, ServiceError> {
        let existing = Self::find(db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course not found."))?;

        let clean = Self::validate(db, form, Some(id)).await?;
        let duplicate_message = duplicate_code_message(&clean.code);

        let mut course: add_on_courses::ActiveModel = existing.into();
        course.code = Set(Some(clean.code));
        course.name = Set(clean.name);
        course.department_id = Set(Some(clean.department_id));
        course.description = Set(clean.description);
        course.price = Set(clean.price);

        let course = course
            .update(db)
            .await
            .map_err(|e| ServiceError::from_insert(e, "course_id", duplicate_message))?;

        info!("Updated course {} ({})", course.name, course.id);
        Ok(course)
    }

    /// Runs the form checks plus the ones that need storage: the department
    /// must exist and no other course may hold the same code.
    async fn validate(
        db: &DatabaseConnection,
        form: &CourseForm,
        editing: Option<Uuid>,
    ) -> Result<CleanCourse, ServiceError> {
        let clean = form.clean()?;

        if departments::Entity::find_by_id(clean.department_id)
            .one(db)
            .await?
            .is_none()
        {
            return Err(ValidationErrors::single("department", "Select a valid department").into());
        }

        let mut query = add_on_courses::Entity::find()
            .filter(add_on_courses::Column::Code.eq(clean.code.as_str()));
        if let Some(id) = editing {
            query = query.filter(add_on_courses::Column::Id.ne(id));
        }

        if query.count(db).await? > 0 {
            return Err(ServiceError::duplicate(
                "course_id",
                duplicate_code_message(&clean.code),
            ));
        }

        Ok(clean)
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<add_on_courses::Model>, ServiceError> {
        Ok(add_on_courses::Entity::find_by_id(id).one(db).await?)
    }

    pub async fn count(db: &DatabaseConnection) -> Result<u64, ServiceError> {
        Ok(add_on_courses::Entity::find().count(db).await?)
    }

    /// Deletes a course and every enrollment that references it
    pub async fn delete(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<add_on_courses::Model, ServiceError> {
        let course = Self::find(db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course not found."))?;

        let txn = db.begin().await?;
        let enrollments = student_courses::Entity::delete_many()
            .filter(student_courses::Column::CourseId.eq(id))
            .exec(&txn)
            .await?;
        add_on_courses::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted course {} and {} enrollments",
            course.name, enrollments.rows_affected
        );
        Ok(course)
    }

    /// Query courses ordered by name, with pagination and filtering
    pub async fn list_paginated(
        db: &DatabaseConnection,
        page: u64,
        department: Option<Uuid>,
        search: Option<&str>,
    ) -> Result<Page<CourseWithDepartment>, ServiceError> {
        let mut condition = Condition::all();

        if let Some(department) = department {
            condition = condition.add(add_on_courses::Column::DepartmentId.eq(department));
        }

        if let Some(search) = search.map(str::trim)
            && !search.is_empty()
        {
            condition = condition.add(
                Condition::any()
                    .add(icontains(
                        (add_on_courses::Entity, add_on_courses::Column::Name),
                        search,
                    ))
                    .add(icontains(
                        (add_on_courses::Entity, add_on_courses::Column::Code),
                        search,
                    )),
            );
        }

        let query = add_on_courses::Entity::find()
            .filter(condition)
            .order_by_asc(add_on_courses::Column::Name)
            .order_by_asc(add_on_courses::Column::Id);

        // Apply pagination
        let per_page = Self::PAGE_SIZE;
        let total_items = query.clone().count(db).await?;
        let page = clamp_page(page, total_items, per_page);
        let courses = query.paginate(db, per_page).fetch_page(page - 1).await?; // SeaORM uses 0-based pages

        let items = Self::attach_departments(db, courses).await?;

        Ok(Page::new(items, page, per_page, total_items))
    }

    /// Batch fetch the departments of `courses` and pair them up
    async fn attach_departments(
        db: &DatabaseConnection,
        courses: Vec<add_on_courses::Model>,
    ) -> Result<Vec<CourseWithDepartment>, ServiceError> {
        let department_ids: Vec<Uuid> = courses.iter().filter_map(|c| c.department_id).collect();

        let departments_by_id: HashMap<Uuid, departments::Model> = if department_ids.is_empty() {
            HashMap::new()
        } else {
            departments::Entity::find()
                .filter(departments::Column::Id.is_in(department_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|d| (d.id, d))
                .collect()
        };

        Ok(courses
            .into_iter()
            .map(|course| CourseWithDepartment {
                department: course
                    .department_id
                    .and_then(|id| departments_by_id.get(&id).cloned()),
                course,
            })
            .collect())
    }
}

fn duplicate_code_message(code: &str) -> String {
    format!("Course ID \"{code}\" already exists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::enrollment::EnrollmentService,
        test_support::{account, course, department, setup},
    };
    use models::{actor::Actor, role::Role};

    fn form(department: &departments::Model, code: &str) -> CourseForm {
        CourseForm {
            course_id: code.to_string(),
            course_name: "Data Structures".to_string(),
            department: department.id.to_string(),
            course_description: "Lists, trees and graphs".to_string(),
            course_price: "300".to_string(),
        }
    }

    #[tokio::test]
    async fn test_code_unique_case_insensitive() {
        let db = setup().await;
        let cs = department(&db, "CS").await;

        let created = CourseService::create(&db, &form(&cs, "CS101")).await.unwrap();
        assert_eq!(created.code.as_deref(), Some("CS101"));

        let err = CourseService::create(&db, &form(&cs, "cs101"))
            .await
            .unwrap_err();
        match err {
            ServiceError::Duplicate { field, message } => {
                assert_eq!(field, "course_id");
                assert_eq!(message, "Course ID \"CS101\" already exists");
            }
            other => panic!("expected duplicate, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_keeps_own_code() {
        let db = setup().await;
        let cs = department(&db, "CS").await;
        let created = CourseService::create(&db, &form(&cs, "CS201")).await.unwrap();

        let mut edit = form(&cs, "cs201");
        edit.course_price = "450".to_string();
        let updated = CourseService::update(&db, created.id, &edit).await.unwrap();
        assert_eq!(updated.price, 450);

        CourseService::create(&db, &form(&cs, "CS202")).await.unwrap();
        let err = CourseService::update(&db, created.id, &form(&cs, "CS202"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_unknown_department_rejected() {
        let db = setup().await;
        let mut form = CourseForm {
            course_id: "MA101".to_string(),
            course_name: "Calculus".to_string(),
            course_description: "Limits".to_string(),
            ..Default::default()
        };
        form.department = Uuid::new_v4().to_string();

        let err = CourseService::create(&db, &form).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_enrollments() {
        let db = setup().await;
        let cs = department(&db, "CS").await;
        let algorithms = course(&db, &cs, "CS301", 500).await;
        let student = account(&db, "Ravi", Role::Student).await;
        let actor = Actor::new(student.id, Role::Student);
        EnrollmentService::request_enrollment(&db, &actor, &[algorithms.id])
            .await
            .unwrap();

        CourseService::delete(&db, algorithms.id).await.unwrap();

        let left = student_courses::Entity::find()
            .filter(student_courses::Column::CourseId.eq(algorithms.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(left, 0);
        assert!(matches!(
            CourseService::delete(&db, algorithms.id).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let db = setup().await;
        let cs = department(&db, "CS").await;
        let math = department(&db, "Math").await;
        for code in ["CS101", "CS102", "CS103", "CS104", "CS105", "CS106"] {
            course(&db, &cs, code, 100).await;
        }
        course(&db, &math, "MA101", 100).await;

        let first = CourseService::list_paginated(&db, 1, Some(cs.id), None)
            .await
            .unwrap();
        assert_eq!(first.total_items, 6);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items.len(), 5);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let past_end = CourseService::list_paginated(&db, 9, Some(cs.id), None)
            .await
            .unwrap();
        assert_eq!(past_end.page, 2);
        assert_eq!(past_end.items.len(), 1);

        let searched = CourseService::list_paginated(&db, 1, None, Some("ma1"))
            .await
            .unwrap();
        assert_eq!(searched.total_items, 1);
        let hit = &searched.items[0];
        assert_eq!(hit.course.code.as_deref(), Some("MA101"));
        assert_eq!(hit.department.as_ref().map(|d| d.id), Some(math.id));
    }

    #[tokio::test]
    async fn test_empty_listing_has_one_page() {
        let db = setup().await;

        let empty = CourseService::list_paginated(&db, 3, None, None)
            .await
            .unwrap();
        assert!(empty.items.is_empty());
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
