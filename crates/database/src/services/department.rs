use crate::{
    entities::{add_on_courses, departments, student_courses, students},
    services::error::ServiceError,
};
use log::info;
use models::department_form::DepartmentForm;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::Expr,
};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentWithCourseCount {
    #[serde(flatten)]
    pub department: departments::Model,
    pub course_count: u64,
}

pub struct DepartmentService;

impl DepartmentService {
    pub async fn create(
        db: &DatabaseConnection,
        form: &DepartmentForm,
    ) -> Result<departments::Model, ServiceError> {
        let clean = form.clean()?;

        let department = departments::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(clean.name),
            description: Set(clean.description),
        }
        .insert(db)
        .await?;

        info!("Created department {} ({})", department.name, department.id);
        Ok(department)
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<Option<departments::Model>, ServiceError> {
        Ok(departments::Entity::find_by_id(id).one(db).await?)
    }

    pub async fn count(db: &DatabaseConnection) -> Result<u64, ServiceError> {
        Ok(departments::Entity::find().count(db).await?)
    }

    pub async fn list(db: &DatabaseConnection) -> Result<Vec<departments::Model>, ServiceError> {
        Ok(departments::Entity::find()
            .order_by_asc(departments::Column::Name)
            .all(db)
            .await?)
    }

    /// Every department with the number of courses it offers
    pub async fn list_with_course_counts(
        db: &DatabaseConnection,
    ) -> Result<Vec<DepartmentWithCourseCount>, ServiceError> {
        let departments = Self::list(db).await?;

        let counts: HashMap<Uuid, u64> = add_on_courses::Entity::find()
            .select_only()
            .column(add_on_courses::Column::DepartmentId)
            .column_as(add_on_courses::Column::Id.count(), "course_count")
            .filter(add_on_courses::Column::DepartmentId.is_not_null())
            .group_by(add_on_courses::Column::DepartmentId)
            .into_tuple::<(Option<Uuid>, i64)>()
            .all(db)
            .await?
            .into_iter()
            .filter_map(|(id, count)| id.map(|id| (id, count.max(0) as u64)))
            .collect();

        Ok(departments
            .into_iter()
            .map(|department| DepartmentWithCourseCount {
                course_count: counts.get(&department.id).copied().unwrap_or(0),
                department,
            })
            .collect())
    }

    /// Deletes a department with its courses and their enrollments.
    ///
    /// Students keep their accounts and lose the department reference.
    pub async fn delete(
        db: &DatabaseConnection,
        id: Uuid,
    ) -> Result<departments::Model, ServiceError> {
        let department = Self::find(db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Department not found."))?;

        let txn = db.begin().await?;

        let course_ids: Vec<Uuid> = add_on_courses::Entity::find()
            .select_only()
            .column(add_on_courses::Column::Id)
            .filter(add_on_courses::Column::DepartmentId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        let enrollments = student_courses::Entity::delete_many()
            .filter(student_courses::Column::CourseId.is_in(course_ids))
            .exec(&txn)
            .await?;

        let courses = add_on_courses::Entity::delete_many()
            .filter(add_on_courses::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?;

        students::Entity::update_many()
            .col_expr(
                students::Column::DepartmentId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(students::Column::DepartmentId.eq(id))
            .exec(&txn)
            .await?;

        departments::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            "Deleted department {} with {} courses and {} enrollments",
            department.name, courses.rows_affected, enrollments.rows_affected
        );
        Ok(department)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        services::enrollment::EnrollmentService,
        test_support::{account, course, department, setup},
    };
    use models::{actor::Actor, role::Role};

    #[tokio::test]
    async fn test_delete_cascades_to_courses_and_enrollments() {
        let db = setup().await;
        let science = department(&db, "Science").await;
        let arts = department(&db, "Arts").await;
        let physics = course(&db, &science, "PHY101", 400).await;
        let painting = course(&db, &arts, "ART101", 200).await;

        let student = account(&db, "Asha", Role::Student).await;
        let actor = Actor::new(student.id, Role::Student);
        EnrollmentService::request_enrollment(&db, &actor, &[physics.id, painting.id])
            .await
            .unwrap();

        DepartmentService::delete(&db, science.id).await.unwrap();

        assert!(
            add_on_courses::Entity::find_by_id(physics.id)
                .one(&db)
                .await
                .unwrap()
                .is_none()
        );
        let remaining = student_courses::Entity::find().all(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].course_id, painting.id);
        assert!(
            students::Entity::find_by_id(student.id)
                .one(&db)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_delete_missing_department() {
        let db = setup().await;
        let err = DepartmentService::delete(&db, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_course_counts() {
        let db = setup().await;
        let science = department(&db, "Science").await;
        let arts = department(&db, "Arts").await;
        course(&db, &science, "PHY101", 400).await;
        course(&db, &science, "CHE101", 300).await;

        let listed = DepartmentService::list_with_course_counts(&db).await.unwrap();
        let count_of = |id: Uuid| {
            listed
                .iter()
                .find(|d| d.department.id == id)
                .map(|d| d.course_count)
        };
        assert_eq!(count_of(science.id), Some(2));
        assert_eq!(count_of(arts.id), Some(0));
    }

    #[tokio::test]
    async fn test_create_validates_name() {
        let db = setup().await;
        let form = DepartmentForm {
            dept_name: String::new(),
            dept_description: "x".to_string(),
        };
        let err = DepartmentService::create(&db, &form).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
