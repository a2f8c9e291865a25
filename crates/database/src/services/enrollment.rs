use crate::{
    entities::{add_on_courses, departments, student_courses, students},
    services::error::{ServiceError, is_unique_violation},
};
use chrono::Utc;
use log::{debug, info};
use models::{
    actor::Actor,
    enrollment_status::{Decision, EnrollmentStatus},
    validation::ValidationErrors,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// An enrollment together with the records a listing shows next to it
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetail {
    pub enrollment: student_courses::Model,
    pub course: add_on_courses::Model,
    pub department: Option<departments::Model>,
    /// Only loaded for principal-facing listings
    pub student: Option<students::Model>,
}

/// A student's enrollments split by status, newest first
#[derive(Debug, Clone, Default, Serialize)]
pub struct StudentSummary {
    pub approved: Vec<EnrollmentDetail>,
    pub pending: Vec<EnrollmentDetail>,
    pub rejected: Vec<EnrollmentDetail>,
    pub total_spent: i64,
}

/// Result of a principal's decision, for building the notice
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    pub enrollment: student_courses::Model,
    pub course_name: String,
    pub student_first_name: String,
}

/// The approval workflow for add-on course requests.
///
/// `PENDING` is entered only through [`EnrollmentService::request_enrollment`];
/// principals move records to `APPROVED` or `REJECTED` with
/// [`EnrollmentService::decide`]; students can only withdraw their own records.
pub struct EnrollmentService;

impl EnrollmentService {
    /// Requests every course in `course_ids` for the acting student.
    ///
    /// Courses already requested are skipped, as are ids that match no
    /// course. Each record is its own insert guarded by the
    /// (student, course) unique index, so concurrent requests for the same
    /// pair create a single record. Returns the number of new records.
    pub async fn request_enrollment(
        db: &DatabaseConnection,
        actor: &Actor,
        course_ids: &[Uuid],
    ) -> Result<u64, ServiceError> {
        if !actor.is_student() {
            return Err(ServiceError::permission_denied(
                "Only students can request courses.",
            ));
        }

        if course_ids.is_empty() {
            return Err(ValidationErrors::single(
                "selected_courses",
                "Please select at least one course.",
            )
            .into());
        }

        let wanted: HashSet<Uuid> = course_ids.iter().copied().collect();
        let courses = add_on_courses::Entity::find()
            .filter(add_on_courses::Column::Id.is_in(wanted))
            .all(db)
            .await?;

        let mut created = 0;
        for course in courses {
            if Self::create_if_absent(db, actor.id, course.id).await? {
                created += 1;
            } else {
                debug!(
                    "Student {} already requested course {}, skipping",
                    actor.id, course.id
                );
            }
        }

        info!(
            "Student {} requested {} new course(s) out of {} selected",
            actor.id,
            created,
            course_ids.len()
        );
        Ok(created)
    }

    /// Inserts a pending record, returning `false` when the pair already exists
    async fn create_if_absent(
        db: &DatabaseConnection,
        student_id: Uuid,
        course_id: Uuid,
    ) -> Result<bool, DbErr> {
        let record = student_courses::ActiveModel {
            id: Set(Uuid::new_v4()),
            student_id: Set(student_id),
            course_id: Set(course_id),
            status: Set(EnrollmentStatus::Pending),
            purchased_at: Set(Utc::now()),
            approved_at: Set(None),
        };

        match student_courses::Entity::insert(record).exec(db).await {
            Ok(_) => Ok(true),
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Applies a principal's decision to an enrollment.
    ///
    /// The transition is not guarded on the current status: approving an
    /// approved record re-stamps `approved_at`, and a rejected record can
    /// be approved later (and the other way round). Rejecting leaves
    /// `approved_at` as it was.
    pub async fn decide(
        db: &DatabaseConnection,
        enrollment_id: Uuid,
        decision: Decision,
        actor: &Actor,
    ) -> Result<DecisionOutcome, ServiceError> {
        if !actor.is_principal() {
            return Err(ServiceError::permission_denied(
                "Only principals can approve or reject course requests.",
            ));
        }

        let (record, course) = student_courses::Entity::find_by_id(enrollment_id)
            .find_also_related(add_on_courses::Entity)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Approval request not found."))?;

        let student = students::Entity::find_by_id(record.student_id)
            .one(db)
            .await?;

        let mut active: student_courses::ActiveModel = record.into();
        active.status = Set(decision.target_status());
        if decision == Decision::Approve {
            active.approved_at = Set(Some(Utc::now()));
        }

        let enrollment = active.update(db).await.map_err(|err| match err {
            // Withdrawn between the read and the write
            DbErr::RecordNotUpdated => ServiceError::not_found("Approval request not found."),
            other => other.into(),
        })?;

        info!(
            "Principal {} {} enrollment {}",
            actor.id,
            decision.verb(),
            enrollment.id
        );

        Ok(DecisionOutcome {
            enrollment,
            course_name: course.map(|c| c.name).unwrap_or_default(),
            student_first_name: student.map(|s| s.first_name).unwrap_or_default(),
        })
    }

    /// Deletes one of the acting student's own enrollments, whatever its status.
    ///
    /// Returns the withdrawn course. A record owned by someone else is
    /// reported exactly like a missing one.
    pub async fn withdraw(
        db: &DatabaseConnection,
        enrollment_id: Uuid,
        actor: &Actor,
    ) -> Result<add_on_courses::Model, ServiceError> {
        let not_found =
            || ServiceError::not_found("Course not found or you do not have permission to remove it.");

        let (record, course) = student_courses::Entity::find_by_id(enrollment_id)
            .filter(student_courses::Column::StudentId.eq(actor.id))
            .find_also_related(add_on_courses::Entity)
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        let course = course.ok_or_else(not_found)?;

        let deleted = student_courses::Entity::delete_by_id(record.id)
            .exec(db)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(not_found());
        }

        info!(
            "Student {} withdrew enrollment {} ({})",
            actor.id, record.id, record.status
        );
        Ok(course)
    }

    /// Sum of course prices over the student's approved enrollments
    pub async fn compute_spend(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> Result<i64, ServiceError> {
        let approved = student_courses::Entity::find()
            .filter(student_courses::Column::StudentId.eq(student_id))
            .filter(student_courses::Column::Status.eq(EnrollmentStatus::Approved))
            .find_also_related(add_on_courses::Entity)
            .all(db)
            .await?;

        Ok(sum_prices(approved.iter().filter_map(|(_, c)| c.as_ref())))
    }

    /// Sum of course prices over every approved enrollment
    pub async fn aggregate_revenue(db: &DatabaseConnection) -> Result<i64, ServiceError> {
        let approved = student_courses::Entity::find()
            .filter(student_courses::Column::Status.eq(EnrollmentStatus::Approved))
            .find_also_related(add_on_courses::Entity)
            .all(db)
            .await?;

        Ok(sum_prices(approved.iter().filter_map(|(_, c)| c.as_ref())))
    }

    pub async fn count_pending(db: &DatabaseConnection) -> Result<u64, ServiceError> {
        Ok(student_courses::Entity::find()
            .filter(student_courses::Column::Status.eq(EnrollmentStatus::Pending))
            .count(db)
            .await?)
    }

    /// A student's enrollments, newest first, optionally narrowed to one status
    pub async fn list_for_student(
        db: &DatabaseConnection,
        student_id: Uuid,
        status: Option<EnrollmentStatus>,
    ) -> Result<Vec<EnrollmentDetail>, ServiceError> {
        let mut query = student_courses::Entity::find()
            .filter(student_courses::Column::StudentId.eq(student_id));
        if let Some(status) = status {
            query = query.filter(student_courses::Column::Status.eq(status));
        }

        let rows = query
            .order_by_desc(student_courses::Column::PurchasedAt)
            .find_also_related(add_on_courses::Entity)
            .all(db)
            .await?;

        Self::hydrate(db, rows, false).await
    }

    /// Dashboard view of one student's enrollments
    pub async fn student_summary(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> Result<StudentSummary, ServiceError> {
        let mut summary = StudentSummary::default();

        for detail in Self::list_for_student(db, student_id, None).await? {
            match detail.enrollment.status {
                EnrollmentStatus::Approved => summary.approved.push(detail),
                EnrollmentStatus::Pending => summary.pending.push(detail),
                EnrollmentStatus::Rejected => summary.rejected.push(detail),
            }
        }
        summary.total_spent = sum_prices(summary.approved.iter().map(|d| &d.course));

        Ok(summary)
    }

    /// Every pending request with its student, newest first
    pub async fn pending_approvals(
        db: &DatabaseConnection,
    ) -> Result<Vec<EnrollmentDetail>, ServiceError> {
        let rows = student_courses::Entity::find()
            .filter(student_courses::Column::Status.eq(EnrollmentStatus::Pending))
            .order_by_desc(student_courses::Column::PurchasedAt)
            .find_also_related(add_on_courses::Entity)
            .all(db)
            .await?;

        Self::hydrate(db, rows, true).await
    }

    /// Status of each course the student has requested, keyed by course id
    pub async fn course_status_map(
        db: &DatabaseConnection,
        student_id: Uuid,
    ) -> Result<HashMap<Uuid, EnrollmentStatus>, ServiceError> {
        let rows: Vec<(Uuid, EnrollmentStatus)> = student_courses::Entity::find()
            .select_only()
            .column(student_courses::Column::CourseId)
            .column(student_courses::Column::Status)
            .filter(student_courses::Column::StudentId.eq(student_id))
            .into_tuple()
            .all(db)
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// Batch fetch departments (and students when asked) for enrollment rows
    async fn hydrate(
        db: &DatabaseConnection,
        rows: Vec<(student_courses::Model, Option<add_on_courses::Model>)>,
        with_students: bool,
    ) -> Result<Vec<EnrollmentDetail>, ServiceError> {
        let rows: Vec<(student_courses::Model, add_on_courses::Model)> = rows
            .into_iter()
            .filter_map(|(enrollment, course)| course.map(|c| (enrollment, c)))
            .collect();

        let department_ids: HashSet<Uuid> =
            rows.iter().filter_map(|(_, c)| c.department_id).collect();
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

        let mut students_by_id: HashMap<Uuid, students::Model> = HashMap::new();
        if with_students && !rows.is_empty() {
            let student_ids: HashSet<Uuid> = rows.iter().map(|(e, _)| e.student_id).collect();
            students_by_id = students::Entity::find()
                .filter(students::Column::Id.is_in(student_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect();
        }

        Ok(rows
            .into_iter()
            .map(|(enrollment, course)| EnrollmentDetail {
                department: course
                    .department_id
                    .and_then(|id| departments_by_id.get(&id).cloned()),
                student: students_by_id.get(&enrollment.student_id).cloned(),
                enrollment,
                course,
            })
            .collect())
    }
}

fn sum_prices<'a>(courses: impl Iterator<Item = &'a add_on_courses::Model>) -> i64 {
    courses.map(|c| i64::from(c.price)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, course, department, setup};
    use models::role::Role;
    use std::time::Duration;

    struct Fixture {
        db: DatabaseConnection,
        student: Actor,
        principal: Actor,
        c1: add_on_courses::Model,
        c2: add_on_courses::Model,
    }

    async fn fixture() -> Fixture {
        let db = setup().await;
        let cs = department(&db, "CS").await;
        let c1 = course(&db, &cs, "C1", 500).await;
        let c2 = course(&db, &cs, "C2", 300).await;
        let student = account(&db, "Asha", Role::Student).await;
        let principal = account(&db, "Meera", Role::Principal).await;

        Fixture {
            db,
            student: Actor::new(student.id, Role::Student),
            principal: Actor::new(principal.id, Role::Principal),
            c1,
            c2,
        }
    }

    async fn record_for(
        db: &DatabaseConnection,
        student: &Actor,
        course: &add_on_courses::Model,
    ) -> student_courses::Model {
        student_courses::Entity::find()
            .filter(student_courses::Column::StudentId.eq(student.id))
            .filter(student_courses::Column::CourseId.eq(course.id))
            .one(db)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_twice_creates_one_record() {
        let f = fixture().await;

        let first = EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let second = EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 0);

        let records = student_courses::Entity::find().all(&f.db).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, EnrollmentStatus::Pending);
        assert_eq!(records[0].approved_at, None);
    }

    #[tokio::test]
    async fn test_partial_batch_counts_only_new() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();

        let created = EnrollmentService::request_enrollment(
            &f.db,
            &f.student,
            &[f.c1.id, f.c2.id, f.c2.id, Uuid::new_v4()],
        )
        .await
        .unwrap();
        assert_eq!(created, 1);
        assert_eq!(
            student_courses::Entity::find().count(&f.db).await.unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_request_rules() {
        let f = fixture().await;

        let empty = EnrollmentService::request_enrollment(&f.db, &f.student, &[]).await;
        assert!(matches!(empty, Err(ServiceError::Validation(_))));

        let by_principal =
            EnrollmentService::request_enrollment(&f.db, &f.principal, &[f.c1.id]).await;
        assert!(matches!(
            by_principal,
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[tokio::test]
    async fn test_approve_restamps_each_time() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let record = record_for(&f.db, &f.student, &f.c1).await;

        let first = EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.principal)
            .await
            .unwrap();
        assert_eq!(first.enrollment.status, EnrollmentStatus::Approved);
        assert_eq!(first.course_name, f.c1.name);
        assert_eq!(first.student_first_name, "Asha");
        let first_stamp = first.enrollment.approved_at.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;

        let second = EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.principal)
            .await
            .unwrap();
        assert_eq!(second.enrollment.status, EnrollmentStatus::Approved);
        assert!(second.enrollment.approved_at.unwrap() > first_stamp);

        let stored = record_for(&f.db, &f.student, &f.c1).await;
        assert_eq!(stored.approved_at, second.enrollment.approved_at);
    }

    #[tokio::test]
    async fn test_decide_is_not_guarded_on_status() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let record = record_for(&f.db, &f.student, &f.c1).await;

        let rejected = EnrollmentService::decide(&f.db, record.id, Decision::Reject, &f.principal)
            .await
            .unwrap();
        assert_eq!(rejected.enrollment.status, EnrollmentStatus::Rejected);
        assert_eq!(rejected.enrollment.approved_at, None);

        let approved = EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.principal)
            .await
            .unwrap();
        assert_eq!(approved.enrollment.status, EnrollmentStatus::Approved);
    }

    #[tokio::test]
    async fn test_decide_errors() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let record = record_for(&f.db, &f.student, &f.c1).await;

        let missing =
            EnrollmentService::decide(&f.db, Uuid::new_v4(), Decision::Approve, &f.principal)
                .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        let by_student =
            EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.student).await;
        assert!(matches!(by_student, Err(ServiceError::PermissionDenied(_))));
        assert_eq!(
            record_for(&f.db, &f.student, &f.c1).await.status,
            EnrollmentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_withdraw_only_own_record() {
        let f = fixture().await;
        let other = account(&f.db, "Kiran", Role::Student).await;
        let other = Actor::new(other.id, Role::Student);

        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let record = record_for(&f.db, &f.student, &f.c1).await;

        let err = EnrollmentService::withdraw(&f.db, record.id, &other)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(record_for(&f.db, &f.student, &f.c1).await, record);

        let withdrawn = EnrollmentService::withdraw(&f.db, record.id, &f.student)
            .await
            .unwrap();
        assert_eq!(withdrawn.id, f.c1.id);
        assert_eq!(
            student_courses::Entity::find().count(&f.db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_withdraw_approved_then_request_again() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        let record = record_for(&f.db, &f.student, &f.c1).await;
        EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.principal)
            .await
            .unwrap();

        EnrollmentService::withdraw(&f.db, record.id, &f.student)
            .await
            .unwrap();
        let again = EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        assert_eq!(again, 1);
        assert_eq!(
            record_for(&f.db, &f.student, &f.c1).await.status,
            EnrollmentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_spend_counts_only_approved() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        assert_eq!(
            EnrollmentService::compute_spend(&f.db, f.student.id)
                .await
                .unwrap(),
            0
        );

        let record = record_for(&f.db, &f.student, &f.c1).await;
        EnrollmentService::decide(&f.db, record.id, Decision::Approve, &f.principal)
            .await
            .unwrap();
        assert_eq!(
            EnrollmentService::compute_spend(&f.db, f.student.id)
                .await
                .unwrap(),
            500
        );

        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c2.id])
            .await
            .unwrap();
        assert_eq!(
            EnrollmentService::compute_spend(&f.db, f.student.id)
                .await
                .unwrap(),
            500
        );
    }

    #[tokio::test]
    async fn test_approve_one_reject_other_scenario() {
        let f = fixture().await;
        let other = account(&f.db, "Kiran", Role::Student).await;
        let other = Actor::new(other.id, Role::Student);

        let created =
            EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id, f.c2.id])
                .await
                .unwrap();
        assert_eq!(created, 2);
        EnrollmentService::request_enrollment(&f.db, &other, &[f.c2.id])
            .await
            .unwrap();

        let r1 = record_for(&f.db, &f.student, &f.c1).await;
        let r2 = record_for(&f.db, &f.student, &f.c2).await;
        let r3 = record_for(&f.db, &other, &f.c2).await;
        EnrollmentService::decide(&f.db, r1.id, Decision::Approve, &f.principal)
            .await
            .unwrap();
        EnrollmentService::decide(&f.db, r2.id, Decision::Reject, &f.principal)
            .await
            .unwrap();
        EnrollmentService::decide(&f.db, r3.id, Decision::Approve, &f.principal)
            .await
            .unwrap();

        assert_eq!(
            EnrollmentService::compute_spend(&f.db, f.student.id)
                .await
                .unwrap(),
            500
        );
        assert_eq!(
            EnrollmentService::aggregate_revenue(&f.db).await.unwrap(),
            800
        );

        let summary = EnrollmentService::student_summary(&f.db, f.student.id)
            .await
            .unwrap();
        assert_eq!(summary.approved.len(), 1);
        assert_eq!(summary.rejected.len(), 1);
        assert!(summary.pending.is_empty());
        assert_eq!(summary.total_spent, 500);
        assert_eq!(
            summary.approved[0].department.as_ref().map(|d| d.name.as_str()),
            Some("CS")
        );
    }

    #[tokio::test]
    async fn test_listings() {
        let f = fixture().await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c1.id])
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        EnrollmentService::request_enrollment(&f.db, &f.student, &[f.c2.id])
            .await
            .unwrap();

        let pending = EnrollmentService::pending_approvals(&f.db).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].course.id, f.c2.id, "newest first");
        assert_eq!(
            pending[0].student.as_ref().map(|s| s.id),
            Some(f.student.id)
        );
        assert_eq!(EnrollmentService::count_pending(&f.db).await.unwrap(), 2);

        let statuses = EnrollmentService::course_status_map(&f.db, f.student.id)
            .await
            .unwrap();
        assert_eq!(statuses.get(&f.c1.id), Some(&EnrollmentStatus::Pending));
        assert_eq!(statuses.len(), 2);

        let rejected =
            EnrollmentService::list_for_student(&f.db, f.student.id, Some(EnrollmentStatus::Rejected))
                .await
                .unwrap();
        assert!(rejected.is_empty());
    }
}
