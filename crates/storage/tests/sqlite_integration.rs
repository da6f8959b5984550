use course_core::model::{Course, CourseDraft, CourseId, LessonId, Profile, QuizId, UserId};
use course_core::time::fixed_now;
use storage::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, NewCourseRecord,
    NewEnrollmentRecord, NewLessonRecord, NewQuizRecord, NewQuizResultRecord, NewUserRecord,
    QuizRepository, QuizResultRepository, StorageError, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let repo = SqliteRepository::connect(&format!("sqlite:file:{name}?mode=memory&cache=shared"))
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn seed_course(repo: &SqliteRepository, owner: u64) -> CourseId {
    let course = Course::new(
        CourseId::new(0),
        UserId::new(owner),
        CourseDraft::new("Rust", "Systems programming"),
        fixed_now(),
    )
    .unwrap();
    repo.insert_course(NewCourseRecord::from_course(&course))
        .await
        .expect("insert course")
}

async fn seed_lesson(repo: &SqliteRepository, course_id: CourseId, order: i32) -> LessonId {
    repo.insert_lesson(NewLessonRecord {
        course_id,
        title: format!("Lesson {order}"),
        content: "content".into(),
        order,
        image: None,
        created_at: fixed_now(),
    })
    .await
    .expect("insert lesson")
}

async fn seed_quiz(repo: &SqliteRepository, lesson_id: LessonId) -> QuizId {
    repo.insert_quiz(NewQuizRecord {
        lesson_id,
        question: "Pick one".into(),
        options: vec!["yes".into(), "no".into()],
        answer: "yes".into(),
        created_at: fixed_now(),
    })
    .await
    .expect("insert quiz")
}

fn completion(user: u64, quiz_id: QuizId) -> NewQuizResultRecord {
    NewQuizResultRecord {
        user_id: UserId::new(user),
        quiz_id,
        score: 80,
        completed_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_counts_quizzes_and_distinct_completions_per_course() {
    let repo = connect("memdb_progress_counts").await;
    let course = seed_course(&repo, 1).await;
    let other_course = seed_course(&repo, 1).await;
    let l1 = seed_lesson(&repo, course, 1).await;
    let l2 = seed_lesson(&repo, course, 2).await;
    let other_lesson = seed_lesson(&repo, other_course, 1).await;

    let q1 = seed_quiz(&repo, l1).await;
    let q2 = seed_quiz(&repo, l1).await;
    let _q3 = seed_quiz(&repo, l2).await;
    let _q4 = seed_quiz(&repo, l2).await;
    let foreign = seed_quiz(&repo, other_lesson).await;

    assert_eq!(repo.count_quizzes_in_course(course).await.unwrap(), 4);
    assert_eq!(repo.quizzes_in_course(course).await.unwrap().len(), 4);
    assert_eq!(repo.course_of_quiz(foreign).await.unwrap(), Some(other_course));

    let user = UserId::new(7);
    repo.insert_result(completion(7, q1)).await.unwrap();
    repo.insert_result(completion(7, q2)).await.unwrap();
    repo.insert_result(completion(7, foreign)).await.unwrap();
    repo.insert_result(completion(8, q1)).await.unwrap();

    assert_eq!(repo.count_distinct_completed(user, course).await.unwrap(), 2);
    assert_eq!(
        repo.count_distinct_completed(user, other_course)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn sqlite_rejects_duplicate_completion_and_enrollment() {
    let repo = connect("memdb_uniqueness").await;
    let course = seed_course(&repo, 1).await;
    let lesson = seed_lesson(&repo, course, 1).await;
    let quiz = seed_quiz(&repo, lesson).await;

    repo.insert_result(completion(3, quiz)).await.unwrap();
    let err = repo.insert_result(completion(3, quiz)).await.unwrap_err();
    assert!(matches!(err, StorageError::Duplicate));
    assert!(repo.result_exists(UserId::new(3), quiz).await.unwrap());

    let enrollment = NewEnrollmentRecord {
        user_id: UserId::new(3),
        course_id: course,
        enrolled_at: fixed_now(),
    };
    repo.insert_enrollment(enrollment).await.unwrap();
    let err = repo.insert_enrollment(enrollment).await.unwrap_err();
    assert!(matches!(err, StorageError::Duplicate));
    assert_eq!(
        repo.enrollments_for_user(UserId::new(3)).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn sqlite_reports_missing_parent_rows() {
    let repo = connect("memdb_missing_parents").await;
    let course = seed_course(&repo, 1).await;
    let lesson = seed_lesson(&repo, course, 1).await;
    let quiz = seed_quiz(&repo, lesson).await;
    repo.delete_course(course).await.unwrap();

    let err = repo.insert_result(completion(3, quiz)).await.unwrap_err();
    assert!(matches!(err, StorageError::MissingReference));

    let err = repo
        .insert_enrollment(NewEnrollmentRecord {
            user_id: UserId::new(3),
            course_id: course,
            enrolled_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingReference));

    let err = repo
        .insert_lesson(NewLessonRecord {
            course_id: course,
            title: "Orphan".into(),
            content: "content".into(),
            order: 1,
            image: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::MissingReference));
}

#[tokio::test]
async fn sqlite_progress_update_and_cascading_delete() {
    let repo = connect("memdb_cascade").await;
    let course = seed_course(&repo, 1).await;
    let lesson = seed_lesson(&repo, course, 1).await;
    let quiz = seed_quiz(&repo, lesson).await;
    let user = UserId::new(5);

    let enrollment_id = repo
        .insert_enrollment(NewEnrollmentRecord {
            user_id: user,
            course_id: course,
            enrolled_at: fixed_now(),
        })
        .await
        .unwrap();
    repo.insert_result(completion(5, quiz)).await.unwrap();
    repo.update_progress(user, course, 100.0).await.unwrap();

    let enrollment = repo.get_enrollment(enrollment_id).await.unwrap().unwrap();
    assert_eq!(enrollment.progress, 100.0);

    repo.delete_course(course).await.unwrap();
    assert!(repo.get_lesson(lesson).await.unwrap().is_none());
    assert!(repo.get_quiz(quiz).await.unwrap().is_none());
    assert!(repo.results_for_user(user).await.unwrap().is_empty());
    assert!(repo.get_enrollment(enrollment_id).await.unwrap().is_none());

    let err = repo.update_progress(user, course, 10.0).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn sqlite_lessons_are_sorted_by_order_then_id() {
    let repo = connect("memdb_lesson_order").await;
    let course = seed_course(&repo, 1).await;
    let third = seed_lesson(&repo, course, 5).await;
    let first = seed_lesson(&repo, course, -1).await;
    let second = seed_lesson(&repo, course, 5).await;

    let ids: Vec<LessonId> = repo
        .lessons_for_course(course)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(ids, vec![first, third, second]);
}

#[tokio::test]
async fn sqlite_users_and_profiles() {
    let repo = connect("memdb_users").await;
    let user = repo
        .insert_user(NewUserRecord {
            subject: "google-123".into(),
            email: "ada@example.com".into(),
            name: "Ada".into(),
            image: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap();

    let found = repo.find_user_by_subject("google-123").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let profile = Profile::new(user.id, "Ada Lovelace", Some("/uploads/ada.png".into())).unwrap();
    repo.upsert_profile(&profile).await.unwrap();
    assert_eq!(repo.get_profile(user.id).await.unwrap(), Some(profile));

    let orphan = Profile::new(UserId::new(9_999), "Nobody", None).unwrap();
    let err = repo.upsert_profile(&orphan).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
