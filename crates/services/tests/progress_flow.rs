use course_core::model::{CourseDraft, LessonDraft, QuizDraft, UserId, VerifiedIdentity};
use course_core::time::fixed_now;
use services::{AppConfig, AppServices, Clock, ErrorKind};
use storage::repository::Storage;

async fn app(name: &str) -> AppServices {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let storage = Storage::sqlite(&url).await.expect("sqlite storage");
    let config = AppConfig::defaults().expect("default config");
    AppServices::from_storage(&storage, &config, Clock::Fixed(fixed_now()))
}

fn identity(subject: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        subject: subject.into(),
        email: format!("{subject}@example.com"),
        name: subject.into(),
        picture: None,
    }
}

fn quiz(lesson_id: course_core::model::LessonId, n: usize) -> QuizDraft {
    QuizDraft {
        lesson_id,
        question: format!("Question {n}"),
        options: vec!["true".into(), "false".into()],
        answer: "true".into(),
    }
}

#[tokio::test]
async fn completions_drive_cached_progress_end_to_end() {
    let app = app("memdb_services_progress_flow").await;
    let profiles = app.profiles();
    let catalog = app.catalog();

    let instructor = profiles.sign_in(identity("instructor")).await.unwrap();
    let student = profiles.sign_in(identity("student")).await.unwrap();

    let course = catalog
        .create_course(instructor.id, CourseDraft::new("Databases", "Joins and indexes"))
        .await
        .unwrap();
    let mut quizzes = Vec::new();
    for order in 1..=2 {
        let lesson = catalog
            .create_lesson(
                instructor.id,
                LessonDraft::new(course.id(), format!("Lesson {order}"), "Read this.", order),
            )
            .await
            .unwrap();
        for n in 0..2 {
            quizzes.push(catalog.create_quiz(instructor.id, quiz(lesson.id, n)).await.unwrap());
        }
    }

    let enrollment = app.enrollments().enroll(student.id, course.id()).await.unwrap();
    let ledger = app.ledger();

    ledger.record_completion(student.id, quizzes[0].id, 80).await.unwrap();
    let overview = profiles.overview(student.id).await.unwrap();
    assert_eq!(overview.enrolled_courses[0].progress, 25.0);

    let err = ledger
        .record_completion(student.id, quizzes[0].id, 100)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyCompleted);

    for quiz in &quizzes[1..] {
        ledger.record_completion(student.id, quiz.id, 60).await.unwrap();
    }
    let overview = profiles.overview(student.id).await.unwrap();
    assert_eq!(overview.enrolled_courses[0].enrollment_id, enrollment.id);
    assert_eq!(overview.enrolled_courses[0].progress, 100.0);
    assert_eq!(
        app.enrollments()
            .course_progress(student.id, course.id())
            .await
            .unwrap(),
        100.0
    );

    let instructor_view = profiles.overview(instructor.id).await.unwrap();
    assert_eq!(instructor_view.created_courses.len(), 1);
    assert!(instructor_view.enrolled_courses.is_empty());
}

#[tokio::test]
async fn cancelling_and_deleting_respect_ownership() {
    let app = app("memdb_services_ownership").await;
    let catalog = app.catalog();
    let enrollments = app.enrollments();
    let owner = UserId::new(1);
    let student = UserId::new(2);

    let course = catalog
        .create_course(owner, CourseDraft::new("Empty", "No quizzes yet"))
        .await
        .unwrap();
    let enrollment = enrollments.enroll(student, course.id()).await.unwrap();
    assert_eq!(
        enrollments.refresh_progress(student, course.id()).await.unwrap(),
        0.0
    );

    let err = enrollments.enroll(student, course.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled);

    let err = enrollments.cancel(enrollment.id, owner).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(enrollments.enrollments_for_user(student).await.unwrap().len(), 1);

    let err = catalog.delete_course(student, course.id()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    catalog.delete_course(owner, course.id()).await.unwrap();
    assert!(enrollments.enrollments_for_user(student).await.unwrap().is_empty());
}
