use anyhow::Context;
use course_core::model::{CourseDraft, CourseId, LessonDraft, QuizDraft, User, VerifiedIdentity};
use services::AppServices;

const DEMO_SUBJECT: &str = "demo-instructor";

const LESSONS: &[(&str, &str, &[(&str, &[&str], &str)])] = &[
    (
        "Ownership",
        "Every value has a single owner; it is dropped when the owner goes out of scope.",
        &[
            (
                "What happens to a value when its owner goes out of scope?",
                &["It is dropped", "It leaks", "It is copied"],
                "It is dropped",
            ),
            (
                "How many owners can a value have at once?",
                &["One", "Two", "Unlimited"],
                "One",
            ),
        ],
    ),
    (
        "Borrowing",
        "References let code use a value without taking ownership of it.",
        &[
            (
                "How many mutable references to a value may exist at once?",
                &["One", "Any number"],
                "One",
            ),
            (
                "Can a shared reference outlive its referent?",
                &["No", "Yes"],
                "No",
            ),
        ],
    ),
];

pub struct SeedReport {
    pub instructor: User,
    pub course_id: CourseId,
    pub created: bool,
}

/// Create a demo instructor and one course with lessons and quizzes.
///
/// Re-running is a no-op once the instructor owns a course.
pub async fn seed_demo(app: &AppServices) -> anyhow::Result<SeedReport> {
    let instructor = app
        .profiles()
        .sign_in(VerifiedIdentity {
            subject: DEMO_SUBJECT.into(),
            email: "instructor@example.com".into(),
            name: "Demo Instructor".into(),
            picture: None,
        })
        .await
        .context("registering demo instructor")?;

    let catalog = app.catalog();
    let existing = catalog
        .list_courses()
        .await?
        .into_iter()
        .find(|c| c.owner_id() == instructor.id);
    if let Some(course) = existing {
        tracing::info!(course = %course.id(), "demo course already present");
        return Ok(SeedReport {
            instructor,
            course_id: course.id(),
            created: false,
        });
    }

    let course = catalog
        .create_course(
            instructor.id,
            CourseDraft::new("Rust in practice", "Ownership and borrowing by example."),
        )
        .await?;

    for (order, (title, content, quizzes)) in (1..).zip(LESSONS) {
        let lesson = catalog
            .create_lesson(
                instructor.id,
                LessonDraft::new(course.id(), *title, *content, order),
            )
            .await?;
        for (question, options, answer) in *quizzes {
            catalog
                .create_quiz(
                    instructor.id,
                    QuizDraft {
                        lesson_id: lesson.id,
                        question: (*question).to_owned(),
                        options: options.iter().map(|o| (*o).to_owned()).collect(),
                        answer: (*answer).to_owned(),
                    },
                )
                .await?;
        }
    }

    tracing::info!(course = %course.id(), "demo course seeded");
    Ok(SeedReport {
        instructor,
        course_id: course.id(),
        created: true,
    })
}
