use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use course_core::model::{
    Course, CourseDraft, CourseId, Enrollment, EnrollmentId, Lesson, LessonId, Profile, Quiz,
    QuizId, QuizResult, QuizResultId, User, UserId, sort_lessons,
};

use crate::repository::{
    CourseRepository, EnrollmentRepository, LessonRepository, NewCourseRecord,
    NewEnrollmentRecord, NewLessonRecord, NewQuizRecord, NewQuizResultRecord, NewUserRecord,
    QuizRepository, QuizResultRepository, StorageError, UserRepository,
};

#[derive(Default)]
struct State {
    next_id: u64,
    users: BTreeMap<UserId, User>,
    profiles: BTreeMap<UserId, Profile>,
    courses: BTreeMap<CourseId, Course>,
    lessons: BTreeMap<LessonId, Lesson>,
    quizzes: BTreeMap<QuizId, Quiz>,
    results: BTreeMap<QuizResultId, QuizResult>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
}

impl State {
    // One sequence for every table keeps ids unique across entity kinds in tests.
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn lesson_course(&self, lesson_id: LessonId) -> Option<CourseId> {
        self.lessons.get(&lesson_id).map(|l| l.course_id)
    }

    fn quiz_course(&self, quiz_id: QuizId) -> Option<CourseId> {
        self.quizzes
            .get(&quiz_id)
            .and_then(|q| self.lesson_course(q.lesson_id))
    }

    fn remove_quiz_cascade(&mut self, quiz_id: QuizId) {
        self.quizzes.remove(&quiz_id);
        self.results.retain(|_, r| r.quiz_id != quiz_id);
    }

    fn remove_lesson_cascade(&mut self, lesson_id: LessonId) {
        self.lessons.remove(&lesson_id);
        let quiz_ids: Vec<QuizId> = self
            .quizzes
            .values()
            .filter(|q| q.lesson_id == lesson_id)
            .map(|q| q.id)
            .collect();
        for quiz_id in quiz_ids {
            self.remove_quiz_cascade(quiz_id);
        }
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Mirrors the SQLite schema constraints: unique `(user, quiz)` results,
/// unique `(user, course)` enrollments, and cascading deletes.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn insert_course(&self, course: NewCourseRecord) -> Result<CourseId, StorageError> {
        let mut guard = self.lock()?;
        let id = CourseId::new(guard.allocate());
        let draft = CourseDraft {
            title: course.title,
            description: course.description,
            image: course.image,
        };
        let stored = Course::new(id, course.owner_id, draft, course.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.courses.insert(id, stored);
        Ok(id)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(self.lock()?.courses.get(&id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StorageError> {
        Ok(self.lock()?.courses.values().cloned().collect())
    }

    async fn courses_by_owner(&self, owner: UserId) -> Result<Vec<Course>, StorageError> {
        Ok(self
            .lock()?
            .courses
            .values()
            .filter(|c| c.owner_id() == owner)
            .cloned()
            .collect())
    }

    async fn update_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let slot = guard
            .courses
            .get_mut(&course.id())
            .ok_or(StorageError::NotFound)?;
        *slot = course.clone();
        Ok(())
    }

    async fn delete_course(&self, id: CourseId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        guard.courses.remove(&id).ok_or(StorageError::NotFound)?;
        let lesson_ids: Vec<LessonId> = guard
            .lessons
            .values()
            .filter(|l| l.course_id == id)
            .map(|l| l.id)
            .collect();
        for lesson_id in lesson_ids {
            guard.remove_lesson_cascade(lesson_id);
        }
        guard.enrollments.retain(|_, e| e.course_id != id);
        Ok(())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.courses.contains_key(&lesson.course_id) {
            return Err(StorageError::MissingReference);
        }
        let id = LessonId::new(guard.allocate());
        guard.lessons.insert(
            id,
            Lesson {
                id,
                course_id: lesson.course_id,
                title: lesson.title,
                content: lesson.content,
                order: lesson.order,
                image: lesson.image,
                created_at: lesson.created_at,
            },
        );
        Ok(id)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(self.lock()?.lessons.get(&id).cloned())
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let mut lessons: Vec<Lesson> = self
            .lock()?
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        sort_lessons(&mut lessons);
        Ok(lessons)
    }

    async fn update_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.courses.contains_key(&lesson.course_id) {
            return Err(StorageError::MissingReference);
        }
        let slot = guard
            .lessons
            .get_mut(&lesson.id)
            .ok_or(StorageError::NotFound)?;
        *slot = lesson.clone();
        Ok(())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.lessons.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        guard.remove_lesson_cascade(id);
        Ok(())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(&self, quiz: NewQuizRecord) -> Result<QuizId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.lessons.contains_key(&quiz.lesson_id) {
            return Err(StorageError::MissingReference);
        }
        let id = QuizId::new(guard.allocate());
        guard.quizzes.insert(
            id,
            Quiz {
                id,
                lesson_id: quiz.lesson_id,
                question: quiz.question,
                options: quiz.options,
                answer: quiz.answer,
                created_at: quiz.created_at,
            },
        );
        Ok(id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self) -> Result<Vec<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.values().cloned().collect())
    }

    async fn quizzes_for_lesson(&self, lesson_id: LessonId) -> Result<Vec<Quiz>, StorageError> {
        Ok(self
            .lock()?
            .quizzes
            .values()
            .filter(|q| q.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&id) {
            return Err(StorageError::NotFound);
        }
        guard.remove_quiz_cascade(id);
        Ok(())
    }

    async fn count_quizzes_in_course(&self, course_id: CourseId) -> Result<u64, StorageError> {
        let n = self.quizzes_in_course(course_id).await?.len();
        u64::try_from(n).map_err(|_| StorageError::Serialization("quiz count overflow".into()))
    }

    async fn quizzes_in_course(&self, course_id: CourseId) -> Result<Vec<QuizId>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .quizzes
            .values()
            .filter(|q| guard.lesson_course(q.lesson_id) == Some(course_id))
            .map(|q| q.id)
            .collect())
    }

    async fn course_of_quiz(&self, quiz_id: QuizId) -> Result<Option<CourseId>, StorageError> {
        Ok(self.lock()?.quiz_course(quiz_id))
    }
}

#[async_trait]
impl QuizResultRepository for InMemoryRepository {
    async fn result_exists(&self, user_id: UserId, quiz_id: QuizId) -> Result<bool, StorageError> {
        Ok(self
            .lock()?
            .results
            .values()
            .any(|r| r.user_id == user_id && r.quiz_id == quiz_id))
    }

    async fn insert_result(&self, result: NewQuizResultRecord) -> Result<QuizResultId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.quizzes.contains_key(&result.quiz_id) {
            return Err(StorageError::MissingReference);
        }
        let duplicate = guard
            .results
            .values()
            .any(|r| r.user_id == result.user_id && r.quiz_id == result.quiz_id);
        if duplicate {
            return Err(StorageError::Duplicate);
        }
        let id = QuizResultId::new(guard.allocate());
        guard.results.insert(
            id,
            QuizResult {
                id,
                user_id: result.user_id,
                quiz_id: result.quiz_id,
                score: result.score,
                completed_at: result.completed_at,
            },
        );
        Ok(id)
    }

    async fn count_distinct_completed(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<u64, StorageError> {
        let guard = self.lock()?;
        let distinct: BTreeSet<QuizId> = guard
            .results
            .values()
            .filter(|r| r.user_id == user_id)
            .filter(|r| guard.quiz_course(r.quiz_id) == Some(course_id))
            .map(|r| r.quiz_id)
            .collect();
        u64::try_from(distinct.len())
            .map_err(|_| StorageError::Serialization("completion count overflow".into()))
    }

    async fn get_result(&self, id: QuizResultId) -> Result<Option<QuizResult>, StorageError> {
        Ok(self.lock()?.results.get(&id).cloned())
    }

    async fn results_for_user(&self, user_id: UserId) -> Result<Vec<QuizResult>, StorageError> {
        Ok(self
            .lock()?
            .results
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_result(&self, id: QuizResultId) -> Result<(), StorageError> {
        self.lock()?
            .results
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryRepository {
    async fn insert_enrollment(
        &self,
        enrollment: NewEnrollmentRecord,
    ) -> Result<EnrollmentId, StorageError> {
        let mut guard = self.lock()?;
        if !guard.courses.contains_key(&enrollment.course_id) {
            return Err(StorageError::MissingReference);
        }
        let duplicate = guard
            .enrollments
            .values()
            .any(|e| e.user_id == enrollment.user_id && e.course_id == enrollment.course_id);
        if duplicate {
            return Err(StorageError::Duplicate);
        }
        let id = EnrollmentId::new(guard.allocate());
        guard.enrollments.insert(
            id,
            Enrollment {
                id,
                user_id: enrollment.user_id,
                course_id: enrollment.course_id,
                progress: 0.0,
                enrolled_at: enrollment.enrolled_at,
            },
        );
        Ok(id)
    }

    async fn find_enrollment(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<Option<Enrollment>, StorageError> {
        Ok(self
            .lock()?
            .enrollments
            .values()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned())
    }

    async fn get_enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, StorageError> {
        Ok(self.lock()?.enrollments.get(&id).cloned())
    }

    async fn enrollments_for_user(&self, user_id: UserId) -> Result<Vec<Enrollment>, StorageError> {
        Ok(self
            .lock()?
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
        progress: f64,
    ) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        let enrollment = guard
            .enrollments
            .values_mut()
            .find(|e| e.user_id == user_id && e.course_id == course_id)
            .ok_or(StorageError::NotFound)?;
        enrollment.progress = progress;
        Ok(())
    }

    async fn delete_enrollment(&self, id: EnrollmentId) -> Result<(), StorageError> {
        self.lock()?
            .enrollments
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn find_user_by_subject(&self, subject: &str) -> Result<Option<User>, StorageError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.subject == subject)
            .cloned())
    }

    async fn insert_user(&self, user: NewUserRecord) -> Result<User, StorageError> {
        let mut guard = self.lock()?;
        let taken = guard
            .users
            .values()
            .any(|u| u.subject == user.subject || u.email == user.email);
        if taken {
            return Err(StorageError::Duplicate);
        }
        let id = UserId::new(guard.allocate());
        let stored = User {
            id,
            subject: user.subject,
            email: user.email,
            created_at: user.created_at,
        };
        guard.users.insert(id, stored.clone());
        guard.profiles.insert(
            id,
            Profile {
                user_id: id,
                name: user.name,
                image: user.image,
            },
        );
        Ok(stored)
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<Profile>, StorageError> {
        Ok(self.lock()?.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self.lock()?;
        if !guard.users.contains_key(&profile.user_id) {
            return Err(StorageError::NotFound);
        }
        guard.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }
}
