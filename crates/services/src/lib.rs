#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod completion_service;
pub mod config;
pub mod enrollment_service;
pub mod error;
pub mod media;
pub mod profile_service;
pub mod progress;

pub use course_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, CourseDetail, LessonDetail};
pub use completion_service::CompletionLedger;
pub use config::{AppConfig, ConfigError, ConfigOverrides};
pub use enrollment_service::{EnrolledCourse, EnrollmentManager};
pub use error::{AppServicesError, ErrorKind, ServiceError};
pub use media::MediaUrls;
pub use profile_service::{CourseCard, EnrolledCourseCard, ProfileOverview, ProfileService};
pub use progress::ProgressCalculator;

#[cfg(test)]
mod test_support;
