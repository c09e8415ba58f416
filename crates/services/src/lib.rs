#![forbid(unsafe_code)]

pub mod activity_service;
pub mod app_services;
pub mod error;
pub mod progress_tracker;
pub mod session_service;
pub mod sync_service;

pub use yachay_core::Clock;

pub use activity_service::{
    ActivityService, NarrativeCompletion, QuizCompletion, VerbalCompletion,
};
pub use app_services::AppServices;
pub use error::{AppServicesError, SyncError};
pub use progress_tracker::ProgressTracker;
pub use session_service::SessionService;
pub use sync_service::SyncService;
