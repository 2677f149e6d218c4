#![allow(dead_code)]

mod log_capture;
mod mock_clock;
mod mock_publisher;
mod mock_repository;

pub use log_capture::LogCapture;
pub use mock_clock::ManualClock;
pub use mock_publisher::RecordingPublisher;
pub use mock_repository::{FailingBackupRepository, RecordingTaskRepository};
