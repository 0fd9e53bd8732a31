pub mod attempt_service;
pub mod catalog_service;
pub mod notification_service;
pub mod scoring_service;
pub mod timer_service;
