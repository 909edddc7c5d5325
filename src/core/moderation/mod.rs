// Core moderation module - lexicon, content filter and the moderation gate.

pub mod content_filter;
pub mod lexicon;
pub mod moderation_models;
pub mod moderation_service;

pub use content_filter::ContentFilter;
pub use moderation_models::Rejected;
pub use moderation_service::ModerationGate;
