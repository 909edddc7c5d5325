// Core board module - records, the hydration engine and the board service.

pub mod board_models;
pub mod board_service;
pub mod hydration;

pub use board_models::{BoardSettings, CommentRecord, PostRecord, ReactionRecord};
pub use board_service::{BoardError, BoardService, BoardStore};
