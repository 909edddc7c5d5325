// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "board/board_store.rs"]
pub mod board;
