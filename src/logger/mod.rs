//! Structured activity logging: JSONL sink behind a non-blocking channel.

pub mod activity;
pub mod jsonl;
