//! # Submission Events
//!
//! Typed lifecycle events emitted by the answer pipeline. Subscribers receive
//! them over a broadcast channel; publishing never fails because nobody is
//! listening.

pub mod publisher;

pub use publisher::{PublishedEvent, SubmissionEvent, SubmissionEventPublisher};
