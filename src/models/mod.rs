//! # Data Layer
//!
//! Records read and written by the assignment engine. Persistence is provided by
//! a [`crate::store`] implementation; these types carry no I/O of their own.

pub mod answer;
pub mod modality;
pub mod project;
pub mod question;
pub mod task;
pub mod training;
pub mod worker;

pub use answer::{handle_time_seconds, Answer, NewAnswer};
pub use modality::{ColumnConfig, ColumnInputType, ColumnKind, ModalityConfig};
pub use project::{Project, ProjectAssignment};
pub use question::{Question, ReplicationState};
pub use task::{Task, TaskCompletion};
pub use training::{gates_passed, TrainingCompletion, TrainingGateResult, TrainingModule};
pub use worker::{TerminationRecord, Worker};
