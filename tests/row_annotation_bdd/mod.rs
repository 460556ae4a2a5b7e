//! Support code for the row annotation behavioural tests.

pub mod state;

pub use state::AnnotationState;
