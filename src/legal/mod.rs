//! Deadline workflows: calendar math, reminder rendering, and the batch jobs
//! that dispatch reminders, reconcile Asana tasks, and seed the catalog.

pub mod calendar;
pub mod docgen;
pub mod reminders;
pub mod seed;
pub mod sync;
