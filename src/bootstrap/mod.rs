//! Tracker application bootstrapping.
//!
//! This module includes all the functions to build the application, its dependencies, and run the jobs.
//!
//! Jobs are tasks executed concurrently. Every configured UDP tracker runs as
//! an independent job, next to the job that cleans up the swarms.
pub mod app;
pub mod jobs;
pub mod logging;
