//! Test helpers module
//!
//! This module provides utilities and helpers for testing the StudyBuddy application.
//! It includes a mock Gemini server, scripted generators and database helpers.

#![allow(dead_code)]

pub mod gemini_mock;
pub mod database_helper;
pub mod test_data;

pub use gemini_mock::*;
pub use database_helper::*;
pub use test_data::*;
