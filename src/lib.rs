//! Field Notes library.
//!
//! Publishing backend for a travel-essay platform: authors draft essays and
//! submit them for review, admins moderate with feedback notes, and approved
//! essays are served with likes and threaded comments over a JSON API.

#![allow(clippy::needless_raw_string_hashes)]

pub mod auth;
pub mod comments;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod moderation;
pub mod site;
pub mod web;
