//! Publishes a note to WordPress over XML-RPC or the REST API.
//!
//! A profile picks the protocol and authentication scheme;
//! [`api::get_wordpress_client`] turns it into a client and
//! [`publish::begin_publish`] drives one publish from prompt to result.

pub mod api;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod publish;
pub mod render;
