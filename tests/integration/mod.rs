//! Integration tests for archive-backed collections

mod cli_commands;
mod cli_parse;
mod evaluation_view;
mod store_integration;
mod support;
mod upload_formats;
