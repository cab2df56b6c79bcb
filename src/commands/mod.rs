/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`   -- `login`, `manual`, `status`, `set` and `url`
- `prompt` -- line input for the interactive handlers
*/

pub mod auth;
pub mod prompt;

pub use prompt::{LinePrompt, ReadlinePrompt};
