//! Hello-world walkthrough for the docstore client.
//!
//! Recreates a `twitter` collection, stores two tweets, reads one back,
//! searches by author and bumps a retweet counter with a script, printing
//! each outcome as it goes. The `hello-docstore` binary wires this up to
//! command-line flags, a settings file and the environment.

#![warn(missing_docs)]

mod cli;
mod error;
mod flow;
mod settings;
mod tweet;

pub use cli::{Cli, LogFormat};
pub use error::{DemoError, DemoResult};
pub use flow::{Report, retweet_script, run};
pub use settings::{DEFAULT_COLLECTION, FileSettings, Settings};
pub use tweet::{TWEET_SCHEMA, Tweet};
