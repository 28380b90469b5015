//! Enumerated configuration values shared by the dispatcher and its binary.
//!
//! Every option parses case-insensitively from `snake_case` text so the same
//! spelling works on the command line, in environment variables and in
//! configuration files.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// How the parameter binder treats request parameters no signature declares.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ExtraParameterPolicy {
    /// Strict binding: undeclared parameters fail the dispatch.
    #[default]
    Reject,
    /// Loose binding: undeclared parameters are dropped silently.
    Ignore,
}

/// How the loader chain treats two loaders yielding the same action name.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CollisionPolicy {
    /// Fail the registry build, naming both loaders.
    #[default]
    Reject,
    /// The loader registered later replaces the earlier definition.
    LastWins,
}

/// Errors encountered while parsing any option in this module from text.
pub type OptionParseError = strum::ParseError;
