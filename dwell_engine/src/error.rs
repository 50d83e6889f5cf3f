// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the engine.
//!
//! None of these are fatal to the host. The engine logs them and degrades to
//! "no candidate found".

use thiserror::Error;

use crate::collector::ElementId;

/// A selector string could not be parsed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    /// The selector is empty or only whitespace.
    #[error("empty selector")]
    Empty,
    /// A character that cannot start or continue a simple selector.
    #[error("unexpected '{ch}' at offset {offset} in selector `{selector}`")]
    Unexpected {
        /// The full selector text.
        selector: String,
        /// Byte offset of the offending character.
        offset: usize,
        /// The offending character.
        ch: char,
    },
    /// A `.`, `#` or `[` with no name after it.
    #[error("missing name at offset {offset} in selector `{selector}`")]
    MissingName {
        /// The full selector text.
        selector: String,
        /// Byte offset where a name was expected.
        offset: usize,
    },
    /// An attribute selector without its closing `]` or closing quote.
    #[error("unterminated attribute selector in `{0}`")]
    Unterminated(String),
}

/// A configuration is unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A dwell or rebuild duration that must be positive is zero.
    #[error("`{0}` must be greater than zero")]
    ZeroDuration(&'static str),
    /// The dwell range is not a positive finite size.
    #[error("invalid dwell range {width}x{height}")]
    InvalidRange {
        /// Configured width.
        width: f64,
        /// Configured height.
        height: f64,
    },
    /// The quadtree capacity is zero.
    #[error("quadtree capacity must be at least 1")]
    ZeroCapacity,
    /// One of the selector lists contains a malformed selector.
    #[error("invalid selector: {0}")]
    Selector(#[from] SelectorError),
    /// The configuration JSON could not be decoded.
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A message could not be decoded or encoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound JSON did not match any known message.
    #[error("undecodable message: {0}")]
    Decode(#[source] serde_json::Error),
    /// An outbound message failed to serialize.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A previously indexed element can no longer be resolved to a live node.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The id was never minted, or its node was pruned on an earlier pass.
    #[error("unknown element {0}")]
    Unknown(ElementId),
    /// The node is gone and nothing is at its last known position.
    #[error("element {0} is detached and nothing is at its last known position")]
    Detached(ElementId),
}
