//! # Topic Filters
//!
//! MQTT topic-name and topic-filter rules.
//!
//! ## Wildcard Semantics
//!
//! - `+` (single-level): matches exactly one topic level
//! - `#` (multi-level): matches zero or more remaining levels, only as the
//!   last level of the filter
//! - A wildcard that is not a whole level, or a `#` before the last level, is
//!   literal for matching and rejected by [`validate_filter`]
//! - Topics whose first level starts with `$` are never matched by a leading
//!   wildcard

use crate::transport::TransportError;
use crate::MAX_TOPIC_LENGTH;

/// Whether `topic` (a concrete topic name) matches `filter`.
pub fn topic_matches(topic: &str, filter: &str) -> bool {
    if topic.starts_with('$') && (filter.starts_with('+') || filter.starts_with('#')) {
        return false;
    }

    let mut topic_levels = topic.split('/');
    let mut filter_levels = filter.split('/').peekable();

    loop {
        let topic_level = topic_levels.next();
        let Some(filter_level) = filter_levels.next() else {
            // Filter exhausted, topic must be too
            return topic_level.is_none();
        };

        if filter_level == "#" && filter_levels.peek().is_none() {
            return true;
        }

        let Some(topic_level) = topic_level else {
            return false;
        };

        if filter_level == "+" {
            continue;
        }

        if topic_level != filter_level {
            return false;
        }
    }
}

/// Validate a topic name used for publishing.
pub fn validate_topic_name(topic: &str) -> Result<(), TransportError> {
    let invalid = |reason| TransportError::InvalidTopic {
        topic: topic.to_string(),
        reason,
    };

    if topic.is_empty() {
        return Err(invalid("empty"));
    }
    if topic.len() > MAX_TOPIC_LENGTH {
        return Err(invalid("too long"));
    }
    if topic.contains(['+', '#']) {
        return Err(invalid("wildcards are not allowed in topic names"));
    }
    if topic.contains('\0') {
        return Err(invalid("contains NUL"));
    }
    Ok(())
}

/// Validate a subscription filter.
pub fn validate_filter(filter: &str) -> Result<(), TransportError> {
    let invalid = |reason| TransportError::InvalidFilter {
        filter: filter.to_string(),
        reason,
    };

    if filter.is_empty() {
        return Err(invalid("empty"));
    }
    if filter.len() > MAX_TOPIC_LENGTH {
        return Err(invalid("too long"));
    }
    if filter.contains('\0') {
        return Err(invalid("contains NUL"));
    }

    let mut levels = filter.split('/').peekable();
    while let Some(level) = levels.next() {
        if level.contains('#') && (level != "#" || levels.peek().is_some()) {
            return Err(invalid("'#' must be the whole last level"));
        }
        if level.contains('+') && level != "+" {
            return Err(invalid("'+' must be a whole level"));
        }
    }
    Ok(())
}
