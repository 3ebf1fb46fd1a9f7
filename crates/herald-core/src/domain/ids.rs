//! Domain identifiers (strongly-typed IDs)
//!
//! - wire 上はすべて UUID
//! - phantom marker で種類ごとに別の型にする。`TaskId` の位置に `ContextId` は渡せない
//! - [`IdGenerator`](crate::ports::IdGenerator) が ULID から生成するので時刻順に並ぶ

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// Marker trait for each id kind.
pub trait IdMarker: Send + Sync + 'static {
    /// Human-readable kind, used in parse errors and log fields.
    fn kind() -> &'static str;
}

/// Generic UUID-backed id.
///
/// `T` is a zero-sized marker; it costs nothing at runtime.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: PhantomData,
        }
    }

    /// Random (v4) id. Prefer an `IdGenerator` in application code.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.uuid
    }
}

impl<T: IdMarker> From<Uuid> for Id<T> {
    fn from(uuid: Uuid) -> Self {
        Self::from_uuid(uuid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.uuid.fmt(f)
    }
}

/// Returned when a string is not a valid id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {input:?}")]
pub struct ParseIdError {
    pub kind: &'static str,
    pub input: String,
}

impl<T: IdMarker> FromStr for Id<T> {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self::from_uuid)
            .map_err(|_| ParseIdError {
                kind: T::kind(),
                input: s.to_string(),
            })
    }
}

/// Task marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Task {}

impl IdMarker for Task {
    fn kind() -> &'static str {
        "task"
    }
}

/// Conversation context marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {}

impl IdMarker for Context {
    fn kind() -> &'static str {
        "context"
    }
}

/// Identifier of a Task (one unit of asynchronous work).
pub type TaskId = Id<Task>;

/// Identifier of the conversation a task belongs to.
pub type ContextId = Id<Context>;
