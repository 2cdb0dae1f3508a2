//! Neutral results for best-effort network paths.
//!
//! Rule lists, rule descriptors and similar lookups never fail their caller.
//! Instead of swallowing errors, they return a `Degradable` so the degraded
//! path stays visible in the signature.

use std::fmt;

/// A value that was either produced or replaced by a neutral fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Degradable<T> {
    /// The lookup succeeded.
    Ready(T),
    /// The lookup failed; the caller should use its neutral value.
    Degraded {
        /// Human-readable cause, for logging only.
        reason: String,
    },
}

impl<T> Degradable<T> {
    /// Build a degraded marker from any displayable cause.
    pub fn degraded(reason: impl fmt::Display) -> Self {
        Degradable::Degraded {
            reason: reason.to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Degradable::Ready(_))
    }

    pub fn is_degraded(&self) -> bool {
        !self.is_ready()
    }

    /// Borrow the value if the lookup succeeded.
    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Degradable::Ready(v) => Some(v),
            Degradable::Degraded { .. } => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Degradable::Ready(v) => Some(v),
            Degradable::Degraded { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Degradable<U> {
        match self {
            Degradable::Ready(v) => Degradable::Ready(f(v)),
            Degradable::Degraded { reason } => Degradable::Degraded { reason },
        }
    }

    /// Chain another best-effort step that can itself degrade.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Degradable<U>) -> Degradable<U> {
        match self {
            Degradable::Ready(v) => f(v),
            Degradable::Degraded { reason } => Degradable::Degraded { reason },
        }
    }

    /// Collapse to the value, or the neutral default on degradation.
    pub fn unwrap_or_neutral(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Degradable<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Degradable::Ready(v),
            Err(e) => Degradable::degraded(e),
        }
    }
}
