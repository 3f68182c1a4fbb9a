//! Invocation events
//!
//! Parses the event an invocation was triggered with, resolves the cycle
//! state from it, and builds the payload for the next invocation.

use std::fmt::Debug;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Minutes a single cycle may run when neither the event nor the options say
pub const DEFAULT_CYCLE_MINUTES: f64 = 12.0;

/// Re-invocations allowed when neither the event nor the options say
pub const DEFAULT_CYCLE_ALLOWED: u32 = 3;

/// Bounds every offset type must meet.
///
/// Equality drives stall detection, serde drives the event payload, and
/// `Default` is the offset used when an event carries none.
pub trait Offset:
    Clone + PartialEq + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Offset for T where
    T: Clone + PartialEq + Debug + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// Fields the handler reads from an incoming event.
///
/// Anything else in the event (such as extra payload keys) is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEvent<C> {
    /// Where the previous cycle left off
    #[serde(default)]
    pub offset: Option<C>,
    /// Minutes allowed for this cycle
    #[serde(default)]
    pub cycle_minutes: Option<f64>,
    /// Remaining re-invocation budget
    #[serde(default)]
    pub cycle_allowed: Option<u32>,
}

impl<C> Default for CycleEvent<C> {
    fn default() -> Self {
        Self {
            offset: None,
            cycle_minutes: None,
            cycle_allowed: None,
        }
    }
}

impl<C: Offset> CycleEvent<C> {
    /// Parse a raw invocation event.
    ///
    /// A `null` event is an empty fresh trigger. Anything that is not a JSON
    /// object is rejected.
    pub fn from_value(event: Value) -> Result<Self> {
        match event {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => {
                serde_json::from_value(event).context("Failed to parse invocation event")
            }
            other => bail!("Invocation event must be a JSON object, got: {other}"),
        }
    }
}

/// Cycle state resolved once per invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CycleState<C> {
    /// Offset handed to the runner
    pub begin_offset: C,
    /// Remaining budget, including this invocation
    pub cycle_allowed: u32,
    /// Minutes this cycle may run
    pub cycle_minutes: f64,
}

impl<C: Offset> CycleState<C> {
    /// Resolve state from an event, falling back to configured values and
    /// then to the defaults.
    ///
    /// Zero and non-finite numbers count as absent at every level.
    #[must_use]
    pub fn resolve(
        event: CycleEvent<C>,
        configured_minutes: Option<f64>,
        configured_allowed: Option<u32>,
    ) -> Self {
        let cycle_minutes = usable_minutes(event.cycle_minutes)
            .or_else(|| usable_minutes(configured_minutes))
            .unwrap_or(DEFAULT_CYCLE_MINUTES);
        let cycle_allowed = usable_allowed(event.cycle_allowed)
            .or_else(|| usable_allowed(configured_allowed))
            .unwrap_or(DEFAULT_CYCLE_ALLOWED);

        Self {
            begin_offset: event.offset.unwrap_or_default(),
            cycle_allowed,
            cycle_minutes,
        }
    }
}

fn usable_minutes(value: Option<f64>) -> Option<f64> {
    value.filter(|m| m.is_finite() && *m != 0.0)
}

fn usable_allowed(value: Option<u32>) -> Option<u32> {
    value.filter(|n| *n != 0)
}

/// Event for the follow-up invocation
#[derive(Debug, Clone, PartialEq)]
pub struct NextInvocation<C> {
    /// Static caller data merged into every payload
    pub extra_payload: Map<String, Value>,
    /// Offset the next cycle starts from
    pub offset: C,
    /// Budget left for the next cycle
    pub cycle_allowed: u32,
    /// Minutes the next cycle may run
    pub cycle_minutes: f64,
}

impl<C: Offset> NextInvocation<C> {
    /// Serialize into the event body for the next invocation.
    ///
    /// Extra payload keys go in first; `offset`, `cycleAllowed` and
    /// `cycleMinutes` always win on collision.
    pub fn to_payload(&self) -> Result<Value> {
        let mut body = self.extra_payload.clone();
        let offset =
            serde_json::to_value(&self.offset).context("Failed to serialize next offset")?;
        body.insert("offset".to_string(), offset);
        body.insert("cycleAllowed".to_string(), Value::from(self.cycle_allowed));
        body.insert("cycleMinutes".to_string(), Value::from(self.cycle_minutes));
        Ok(Value::Object(body))
    }
}
