//! Scripted metric source for testing
//!
//! Attributes return a fixed value unless a response sequence has been queued
//! for them; queued responses are consumed first, in order.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use qascreen_core::MetricField;

use crate::error::{SourceError, SourceResult};
use crate::source::{MetricPlan, MetricSource};

/// One scripted reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MockResponse {
    Value(f64),
    NotFound,
    ConnectionLost,
}

type Key = (String, String);

#[derive(Default)]
struct State {
    values: HashMap<Key, f64>,
    queued: HashMap<Key, VecDeque<MockResponse>>,
    calls: usize,
}

/// In-memory [`MetricSource`].
#[derive(Default)]
pub struct MockMetricSource {
    state: Mutex<State>,
}

impl MockMetricSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source answering every query of `plan` so that each field reads `values`.
    ///
    /// For summed fields the whole value goes to the first query and the rest read zero.
    pub fn with_field_values(plan: &MetricPlan, values: [f64; 4]) -> Self {
        let source = Self::new();
        for field in MetricField::ALL {
            for (position, query) in plan.queries(field).iter().enumerate() {
                let value = if position == 0 { values[field.index()] } else { 0.0 };
                source.set(&query.object_name, query.attribute, value);
            }
        }
        source
    }

    /// Sets the steady-state value of an attribute.
    pub fn set(&self, object_name: &str, attribute: &str, value: f64) {
        self.state
            .lock()
            .values
            .insert((object_name.to_string(), attribute.to_string()), value);
    }

    /// Queues replies that are returned before the steady-state value.
    pub fn queue(&self, object_name: &str, attribute: &str, responses: Vec<MockResponse>) {
        self.state
            .lock()
            .queued
            .entry((object_name.to_string(), attribute.to_string()))
            .or_default()
            .extend(responses);
    }

    /// Number of `get_attribute` calls served.
    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }
}

#[async_trait]
impl MetricSource for MockMetricSource {
    async fn get_attribute(&self, object_name: &str, attribute: &str) -> SourceResult<f64> {
        let key = (object_name.to_string(), attribute.to_string());
        let mut state = self.state.lock();
        state.calls += 1;

        let scripted = state.queued.get_mut(&key).and_then(VecDeque::pop_front);
        let response = match scripted {
            Some(response) => response,
            None => match state.values.get(&key) {
                Some(value) => MockResponse::Value(*value),
                None => MockResponse::NotFound,
            },
        };

        match response {
            MockResponse::Value(value) => Ok(value),
            MockResponse::NotFound => Err(SourceError::not_found(object_name, attribute)),
            MockResponse::ConnectionLost => {
                Err(SourceError::Connection("connection reset by peer".to_string()))
            }
        }
    }
}
