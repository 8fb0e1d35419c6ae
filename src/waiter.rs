//! Acceptor-driven polling with bounded jittered backoff.
//!
//! `wait_until` drives a `command` closure to a terminal state: each
//! invocation's `Result<O, SdkError>` is tested against the waiter's
//! acceptors in declaration order; the first match decides `success`,
//! `retry`, or `failure`. Unmatched results default to `failure` on error,
//! `retry` otherwise.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::SdkError;

#[derive(Debug, Error)]
pub enum WaiterError {
    #[error("waiter failed: {0}")]
    WaiterFailed(String),

    #[error("waiter timed out before reaching a terminal state")]
    WaiterTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaiterState {
    Success,
    Retry,
    Failure,
}

/// One acceptor's test. `JmesPath`/`JmesAll`/`JmesAny` only ever match an
/// `Ok` output; `ErrorCode`/`ErrorStatus` only ever match an `Err`.
#[derive(Debug, Clone)]
pub enum Matcher {
    Success,
    ErrorCode(String),
    ErrorStatus(u16),
    JmesPath { expr: String, expected: String },
    JmesAll { expr: String, expected: String },
    JmesAny { expr: String, expected: String },
}

impl Matcher {
    fn matches_ok<O: Serialize>(&self, output: &O) -> bool {
        match self {
            Matcher::Success => true,
            Matcher::JmesPath { expr, expected } => jmes_string_eq(expr, output, expected),
            Matcher::JmesAll { expr, expected } => jmes_array_all(expr, output, expected),
            Matcher::JmesAny { expr, expected } => jmes_array_any(expr, output, expected),
            Matcher::ErrorCode(_) | Matcher::ErrorStatus(_) => false,
        }
    }

    fn matches_err(&self, error: &SdkError) -> bool {
        match self {
            Matcher::ErrorCode(expected) => error.error_code() == Some(expected.as_str()),
            Matcher::ErrorStatus(status) => error.status_code() == Some(*status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Acceptor {
    pub state: WaiterState,
    pub matcher: Matcher,
}

#[derive(Debug, Clone)]
pub struct Waiter {
    pub acceptors: Vec<Acceptor>,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Waiter {
    pub fn new(acceptors: Vec<Acceptor>, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            acceptors,
            min_delay,
            max_delay,
        }
    }

    fn classify<O: Serialize>(&self, result: &Result<O, SdkError>) -> WaiterState {
        for acceptor in &self.acceptors {
            let matched = match result {
                Ok(output) => acceptor.matcher.matches_ok(output),
                Err(error) => acceptor.matcher.matches_err(error),
            };
            if matched {
                return acceptor.state;
            }
        }
        match result {
            Ok(_) => WaiterState::Retry,
            Err(_) => WaiterState::Failure,
        }
    }
}

/// Drive `command` until one of the waiter's acceptors reports `success` or
/// `failure`, the deadline elapses, or `cancellation` fires. Cancellation
/// during either the in-flight `command` call or a retry sleep returns
/// `SdkError::Cancelled` immediately, with no further polling attempted.
pub async fn wait_until<F, Fut, O>(
    command: F,
    waiter: &Waiter,
    max_wait_time: Duration,
    cancellation: &CancellationToken,
) -> Result<O, SdkError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<O, SdkError>>,
    O: Serialize,
{
    let deadline = Instant::now() + max_wait_time;
    let mut attempt: u32 = 1;
    loop {
        let result = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
            r = command() => r,
        };
        match waiter.classify(&result) {
            WaiterState::Success => return result,
            WaiterState::Failure => {
                return match result {
                    Err(error) => Err(error),
                    Ok(_) => Err(SdkError::Waiter(WaiterError::WaiterFailed(
                        "waiter acceptor reported a failure state".to_string(),
                    ))),
                };
            }
            WaiterState::Retry => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let wait =
                    calculate_retry_wait_time(attempt, waiter.min_delay, waiter.max_delay, remaining)?;
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => return Err(SdkError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
                attempt += 1;
            }
        }
    }
}

/// The bounded jittered backoff formula of §4.7:
/// ```text
/// ceiling = log2(max/min) + 1
/// d = attempt > ceiling ? max : min * 2^(attempt-1)
/// wait = uniform(min, d); if remaining - wait < min: timeout
/// ```
pub fn calculate_retry_wait_time(
    attempt: u32,
    min_delay: Duration,
    max_delay: Duration,
    remaining: Duration,
) -> Result<Duration, WaiterError> {
    let min = min_delay.as_secs_f64().max(f64::EPSILON);
    let max = max_delay.as_secs_f64().max(min);
    let ceiling = (max / min).log2() + 1.0;
    let d = if attempt as f64 > ceiling {
        max
    } else {
        (min * 2f64.powi(attempt as i32 - 1)).min(max)
    };
    let wait_secs = if d > min {
        rand::thread_rng().gen_range(min..=d)
    } else {
        min
    };
    let wait = Duration::from_secs_f64(wait_secs);

    match remaining.checked_sub(wait) {
        Some(left) if left >= min_delay => Ok(wait),
        _ => Err(WaiterError::WaiterTimeout),
    }
}

fn jmes_search<O: Serialize>(expr: &str, output: &O) -> Option<jmespath::Variable> {
    let value = serde_json::to_value(output).ok()?;
    let expression = jmespath::compile(expr).ok()?;
    let result = expression.search(value).ok()?;
    Some((*result).clone())
}

fn variable_as_string(var: &jmespath::Variable) -> String {
    match var.as_string() {
        Some(s) => s.clone(),
        None => var.to_string(),
    }
}

fn jmes_string_eq<O: Serialize>(expr: &str, output: &O, expected: &str) -> bool {
    match jmes_search(expr, output) {
        Some(var) => variable_as_string(&var) == expected,
        None => false,
    }
}

fn jmes_array_all<O: Serialize>(expr: &str, output: &O, expected: &str) -> bool {
    match jmes_search(expr, output).and_then(|v| v.as_array().cloned()) {
        Some(items) if !items.is_empty() => items.iter().all(|item| variable_as_string(item) == expected),
        _ => false,
    }
}

fn jmes_array_any<O: Serialize>(expr: &str, output: &O, expected: &str) -> bool {
    match jmes_search(expr, output).and_then(|v| v.as_array().cloned()) {
        Some(items) => items.iter().any(|item| variable_as_string(item) == expected),
        None => false,
    }
}
