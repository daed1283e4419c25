//! Safety Layer (C3): a pure function from a policy's proposed replica count
//! to a safe, rate-limited, cooldown-respecting scaling decision.

use chrono::{DateTime, Utc};

use crate::crd::ScalerBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDirection {
    Up,
    Down,
}

impl ScaleDirection {
    fn as_str(self) -> &'static str {
        match self {
            ScaleDirection::Up => "up",
            ScaleDirection::Down => "down",
        }
    }
}

/// The Safety Layer's verdict for one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleDecision {
    pub should_act: bool,
    pub target_replicas: i32,
    pub reason: String,
    /// The direction the policy asked to move in (Rule 2), independent of
    /// whether the rate-limit/final-clamp steps then capped `target_replicas`
    /// back down to `current`. `None` only for the Rule 1 no-op short-circuit,
    /// where `policy_desired == current` and there is no direction to report.
    pub direction: Option<ScaleDirection>,
}

/// Apply the six ordered safety rules to a policy's proposed replica count.
///
/// No I/O; deterministic given `(current, policy_desired, min, max, behavior,
/// last_scale_at, now)`.
pub fn decide(
    current: i32,
    policy_desired: i32,
    min: i32,
    max: i32,
    behavior: &ScalerBehavior,
    last_scale_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ScaleDecision {
    // Rule 1: no-op short-circuit.
    if policy_desired == current {
        return ScaleDecision {
            should_act: false,
            target_replicas: current,
            reason: "already at desired".to_string(),
            direction: None,
        };
    }

    // Rule 2: direction.
    let direction = if policy_desired > current {
        ScaleDirection::Up
    } else {
        ScaleDirection::Down
    };

    let (cooldown_seconds, max_change) = match direction {
        ScaleDirection::Up => (behavior.scale_up.cooldown_seconds, behavior.scale_up.max_increment),
        ScaleDirection::Down => (behavior.scale_down.cooldown_seconds, behavior.scale_down.max_decrement),
    };

    // Rule 3: cooldown check.
    if let Some(last) = last_scale_at {
        let elapsed = (now - last).num_seconds().max(0) as u64;
        if elapsed < cooldown_seconds {
            return ScaleDecision {
                should_act: false,
                target_replicas: current,
                reason: format!("in {} cooldown", direction.as_str()),
                direction: Some(direction),
            };
        }
    }

    // Rule 4: rate limit.
    let delta = (policy_desired - current).unsigned_abs();
    let capped_delta = delta.min(max_change) as i32;
    let capped = match direction {
        ScaleDirection::Up => current + capped_delta,
        ScaleDirection::Down => current - capped_delta,
    };

    // Rule 5: final clamp.
    let target = capped.max(min).min(max);

    // Rule 6: result.
    ScaleDecision {
        should_act: true,
        target_replicas: target,
        direction: Some(direction),
        reason: format!("scaling {} from {current} to {target}", direction.as_str()),
    }
}
