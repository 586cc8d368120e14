//! Weight-vector tweening.
//!
//! The driver owns the current weight vector. A tween interpolates from the weights current
//! at its start to a target, sampled whenever the host scheduler calls [`Animator::tick`].
//! Time is passed in explicitly so the host decides what "now" means.

use std::time::{Duration, Instant};

use crate::animation::ease::Easing;
use crate::foundation::error::{MorphError, MorphResult};
use crate::foundation::math::lerp;

/// Driver state. `Complete` and `Cancelled` are reported through [`Tick`] and
/// [`Animator::animate`]; the machine itself always settles back to `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnimState {
    Idle,
    Running,
}

/// What one scheduler tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tick {
    /// No tween active; weights unchanged.
    Idle,
    /// Weights moved; `t` is the linear elapsed fraction in `[0, 1)`.
    Progress { t: f64 },
    /// The tween reached its end; weights equal the target exactly.
    Complete,
}

#[derive(Clone, Debug)]
struct Tween {
    start: Vec<f64>,
    target: Vec<f64>,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

impl Tween {
    fn fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn sample(&self, t: f64, out: &mut [f64]) {
        let e = self.easing.apply(t);
        for ((o, &a), &b) in out.iter_mut().zip(&self.start).zip(&self.target) {
            *o = lerp(a, b, e);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Animator {
    weights: Vec<f64>,
    tween: Option<Tween>,
}

impl Animator {
    pub fn new(weights: Vec<f64>) -> Self {
        Self {
            weights,
            tween: None,
        }
    }

    pub fn state(&self) -> AnimState {
        if self.tween.is_some() {
            AnimState::Running
        } else {
            AnimState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.tween.is_some()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn target(&self) -> Option<&[f64]> {
        self.tween.as_ref().map(|t| t.target.as_slice())
    }

    /// Apply `weights` immediately, cancelling any running tween.
    ///
    /// Returns `true` when a tween was cancelled.
    pub fn set(&mut self, weights: &[f64]) -> MorphResult<bool> {
        self.check(weights)?;
        let cancelled = self.tween.take().is_some();
        self.weights.copy_from_slice(weights);
        Ok(cancelled)
    }

    /// Start tweening toward `target` from the weights current at `now`.
    ///
    /// A running tween is cancelled first; its value at `now` becomes the new start so the
    /// motion is continuous. Returns `true` when a tween was cancelled.
    pub fn animate_at(
        &mut self,
        target: &[f64],
        duration: Duration,
        easing: Easing,
        now: Instant,
    ) -> MorphResult<bool> {
        self.check(target)?;
        let cancelled = match self.tween.take() {
            Some(prev) => {
                prev.sample(prev.fraction(now), &mut self.weights);
                true
            }
            None => false,
        };
        self.tween = Some(Tween {
            start: self.weights.clone(),
            target: target.to_vec(),
            started_at: now,
            duration,
            easing,
        });
        Ok(cancelled)
    }

    pub fn animate(
        &mut self,
        target: &[f64],
        duration: Duration,
        easing: Easing,
    ) -> MorphResult<bool> {
        self.animate_at(target, duration, easing, Instant::now())
    }

    /// Advance to `now`, updating the weights.
    pub fn tick_at(&mut self, now: Instant) -> Tick {
        let Some(tween) = &self.tween else {
            return Tick::Idle;
        };
        let t = tween.fraction(now);
        if t >= 1.0 {
            self.weights.copy_from_slice(&tween.target);
            self.tween = None;
            return Tick::Complete;
        }
        tween.sample(t, &mut self.weights);
        Tick::Progress { t }
    }

    pub fn tick(&mut self) -> Tick {
        self.tick_at(Instant::now())
    }

    /// Stop a running tween where it was last sampled. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        self.tween.take().is_some()
    }

    /// Append a weight for a newly registered image (also to a running tween's endpoints).
    pub fn push_weight(&mut self, weight: f64) {
        self.weights.push(weight);
        if let Some(t) = &mut self.tween {
            t.start.push(weight);
            t.target.push(weight);
        }
    }

    /// Drop the weight of a removed image.
    pub fn remove_weight(&mut self, idx: usize) {
        if idx >= self.weights.len() {
            return;
        }
        self.weights.remove(idx);
        if let Some(t) = &mut self.tween {
            t.start.remove(idx);
            t.target.remove(idx);
        }
    }

    fn check(&self, weights: &[f64]) -> MorphResult<()> {
        if weights.len() != self.weights.len() {
            return Err(MorphError::validation(format!(
                "weight vector has {} entries, expected {}",
                weights.len(),
                self.weights.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| !w.is_finite()) {
            return Err(MorphError::animation(format!("weight {w} is not finite")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/driver.rs"]
mod tests;
