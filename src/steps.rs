//! Age-indexed keyframe sequences
//!
//! A [`StepSequence`] is the ordered list of `(age, value)` keyframes that
//! drives one affector channel over a particle's normalized lifetime.
//!
//! Ages are kept non-decreasing by construction: [`StepSequence::add_step`]
//! inserts at the sorted position, and [`StepSequence::set_age`] pulls an
//! edited age up to its predecessor. The latter is a one-sided repair; a
//! step is never moved past its successors, so a sequence edited out of
//! order is stored exactly as the user left it.
//!
//! # Example
//!
//! ```
//! use pfxsrc::steps::StepSequence;
//!
//! let mut seq = StepSequence::new();
//! seq.add_step(0.2, 1.0f32);
//! seq.add_step(0.8, 3.0f32);
//! assert_eq!(seq.sample(0.5), Some(2.0));
//! assert_eq!(seq.sample(0.0), Some(1.0));
//! assert_eq!(seq.sample(1.0), Some(3.0));
//! ```

use crate::math::Lerp;
use serde::{Deserialize, Serialize};

/// A single keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Step<T> {
    /// Normalized particle age in `[0, 1]`
    pub age: f32,
    /// Channel value at this age
    pub value: T,
}

impl<T> Step<T> {
    pub fn new(age: f32, value: T) -> Self {
        Self { age, value }
    }
}

/// Ordered keyframes for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepSequence<T> {
    steps: Vec<Step<T>>,
}

impl<T> Default for StepSequence<T> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<T: Lerp> StepSequence<T> {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from already ordered steps (as read from a file).
    ///
    /// The steps are stored as given; no reordering or repair happens.
    pub fn from_steps(steps: Vec<Step<T>>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step<T>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Step<T>> {
        self.steps.get(index)
    }

    /// Insert a step at its sorted position and return the index it landed at.
    ///
    /// Scans from the end, shifting every step with a strictly greater age.
    /// A step whose age equals an existing one is placed after it.
    pub fn add_step(&mut self, age: f32, value: T) -> usize {
        let mut index = self.steps.len();
        while index > 0 && self.steps[index - 1].age > age {
            index -= 1;
        }
        self.steps.insert(index, Step::new(age, value));
        index
    }

    /// Remove the last step. Does nothing on an empty sequence.
    pub fn remove_last(&mut self) -> Option<Step<T>> {
        self.steps.pop()
    }

    /// Remove every step.
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Replace the value of the step at `index`.
    ///
    /// Returns `false` when the index is out of range.
    pub fn set_value(&mut self, index: usize, value: T) -> bool {
        match self.steps.get_mut(index) {
            Some(step) => {
                step.value = value;
                true
            }
            None => false,
        }
    }

    /// Edit the age of the step at `index`.
    ///
    /// An age below the predecessor's is clamped up to it. Successors are
    /// not examined. Returns the stored age, or `None` when out of range.
    pub fn set_age(&mut self, index: usize, age: f32) -> Option<f32> {
        if index >= self.steps.len() {
            return None;
        }
        let mut age = age;
        if index > 0 && age < self.steps[index - 1].age {
            age = self.steps[index - 1].age;
        }
        self.steps[index].age = age;
        Some(age)
    }

    /// Apply the predecessor clamp to every step, first to last.
    ///
    /// Equivalent to re-submitting each step's current age through
    /// [`StepSequence::set_age`] in storage order, the way an edit frame
    /// visits every slider.
    pub fn repair_ages(&mut self) {
        for i in 1..self.steps.len() {
            if self.steps[i].age < self.steps[i - 1].age {
                self.steps[i].age = self.steps[i - 1].age;
            }
        }
    }

    /// Sample the sequence at normalized `age`.
    ///
    /// Returns `None` for an empty sequence, the sole value for a single
    /// step, and otherwise interpolates linearly between the bracketing
    /// steps. Ages outside the recorded range clamp to the first or last
    /// value.
    pub fn sample(&self, age: f32) -> Option<T> {
        let first = self.steps.first()?;
        let last = self.steps.last()?;

        if self.steps.len() == 1 || age <= first.age {
            return Some(first.value);
        }
        if age >= last.age {
            return Some(last.value);
        }

        for window in self.steps.windows(2) {
            let (a, b) = (&window[0], &window[1]);
            if age >= a.age && age < b.age {
                let span = b.age - a.age;
                let t = if span > f32::EPSILON { (age - a.age) / span } else { 0.0 };
                return Some(a.value.lerp(&b.value, t));
            }
        }

        // Only reachable when an edit left the ages out of order
        Some(last.value)
    }

    /// Sample, falling back to `default` for an empty sequence
    pub fn sample_or(&self, age: f32, default: T) -> T {
        self.sample(age).unwrap_or(default)
    }

    /// Check whether ages are non-decreasing in storage order
    pub fn is_ordered(&self) -> bool {
        self.steps.windows(2).all(|w| w[0].age <= w[1].age)
    }
}
