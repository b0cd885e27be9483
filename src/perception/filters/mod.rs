//! Filtering algorithms for noisy steering signals

/// A generic filter interface
pub trait Filter<T> {
    /// Filter the input data
    fn filter(&mut self, input: T) -> T;

    /// Forget any history
    fn reset(&mut self);
}

/// First-order low-pass (exponential moving average) filter
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    alpha: f64,
    state: Option<f64>,
}

impl LowPassFilter {
    /// `alpha` is the weight of the newest sample; 1.0 passes input through
    pub fn new(alpha: f64) -> Self {
        LowPassFilter {
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            state: None,
        }
    }
}

impl Filter<f64> for LowPassFilter {
    fn filter(&mut self, input: f64) -> f64 {
        let output = match self.state {
            Some(previous) => self.alpha * input + (1.0 - self.alpha) * previous,
            None => input,
        };
        self.state = Some(output);
        output
    }

    fn reset(&mut self) {
        self.state = None;
    }
}
