use crate::layers::Param;
use crate::math::Matrix;

/// Adam optimizer.
///
/// Moment estimates are owned by the optimizer and matched to parameters by
/// position, so each instance must always be stepped with the same parameter
/// list (one network).
pub struct Adam {
    pub lr: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub eps: f32,
    t: usize,
    m: Vec<Matrix>,
    v: Vec<Matrix>,
}

impl Adam {
    pub fn new(lr: f32, beta1: f32, beta2: f32, eps: f32) -> Self {
        Self {
            lr,
            beta1,
            beta2,
            eps,
            t: 0,
            m: Vec::new(),
            v: Vec::new(),
        }
    }

    /// Keras defaults: `beta1 = 0.9`, `beta2 = 0.999`, `eps = 1e-7`.
    pub fn with_lr(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-7)
    }

    /// Number of updates applied so far.
    pub fn steps(&self) -> usize {
        self.t
    }

    fn ensure_state(&mut self, params: &[&mut Param]) {
        let matches = self.m.len() == params.len()
            && self.m.iter().zip(params).all(|(m, p)| m.data.len() == p.len());
        if !matches {
            self.m = params
                .iter()
                .map(|p| Matrix::zeros(p.value.rows, p.value.cols))
                .collect();
            self.v = self.m.clone();
            self.t = 0;
        }
    }

    pub fn step(&mut self, params: &mut [&mut Param]) {
        self.ensure_state(params);
        self.t += 1;
        let bias1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias2 = 1.0 - self.beta2.powi(self.t as i32);
        for ((p, m), v) in params.iter_mut().zip(&mut self.m).zip(&mut self.v) {
            for i in 0..p.grad.data.len() {
                let g = p.grad.data[i];
                m.data[i] = self.beta1 * m.data[i] + (1.0 - self.beta1) * g;
                v.data[i] = self.beta2 * v.data[i] + (1.0 - self.beta2) * g * g;
                let m_hat = m.data[i] / bias1;
                let v_hat = v.data[i] / bias2;
                p.value.data[i] -= self.lr * m_hat / (v_hat.sqrt() + self.eps);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut p = Param::zeros(1, 2);
        p.grad.data = vec![0.5, -2.0];
        let mut adam = Adam::with_lr(0.1);
        adam.step(&mut [&mut p]);
        assert_relative_eq!(p.value.data[0], -0.1, epsilon = 1e-5);
        assert_relative_eq!(p.value.data[1], 0.1, epsilon = 1e-5);
        assert_eq!(adam.steps(), 1);
    }

    #[test]
    fn minimises_a_quadratic() {
        let mut p = Param::zeros(1, 1);
        p.value.data[0] = 3.0;
        let mut adam = Adam::with_lr(0.1);
        for _ in 0..300 {
            p.grad.data[0] = 2.0 * p.value.data[0];
            adam.step(&mut [&mut p]);
        }
        assert!(p.value.data[0].abs() < 0.1);
    }
}
