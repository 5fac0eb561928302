use crate::layers::Param;

/// Plain gradient descent: `w -= lr * g`.
pub struct SGD {
    pub lr: f32,
}

impl SGD {
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }

    pub fn step(&mut self, params: &mut [&mut Param]) {
        for p in params.iter_mut() {
            let lr = self.lr;
            for (v, g) in p.value.data.iter_mut().zip(&p.grad.data) {
                *v -= lr * g;
            }
        }
    }
}
