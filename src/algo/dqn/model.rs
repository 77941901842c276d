use burn::{
    module::Param,
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

/// A multilayer perceptron mapping a flattened state to one Q value per action
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl<B: Backend> QNetwork<B> {
    /// Build the layers `input -> hidden[0] -> ... -> hidden[n-1] -> num_actions`
    pub fn init(input: usize, hidden: &[usize], num_actions: usize, device: &B::Device) -> Self {
        let widths: Vec<usize> = std::iter::once(input)
            .chain(hidden.iter().copied())
            .chain(std::iter::once(num_actions))
            .collect();

        Self {
            layers: widths
                .windows(2)
                .map(|w| LinearConfig::new(w[0], w[1]).init(device))
                .collect(),
        }
    }

    /// `[batch, input]` to `[batch, num_actions]`, with ReLU between layers
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let last = self.layers.len() - 1;
        self.layers
            .iter()
            .enumerate()
            .fold(input, |x, (i, layer)| {
                let x = layer.forward(x);
                if i < last {
                    relu(x)
                } else {
                    x
                }
            })
    }

    /// Soft update the parameters towards `other`
    ///
    /// θ′ ← τθ + (1 − τ)θ′
    pub fn soft_update(self, other: &Self, tau: f32) -> Self {
        Self {
            layers: self
                .layers
                .into_iter()
                .zip(&other.layers)
                .map(|(this, that)| soft_update_linear(this, that, tau))
                .collect(),
        }
    }
}

fn soft_update_tensor<B: Backend, const D: usize>(
    this: Param<Tensor<B, D>>,
    that: &Param<Tensor<B, D>>,
    tau: f32,
) -> Param<Tensor<B, D>> {
    this.map(|tensor| (tensor * (1.0 - tau) + that.val() * tau).detach())
}

fn soft_update_linear<B: Backend>(mut this: Linear<B>, that: &Linear<B>, tau: f32) -> Linear<B> {
    this.weight = soft_update_tensor(this.weight, &that.weight, tau);
    this.bias = match (this.bias, &that.bias) {
        (Some(b1), Some(b2)) => Some(soft_update_tensor(b1, b2, tau)),
        (bias, _) => bias,
    };

    this
}
