/*!
# Parameter initialization

Resets the learned parameters of an assembled network. Dispatch is done on
the layer tags reported by [`Parameterized`], never on parameter names.

- Convolution weights: `N(0, sqrt(2 / fan_out))` with
  `fan_out = out_channels * prod(kernel)`.
- Normalization scale: 1, shift: 0.
- Convolution biases and anything else: left as constructed.
 */

use crate::layers::{LayerMut, Parameterized};

/**
Standard deviation of the normal distribution used for a convolution weight.

# Arguments
fan_out: i64 - `out_channels * prod(kernel)`

# Example
```rust
# use atrous_seg::tensor_init::he_std;
assert!((he_std(8) - 0.5).abs() < 1e-12);
```
 */
pub fn he_std(fan_out: i64) -> f64 {
    (2.0 / fan_out as f64).sqrt()
}

/**
Initialize every convolution and normalization layer of `module`.

Returns the number of (convolution, normalization) layers that were reset.
 */
pub fn init_parameters<M: Parameterized + ?Sized>(module: &mut M) -> (usize, usize) {
    let mut counts = (0, 0);
    tch::no_grad(|| {
        module.visit_layers(&mut |layer| match layer {
            LayerMut::Conv(conv) => {
                let std = he_std(conv.fan_out());
                let _ = conv.weight.normal_(0.0, std);
                counts.0 += 1;
            }
            LayerMut::Norm(norm) => {
                let _ = norm.weight.fill_(1.0);
                let _ = norm.bias.fill_(0.0);
                counts.1 += 1;
            }
        })
    });
    tracing::debug!(convs = counts.0, norms = counts.1, "initialized parameters");
    counts
}
