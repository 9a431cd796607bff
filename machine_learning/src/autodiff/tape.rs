use ndarray::{Array2, ArrayView2, Axis, linalg};

use crate::{
    MlErr, Result,
    arch::activations::{Relu, log_softmax_rows, log_softmax_rows_backward},
};

/// A handle to a value recorded on a `Tape`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Var(usize);

#[derive(Clone, Copy, Debug)]
enum Op {
    Leaf,
    /// `x · wᵀ`
    MatMulT(Var, Var),
    /// `x + b` with `b` of shape `[1, n]` broadcast over the rows of `x`.
    AddRow(Var, Var),
    Relu(Var),
    LogSoftmax(Var),
    Mul(Var, Var),
    /// Sum over the columns, `[r, c] -> [r, 1]`.
    SumRows(Var),
    /// Mean of every element, `[r, c] -> [1, 1]`.
    Mean(Var),
    Scale(Var, f32),
}

struct Node {
    value: Array2<f32>,
    op: Op,
    requires_grad: bool,
}

/// A reverse-mode automatic differentiation tape.
///
/// Every operation evaluates eagerly and appends a node holding its value and the operation that
/// produced it. Since nodes can only refer to nodes recorded before them, the list is already in
/// topological order and `backward` only needs to walk it in reverse.
#[derive(Default)]
pub struct Tape {
    nodes: Vec<Node>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value the gradient will be computed for.
    pub fn var(&mut self, value: Array2<f32>) -> Var {
        self.push(value, Op::Leaf, true)
    }

    /// Records a value that is treated as a constant, no gradient is propagated into it.
    pub fn constant(&mut self, value: Array2<f32>) -> Var {
        self.push(value, Op::Leaf, false)
    }

    pub fn value(&self, var: Var) -> ArrayView2<'_, f32> {
        self.nodes[var.0].value.view()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn matmul_t(&mut self, x: Var, w: Var) -> Result<Var> {
        let (xv, wv) = (self.value(x), self.value(w));
        if xv.ncols() != wv.ncols() {
            return Err(MlErr::shape(
                "matmul",
                format!("cannot multiply {:?} by the transpose of {:?}", xv.shape(), wv.shape()),
            ));
        }

        let mut out = Array2::zeros((xv.nrows(), wv.nrows()));
        linalg::general_mat_mul(1.0, &xv, &wv.t(), 0.0, &mut out);
        Ok(self.record(out, Op::MatMulT(x, w)))
    }

    pub fn add_row(&mut self, x: Var, b: Var) -> Result<Var> {
        let (xv, bv) = (self.value(x), self.value(b));
        if bv.nrows() != 1 || bv.ncols() != xv.ncols() {
            return Err(MlErr::shape(
                "bias",
                format!("got {:?}, expected [1, {}]", bv.shape(), xv.ncols()),
            ));
        }

        let out = &xv + &bv;
        Ok(self.record(out, Op::AddRow(x, b)))
    }

    pub fn relu(&mut self, x: Var) -> Var {
        let mut out = self.value(x).to_owned();
        out.par_mapv_inplace(|z| Relu.f(z));
        self.record(out, Op::Relu(x))
    }

    pub fn log_softmax(&mut self, x: Var) -> Var {
        let mut out = self.value(x).to_owned();
        log_softmax_rows(&mut out);
        self.record(out, Op::LogSoftmax(x))
    }

    /// Elementwise product of two values of the same shape.
    pub fn mul(&mut self, a: Var, b: Var) -> Result<Var> {
        let (av, bv) = (self.value(a), self.value(b));
        if av.dim() != bv.dim() {
            return Err(MlErr::shape(
                "elementwise product",
                format!("got {:?} and {:?}", av.shape(), bv.shape()),
            ));
        }

        let out = &av * &bv;
        Ok(self.record(out, Op::Mul(a, b)))
    }

    pub fn sum_rows(&mut self, x: Var) -> Var {
        let out = self.value(x).sum_axis(Axis(1)).insert_axis(Axis(1));
        self.record(out, Op::SumRows(x))
    }

    pub fn mean(&mut self, x: Var) -> Var {
        let mean = self.value(x).mean().unwrap_or_default();
        self.record(Array2::from_elem((1, 1), mean), Op::Mean(x))
    }

    pub fn scale(&mut self, x: Var, c: f32) -> Var {
        let out = &self.value(x) * c;
        self.record(out, Op::Scale(x, c))
    }

    /// Computes the gradient of the scalar `root` with respect to every recorded variable.
    ///
    /// # Returns
    /// The gradients, or an `InvalidShape` error if `root` is not a `[1, 1]` value.
    pub fn backward(&self, root: Var) -> Result<Gradients> {
        let shape = self.value(root).dim();
        if shape != (1, 1) {
            return Err(MlErr::shape(
                "backward root",
                format!("got {shape:?}, expected a scalar"),
            ));
        }

        let mut adj: Vec<Option<Array2<f32>>> = vec![None; self.nodes.len()];
        adj[root.0] = Some(Array2::ones((1, 1)));

        for i in (0..=root.0).rev() {
            let Some(d) = adj[i].take() else {
                continue;
            };

            let node = &self.nodes[i];
            match node.op {
                Op::Leaf => {
                    adj[i] = Some(d);
                }
                Op::MatMulT(x, w) => {
                    if self.requires_grad(x) {
                        self.accumulate(&mut adj, x, d.dot(&self.value(w)));
                    }
                    if self.requires_grad(w) {
                        self.accumulate(&mut adj, w, d.t().dot(&self.value(x)));
                    }
                }
                Op::AddRow(x, b) => {
                    if self.requires_grad(b) {
                        let db = d.sum_axis(Axis(0)).insert_axis(Axis(0));
                        self.accumulate(&mut adj, b, db);
                    }
                    self.accumulate(&mut adj, x, d);
                }
                Op::Relu(x) => {
                    let mut dx = d;
                    dx.zip_mut_with(&self.value(x), |g, &z| *g *= Relu.df(z));
                    self.accumulate(&mut adj, x, dx);
                }
                Op::LogSoftmax(x) => {
                    let dx = log_softmax_rows_backward(node.value.view(), d.view());
                    self.accumulate(&mut adj, x, dx);
                }
                Op::Mul(a, b) => {
                    if self.requires_grad(a) {
                        self.accumulate(&mut adj, a, &d * &self.value(b));
                    }
                    if self.requires_grad(b) {
                        self.accumulate(&mut adj, b, &d * &self.value(a));
                    }
                }
                Op::SumRows(x) => {
                    let mut dx = Array2::zeros(self.value(x).raw_dim());
                    dx += &d;
                    self.accumulate(&mut adj, x, dx);
                }
                Op::Mean(x) => {
                    let xv = self.value(x);
                    let g = d[[0, 0]] / xv.len().max(1) as f32;
                    self.accumulate(&mut adj, x, Array2::from_elem(xv.raw_dim(), g));
                }
                Op::Scale(x, c) => {
                    self.accumulate(&mut adj, x, d * c);
                }
            }
        }

        Ok(Gradients { adj })
    }

    fn push(&mut self, value: Array2<f32>, op: Op, requires_grad: bool) -> Var {
        self.nodes.push(Node {
            value,
            op,
            requires_grad,
        });

        Var(self.nodes.len() - 1)
    }

    fn record(&mut self, value: Array2<f32>, op: Op) -> Var {
        let requires_grad = match op {
            Op::Leaf => false,
            Op::MatMulT(a, b) | Op::AddRow(a, b) | Op::Mul(a, b) => {
                self.requires_grad(a) || self.requires_grad(b)
            }
            Op::Relu(x) | Op::LogSoftmax(x) | Op::SumRows(x) | Op::Mean(x) | Op::Scale(x, _) => {
                self.requires_grad(x)
            }
        };

        self.push(value, op, requires_grad)
    }

    fn requires_grad(&self, var: Var) -> bool {
        self.nodes[var.0].requires_grad
    }

    fn accumulate(&self, adj: &mut [Option<Array2<f32>>], var: Var, grad: Array2<f32>) {
        if !self.requires_grad(var) {
            return;
        }

        if let Some(acc) = adj[var.0].as_mut() {
            *acc += &grad;
        } else {
            adj[var.0] = Some(grad);
        }
    }
}

/// The result of a backward pass.
pub struct Gradients {
    adj: Vec<Option<Array2<f32>>>,
}

impl Gradients {
    /// Returns the gradient with respect to `var`, `None` if `var` is a constant or doesn't
    /// influence the differentiated value.
    pub fn wrt(&self, var: Var) -> Option<ArrayView2<'_, f32>> {
        self.adj.get(var.0)?.as_ref().map(|g| g.view())
    }

    /// Takes the gradient with respect to `var` out of the set.
    pub fn take(&mut self, var: Var) -> Option<Array2<f32>> {
        self.adj.get_mut(var.0)?.take()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn close(a: ArrayView2<f32>, b: ArrayView2<f32>) -> bool {
        a.dim() == b.dim() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn affine_then_mean() {
        // l = mean(x · wᵀ + b)
        let mut t = Tape::new();
        let x = t.constant(array![[1., 2.], [3., 4.]]);
        let w = t.var(array![[1., -1.], [0.5, 0.]]);
        let b = t.var(array![[0., 1.]]);

        let z = t.matmul_t(x, w).unwrap();
        let z = t.add_row(z, b).unwrap();
        let l = t.mean(z);

        assert_eq!(t.value(z), array![[-1., 1.5], [-1., 2.5]]);
        assert!((t.value(l)[[0, 0]] - 0.5).abs() < 1e-6);

        let grads = t.backward(l).unwrap();
        // every output gets a 1/4 share, dw[j] = sum_rows(x) / 4
        assert!(close(
            grads.wrt(w).unwrap(),
            array![[1., 1.5], [1., 1.5]].view()
        ));
        assert!(close(grads.wrt(b).unwrap(), array![[0.5, 0.5]].view()));
        assert!(grads.wrt(x).is_none());
    }

    #[test]
    fn relu_blocks_negative_paths() {
        let mut t = Tape::new();
        let x = t.var(array![[-1., 2., 0.]]);
        let r = t.relu(x);
        let s = t.sum_rows(r);
        let l = t.mean(s);

        let grads = t.backward(l).unwrap();
        assert_eq!(grads.wrt(x).unwrap(), array![[0., 1., 0.]]);
    }

    #[test]
    fn reused_values_accumulate() {
        // l = mean(x * x) => dl/dx = 2x / n
        let mut t = Tape::new();
        let x = t.var(array![[1., -3.]]);
        let sq = t.mul(x, x).unwrap();
        let l = t.mean(sq);

        let grads = t.backward(l).unwrap();
        assert!(close(grads.wrt(x).unwrap(), array![[1., -3.]].view()));
    }

    #[test]
    fn negative_log_likelihood_gradient_is_softmax_minus_target() {
        let mut t = Tape::new();
        let z = t.var(array![[2., 1., 0.1]]);
        let y = t.constant(array![[0., 1., 0.]]);

        let lp = t.log_softmax(z);
        let picked = t.mul(lp, y).unwrap();
        let picked = t.sum_rows(picked);
        let mean = t.mean(picked);
        let l = t.scale(mean, -1.);

        let grads = t.backward(l).unwrap();
        let zv = t.value(z);
        let max = 2.;
        let total: f32 = zv.iter().map(|v| (v - max).exp()).sum();
        let expected = zv.mapv(|v| (v - max).exp() / total) - t.value(y);

        assert!(close(grads.wrt(z).unwrap(), expected.view()));
    }

    #[test]
    fn backward_needs_a_scalar() {
        let mut t = Tape::new();
        let x = t.var(array![[1., 2.]]);

        assert!(matches!(
            t.backward(x),
            Err(MlErr::InvalidShape { .. })
        ));
    }

    #[test]
    fn shape_mismatches_are_reported() {
        let mut t = Tape::new();
        let x = t.constant(Array2::zeros((2, 3)));
        let w = t.var(Array2::zeros((4, 2)));
        let b = t.var(Array2::zeros((1, 5)));

        assert!(t.matmul_t(x, w).is_err());
        assert!(t.add_row(x, b).is_err());
        assert!(t.mul(x, w).is_err());
        assert_eq!(t.len(), 3);
    }
}
