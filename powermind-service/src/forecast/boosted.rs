use super::{check_training, FitError, Inputs, Regressor};
use crate::pipeline::PipelineError;
use powermind_domain::FeatureRow;

/// Hyper-parameters of [`BoostedTrees`].
///
/// Defaults follow the usual gradient-boosting library defaults: 100 rounds,
/// learning rate 0.3, depth 6, L2 leaf penalty 1.0, min child weight 1.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedTreesParams {
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub lambda: f64,
    pub min_child_weight: f64,
}

impl Default for BoostedTreesParams {
    fn default() -> Self {
        Self {
            n_rounds: 100,
            learning_rate: 0.3,
            max_depth: 6,
            lambda: 1.0,
            min_child_weight: 1.0,
        }
    }
}

impl BoostedTreesParams {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.n_rounds == 0 {
            return Err(PipelineError::invalid("forecast.boosted.n_rounds", "must be positive"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PipelineError::invalid(
                "forecast.boosted.learning_rate",
                format!("must be positive, got {}", self.learning_rate),
            ));
        }
        if self.max_depth == 0 {
            return Err(PipelineError::invalid("forecast.boosted.max_depth", "must be positive"));
        }
        if !(self.lambda >= 0.0 && self.lambda.is_finite()) {
            return Err(PipelineError::invalid(
                "forecast.boosted.lambda",
                format!("must be non-negative, got {}", self.lambda),
            ));
        }
        if !(self.min_child_weight >= 0.0 && self.min_child_weight.is_finite()) {
            return Err(PipelineError::invalid(
                "forecast.boosted.min_child_weight",
                format!("must be non-negative, got {}", self.min_child_weight),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn eval(&self, x: &Inputs) -> f64 {
        let mut node = self;
        loop {
            match node {
                Node::Leaf(w) => return *w,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x[*feature] < *threshold { left } else { right };
                }
            }
        }
    }
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Gradient-boosted regression trees with squared-error loss.
///
/// Each round fits a depth-limited tree to the current residuals. With a
/// unit hessian the split gain is `GL²/(nL+λ) + GR²/(nR+λ) − G²/(n+λ)` and a
/// leaf's weight is `G/(n+λ)`, where `G` sums residuals.
#[derive(Debug, Clone)]
pub struct BoostedTrees {
    params: BoostedTreesParams,
    base_score: Option<f64>,
    trees: Vec<Node>,
}

impl BoostedTrees {
    pub fn new(params: BoostedTreesParams) -> Self {
        Self {
            params,
            base_score: None,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> &BoostedTreesParams {
        &self.params
    }

    fn leaf(&self, residuals: &[f64], rows: &[usize]) -> Node {
        let sum: f64 = rows.iter().map(|&i| residuals[i]).sum();
        Node::Leaf(sum / (rows.len() as f64 + self.params.lambda))
    }

    fn grow(&self, inputs: &[Inputs], residuals: &[f64], rows: Vec<usize>, depth: usize) -> Node {
        if depth >= self.params.max_depth || rows.len() < 2 {
            return self.leaf(residuals, &rows);
        }

        let Some(split) = self.best_split(inputs, residuals, &rows) else {
            return self.leaf(residuals, &rows);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| inputs[i][split.feature] < split.threshold);

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(inputs, residuals, left, depth + 1)),
            right: Box::new(self.grow(inputs, residuals, right, depth + 1)),
        }
    }

    fn best_split(&self, inputs: &[Inputs], residuals: &[f64], rows: &[usize]) -> Option<Split> {
        let lambda = self.params.lambda;
        let n = rows.len();
        let total: f64 = rows.iter().map(|&i| residuals[i]).sum();
        let parent = total * total / (n as f64 + lambda);

        let mut best: Option<Split> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..FeatureRow::INPUTS {
            sorted.sort_by(|&a, &b| inputs[a][feature].total_cmp(&inputs[b][feature]));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += residuals[sorted[k]];

                let lo = inputs[sorted[k]][feature];
                let hi = inputs[sorted[k + 1]][feature];
                if lo == hi {
                    continue;
                }

                let n_left = (k + 1) as f64;
                let n_right = (n - k - 1) as f64;
                if n_left < self.params.min_child_weight || n_right < self.params.min_child_weight {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / (n_left + lambda)
                    + right_sum * right_sum / (n_right + lambda)
                    - parent;

                // Strictly positive gain, with slack for rounding on flat residuals.
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Split {
                        feature,
                        threshold: lo + (hi - lo) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

impl Default for BoostedTrees {
    fn default() -> Self {
        Self::new(BoostedTreesParams::default())
    }
}

impl Regressor for BoostedTrees {
    fn name(&self) -> &'static str {
        "boosted"
    }

    fn fit(&mut self, inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError> {
        check_training(inputs, targets)?;

        let n = targets.len();
        let base = targets.iter().sum::<f64>() / n as f64;
        let mut current = vec![base; n];
        let mut trees = Vec::with_capacity(self.params.n_rounds);

        for _ in 0..self.params.n_rounds {
            let residuals: Vec<f64> = targets.iter().zip(&current).map(|(y, p)| y - p).collect();
            let tree = self.grow(inputs, &residuals, (0..n).collect(), 0);
            for (p, x) in current.iter_mut().zip(inputs) {
                *p += self.params.learning_rate * tree.eval(x);
            }
            trees.push(tree);
        }

        tracing::debug!(rounds = trees.len(), base_score = base, "boosted trees fitted");
        self.base_score = Some(base);
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, inputs: &[Inputs]) -> Result<Vec<f64>, FitError> {
        let base = self.base_score.ok_or(FitError::NotFitted)?;
        let lr = self.params.learning_rate;
        Ok(inputs
            .iter()
            .map(|x| base + lr * self.trees.iter().map(|t| t.eval(x)).sum::<f64>())
            .collect())
    }
}
