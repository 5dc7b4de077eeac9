use super::{check_training, FitError, Inputs, Regressor};
use crate::pipeline::PipelineError;
use powermind_domain::FeatureRow;

const DIM: usize = FeatureRow::INPUTS + 1;

/// Ordinary least squares with an intercept, solved via the normal equations.
///
/// A non-zero `ridge` adds an L2 penalty on the slopes (never the intercept),
/// which keeps the system solvable when inputs are collinear.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    ridge: f64,
    coefficients: Option<[f64; DIM]>,
}

impl LinearRegression {
    pub fn with_ridge(ridge: f64) -> Result<Self, PipelineError> {
        if !(ridge >= 0.0 && ridge.is_finite()) {
            return Err(PipelineError::invalid(
                "forecast.linear.ridge",
                format!("must be non-negative, got {ridge}"),
            ));
        }
        Ok(Self {
            ridge,
            coefficients: None,
        })
    }

    /// Intercept followed by one slope per input, once fitted.
    pub fn coefficients(&self) -> Option<&[f64; DIM]> {
        self.coefficients.as_ref()
    }
}

fn design_row(x: &Inputs) -> [f64; DIM] {
    let mut row = [1.0; DIM];
    row[1..].copy_from_slice(x);
    row
}

/// Gaussian elimination with partial pivoting on an augmented system.
fn solve(mut a: [[f64; DIM]; DIM], mut b: [f64; DIM]) -> Result<[f64; DIM], FitError> {
    let scale = (0..DIM).map(|i| a[i][i].abs()).fold(1.0_f64, f64::max);
    let tolerance = scale * 1e-10;

    for col in 0..DIM {
        let pivot = (col..DIM)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= tolerance {
            return Err(FitError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..DIM {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..DIM {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; DIM];
    for row in (0..DIM).rev() {
        let tail: f64 = (row + 1..DIM).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

impl Regressor for LinearRegression {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn fit(&mut self, inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError> {
        check_training(inputs, targets)?;

        let mut xtx = [[0.0; DIM]; DIM];
        let mut xty = [0.0; DIM];
        for (x, y) in inputs.iter().zip(targets) {
            let row = design_row(x);
            for i in 0..DIM {
                xty[i] += row[i] * y;
                for j in 0..DIM {
                    xtx[i][j] += row[i] * row[j];
                }
            }
        }
        for (i, r) in xtx.iter_mut().enumerate().skip(1) {
            r[i] += self.ridge;
        }

        self.coefficients = Some(solve(xtx, xty)?);
        Ok(())
    }

    fn predict(&self, inputs: &[Inputs]) -> Result<Vec<f64>, FitError> {
        let beta = self.coefficients.as_ref().ok_or(FitError::NotFitted)?;
        Ok(inputs
            .iter()
            .map(|x| design_row(x).iter().zip(beta).map(|(a, b)| a * b).sum::<f64>())
            .collect())
    }
}
