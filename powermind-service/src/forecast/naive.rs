use serde::Deserialize;

use super::{check_training, FitError, Inputs, Regressor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Mean,
    #[default]
    Median,
}

/// Stub baseline that predicts one statistic of the training targets for
/// every row, ignoring the inputs.
#[derive(Debug, Clone)]
pub struct NaiveBaseline {
    statistic: Statistic,
    level: Option<f64>,
}

impl NaiveBaseline {
    pub fn new(statistic: Statistic) -> Self {
        Self {
            statistic,
            level: None,
        }
    }

    pub fn level(&self) -> Option<f64> {
        self.level
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl Regressor for NaiveBaseline {
    fn name(&self) -> &'static str {
        match self.statistic {
            Statistic::Mean => "naive-mean",
            Statistic::Median => "naive-median",
        }
    }

    fn fit(&mut self, inputs: &[Inputs], targets: &[f64]) -> Result<(), FitError> {
        check_training(inputs, targets)?;
        let level = match self.statistic {
            Statistic::Mean => targets.iter().sum::<f64>() / targets.len() as f64,
            Statistic::Median => median(targets),
        };
        self.level = Some(level);
        Ok(())
    }

    fn predict(&self, inputs: &[Inputs]) -> Result<Vec<f64>, FitError> {
        let level = self.level.ok_or(FitError::NotFitted)?;
        Ok(vec![level; inputs.len()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_ignores_a_single_spike() {
        let inputs = vec![[0.0; 4]; 6];
        let targets = [20.0, 20.0, 20.0, 45.0, 20.0, 20.0];
        let mut model = NaiveBaseline::new(Statistic::Median);
        model.fit(&inputs, &targets).expect("fit");
        assert_eq!(model.level(), Some(20.0));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn mean_predicts_training_average_everywhere() {
        let inputs = vec![[0.0; 4]; 4];
        let targets = [10.0, 20.0, 30.0, 40.0];
        let mut model = NaiveBaseline::new(Statistic::Mean);
        model.fit(&inputs, &targets).expect("fit");
        assert_eq!(model.predict(&inputs[..2]).expect("predict"), vec![25.0, 25.0]);
    }

    #[test]
    fn empty_training_set_is_rejected() {
        let mut model = NaiveBaseline::new(Statistic::Mean);
        assert_eq!(model.fit(&[], &[]), Err(FitError::EmptyTrainingSet));
        assert_eq!(model.predict(&[[0.0; 4]]), Err(FitError::NotFitted));
    }
}
