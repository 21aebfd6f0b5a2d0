use serde::{Deserialize, Serialize};
use tracing::debug;

use super::engine::{
    accumulate_final_balance, bounded_months, monthly_rate_from_annual, total_contributed,
};
use super::rates::{RateCatalog, resolve_annual_rate};
use super::types::{MonteCarloTrial, SimulationInput};

const MIN_TRIAL_RATE: f64 = 0.1;
const INFLATION_SHOCK_SCALE: f64 = 0.1;
const DISPERSION_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonteCarloConfig {
    pub trials: u32,
    /// Fraction of the base rate a full market shock moves it by.
    pub volatility: f64,
    pub trend: f64,
    /// Weight of the market shock inside the inflation shock, 0..=1.
    pub correlation: f64,
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            trials: 1_000,
            volatility: 0.15,
            trend: 0.0,
            correlation: 0.3,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloSummary {
    pub trials: u32,
    pub total_contributed: f64,
    pub mean: f64,
    pub median: f64,
    pub percentile5: f64,
    pub percentile25: f64,
    pub percentile75: f64,
    pub percentile95: f64,
    pub min: f64,
    pub max: f64,
    pub standard_deviation: f64,
    pub value_at_risk: f64,
    pub conditional_value_at_risk: f64,
    pub mean_return_percent: f64,
    pub sharpe_ratio: f64,
    pub probability_of_loss: f64,
    pub pessimistic_percent: f64,
    pub realistic_percent: f64,
    pub optimistic_percent: f64,
}

/// Trial values are real (deflated by the trial's inflation). Percentiles use
/// nearest-rank indexing `floor(p / 100 * n)` over the ascending values.
pub fn run_monte_carlo(
    base: &SimulationInput,
    catalog: &RateCatalog,
    config: &MonteCarloConfig,
) -> MonteCarloSummary {
    let base_rate = resolve_annual_rate(base, catalog);
    let base_inflation = base.inflation_rate().unwrap_or(0.0).max(0.0);
    let months = bounded_months(base.period_months());
    let contributed = total_contributed(base.initial_value, base.monthly_contribution, months);

    let mut rng = Rng::new(config.seed);
    let mut trials: Vec<MonteCarloTrial> = (0..config.trials)
        .map(|trial_index| {
            let shock_market = rng.uniform_signed();
            let shock_inflation = shock_market * config.correlation
                + rng.uniform_signed() * (1.0 - config.correlation);

            let rate = (base_rate * (1.0 + shock_market * config.volatility + config.trend))
                .max(MIN_TRIAL_RATE);
            let inflation =
                (base_inflation * (1.0 + shock_inflation * INFLATION_SHOCK_SCALE)).max(0.0);

            let nominal = accumulate_final_balance(
                base.initial_value,
                base.monthly_contribution,
                monthly_rate_from_annual(rate),
                months,
            );
            let final_value = nominal / (1.0 + inflation / 100.0).powf(months as f64 / 12.0);

            MonteCarloTrial {
                trial_index,
                final_value,
                return_percent: return_percent(final_value, contributed),
            }
        })
        .collect();

    let summary = summarize(&mut trials, contributed);
    debug!(
        trials = summary.trials,
        median = summary.median,
        probability_of_loss = summary.probability_of_loss,
        "monte carlo finished"
    );
    summary
}

fn return_percent(final_value: f64, contributed: f64) -> f64 {
    if contributed == 0.0 {
        0.0
    } else {
        (final_value - contributed) / contributed * 100.0
    }
}

fn summarize(trials: &mut [MonteCarloTrial], contributed: f64) -> MonteCarloSummary {
    if trials.is_empty() {
        return MonteCarloSummary {
            total_contributed: contributed,
            ..MonteCarloSummary::default()
        };
    }

    trials.sort_by(|a, b| a.final_value.total_cmp(&b.final_value));
    let values: Vec<f64> = trials.iter().map(|t| t.final_value).collect();
    let returns: Vec<f64> = trials.iter().map(|t| t.return_percent).collect();
    let n = values.len() as f64;

    let mean = values.iter().sum::<f64>() / n;
    let standard_deviation = std_dev(&values, mean);

    let mean_return_percent = returns.iter().sum::<f64>() / n;
    let return_std = std_dev(&returns, mean_return_percent);
    let sharpe_ratio = if return_std > DISPERSION_EPS {
        mean_return_percent / return_std
    } else {
        0.0
    };

    let tail = ((0.05 * n).floor() as usize).max(1);
    let conditional_value_at_risk = values[..tail].iter().sum::<f64>() / tail as f64;

    let losses = values.iter().filter(|v| **v < contributed).count();
    let share = |count: usize| count as f64 * 100.0 / n;
    let pessimistic = returns.iter().filter(|r| **r < 0.0).count();
    let optimistic = returns.iter().filter(|r| **r > 50.0).count();

    MonteCarloSummary {
        trials: values.len() as u32,
        total_contributed: contributed,
        mean,
        median: nearest_rank(&values, 50.0),
        percentile5: nearest_rank(&values, 5.0),
        percentile25: nearest_rank(&values, 25.0),
        percentile75: nearest_rank(&values, 75.0),
        percentile95: nearest_rank(&values, 95.0),
        min: values[0],
        max: values[values.len() - 1],
        standard_deviation,
        value_at_risk: nearest_rank(&values, 5.0),
        conditional_value_at_risk,
        mean_return_percent,
        sharpe_ratio,
        probability_of_loss: share(losses),
        pessimistic_percent: share(pessimistic),
        realistic_percent: share(values.len() - pessimistic - optimistic),
        optimistic_percent: share(optimistic),
    }
}

/// Nearest-rank percentile of ascending `sorted`, without interpolation.
/// The index is clamped to the last element, which only matters at p = 100.
pub fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((p / 100.0) * sorted.len() as f64).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

struct Rng {
    state: u64,
}

impl Rng {
    fn new(seed: u64) -> Self {
        let mixed = splitmix64(seed);
        let state = if mixed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            mixed
        };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    /// Uniform in (-1, 1).
    fn uniform_signed(&mut self) -> f64 {
        2.0 * self.next_f64() - 1.0
    }
}
