/// RSI reading used wherever the ratio is undefined (warm-up or zero average loss).
pub const NEUTRAL_RSI: f64 = 50.0;

/// Trailing arithmetic mean over `window` values, aligned with `data`.
///
/// Positions with fewer than `window` values of history are `None`.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; data.len()];
    }

    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        if i + 1 < window {
            result.push(None);
            continue;
        }
        let sum: f64 = data[i + 1 - window..=i].iter().sum();
        result.push(Some(sum / window as f64));
    }
    result
}

/// Exponential Moving Average seeded with the first value.
///
/// `alpha = 2 / (span + 1)`; every position is defined.
pub fn ema(data: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || data.is_empty() {
        return vec![];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut result = Vec::with_capacity(data.len());
    result.push(data[0]);

    for i in 1..data.len() {
        let ema_val = alpha * data[i] + (1.0 - alpha) * result[i - 1];
        result.push(ema_val);
    }

    result
}

/// Relative Strength Index over simple trailing means of gains and losses.
///
/// The first step has no delta and counts as neither gain nor loss. Warm-up
/// positions and windows with zero average loss read `NEUTRAL_RSI`.
pub fn rsi(data: &[f64], window: usize) -> Vec<f64> {
    if data.is_empty() {
        return vec![];
    }

    let mut gains = Vec::with_capacity(data.len());
    let mut losses = Vec::with_capacity(data.len());
    gains.push(0.0);
    losses.push(0.0);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let avg_gains = rolling_mean(&gains, window);
    let avg_losses = rolling_mean(&losses, window);

    avg_gains
        .into_iter()
        .zip(avg_losses)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) if loss != 0.0 => {
                let rs = gain / loss;
                100.0 - (100.0 / (1.0 + rs))
            }
            _ => NEUTRAL_RSI,
        })
        .collect()
}

/// MACD (Moving Average Convergence Divergence)
#[derive(Debug, Clone, PartialEq)]
pub struct MacdResult {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// All three lines are aligned with `data`, one value per input position.
pub fn macd(data: &[f64], short_span: usize, long_span: usize, signal_span: usize) -> MacdResult {
    if short_span == 0 || long_span == 0 || signal_span == 0 || data.is_empty() {
        return MacdResult { macd_line: vec![], signal_line: vec![], histogram: vec![] };
    }

    let ema_short = ema(data, short_span);
    let ema_long = ema(data, long_span);

    let macd_line: Vec<f64> = ema_short
        .iter()
        .zip(&ema_long)
        .map(|(short, long)| short - long)
        .collect();

    let signal_line = ema(&macd_line, signal_span);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}
