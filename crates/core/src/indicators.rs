//! Technical indicators over a close-price or volume series.
//!
//! Every function returns a vector aligned to its input: element `i` is the
//! indicator value at bar `i`, or `None` while the indicator is still warming
//! up. Exponential smoothing is the recursive (non-adjusted) form seeded with
//! the first observation.

pub const RSI_PERIOD: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const VOLUME_MEAN_PERIOD: usize = 20;

/// Bars needed before the MACD signal line is defined at the last two bars.
pub const MACD_MIN_BARS: usize = MACD_SLOW + MACD_SIGNAL;

fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for (i, &v) in values.iter().enumerate() {
        let cur = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        prev = Some(cur);
        out.push(if i + 1 >= min_periods { Some(cur) } else { None });
    }
    out
}

/// Exponential Moving Average with span `period`.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    ewm(values, 2.0 / (period as f64 + 1.0), period)
}

/// Relative Strength Index with Wilder smoothing.
///
/// The first bar has no prior close and contributes a zero gain and loss, so
/// the average starts at bar 0 and the index is defined from `period - 1`.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    let mut prev: Option<f64> = None;
    for &close in closes {
        let change = prev.map(|p| close - p).unwrap_or(0.0);
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
        prev = Some(close);
    }

    let alpha = 1.0 / period as f64;
    let avg_gain = ewm(&gains, alpha, period);
    let avg_loss = ewm(&losses, alpha, period);

    avg_gain
        .iter()
        .zip(avg_loss.iter())
        .map(|(g, l)| {
            let (g, l) = ((*g)?, (*l)?);
            Some(if l == 0.0 {
                100.0
            } else {
                100.0 - 100.0 / (1.0 + g / l)
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD line, signal line and histogram.
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);

    let macd: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // The signal line starts smoothing at the first defined MACD value.
    let mut signal = vec![None; closes.len()];
    if let Some(start) = macd.iter().position(Option::is_some) {
        let defined: Vec<f64> = macd[start..].iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        for (i, v) in ema(&defined, signal_period).into_iter().enumerate() {
            signal[start + i] = v;
        }
    }

    let histogram = macd
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdSeries {
        macd,
        signal,
        histogram,
    }
}

/// Trailing mean over `period` values, including the current one.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Last defined value of an aligned series, if the final element is defined.
pub fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Second-to-last element of an aligned series, if defined.
pub fn previous(series: &[Option<f64>]) -> Option<f64> {
    let n = series.len();
    if n < 2 {
        return None;
    }
    series[n - 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ema_warms_up_then_tracks_recursively() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let out = ema(&data, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);

        // alpha = 0.5, seeded with the first value.
        assert!(approx(out[2].unwrap(), 2.25));
        assert!(approx(out[3].unwrap(), 3.125));
    }

    #[test]
    fn ema_of_constant_series_is_constant() {
        let data = vec![7.5; 30];
        let out = ema(&data, 20);
        assert!(out[..19].iter().all(Option::is_none));
        assert!(out[19..].iter().all(|v| approx(v.unwrap(), 7.5)));
    }

    #[test]
    fn rsi_is_100_on_monotonic_rise() {
        let data: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let out = rsi(&data, RSI_PERIOD);
        assert!(out[..RSI_PERIOD - 1].iter().all(Option::is_none));
        assert!(approx(out[RSI_PERIOD - 1].unwrap(), 100.0));
        assert!(approx(last(&out).unwrap(), 100.0));
    }

    #[test]
    fn rsi_seeds_first_bar_with_zero_change() {
        // Bar 0 contributes a zero change; defined from bar 13.
        let mut data = vec![10.0, 11.0, 10.5];
        data.extend(std::iter::repeat(10.5).take(11));
        let out = rsi(&data, RSI_PERIOD);
        assert_eq!(out.len(), 14);
        assert!(out[12].is_none());

        let a = 1.0 / RSI_PERIOD as f64;
        let mut g = 0.0;
        let mut l = 0.0;
        for (gain, loss) in [(0.0, 0.0), (1.0, 0.0), (0.0, 0.5)]
            .into_iter()
            .chain(std::iter::repeat((0.0, 0.0)).take(11))
        {
            g = a * gain + (1.0 - a) * g;
            l = a * loss + (1.0 - a) * l;
        }
        let expected = 100.0 - 100.0 / (1.0 + g / l);
        assert!(approx(out[13].unwrap(), expected));
    }

    #[test]
    fn rsi_is_low_on_monotonic_fall() {
        let data: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        let out = rsi(&data, RSI_PERIOD);
        assert!(approx(last(&out).unwrap(), 0.0));
    }

    #[test]
    fn rsi_stays_in_range_on_alternating_series() {
        let data: Vec<f64> = (0..60)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.5 })
            .collect();
        for v in rsi(&data, RSI_PERIOD).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn macd_signal_is_defined_from_expected_index() {
        let data: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 * 0.3).sin()).collect();
        let out = macd(&data, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

        assert_eq!(out.macd.iter().position(Option::is_some), Some(MACD_SLOW - 1));
        assert_eq!(
            out.signal.iter().position(Option::is_some),
            Some(MACD_MIN_BARS - 2)
        );
        assert_eq!(out.histogram.len(), data.len());

        let m = last(&out.macd).unwrap();
        let s = last(&out.signal).unwrap();
        assert!(approx(last(&out.histogram).unwrap(), m - s));
    }

    #[test]
    fn macd_is_positive_in_uptrend() {
        let data: Vec<f64> = (0..60).map(|i| 10.0 + i as f64).collect();
        let out = macd(&data, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        assert!(last(&out.macd).unwrap() > 0.0);
    }

    #[test]
    fn rolling_mean_includes_current_value() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = rolling_mean(&data, 3);
        assert_eq!(out[..2], [None, None]);
        assert!(approx(out[2].unwrap(), 2.0));
        assert!(approx(out[4].unwrap(), 4.0));
    }

    #[test]
    fn rolling_mean_insufficient_data() {
        assert!(rolling_mean(&[1.0, 2.0], 3).iter().all(Option::is_none));
    }

    #[test]
    fn previous_reads_second_to_last() {
        let s = [None, Some(1.0), Some(2.0)];
        assert_eq!(previous(&s), Some(1.0));
        assert_eq!(previous(&s[..1]), None);
    }
}
