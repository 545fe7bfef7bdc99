// Utility helpers for cell parsing, basic statistics and number formatting.
//
// Everything that touches raw CSV text or floating-point edge cases lives
// here so the engines can work with clean, typed values.
use num_format::{Locale, ToFormattedString};
use std::cmp::Ordering;

/// Parse a CSV cell into `f64`.
///
/// - Trims whitespace and strips thousands separators (`1,234.5`).
/// - Returns `None` for empty cells and for anything that is not a finite
///   number (`NaN`, `inf`).
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a CSV cell into a non-negative count.
///
/// Whole-valued floats such as `120.0` are accepted because spreadsheet
/// exports frequently widen integer columns.
pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<u32>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(s))?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i32>() {
        return Some(v);
    }
    let f = parse_f64_safe(Some(s))?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Mean of `values`, 0 when there are none.
pub fn average(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<f64>() / n as f64,
    }
}

pub fn median(v: Vec<f64>) -> f64 {
    quantile(v, 0.5)
}

/// Quantile with linear interpolation between closest ranks.
///
/// Takes the vector by value so it can be sorted in place. Returns 0 for an
/// empty input.
pub fn quantile(mut v: Vec<f64>, q: f64) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let pos = q.clamp(0.0, 1.0) * (v.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    v[lo] + (v[hi] - v[lo]) * (pos - lo as f64)
}

/// Pearson correlation coefficient.
///
/// `None` when fewer than two points are given or either side has zero
/// variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = average(xs);
    let my = average(ys);
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Ordinary-least-squares line `y = slope * x + intercept`.
///
/// Requires at least two distinct x-values; otherwise the slope is
/// undefined and `None` is returned.
pub fn ols(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || distinct_count(xs) < 2 {
        return None;
    }
    let mx = average(xs);
    let my = average(ys);
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx) * (x - mx);
    }
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
}

fn distinct_count(xs: &[f64]) -> usize {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
    sorted.len()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators, e.g. `1,234.50`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // No sign when the rounded value is zero.
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Students, rows and tallies with `en` thousands separators.
pub fn format_count<N: ToFormattedString>(count: N) -> String {
    count.to_formatted_string(&Locale::en)
}

/// Render an optional value, using `n/a` for anything undefined.
pub fn format_optional(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format_number(v, decimals),
        None => "n/a".to_string(),
    }
}

/// Render a year-over-year delta with an explicit sign and unit suffix.
///
/// An absent delta is always `n/a`, never `+0`.
pub fn format_delta(delta: Option<f64>, decimals: usize, suffix: &str) -> String {
    match delta {
        Some(d) => {
            let body = format_number(d, decimals);
            if body.starts_with('-') || body.chars().all(|c| !c.is_ascii_digit() || c == '0') {
                format!("{}{}", body, suffix)
            } else {
                format!("+{}{}", body, suffix)
            }
        }
        None => "n/a".to_string(),
    }
}
