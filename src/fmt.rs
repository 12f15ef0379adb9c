fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));
    let with_commas = group_thousands(int_part);

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// A plain column sum: 1,250 or 2.50, no currency sign.
pub fn plain_number(val: f64) -> String {
    let digits = if val.fract() == 0.0 {
        format!("{:.0}", val.abs())
    } else {
        format!("{:.2}", val.abs())
    };
    let (int_part, dec_part) = match digits.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (digits.as_str(), None),
    };
    let sign = if val < 0.0 { "-" } else { "" };
    let with_commas = group_thousands(int_part);
    match dec_part {
        Some(d) => format!("{sign}{with_commas}.{d}"),
        None => format!("{sign}{with_commas}"),
    }
}

/// An aggregate total, as money or as a plain number.
pub fn amount(val: f64, is_money: bool) -> String {
    if is_money {
        money(val)
    } else {
        plain_number(val)
    }
}

/// Format a count with thousands separators: 12,345
pub fn number(val: usize) -> String {
    group_thousands(&val.to_string())
}

/// Compact axis label: $950, $1.5k, $12k, $2M (no `$` for plain sums)
pub fn compact_amount(val: f64, is_money: bool) -> String {
    let sign = if is_money { "$" } else { "" };
    if val >= 1_000_000.0 {
        let m = val / 1_000_000.0;
        if m == m.floor() {
            format!("{sign}{}M", m as u64)
        } else {
            format!("{sign}{:.1}M", m)
        }
    } else if val >= 1000.0 {
        let k = val / 1000.0;
        if k == k.floor() {
            format!("{sign}{}k", k as u64)
        } else {
            format!("{sign}{:.1}k", k)
        }
    } else {
        format!("{sign}{}", val.round() as u64)
    }
}

/// Statistic cell: two decimals, `NaN` spelled out.
pub fn stat(val: f64) -> String {
    if val.is_nan() {
        "NaN".to_string()
    } else {
        format!("{val:.2}")
    }
}
