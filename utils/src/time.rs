//! Duration formatting for log fields.

const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

/// Render `secs` as its two most significant non-zero units, e.g. `"14d"`,
/// `"2m 5s"` or `"1d 3h"`. Zero renders as `"0s"`.
pub fn format_duration(secs: u64) -> String {
    let mut rest = secs;
    let parts: Vec<String> = UNITS
        .iter()
        .filter_map(|&(size, suffix)| {
            let n = rest / size;
            rest %= size;
            (n > 0).then(|| format!("{n}{suffix}"))
        })
        .take(2)
        .collect();
    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}
