//! Number formatting and file naming helpers used by dataset scripts.

/// Unit family for [`format_unit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// Powers of 1000: K, M, B, T
    Si,
    /// Powers of 1024: K, M, G, T, P, Exa
    Binary,
    /// Seconds: ms, sec, min, h, days
    Time,
}

impl Scale {
    /// Map the conventional numeric base (1000, 1024, 60) to a scale.
    pub fn from_base(base: i64) -> Option<Self> {
        match base {
            1000 => Some(Scale::Si),
            1024 => Some(Scale::Binary),
            60 => Some(Scale::Time),
            _ => None,
        }
    }
}

fn plain(num: f64) -> String {
    if num.fract() == 0.0 && num.abs() < 1e15 {
        format!("{}", num as i64)
    } else {
        format!("{}", num)
    }
}

/// Format a large number with a unit suffix and two decimals.
pub fn format_unit(num: f64, scale: Scale) -> String {
    match scale {
        Scale::Si => {
            const SUFFIXES: [(f64, &str); 4] = [(1e3, "K"), (1e6, "M"), (1e9, "B"), (1e12, "T")];
            if num < 1e3 {
                return plain(num);
            }
            let (unit, suffix) = SUFFIXES
                .iter()
                .rev()
                .find(|(unit, _)| num >= *unit)
                .copied()
                .unwrap_or(SUFFIXES[0]);
            format!("{:.2}{}", num / unit, suffix)
        }
        Scale::Binary => {
            const SUFFIXES: [&str; 6] = ["K", "M", "G", "T", "P", "Exa"];
            if num < 1024.0 {
                return plain(num);
            }
            let mut exp = 1;
            while exp < SUFFIXES.len() && num >= 1024f64.powi(exp as i32 + 1) {
                exp += 1;
            }
            format!("{:.2}{}", num / 1024f64.powi(exp as i32), SUFFIXES[exp - 1])
        }
        Scale::Time => {
            if num < 1.0 {
                format!("{:.2}ms", num * 1000.0)
            } else if num < 60.0 {
                format!("{:.2}sec", num)
            } else if num < 3600.0 {
                format!("{:.2}min", num / 60.0)
            } else if num < 86400.0 {
                format!("{:.2}h", num / 3600.0)
            } else {
                let days = (num / 86400.0).floor();
                let hours = (num % 86400.0) / 3600.0;
                format!("{}d {:.1}h", days as i64, hours)
            }
        }
    }
}

/// Dataset base name: directories stripped (both separators), a trailing
/// `_L<digits>` line-count marker removed, then everything after the first `.`.
pub fn basename_from_path(path: &str) -> String {
    let mut base = path;
    if let Some((_, right)) = base.rsplit_once('/') {
        base = right;
    }
    if let Some((_, right)) = base.rsplit_once('\\') {
        base = right;
    }
    if let Some((left, right)) = base.rsplit_once("_L") {
        if right.starts_with(|c: char| c.is_ascii_digit()) {
            base = left;
        }
    }
    base.split('.').next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_si_units() {
        assert_eq!(format_unit(999.0, Scale::Si), "999");
        assert_eq!(format_unit(1500.0, Scale::Si), "1.50K");
        assert_eq!(format_unit(2_500_000.0, Scale::Si), "2.50M");
        assert_eq!(format_unit(7_000_000_000.0, Scale::Si), "7.00B");
        assert_eq!(format_unit(3.2e15, Scale::Si), "3200.00T");
    }

    #[test]
    fn test_binary_units() {
        assert_eq!(format_unit(512.0, Scale::Binary), "512");
        assert_eq!(format_unit(2048.0, Scale::Binary), "2.00K");
        assert_eq!(format_unit(3.0 * 1024.0 * 1024.0, Scale::Binary), "3.00M");
        assert_eq!(format_unit(1024f64.powi(7), Scale::Binary), "1024.00Exa");
    }

    #[test]
    fn test_time_units() {
        assert_eq!(format_unit(0.25, Scale::Time), "250.00ms");
        assert_eq!(format_unit(12.0, Scale::Time), "12.00sec");
        assert_eq!(format_unit(90.0, Scale::Time), "1.50min");
        assert_eq!(format_unit(5400.0, Scale::Time), "1.50h");
        assert_eq!(format_unit(86400.0 * 2.0 + 5400.0, Scale::Time), "2d 1.5h");
    }

    #[test]
    fn test_scale_from_base() {
        assert_eq!(Scale::from_base(1024), Some(Scale::Binary));
        assert_eq!(Scale::from_base(7), None);
    }

    #[test]
    fn test_basename_from_path() {
        assert_eq!(basename_from_path("data/wiki_L12000.jsonl.zst"), "wiki");
        assert_eq!(basename_from_path("C:\\data\\train.jsonl"), "train");
        assert_eq!(basename_from_path("jhumaneval.jsonl"), "jhumaneval");
        assert_eq!(basename_from_path("a/b_Lx.csv"), "b_Lx");
        assert_eq!(basename_from_path("plain"), "plain");
    }
}
