//! Estimated integral term contributions, used to start the integral without
//! winding it up from zero.

/// (set point minus outside temperature in celcius, integral term in volts).
/// Assigned from expected steady state drive, not measured. Both columns
/// must increase monotonically.
pub static INTEGRAL_BOOTSTRAP_TABLE: [(f32, f32); 12] = [
    (-15.0, -12.0),
    (-10.0, -8.0),
    (-5.0, -4.0),
    (0.0, 0.0),
    (5.0, 1.5),
    (10.0, 3.0),
    (15.0, 4.5),
    (20.0, 6.0),
    (25.0, 7.5),
    (30.0, 9.0),
    (35.0, 10.5),
    (40.0, 12.0),
];

/// Contribution of the entry closest to `temp_diff_c`.
///
/// Walks the table until the distance stops shrinking, so ties go to the lower
/// entry. Beyond either end the nearest end entry is used.
pub fn lookup_contribution(table: &[(f32, f32)], temp_diff_c: f32) -> f32 {
    let (first, rest) = match table.split_first() {
        Some(split) => split,
        None => return 0.0,
    };

    let mut best = first;

    for entry in rest {
        if (temp_diff_c - entry.0).abs() < (temp_diff_c - best.0).abs() {
            best = entry;
        } else {
            break;
        }
    }

    best.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_monotonic() {
        for pair in INTEGRAL_BOOTSTRAP_TABLE.windows(2) {
            assert!(pair[1].0 > pair[0].0);
            assert!(pair[1].1 > pair[0].1);
        }
    }

    #[test]
    fn exact_entries() {
        for (diff, contribution) in INTEGRAL_BOOTSTRAP_TABLE {
            assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, diff), contribution);
        }
    }

    #[test]
    fn nearest_entry() {
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, 11.0), 3.0);
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, 13.0), 4.5);
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, -7.0), -4.0);
    }

    #[test]
    fn tie_goes_low() {
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, 12.5), 3.0);
    }

    #[test]
    fn beyond_ends_clamp() {
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, 90.0), 12.0);
        assert_eq!(lookup_contribution(&INTEGRAL_BOOTSTRAP_TABLE, -40.0), -12.0);
    }

    #[test]
    fn empty_table() {
        assert_eq!(lookup_contribution(&[], 10.0), 0.0);
    }
}
