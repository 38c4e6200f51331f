//! Day distribution for programs that don't pin weekdays.
//!
//! Spreads "N workouts per week" over fixed weekdays, avoiding Sunday
//! unless every day of the week is used.

/// Weekday layouts indexed by workouts per week (1..=7), 0 = Sunday
const DISTRIBUTIONS: [&[u8]; 7] = [
    &[1],
    &[1, 4],
    &[1, 3, 5],
    &[1, 2, 4, 5],
    &[1, 2, 3, 4, 5],
    &[1, 2, 3, 4, 5, 6],
    &[0, 1, 2, 3, 4, 5, 6],
];

/// Weekdays to use for `n` workouts per week.
///
/// Values outside 1..=7 are clamped to 7.
pub fn distribute(n: usize) -> &'static [u8] {
    let n = if (1..=7).contains(&n) { n } else { 7 };
    DISTRIBUTIONS[n - 1]
}

/// Weekday for the i-th populated day (author order) out of `total`
pub fn weekday_for(index: usize, total: usize) -> u8 {
    let days = distribute(total);
    days[index % days.len()]
}
