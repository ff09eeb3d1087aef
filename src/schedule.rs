// ⏰ Installment Schedule - Calendar math for commitment expansion
//
// Three rules live here:
// 1. Calendar-month addition: installment i is dated reference + i months,
//    preserving day-of-month where valid and clamping to month-end otherwise
//    (Jan 31 + 1 month = Feb 28/29).
// 2. Credit-card reference date: a purchase on or after the card's closing
//    day lands on NEXT month's due date; before it, on this month's due date.
// 3. Cent-exact installment split: amounts are divided in integer cents and
//    the last installment absorbs the remainder, so the entries always sum
//    to the committed total.

use chrono::{Datelike, Months, NaiveDate};

/// Add `months` calendar months, clamping the day to the target month's end.
///
/// Example:
/// ```
/// use chrono::NaiveDate;
/// use finance_cockpit::schedule::add_months;
///
/// let jan31 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// assert_eq!(add_months(jan31, 1), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
/// ```
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date + Months::new(months)
}

/// Build a date in the given year/month, clamping `day` to the month's length.
pub fn clamped_date(year: i32, month: u32, day: u32) -> NaiveDate {
    let mut day = day.min(31);
    loop {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return date;
        }
        // day beyond month end (e.g. 31 in April), walk back to the last valid one
        day -= 1;
    }
}

/// Reference date for a credit-card purchase.
///
/// The installment sequence is NOT anchored on the purchase date: if the
/// purchase happens on or after the statement's closing day, it only shows up
/// on next month's invoice, due on `due_day`.
pub fn credit_reference_date(purchase: NaiveDate, closing_day: u32, due_day: u32) -> NaiveDate {
    let candidate = clamped_date(purchase.year(), purchase.month(), due_day);

    if purchase.day() >= closing_day {
        add_months(candidate, 1)
    } else {
        candidate
    }
}

/// Split `total` into `count` installment amounts, exact in cents.
///
/// Every installment gets `total / count` floored to the cent; the last one
/// absorbs the remainder. The returned amounts always sum to `total` within
/// one cent of float representation.
pub fn split_installments(total: f64, count: u32) -> Vec<f64> {
    assert!(count >= 1, "installment count must be at least 1");

    let total_cents = (total * 100.0).round() as i64;
    let base_cents = total_cents / count as i64;

    let mut amounts = vec![base_cents as f64 / 100.0; count as usize];
    let last_cents = total_cents - base_cents * (count as i64 - 1);
    amounts[count as usize - 1] = last_cents as f64 / 100.0;

    amounts
}

/// Dates for `count` installments anchored at `reference`.
pub fn installment_dates(reference: NaiveDate, count: u32) -> Vec<NaiveDate> {
    (0..count).map(|i| add_months(reference, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_preserves_day() {
        assert_eq!(add_months(date(2026, 1, 10), 1), date(2026, 2, 10));
        assert_eq!(add_months(date(2026, 1, 10), 11), date(2026, 12, 10));
        assert_eq!(add_months(date(2026, 11, 15), 2), date(2027, 1, 15));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2026, 1, 31), 1), date(2026, 2, 28));
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29)); // leap year
        assert_eq!(add_months(date(2026, 3, 31), 1), date(2026, 4, 30));
    }

    #[test]
    fn test_clamped_date() {
        assert_eq!(clamped_date(2026, 4, 31), date(2026, 4, 30));
        assert_eq!(clamped_date(2026, 2, 30), date(2026, 2, 28));
        assert_eq!(clamped_date(2026, 7, 15), date(2026, 7, 15));
    }

    #[test]
    fn test_credit_anchor_before_closing() {
        // Card closes on the 25th, due on the 5th.
        // Purchase on the 10th → current month's due date.
        let anchor = credit_reference_date(date(2026, 3, 10), 25, 5);
        assert_eq!(anchor, date(2026, 3, 5));
    }

    #[test]
    fn test_credit_anchor_on_or_after_closing() {
        // Purchase ON the closing day already misses the statement.
        let anchor = credit_reference_date(date(2026, 3, 25), 25, 5);
        assert_eq!(anchor, date(2026, 4, 5));

        let anchor = credit_reference_date(date(2026, 3, 28), 25, 5);
        assert_eq!(anchor, date(2026, 4, 5));
    }

    #[test]
    fn test_credit_anchor_rolls_over_year() {
        let anchor = credit_reference_date(date(2026, 12, 27), 25, 10);
        assert_eq!(anchor, date(2027, 1, 10));
    }

    #[test]
    fn test_split_even() {
        let amounts = split_installments(12000.0, 12);
        assert_eq!(amounts.len(), 12);
        assert!(amounts.iter().all(|&a| a == 1000.0));
    }

    #[test]
    fn test_split_uneven_last_absorbs_remainder() {
        let amounts = split_installments(100.0, 3);
        assert_eq!(amounts, vec![33.33, 33.33, 33.34]);

        let cents: i64 = amounts.iter().map(|a| (a * 100.0).round() as i64).sum();
        assert_eq!(cents, 10000);
    }

    #[test]
    fn test_split_sum_is_exact_in_cents() {
        for &(total, n) in &[(999.99_f64, 7_u32), (0.01, 1), (1234.56, 5), (10.0, 3)] {
            let amounts = split_installments(total, n);
            let cents: i64 = amounts.iter().map(|a| (a * 100.0).round() as i64).sum();
            assert_eq!(cents, (total * 100.0).round() as i64, "total={} n={}", total, n);
        }
    }

    #[test]
    fn test_installment_dates() {
        let dates = installment_dates(date(2026, 1, 10), 12);
        assert_eq!(dates.len(), 12);
        assert_eq!(dates[0], date(2026, 1, 10));
        assert_eq!(dates[1], date(2026, 2, 10));
        assert_eq!(dates[11], date(2026, 12, 10));
    }
}
