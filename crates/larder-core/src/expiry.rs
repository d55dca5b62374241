use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{models::FoodItem, Error, Result};

/// Items expiring within this many days show up in the expiring view.
pub const EXPIRY_WINDOW_DAYS: i64 = 14;

/// Whole days until an expiration date, relative to a caller-supplied "today".
///
/// Both sides are calendar dates, so the subtraction is exact: an item
/// expiring today yields 0, tomorrow yields 1, yesterday yields -1. There is
/// no timestamp drift to round away.
///
/// A missing date is an error here, never a silent "expired".
pub fn days_left(expiration: Option<NaiveDate>, today: NaiveDate) -> Result<i64> {
    let expiration = expiration.ok_or(Error::MissingDate)?;
    Ok((expiration - today).num_days())
}

/// Parse a user-supplied expiration date (YYYY-MM-DD).
///
/// Unparsable input is reported the same way as absent input: the save
/// precondition is "a usable date exists", and neither form satisfies it.
pub fn parse_expiration_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| Error::MissingDate)
}

/// Urgency classification for a saved item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Urgency {
    /// Expires today or already past
    Expired,
    /// 1-3 days left
    Critical,
    /// 4-14 days left
    Soon,
    /// More than 14 days out - excluded from the expiring view
    NotSoon,
}

impl Urgency {
    pub fn from_days_left(days: i64) -> Self {
        match days {
            d if d <= 0 => Urgency::Expired,
            1..=3 => Urgency::Critical,
            4..=EXPIRY_WINDOW_DAYS => Urgency::Soon,
            _ => Urgency::NotSoon,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Expired => "Expired",
            Urgency::Critical => "Critical",
            Urgency::Soon => "Soon",
            Urgency::NotSoon => "Not soon",
        }
    }

    pub fn color_code(&self) -> &'static str {
        match self {
            Urgency::Expired | Urgency::Critical => "red",
            Urgency::Soon => "orange",
            Urgency::NotSoon => "green",
        }
    }
}

/// A saved item annotated with its expiry computation for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiringItem {
    pub days_left: i64,
    pub urgency: Urgency,
    pub item: FoodItem,
}

/// Select and order the items expiring within the window.
///
/// Includes items whose days-left falls in [0, EXPIRY_WINDOW_DAYS]: expired-
/// today counts, expired-before-today does not. Items without an expiration
/// date are skipped, not errored. Output is most-urgent-first: ascending
/// days-left, ties broken by oldest save first so the ordering is
/// deterministic.
///
/// This is recomputed from scratch on every call - no cached state.
pub fn expiring_within_window(items: Vec<FoodItem>, today: NaiveDate) -> Vec<ExpiringItem> {
    let mut expiring: Vec<ExpiringItem> = items
        .into_iter()
        .filter_map(|item| {
            let days = days_left(item.expiration_date, today).ok()?;
            if !(0..=EXPIRY_WINDOW_DAYS).contains(&days) {
                return None;
            }
            Some(ExpiringItem {
                days_left: days,
                urgency: Urgency::from_days_left(days),
                item,
            })
        })
        .collect();

    expiring.sort_by(|a, b| {
        a.days_left
            .cmp(&b.days_left)
            .then_with(|| a.item.created_at.cmp(&b.item.created_at))
    });

    expiring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Unit;
    use chrono::{Duration, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item_expiring(code: &str, expiration: Option<NaiveDate>, saved_offset_secs: i64) -> FoodItem {
        FoodItem {
            id: format!("id-{code}"),
            owner_id: "alice".into(),
            code: code.into(),
            product_name: "No name".into(),
            brands: "Unknown".into(),
            image_url: String::new(),
            nutriscore_grade: None,
            quantity: 1,
            unit: Unit::Items,
            expiration_date: expiration,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
                + Duration::seconds(saved_offset_secs),
        }
    }

    #[test]
    fn test_days_left_same_day_is_zero() {
        let today = date(2026, 8, 7);
        assert_eq!(days_left(Some(today), today).unwrap(), 0);
    }

    #[test]
    fn test_days_left_missing_date_errors() {
        let err = days_left(None, date(2026, 8, 7)).unwrap_err();
        assert!(matches!(err, Error::MissingDate));
    }

    #[test]
    fn test_days_left_signed() {
        let today = date(2026, 8, 7);
        assert_eq!(days_left(Some(date(2026, 8, 9)), today).unwrap(), 2);
        assert_eq!(days_left(Some(date(2026, 8, 6)), today).unwrap(), -1);
    }

    #[test]
    fn test_parse_expiration_date() {
        assert_eq!(
            parse_expiration_date("2026-08-20").unwrap(),
            date(2026, 8, 20)
        );
        assert_eq!(parse_expiration_date(" 2026-08-20 ").unwrap(), date(2026, 8, 20));
        assert!(matches!(
            parse_expiration_date("20/08/2026").unwrap_err(),
            Error::MissingDate
        ));
        assert!(matches!(
            parse_expiration_date("").unwrap_err(),
            Error::MissingDate
        ));
    }

    #[test]
    fn test_urgency_from_days_left() {
        assert_eq!(Urgency::from_days_left(-5), Urgency::Expired);
        assert_eq!(Urgency::from_days_left(0), Urgency::Expired);
        assert_eq!(Urgency::from_days_left(1), Urgency::Critical);
        assert_eq!(Urgency::from_days_left(3), Urgency::Critical);
        assert_eq!(Urgency::from_days_left(4), Urgency::Soon);
        assert_eq!(Urgency::from_days_left(14), Urgency::Soon);
        assert_eq!(Urgency::from_days_left(15), Urgency::NotSoon);
    }

    #[test]
    fn test_urgency_colors() {
        assert_eq!(Urgency::Expired.color_code(), "red");
        assert_eq!(Urgency::Critical.color_code(), "red");
        assert_eq!(Urgency::Soon.color_code(), "orange");
    }

    #[test]
    fn test_window_includes_bounds_and_excludes_rest() {
        let today = date(2026, 8, 7);
        let items = vec![
            item_expiring("today", Some(today), 0),
            item_expiring("edge", Some(today + Duration::days(14)), 0),
            item_expiring("past", Some(today - Duration::days(1)), 0),
            item_expiring("far", Some(today + Duration::days(20)), 0),
            item_expiring("undated", None, 0),
        ];

        let expiring = expiring_within_window(items, today);
        let codes: Vec<&str> = expiring.iter().map(|e| e.item.code.as_str()).collect();
        assert_eq!(codes, vec!["today", "edge"]);
        assert_eq!(expiring[0].urgency, Urgency::Expired);
        assert_eq!(expiring[1].urgency, Urgency::Soon);
    }

    #[test]
    fn test_window_orders_by_urgency_then_save_time() {
        let today = date(2026, 8, 7);
        let items = vec![
            item_expiring("soon", Some(today + Duration::days(10)), 0),
            item_expiring("critical-late", Some(today + Duration::days(2)), 60),
            item_expiring("critical-early", Some(today + Duration::days(2)), 0),
            item_expiring("expired", Some(today), 0),
        ];

        let expiring = expiring_within_window(items, today);
        let codes: Vec<&str> = expiring.iter().map(|e| e.item.code.as_str()).collect();
        assert_eq!(
            codes,
            vec!["expired", "critical-early", "critical-late", "soon"]
        );
        assert_eq!(expiring[1].days_left, 2);
        assert_eq!(expiring[1].urgency, Urgency::Critical);
    }

    #[test]
    fn test_window_recomputes_per_reference_date() {
        let exp = date(2026, 8, 21);
        let items = vec![item_expiring("x", Some(exp), 0)];

        // 20 days out: not in the window yet.
        assert!(expiring_within_window(items.clone(), date(2026, 8, 1)).is_empty());
        // 14 days out: enters the window.
        assert_eq!(expiring_within_window(items, date(2026, 8, 7)).len(), 1);
    }
}
