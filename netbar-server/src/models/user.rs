use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use super::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub card_uid: String,
    pub username: String,
    /// National id number, only used to derive age
    #[serde(skip_serializing)]
    pub id_card: String,
    #[sqlx(try_from = "i64")]
    pub balance: Money,
    pub is_active: bool,
}

impl User {
    /// Age on `today` derived from the birth date embedded in the id number.
    ///
    /// 18-digit ids carry `YYYYMMDD` at offset 6, legacy 15-digit ids carry
    /// `YYMMDD` in the 1900s. Anything else yields `None`.
    pub fn age_on(&self, today: Date) -> Option<u32> {
        let id = self.id_card.trim();
        if !id.is_ascii() {
            return None;
        }

        let (year, month, day) = match id.len() {
            18 => (id[6..10].parse::<i32>().ok()?, &id[10..12], &id[12..14]),
            15 => (1900 + id[6..8].parse::<i32>().ok()?, &id[8..10], &id[10..12]),
            _ => return None,
        };

        let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
        let birth = Date::from_calendar_date(year, month, day.parse().ok()?).ok()?;

        if birth > today {
            return None;
        }

        let mut age = today.year() - birth.year();
        if (today.month() as u8, today.day()) < (birth.month() as u8, birth.day()) {
            age -= 1;
        }

        u32::try_from(age).ok()
    }
}

pub struct UserTable;

impl Table for UserTable {
    fn name(&self) -> &'static str {
        "users"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_uid TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL,
                id_card TEXT NOT NULL DEFAULT '',
                balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                is_active BOOLEAN NOT NULL DEFAULT 1
            );
            "#
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS users;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn user_with_id(id_card: &str) -> User {
        User {
            id: 1,
            card_uid: "031368FC".to_string(),
            username: "alice".to_string(),
            id_card: id_card.to_string(),
            balance: Money::ZERO,
            is_active: true,
        }
    }

    #[test]
    fn test_age_from_18_digit_id() {
        let user = user_with_id("110101200801150012");

        assert_eq!(user.age_on(date!(2026 - 01 - 14)), Some(17));
        assert_eq!(user.age_on(date!(2026 - 01 - 15)), Some(18));
    }

    #[test]
    fn test_age_from_15_digit_id() {
        let user = user_with_id("110101850620001");

        assert_eq!(user.age_on(date!(2026 - 10 - 18)), Some(41));
    }

    #[test]
    fn test_unparseable_id_has_no_age() {
        assert_eq!(user_with_id("").age_on(date!(2026 - 10 - 18)), None);
        assert_eq!(user_with_id("11010120081315001X").age_on(date!(2026 - 10 - 18)), None);
        assert_eq!(user_with_id("1101012099011500").age_on(date!(2026 - 10 - 18)), None);
    }
}
