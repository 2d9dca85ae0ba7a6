//! Fake data generation helpers.
//!
//! Provides deterministic fake data for names, emails, products, prices and dates.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rand::Rng;

/// First names for fake data
const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate",
    "Leo", "Maya", "Noah", "Olivia", "Peter", "Quinn", "Rose", "Sam", "Tara", "Uma", "Victor",
    "Wendy", "Xavier", "Yara", "Zack", "Anna", "Brian", "Clara", "Derek",
];

/// Last names for fake data
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Anderson", "Taylor", "Thomas", "Moore", "Jackson", "Martin", "Lee", "Thompson", "White",
    "Harris", "Clark", "Lewis", "Robinson", "Walker", "Hall", "Young", "King", "Wright", "Hill",
];

const EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "mail.test",
    "shop.test",
];

/// Product adjectives
const PRODUCT_ADJECTIVES: &[&str] = &[
    "Premium", "Pro", "Ultra", "Super", "Mega", "Mini", "Lite", "Plus", "Max", "Elite", "Advanced",
    "Basic", "Standard", "Classic", "Modern", "Smart", "Quick", "Easy", "Fast",
];

/// Product nouns
const PRODUCT_NOUNS: &[&str] = &[
    "Widget",
    "Gadget",
    "Device",
    "Tool",
    "Kit",
    "Pack",
    "Set",
    "Bundle",
    "System",
    "Module",
    "Component",
    "Unit",
    "Item",
    "Speaker",
    "Lamp",
    "Backpack",
    "Bottle",
    "Charger",
];

/// Category names
const CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
    "Food & Beverage",
    "Health",
    "Beauty",
    "Automotive",
    "Office",
    "Pet Supplies",
    "Music",
    "Movies",
    "Software",
];

/// Seeded source of fake values
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn choose(&mut self, words: &'static [&'static str]) -> &'static str {
        words[self.rng.random_range(0..words.len())]
    }

    pub fn first_name(&mut self) -> &'static str {
        self.choose(FIRST_NAMES)
    }

    pub fn last_name(&mut self) -> &'static str {
        self.choose(LAST_NAMES)
    }

    /// `first.last<serial>@domain`, unique as long as `serial` is
    pub fn email(&mut self, first: &str, last: &str, serial: u64) -> String {
        let domain = self.choose(EMAIL_DOMAINS);
        format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            serial,
            domain
        )
    }

    /// "Adjective Noun NNN"
    pub fn product_name(&mut self) -> String {
        let adjective = self.choose(PRODUCT_ADJECTIVES);
        let noun = self.choose(PRODUCT_NOUNS);
        let model: u32 = self.rng.random_range(100..1000);
        format!("{adjective} {noun} {model}")
    }

    pub fn category(&mut self) -> &'static str {
        self.choose(CATEGORIES)
    }

    /// Amount in `[min, max)`, rounded to cents
    pub fn price(&mut self, min: f64, max: f64) -> f64 {
        let cents = (self.rng.random_range(min..max) * 100.0).round();
        cents / 100.0
    }

    /// Integer in `[min, max]`
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Date between `anchor - days_back` and `anchor`, inclusive
    pub fn date_before(&mut self, anchor: NaiveDate, days_back: i64) -> NaiveDate {
        let offset = self.rng.random_range(0..=days_back.max(0));
        anchor - Duration::days(offset)
    }

    /// Timestamp on a day within the window, at a random second of that day
    pub fn datetime_before(&mut self, anchor: NaiveDate, days_back: i64) -> NaiveDateTime {
        let date = self.date_before(anchor, days_back);
        let secs: u32 = self.rng.random_range(0..86_400);
        let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN);
        date.and_time(time)
    }

    /// Random element of a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Random key from a non-empty slice
    pub fn pick_id(&mut self, ids: &[i64]) -> i64 {
        *self.pick(ids)
    }
}
