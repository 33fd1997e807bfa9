use anyhow::bail;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The closed set of spending categories. Every budget target is keyed by one of these, and a
/// categorised transaction always carries one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    RestaurantsAndTakeaway,
    EntertainmentAndRecreation,
    ClothingAndAccessories,
    HealthAndBeauty,
    SubscriptionsAndMemberships,
    Groceries,
    Transportation,
    Shopping,
    LifeAdmin,
    Other,
}

impl Category {
    /// Every category, in the order they are seeded and displayed.
    pub const ALL: [Category; 10] = [
        Category::RestaurantsAndTakeaway,
        Category::EntertainmentAndRecreation,
        Category::ClothingAndAccessories,
        Category::HealthAndBeauty,
        Category::SubscriptionsAndMemberships,
        Category::Groceries,
        Category::Transportation,
        Category::Shopping,
        Category::LifeAdmin,
        Category::Other,
    ];

    /// The label stored in the database and shown to the user.
    pub const fn label(&self) -> &'static str {
        match self {
            Category::RestaurantsAndTakeaway => "Restaurants & Takeaway",
            Category::EntertainmentAndRecreation => "Entertainment & Recreation",
            Category::ClothingAndAccessories => "Clothing & Accessories",
            Category::HealthAndBeauty => "Health & Beauty",
            Category::SubscriptionsAndMemberships => "Subscriptions & Memberships",
            Category::Groceries => "Groceries",
            Category::Transportation => "Transportation",
            Category::Shopping => "Shopping",
            Category::LifeAdmin => "Life Admin",
            Category::Other => "Other",
        }
    }
}

/// Lower-cases, turns `&` into `and` and collapses whitespace so that "Health & Beauty",
/// "health and beauty" and "HEALTH  AND BEAUTY" compare equal.
fn normalize(s: &str) -> String {
    s.replace('&', " and ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        if let Some(c) = Category::ALL.iter().find(|c| normalize(c.label()) == wanted) {
            return Ok(*c);
        }
        // Labels that older data used for the same buckets
        let alias = match wanted.as_str() {
            "food" | "restaurants and cafes" | "takeaway" => Category::RestaurantsAndTakeaway,
            "entertain and recreation" | "entertainment" => Category::EntertainmentAndRecreation,
            "clothing" => Category::ClothingAndAccessories,
            "subscriptions" => Category::SubscriptionsAndMemberships,
            "transport" => Category::Transportation,
            _ => bail!(
                "Unknown category '{s}'. Expected one of: {}",
                Category::ALL
                    .iter()
                    .map(Category::label)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        };
        Ok(alias)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Category::from_str(&s).map_err(serde::de::Error::custom)
    }
}
