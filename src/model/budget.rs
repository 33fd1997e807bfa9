use crate::model::{Amount, Category};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weekly spending ceilings keyed by category. Every category is always present; a category
/// without a stored row has a ceiling of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetTargets(BTreeMap<Category, Amount>);

impl Default for BudgetTargets {
    fn default() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, Amount::ZERO)).collect())
    }
}

impl BudgetTargets {
    /// Builds targets from stored rows, filling in zero for any missing category.
    pub fn new(rows: impl IntoIterator<Item = (Category, Amount)>) -> Self {
        let mut targets = Self::default();
        for (category, amount) in rows {
            targets.0.insert(category, amount);
        }
        targets
    }

    /// The weekly ceiling for `category`.
    pub fn weekly(&self, category: Category) -> Amount {
        self.0.get(&category).copied().unwrap_or_default()
    }

    /// The sum of all weekly ceilings.
    pub fn weekly_total(&self) -> Amount {
        self.0.values().copied().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Amount)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_missing_categories_are_zero() {
        let targets = BudgetTargets::new(vec![(
            Category::Groceries,
            Amount::from_str("150").unwrap(),
        )]);
        assert_eq!(targets.iter().count(), 10);
        assert_eq!(
            targets.weekly(Category::Groceries),
            Amount::from_str("150").unwrap()
        );
        assert!(targets.weekly(Category::Shopping).is_zero());
        assert_eq!(targets.weekly_total(), Amount::from_str("150").unwrap());
    }
}
