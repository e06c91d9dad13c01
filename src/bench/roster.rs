//! The fixed estimator lineup

use super::RosterEntry;
use crate::models::{
    DecisionTree, GaussianNaiveBayes, KNNClassifier, LinearDiscriminantAnalysis,
    LogisticRegression, RandomForestClassifier, SVMClassifier, SVMConfig,
};

/// Build the default seven-estimator roster in its fixed order.
///
/// The order is part of the contract: ties in validation accuracy resolve
/// by it, so a fixed seed plus a fixed roster gives a fixed ranking.
/// Estimators with internal randomness all take the same `seed`.
pub fn default_roster(seed: u64) -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("Logistic Regression", Box::new(LogisticRegression::new())),
        RosterEntry::new(
            "Linear Discriminant Analysis",
            Box::new(LinearDiscriminantAnalysis::new()),
        ),
        RosterEntry::new("K Nearest Neighbors", Box::new(KNNClassifier::with_k(5))),
        RosterEntry::new(
            "Decision Tree",
            Box::new(DecisionTree::new().with_random_state(seed)),
        ),
        RosterEntry::new("Gaussian Naive Bayes", Box::new(GaussianNaiveBayes::new())),
        RosterEntry::new(
            "Random Forest",
            Box::new(RandomForestClassifier::new(100).with_random_state(seed)),
        ),
        RosterEntry::new(
            "Support Vector Machine",
            Box::new(SVMClassifier::new(SVMConfig {
                random_state: Some(seed),
                ..Default::default()
            })),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_names_and_order() {
        let roster = default_roster(1);
        let names: Vec<&str> = roster.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Logistic Regression",
                "Linear Discriminant Analysis",
                "K Nearest Neighbors",
                "Decision Tree",
                "Gaussian Naive Bayes",
                "Random Forest",
                "Support Vector Machine",
            ]
        );
    }

    #[test]
    fn test_roster_is_rebuildable() {
        let a = default_roster(7);
        let b = default_roster(7);
        assert_eq!(a.len(), b.len());
        for (ea, eb) in a.iter().zip(b.iter()) {
            assert_eq!(ea.name, eb.name);
        }
    }
}
