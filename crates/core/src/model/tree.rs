use crate::error::PredictionError;
use crate::features::FeatureRow;
use crate::model::Predictor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

/// Additive regression-tree ensemble (XGBoost-style dump).
///
/// Each tree is a flat node list rooted at index 0. A split sends the row left when
/// `x[feature] < threshold`. The output is `base_score` plus the sum of the reached leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    #[serde(default)]
    pub base_score: f64,
    pub n_features: usize,
    pub trees: Vec<Vec<TreeNode>>,
}

impl GradientBoostedTrees {
    fn eval_tree(tree_idx: usize, nodes: &[TreeNode], x: &[f64]) -> Result<f64, PredictionError> {
        let mut idx = 0usize;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes.
        for _ in 0..nodes.len() {
            let node = nodes.get(idx).ok_or_else(|| {
                PredictionError::InvalidModel(format!(
                    "tree {tree_idx} references missing node {idx}"
                ))
            })?;
            match node {
                TreeNode::Leaf { leaf } => return Ok(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = x.get(*feature).ok_or_else(|| {
                        PredictionError::InvalidModel(format!(
                            "tree {tree_idx} splits on feature {feature} outside the row"
                        ))
                    })?;
                    idx = if *value < *threshold { *left } else { *right };
                }
            }
        }

        Err(PredictionError::InvalidModel(format!(
            "tree {tree_idx} does not terminate in a leaf"
        )))
    }
}

impl Predictor for GradientBoostedTrees {
    fn kind(&self) -> &'static str {
        "gradient_boosted"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        if row.len() != self.n_features {
            return Err(PredictionError::ShapeMismatch {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let x = row.values();
        let mut out = self.base_score;
        for (tree_idx, nodes) in self.trees.iter().enumerate() {
            out += Self::eval_tree(tree_idx, nodes, x)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> GradientBoostedTrees {
        serde_json::from_value(json!({
            "base_score": 0.5,
            "n_features": 2,
            "trees": [
                [
                    {"feature": 0, "threshold": 10.0, "left": 1, "right": 2},
                    {"leaf": 1.0},
                    {"feature": 1, "threshold": 0.5, "left": 3, "right": 4},
                    {"leaf": 2.0},
                    {"leaf": 3.0}
                ],
                [
                    {"leaf": 0.25}
                ]
            ]
        }))
        .unwrap()
    }

    fn row(a: f64, b: f64) -> FeatureRow {
        [("a".to_string(), a), ("b".to_string(), b)]
            .into_iter()
            .collect()
    }

    #[test]
    fn walks_each_tree_to_a_leaf() {
        let m = model();
        assert_eq!(m.predict(&row(5.0, 0.0)).unwrap(), 0.5 + 1.0 + 0.25);
        assert_eq!(m.predict(&row(20.0, 0.0)).unwrap(), 0.5 + 2.0 + 0.25);
        assert_eq!(m.predict(&row(20.0, 1.0)).unwrap(), 0.5 + 3.0 + 0.25);
    }

    #[test]
    fn rejects_wrong_width() {
        let one: FeatureRow = [("a".to_string(), 1.0)].into_iter().collect();
        assert!(matches!(
            model().predict(&one),
            Err(PredictionError::ShapeMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn reports_dangling_node_reference() {
        let m = GradientBoostedTrees {
            base_score: 0.0,
            n_features: 2,
            trees: vec![vec![TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                left: 7,
                right: 7,
            }]],
        };
        assert!(matches!(
            m.predict(&row(0.0, 0.0)),
            Err(PredictionError::InvalidModel(_))
        ));
    }

    #[test]
    fn reports_cycles() {
        let m = GradientBoostedTrees {
            base_score: 0.0,
            n_features: 2,
            trees: vec![vec![TreeNode::Split {
                feature: 0,
                threshold: 1.0,
                left: 0,
                right: 0,
            }]],
        };
        assert!(matches!(
            m.predict(&row(0.0, 0.0)),
            Err(PredictionError::InvalidModel(_))
        ));
    }
}
