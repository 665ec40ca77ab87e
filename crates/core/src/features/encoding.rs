use crate::domain::campaign::RawCampaignInput;
use crate::features::row::FeatureRow;
use std::collections::BTreeSet;

/// Choices offered by the campaign form for each categorical column, in the order their
/// indicator blocks are emitted.
pub const FORM_LEVELS: [(&str, &[&str]); 5] = [
    (
        "Channel",
        &["Facebook", "Google", "Instagram", "LinkedIn", "YouTube"],
    ),
    ("Objective", &["Awareness", "Leads", "Sales", "Traffic"]),
    ("Audience", &["Adults", "Professionals", "Seniors", "Youth"]),
    ("Geo", &["India", "SEA", "UK", "US"]),
    ("Creative_Type", &["Carousel", "Image", "Video"]),
];

#[derive(Debug, Clone, PartialEq)]
struct CategoricalColumn {
    name: String,
    /// Alphabetically first level. It gets no indicator column.
    reference: String,
    levels: BTreeSet<String>,
}

impl CategoricalColumn {
    fn new(name: &str, levels: &[&str]) -> Option<Self> {
        let mut sorted: BTreeSet<String> = levels.iter().map(|s| s.to_string()).collect();
        let reference = sorted.pop_first()?;
        Some(Self {
            name: name.to_string(),
            reference,
            levels: sorted,
        })
    }

    fn indicator(&self, level: &str) -> String {
        format!("{}_{}", self.name, level)
    }
}

/// Dummy encoding with the first level of every column dropped.
///
/// Every column always emits the same indicator set, so the encoded layout does not depend on
/// the input. A value equal to the reference level, or one the vocabulary has never seen,
/// yields an all-zero block.
#[derive(Debug, Clone, PartialEq)]
pub struct OneHotEncoder {
    columns: Vec<CategoricalColumn>,
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::campaign_form()
    }
}

impl OneHotEncoder {
    pub fn new<'a>(vocabulary: impl IntoIterator<Item = (&'a str, &'a [&'a str])>) -> Self {
        let columns = vocabulary
            .into_iter()
            .filter_map(|(name, levels)| CategoricalColumn::new(name, levels))
            .collect();
        Self { columns }
    }

    pub fn campaign_form() -> Self {
        Self::new(FORM_LEVELS)
    }

    /// Learn extra levels from indicator columns the model declares (`"<column>_<level>"`).
    ///
    /// Levels the form never offered still reach the model when the artifact was trained on
    /// them. A declared indicator for the form's reference level is emitted as well.
    pub fn extend_from_model_columns(&mut self, model_columns: &[String]) {
        for column in &mut self.columns {
            let prefix = format!("{}_", column.name);
            for model_column in model_columns {
                let Some(level) = model_column.strip_prefix(&prefix) else {
                    continue;
                };
                if level.is_empty() {
                    continue;
                }
                if column.levels.insert(level.to_string()) {
                    tracing::debug!(
                        column = %column.name,
                        level,
                        "added category level declared by model"
                    );
                }
            }
        }
    }

    /// Indicator column names in emission order.
    pub fn indicator_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|c| c.levels.iter().map(|level| c.indicator(level)))
            .collect()
    }

    pub fn encode_into(&self, input: &RawCampaignInput, row: &mut FeatureRow) {
        for column in &self.columns {
            let value = input.categorical(&column.name).unwrap_or_default();
            if !column.levels.contains(value) && value != column.reference {
                tracing::debug!(
                    column = %column.name,
                    value,
                    "unknown category; encoding as reference level"
                );
            }

            for level in &column.levels {
                let hit = if level == value { 1.0 } else { 0.0 };
                row.push(column.indicator(level), hit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::campaign::fixtures;

    #[test]
    fn drops_alphabetically_first_level() {
        let encoder = OneHotEncoder::campaign_form();
        let cols = encoder.indicator_columns();

        assert!(!cols.contains(&"Channel_Facebook".to_string()));
        assert!(!cols.contains(&"Objective_Awareness".to_string()));
        assert!(!cols.contains(&"Audience_Adults".to_string()));
        assert!(!cols.contains(&"Geo_India".to_string()));
        assert!(!cols.contains(&"Creative_Type_Carousel".to_string()));
        assert_eq!(
            &cols[..4],
            &[
                "Channel_Google",
                "Channel_Instagram",
                "Channel_LinkedIn",
                "Channel_YouTube",
            ]
        );
        // 4 + 3 + 3 + 3 + 2
        assert_eq!(cols.len(), 15);
    }

    #[test]
    fn sets_single_indicator_for_known_level() {
        let encoder = OneHotEncoder::campaign_form();
        let mut row = FeatureRow::new();
        encoder.encode_into(&fixtures::fresh_campaign(), &mut row);

        assert_eq!(row.get("Channel_Google"), Some(1.0));
        assert_eq!(row.get("Channel_YouTube"), Some(0.0));
        assert_eq!(row.get("Objective_Sales"), Some(1.0));
        assert_eq!(row.get("Geo_US"), Some(1.0));
        assert_eq!(row.get("Creative_Type_Video"), Some(1.0));
        // Adults is the reference level for Audience.
        let audience_hits: f64 = row
            .iter()
            .filter(|(c, _)| c.starts_with("Audience_"))
            .map(|(_, v)| v)
            .sum();
        assert_eq!(audience_hits, 0.0);
    }

    #[test]
    fn unknown_level_encodes_as_all_zero_block() {
        let encoder = OneHotEncoder::campaign_form();
        let mut input = fixtures::fresh_campaign();
        input.channel = "TikTok".to_string();

        let mut row = FeatureRow::new();
        encoder.encode_into(&input, &mut row);

        let channel: Vec<f64> = row
            .iter()
            .filter(|(c, _)| c.starts_with("Channel_"))
            .map(|(_, v)| v)
            .collect();
        assert_eq!(channel, vec![0.0; 4]);
    }

    #[test]
    fn learns_levels_from_model_columns() {
        let mut encoder = OneHotEncoder::campaign_form();
        encoder.extend_from_model_columns(&[
            "CTR".to_string(),
            "Channel_TikTok".to_string(),
            "Channel_Facebook".to_string(),
        ]);

        let mut input = fixtures::fresh_campaign();
        input.channel = "TikTok".to_string();
        let mut row = FeatureRow::new();
        encoder.encode_into(&input, &mut row);

        assert_eq!(row.get("Channel_TikTok"), Some(1.0));
        assert_eq!(row.get("Channel_Facebook"), Some(0.0));
    }

    #[test]
    fn declared_reference_level_gets_its_indicator() {
        let model_columns: Vec<String> = ["Channel_Bing", "Channel_Facebook", "Channel_Google"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut encoder = OneHotEncoder::campaign_form();
        encoder.extend_from_model_columns(&model_columns);

        let mut input = fixtures::fresh_campaign();
        input.channel = "Facebook".to_string();
        let mut row = FeatureRow::new();
        encoder.encode_into(&input, &mut row);
        let row = row.align(&model_columns);

        assert_eq!(row.values(), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn undeclared_reference_level_stays_dropped() {
        let mut encoder = OneHotEncoder::campaign_form();
        encoder.extend_from_model_columns(&["Channel_Google".to_string()]);
        assert!(!encoder
            .indicator_columns()
            .contains(&"Channel_Facebook".to_string()));
    }
}
