use serde::{Deserialize, Serialize};

/// One form submission, keyed exactly the way the model's training frame was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCampaignInput {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "Objective")]
    pub objective: String,
    #[serde(rename = "Audience")]
    pub audience: String,
    #[serde(rename = "Geo")]
    pub geo: String,
    #[serde(rename = "Creative_Type")]
    pub creative_type: String,
    #[serde(rename = "Budget")]
    pub budget: f64,
    #[serde(rename = "Spend_Till_Date")]
    pub spend_till_date: f64,
    #[serde(rename = "Impressions_Till_Date")]
    pub impressions_till_date: f64,
    #[serde(rename = "Clicks_Till_Date")]
    pub clicks_till_date: f64,
    #[serde(rename = "Conversions_Till_Date")]
    pub conversions_till_date: f64,
    #[serde(rename = "Campaign_Duration")]
    pub campaign_duration: f64,
    #[serde(rename = "Duration_Till_Date")]
    pub duration_till_date: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl std::fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            // Whole numbers print without a trailing ".0".
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            FieldValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl RawCampaignInput {
    /// All fields in form order, with their wire names.
    pub fn fields(&self) -> [(&'static str, FieldValue<'_>); 13] {
        [
            ("Status", FieldValue::Text(&self.status)),
            ("Channel", FieldValue::Text(&self.channel)),
            ("Objective", FieldValue::Text(&self.objective)),
            ("Audience", FieldValue::Text(&self.audience)),
            ("Geo", FieldValue::Text(&self.geo)),
            ("Creative_Type", FieldValue::Text(&self.creative_type)),
            ("Budget", FieldValue::Number(self.budget)),
            ("Spend_Till_Date", FieldValue::Number(self.spend_till_date)),
            (
                "Impressions_Till_Date",
                FieldValue::Number(self.impressions_till_date),
            ),
            ("Clicks_Till_Date", FieldValue::Number(self.clicks_till_date)),
            (
                "Conversions_Till_Date",
                FieldValue::Number(self.conversions_till_date),
            ),
            ("Campaign_Duration", FieldValue::Number(self.campaign_duration)),
            ("Duration_Till_Date", FieldValue::Number(self.duration_till_date)),
        ]
    }

    /// Value of a categorical column by its wire name.
    pub fn categorical(&self, column: &str) -> Option<&str> {
        match column {
            "Channel" => Some(&self.channel),
            "Objective" => Some(&self.objective),
            "Audience" => Some(&self.audience),
            "Geo" => Some(&self.geo),
            "Creative_Type" => Some(&self.creative_type),
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::RawCampaignInput;

    pub fn fresh_campaign() -> RawCampaignInput {
        RawCampaignInput {
            status: "Active".to_string(),
            channel: "Google".to_string(),
            objective: "Sales".to_string(),
            audience: "Adults".to_string(),
            geo: "US".to_string(),
            creative_type: "Video".to_string(),
            budget: 5000.0,
            spend_till_date: 0.0,
            impressions_till_date: 0.0,
            clicks_till_date: 0.0,
            conversions_till_date: 0.0,
            campaign_duration: 30.0,
            duration_till_date: 0.0,
        }
    }

    pub fn completed_campaign() -> RawCampaignInput {
        RawCampaignInput {
            status: "Completed".to_string(),
            spend_till_date: 200.0,
            impressions_till_date: 1000.0,
            clicks_till_date: 50.0,
            conversions_till_date: 5.0,
            duration_till_date: 30.0,
            ..fresh_campaign()
        }
    }
}
