use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc, NaiveDate};
use sqlx::FromRow;

/// Direction of one adjustment line. Stored as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AdjustmentItemType {
    Addition,
    Subtraction,
}

impl AdjustmentItemType {
    /// +1 for additions, -1 for subtractions.
    pub fn sign(self) -> i64 {
        match self {
            AdjustmentItemType::Addition => 1,
            AdjustmentItemType::Subtraction => -1,
        }
    }

    pub fn signed_quantity(self, quantity: i64) -> i64 {
        self.sign() * quantity
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAdjustmentRequest {
    pub warehouse_id: i64,
    pub adjustment_date: NaiveDate,
    pub note: Option<String>,
    pub items: Vec<AdjustmentItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentItemRequest {
    pub product_id: i64,
    pub quantity: i64,
    pub item_type: AdjustmentItemType,
}

#[derive(Debug, Serialize)]
pub struct AdjustmentResponse {
    pub id: i64,
    pub reference: String,
    pub warehouse_id: i64,
    pub warehouse_name: String,
    pub adjustment_date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<AdjustmentItemResponse>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AdjustmentItemResponse {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub quantity: i64,
    pub item_type: AdjustmentItemType,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AdjustmentListItem {
    pub id: i64,
    pub reference: String,
    pub warehouse_name: String,
    pub adjustment_date: NaiveDate,
    pub total_items: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_quantity_follows_item_type() {
        assert_eq!(AdjustmentItemType::Addition.signed_quantity(5), 5);
        assert_eq!(AdjustmentItemType::Subtraction.signed_quantity(5), -5);
    }

    #[test]
    fn item_type_serializes_lowercase() {
        let json = serde_json::to_string(&AdjustmentItemType::Addition).unwrap();
        assert_eq!(json, "\"addition\"");
        let parsed: AdjustmentItemType = serde_json::from_str("\"subtraction\"").unwrap();
        assert_eq!(parsed, AdjustmentItemType::Subtraction);
    }
}
