use serde::Deserialize;
use uuid::Uuid;

use super::services::NewReview;
use crate::{
    error::{AppError, AppResult},
    store::Document,
};

/// Body of POST /review.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    #[serde(rename = "mealId")]
    pub meal_id: Option<Uuid>,
    pub rating: Option<f64>,
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Document,
}

impl CreateReviewRequest {
    pub fn validate(self) -> AppResult<NewReview> {
        let meal_id = self
            .meal_id
            .ok_or_else(|| AppError::bad_input("mealId is required"))?;
        let rating = self
            .rating
            .filter(|r| r.is_finite())
            .ok_or_else(|| AppError::bad_input("rating is required"))?;
        Ok(NewReview {
            meal_id,
            rating,
            text: self.text,
            extra: self.extra,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct EditReviewRequest {
    #[serde(rename = "newText")]
    pub new_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> CreateReviewRequest {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn meal_and_rating_are_required() {
        let missing_meal = parse(json!({"rating": 4}));
        assert!(matches!(missing_meal.validate(), Err(AppError::BadInput(_))));

        let missing_rating = parse(json!({"mealId": Uuid::new_v4()}));
        assert!(matches!(missing_rating.validate(), Err(AppError::BadInput(_))));
    }

    #[test]
    fn unknown_fields_are_kept_for_display() {
        let id = Uuid::new_v4();
        let input = parse(json!({"mealId": id, "rating": 5, "text": "great", "userName": "Rafi"}))
            .validate()
            .unwrap();
        assert_eq!(input.meal_id, id);
        assert_eq!(input.rating, 5.0);
        assert_eq!(input.text, "great");
        assert_eq!(input.extra["userName"], "Rafi");
    }
}
