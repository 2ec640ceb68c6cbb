use serde::{Deserialize, Serialize};

/// Dish name the model is instructed to return when the image does not
/// depict food or drink.
pub const NOT_FOOD_DISH_NAME: &str = "Not a food item";

/// Structured outcome of one analysis call, matching the JSON schema the
/// upstream model is constrained to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub is_food: bool,
    pub dish_name: String,
    pub recipe: Recipe,
    pub nutrition: NutritionEstimate,
    pub healthier_variation: String,
    /// Present only when the model judged the dish calorie/fat/sugar-dense.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_advice: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
}

/// Human-readable approximate values ("350 kcal", "8g"), not guaranteed
/// to be numeric-parseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    pub calories: String,
    pub protein: String,
    pub carbs: String,
    pub fat: String,
}

impl AnalysisResult {
    /// The sentinel result for a non-food image: everything except the
    /// dish name is empty/defaulted. Consumers must not assume
    /// `recipe.ingredients` or `recipe.steps` are non-empty.
    pub fn not_food() -> Self {
        Self {
            is_food: false,
            dish_name: NOT_FOOD_DISH_NAME.to_string(),
            recipe: Recipe::default(),
            nutrition: NutritionEstimate::default(),
            healthier_variation: String::new(),
            friendly_advice: None,
        }
    }
}

/// Phase of the single in-flight analysis request. Exactly one variant is
/// active at a time; owned exclusively by the controller and changed only
/// on user action or completion of the in-flight call.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleState {
    Idle,
    Loading,
    Succeeded(AnalysisResult),
    Failed(String),
}

/// The five-way presentation contract: which screen the page shows.
/// Pure function of the lifecycle state, no business logic of its own.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Start,
    Loading,
    Error(String),
    NotFood,
    Result(AnalysisResult),
}

impl View {
    pub fn from_state(state: &LifecycleState) -> Self {
        match state {
            LifecycleState::Idle => View::Start,
            LifecycleState::Loading => View::Loading,
            LifecycleState::Failed(message) => View::Error(message.clone()),
            // A non-food judgment is a valid success, rendered on its own
            // screen rather than the recipe screen.
            LifecycleState::Succeeded(result) if !result.is_food => View::NotFood,
            LifecycleState::Succeeded(result) => View::Result(result.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_result_deserialization() {
        let json = r#"{
            "isFood": true,
            "dishName": "Pancakes",
            "recipe": {
                "ingredients": ["flour", "egg"],
                "steps": ["mix", "cook"]
            },
            "nutrition": {
                "calories": "350 kcal",
                "protein": "8g",
                "carbs": "50g",
                "fat": "10g"
            },
            "healthierVariation": "Use whole wheat flour."
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();

        assert!(result.is_food);
        assert_eq!(result.dish_name, "Pancakes");
        assert_eq!(result.recipe.ingredients, vec!["flour", "egg"]);
        assert_eq!(result.recipe.steps, vec!["mix", "cook"]);
        assert_eq!(result.nutrition.calories, "350 kcal");
        assert_eq!(result.nutrition.fat, "10g");
        assert_eq!(result.healthier_variation, "Use whole wheat flour.");
        assert!(result.friendly_advice.is_none());
    }

    #[test]
    fn test_friendly_advice_round_trip() {
        let json = r#"{
            "isFood": true,
            "dishName": "Double cheeseburger",
            "recipe": {"ingredients": ["bun", "beef", "cheese"], "steps": ["grill", "assemble"]},
            "nutrition": {"calories": "850 kcal", "protein": "40g", "carbs": "45g", "fat": "52g"},
            "healthierVariation": "Skip one patty.",
            "friendlyAdvice": "Maybe save this one for cheat day!"
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.friendly_advice.as_deref(),
            Some("Maybe save this one for cheat day!")
        );

        // The optional field must stay absent (not null) when missing.
        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(
            serialized["friendlyAdvice"],
            "Maybe save this one for cheat day!"
        );
        let plain = serde_json::to_value(AnalysisResult::not_food()).unwrap();
        assert!(plain.get("friendlyAdvice").is_none());
    }

    #[test]
    fn test_not_food_sentinel() {
        let result = AnalysisResult::not_food();
        assert!(!result.is_food);
        assert_eq!(result.dish_name, NOT_FOOD_DISH_NAME);
        assert!(result.recipe.ingredients.is_empty());
        assert!(result.recipe.steps.is_empty());
        assert!(result.healthier_variation.is_empty());
    }

    #[test]
    fn test_view_mapping() {
        assert_eq!(View::from_state(&LifecycleState::Idle), View::Start);
        assert_eq!(View::from_state(&LifecycleState::Loading), View::Loading);
        assert_eq!(
            View::from_state(&LifecycleState::Failed("boom".into())),
            View::Error("boom".into())
        );
        assert_eq!(
            View::from_state(&LifecycleState::Succeeded(AnalysisResult::not_food())),
            View::NotFood
        );
    }

    #[test]
    fn test_food_success_renders_result_view() {
        let result = AnalysisResult {
            is_food: true,
            dish_name: "Menemen".to_string(),
            recipe: Recipe {
                ingredients: vec!["egg".into(), "tomato".into()],
                steps: vec!["saute".into(), "add eggs".into()],
            },
            nutrition: NutritionEstimate {
                calories: "300 kcal".into(),
                protein: "15g".into(),
                carbs: "10g".into(),
                fat: "20g".into(),
            },
            healthier_variation: "Use less oil.".to_string(),
            friendly_advice: None,
        };

        match View::from_state(&LifecycleState::Succeeded(result.clone())) {
            View::Result(r) => assert_eq!(r, result),
            other => panic!("expected result view, got {:?}", other),
        }
    }
}
