use sea_orm::FromQueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Fully validated data for a new recipe. `image` is already stored.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: i32,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
}

/// Changes applied by an update. `None` keeps the stored value; the
/// ingredient list is always replaced as a whole.
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct RecipeIngredientRow {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}
