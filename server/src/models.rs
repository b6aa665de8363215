use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: Uuid,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::upload_targets)]
pub struct NewUploadTarget<'a> {
    pub token: &'a str,
    pub user_id: Uuid,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::images)]
pub struct NewImage<'a> {
    pub user_id: Uuid,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageData {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::fridge_analyses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FridgeAnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_handle: String,
    pub status: String,
    pub ingredients: serde_json::Value,
    pub recipes: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::fridge_analyses)]
pub struct NewFridgeAnalysis<'a> {
    pub user_id: Uuid,
    pub image_handle: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipe_scans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RecipeScanRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_handle: String,
    pub status: String,
    pub name: Option<String>,
    pub ingredients: serde_json::Value,
    pub instructions: serde_json::Value,
    pub cooking_time: Option<String>,
    pub servings: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_scans)]
pub struct NewRecipeScan<'a> {
    pub user_id: Uuid,
    pub image_handle: &'a str,
}
