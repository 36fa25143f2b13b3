//! HTTP request handlers.
//!
//! This layer is the validation boundary: request bodies are checked here
//! (email shape, password length, rating bounds, required strings) and each
//! handler then calls one store method with already-validated data.

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::store::{
    Book, BookPatch, BookQuery, BookSort, BookWithDetails, Bookmark, Category, CategoryPatch,
    Download, LibraryStats, NewBook, NewCategory, NewReadingProgress, NewReview, ReadingProgress,
    Review, ReviewWithUser, User,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::Html,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ============================================================================
// WEB PAGES
// ============================================================================

/// Index page (simple HTML).
pub async fn index(State(state): State<AppState>) -> Result<Html<String>> {
    let stats = state.store.get_stats()?;
    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 600px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        .stats {{ background: #f5f5f5; padding: 1rem; border-radius: 8px; margin: 1rem 0; }}
        code {{ background: #e8e8e8; padding: 0.2rem 0.4rem; border-radius: 4px; }}
    </style>
</head>
<body>
    <h1>📚 {title}</h1>
    <div class="stats">
        <p><strong>{books}</strong> books, <strong>{reviews}</strong> reviews, <strong>{downloads}</strong> downloads</p>
    </div>
    <h2>API</h2>
    <p>The JSON API lives under <code>/api</code>, e.g. <code>/api/books</code>.</p>
</body>
</html>"#,
        title = state.config.server.title,
        books = stats.books,
        reviews = stats.reviews,
        downloads = stats.downloads,
    );

    Ok(Html(html))
}

// ============================================================================
// AUTH API
// ============================================================================

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    name: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    token: String,
    user: User,
}

/// Auth register.
pub async fn auth_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>> {
    state.auth.register(&req.email, &req.password, &req.name)?;
    let (user, token) = state.auth.login(&req.email, &req.password)?;

    Ok(Json(LoginResponse { token, user }))
}

/// Auth login.
pub async fn auth_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = state.auth.login(&req.email, &req.password)?;

    Ok(Json(LoginResponse { token, user }))
}

/// Auth logout.
pub async fn auth_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
    if let Some(token) = extract_token(&headers) {
        state.auth.logout(&token)?;
    }
    Ok(Json(json!({ "success": true })))
}

/// Get current user info.
pub async fn auth_me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<User>> {
    let user = get_authenticated_user(&state, &headers)?;
    Ok(Json(user))
}

// ============================================================================
// BOOK API
// ============================================================================

/// Query parameters for book listings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBooksParams {
    limit: Option<usize>,
    sort: Option<String>,
    search: Option<String>,
    category_id: Option<String>,
}

/// List books with optional search, category filter, sort and limit.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListBooksParams>,
) -> Result<Json<Vec<BookWithDetails>>> {
    let query = BookQuery {
        limit: params.limit,
        sort: params
            .sort
            .as_deref()
            .map(BookSort::parse)
            .unwrap_or_default(),
        search: params.search.filter(|s| !s.is_empty()),
        category_id: params.category_id,
    };

    Ok(Json(state.store.list_books(&query)?))
}

/// Get a single book with category and rating details.
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookWithDetails>> {
    let book = state
        .store
        .get_book(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    Ok(Json(book))
}

/// Book create/update request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRequest {
    title: Option<String>,
    author: Option<String>,
    description: Option<String>,
    category_id: Option<String>,
    cover_image: Option<String>,
    book_file: Option<String>,
    file_type: Option<String>,
}

/// Create a book (admin).
pub async fn create_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<Json<Book>> {
    require_admin(&state, &headers)?;

    let new = NewBook {
        title: require_field(req.title, "title")?,
        author: require_field(req.author, "author")?,
        description: require_field(req.description, "description")?,
        category_id: req.category_id,
        cover_image: req.cover_image,
        book_file: req.book_file,
        file_type: req.file_type,
    };

    Ok(Json(state.store.create_book(&new)?))
}

/// Partially update a book (admin). Only provided fields change.
pub async fn update_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<Json<Book>> {
    require_admin(&state, &headers)?;

    let patch = BookPatch {
        title: non_empty(req.title, "title")?,
        author: non_empty(req.author, "author")?,
        description: non_empty(req.description, "description")?,
        category_id: req.category_id,
        cover_image: req.cover_image,
        book_file: req.book_file,
        file_type: req.file_type,
    };

    let book = state
        .store
        .update_book(&id, &patch)?
        .ok_or_else(|| AppError::NotFound(format!("Book not found: {}", id)))?;

    Ok(Json(book))
}

/// Delete a book (admin). No-op if the id is unknown.
pub async fn delete_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    require_admin(&state, &headers)?;
    state.store.delete_book(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Record a download: bumps the counter and appends a log entry.
/// Works without authentication; a valid token attributes the download.
pub async fn download_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Download>> {
    if !state.store.increment_download_count(&id)? {
        return Err(AppError::NotFound(format!("Book not found: {}", id)));
    }

    let user_id = match extract_token(&headers) {
        Some(token) => state.auth.validate_token(&token)?.map(|u| u.id),
        None => None,
    };

    let download = state.store.create_download(&id, user_id.as_deref())?;
    Ok(Json(download))
}

// ============================================================================
// CATEGORY API
// ============================================================================

/// List all categories.
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(state.store.list_categories()?))
}

/// Get a single category.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Category>> {
    let category = state
        .store
        .get_category(&id)?
        .ok_or_else(|| AppError::NotFound(format!("Category not found: {}", id)))?;

    Ok(Json(category))
}

/// Category create/update request body.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    name: Option<String>,
    description: Option<String>,
}

/// Create a category (admin).
pub async fn create_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    require_admin(&state, &headers)?;

    let new = NewCategory {
        name: require_field(req.name, "name")?,
        description: req.description,
    };

    Ok(Json(state.store.create_category(&new)?))
}

/// Partially update a category (admin).
pub async fn update_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    require_admin(&state, &headers)?;

    let patch = CategoryPatch {
        name: non_empty(req.name, "name")?,
        description: req.description,
    };

    let category = state
        .store
        .update_category(&id, &patch)?
        .ok_or_else(|| AppError::NotFound(format!("Category not found: {}", id)))?;

    Ok(Json(category))
}

/// Delete a category (admin). No-op if the id is unknown.
pub async fn delete_category(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    require_admin(&state, &headers)?;
    state.store.delete_category(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// REVIEW API
// ============================================================================

/// Reviews for a book, newest first, with reviewer info.
pub async fn book_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReviewWithUser>>> {
    Ok(Json(state.store.reviews_for_book(&id)?))
}

/// Review request body.
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    rating: i64,
    comment: Option<String>,
}

/// Create a review for a book.
pub async fn create_review(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Review>> {
    let user = get_authenticated_user(&state, &headers)?;

    if !(1..=5).contains(&req.rating) {
        return Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    if state.store.get_book(&id)?.is_none() {
        return Err(AppError::NotFound(format!("Book not found: {}", id)));
    }

    let review = state.store.create_review(&NewReview {
        book_id: id,
        user_id: user.id,
        rating: req.rating,
        comment: req.comment,
    })?;

    Ok(Json(review))
}

// ============================================================================
// BOOKMARK API
// ============================================================================

/// Bookmarks of the authenticated user, newest first.
pub async fn my_bookmarks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Bookmark>>> {
    let user = get_authenticated_user(&state, &headers)?;
    Ok(Json(state.store.bookmarks_for_user(&user.id)?))
}

/// Bookmark create request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRequest {
    book_id: String,
}

/// Bookmark a book for the authenticated user.
pub async fn create_bookmark(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<BookmarkRequest>,
) -> Result<Json<Bookmark>> {
    let user = get_authenticated_user(&state, &headers)?;

    if state.store.get_book(&req.book_id)?.is_none() {
        return Err(AppError::NotFound(format!(
            "Book not found: {}",
            req.book_id
        )));
    }

    Ok(Json(state.store.create_bookmark(&req.book_id, &user.id)?))
}

/// Whether the authenticated user has bookmarked a book.
pub async fn bookmark_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let user = get_authenticated_user(&state, &headers)?;
    let is_bookmarked = state.store.is_bookmarked(&user.id, &book_id)?;
    Ok(Json(json!({ "isBookmarked": is_bookmarked })))
}

/// Remove a bookmark. No-op if it does not exist.
pub async fn delete_bookmark(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<StatusCode> {
    let user = get_authenticated_user(&state, &headers)?;
    state.store.delete_bookmark(&user.id, &book_id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// READING PROGRESS API
// ============================================================================

/// Get reading progress for the authenticated user.
pub async fn get_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
) -> Result<Json<Option<ReadingProgress>>> {
    let user = get_authenticated_user(&state, &headers)?;
    let progress = state.store.get_reading_progress(&user.id, &book_id)?;
    Ok(Json(progress))
}

/// Progress update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    last_page: Option<i64>,
    total_pages: Option<i64>,
}

/// Create or overwrite reading progress for the authenticated user.
pub async fn update_progress(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> Result<Json<ReadingProgress>> {
    let user = get_authenticated_user(&state, &headers)?;

    let last_page = req.last_page.unwrap_or(0);
    if last_page < 0 {
        return Err(AppError::Validation(
            "lastPage must not be negative".to_string(),
        ));
    }

    let progress = state.store.upsert_reading_progress(&NewReadingProgress {
        book_id,
        user_id: user.id,
        last_page,
        total_pages: req.total_pages,
    })?;

    Ok(Json(progress))
}

// ============================================================================
// ADMIN API
// ============================================================================

/// List all users, newest first (admin).
pub async fn admin_list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<User>>> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.list_users()?))
}

/// Role update request.
#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    role: String,
}

/// Change a user's role (admin).
pub async fn admin_update_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<User>> {
    require_admin(&state, &headers)?;

    if req.role != "admin" && req.role != "user" {
        return Err(AppError::Validation(
            "Role must be 'admin' or 'user'".to_string(),
        ));
    }

    let user = state
        .store
        .update_user_role(&id, &req.role)?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", id)))?;

    Ok(Json(user))
}

/// Block flag update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    is_blocked: bool,
}

/// Block or unblock a user (admin).
pub async fn admin_update_block(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<BlockRequest>,
) -> Result<Json<User>> {
    require_admin(&state, &headers)?;

    let user = state
        .store
        .update_user_block(&id, req.is_blocked)?
        .ok_or_else(|| AppError::NotFound(format!("User not found: {}", id)))?;

    Ok(Json(user))
}

/// Dashboard counts (admin).
pub async fn admin_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<LibraryStats>> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.get_stats()?))
}

/// Full download log, newest first (admin).
pub async fn admin_downloads(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Download>>> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.list_downloads()?))
}

/// All reviews, newest first (admin).
pub async fn admin_reviews(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Review>>> {
    require_admin(&state, &headers)?;
    Ok(Json(state.store.list_reviews()?))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Extract token from Authorization header.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Get authenticated user from token.
fn get_authenticated_user(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let token = extract_token(headers)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    state
        .auth
        .validate_token(&token)?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Get authenticated user and require the admin role.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User> {
    let user = get_authenticated_user(state, headers)?;
    if !state.auth.is_admin(&user) {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}

/// Require a string field to be present and non-empty.
fn require_field(value: Option<String>, field: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!(
            "Field '{}' is required",
            field
        ))),
    }
}

/// Reject empty strings in optional patch fields.
fn non_empty(value: Option<String>, field: &str) -> Result<Option<String>> {
    match value {
        Some(v) if v.trim().is_empty() => Err(AppError::Validation(format!(
            "Field '{}' must not be empty",
            field
        ))),
        other => Ok(other),
    }
}
