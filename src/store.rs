mod catalog;

pub use catalog::Store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: String,
    /// Email address used for login (unique).
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// User role: "admin" or "user".
    pub role: String,
    /// Whether the account is blocked from logging in.
    pub is_blocked: bool,
    /// Account creation timestamp.
    pub created_at: i64,
}

/// Data for creating a user. The password is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email address (unique).
    pub email: String,
    /// Argon2 password hash.
    pub password_hash: String,
    /// Display name.
    pub name: String,
    /// User role.
    pub role: String,
    /// Blocked flag.
    pub is_blocked: bool,
}

/// Authentication session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session token.
    pub token: String,
    /// User ID.
    pub user_id: String,
    /// Expiration timestamp.
    pub expires_at: i64,
}

/// Book category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique category ID.
    pub id: String,
    /// Category name (unique).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Data for creating a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// Category name (unique).
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// Partial category update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Catalog book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique book ID.
    pub id: String,
    /// Book title.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Book description.
    pub description: String,
    /// Category reference (nullable).
    pub category_id: Option<String>,
    /// Cover image location.
    pub cover_image: Option<String>,
    /// Book file location.
    pub book_file: Option<String>,
    /// File type of the book file (e.g. "pdf", "epub").
    pub file_type: Option<String>,
    /// Number of times the book was downloaded.
    pub download_count: i64,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Data for creating a book.
#[derive(Debug, Clone)]
pub struct NewBook {
    /// Book title.
    pub title: String,
    /// Author name.
    pub author: String,
    /// Book description.
    pub description: String,
    /// Category reference (nullable).
    pub category_id: Option<String>,
    /// Cover image location.
    pub cover_image: Option<String>,
    /// Book file location.
    pub book_file: Option<String>,
    /// File type of the book file.
    pub file_type: Option<String>,
}

/// Partial book update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    /// New title.
    pub title: Option<String>,
    /// New author.
    pub author: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category reference.
    pub category_id: Option<String>,
    /// New cover image location.
    pub cover_image: Option<String>,
    /// New book file location.
    pub book_file: Option<String>,
    /// New file type.
    pub file_type: Option<String>,
}

/// Book with its resolved category and review aggregates.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookWithDetails {
    /// The book record.
    #[serde(flatten)]
    pub book: Book,
    /// Resolved category, None if the book has no category.
    pub category: Option<Category>,
    /// Mean of all review ratings, 0.0 if the book has no reviews.
    pub average_rating: f64,
    /// Number of reviews for the book.
    pub review_count: i64,
}

/// Book review.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Unique review ID.
    pub id: String,
    /// Reviewed book.
    pub book_id: String,
    /// Reviewer.
    pub user_id: String,
    /// Rating, 1 to 5 inclusive.
    pub rating: i64,
    /// Optional comment.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Data for creating a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Reviewed book.
    pub book_id: String,
    /// Reviewer.
    pub user_id: String,
    /// Rating, 1 to 5 inclusive.
    pub rating: i64,
    /// Optional comment.
    pub comment: Option<String>,
}

/// Minimal reviewer projection attached to a review.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewUser {
    /// User ID, empty if the user no longer exists.
    pub id: String,
    /// Display name, "Unknown" if the user no longer exists.
    pub name: String,
    /// Email, empty if the user no longer exists.
    pub email: String,
}

impl ReviewUser {
    /// Placeholder for reviews whose author was deleted.
    pub fn unknown() -> Self {
        Self {
            id: String::new(),
            name: "Unknown".to_string(),
            email: String::new(),
        }
    }
}

/// Review joined with its reviewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithUser {
    /// The review record.
    #[serde(flatten)]
    pub review: Review,
    /// Reviewer projection.
    pub user: ReviewUser,
}

/// Bookmark marking a book as saved by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    /// Unique bookmark ID.
    pub id: String,
    /// Bookmarked book.
    pub book_id: String,
    /// Owner of the bookmark.
    pub user_id: String,
    /// Creation timestamp.
    pub created_at: i64,
}

/// Reading position of a user in a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    /// Unique progress ID.
    pub id: String,
    /// Book being read.
    pub book_id: String,
    /// Reading user.
    pub user_id: String,
    /// Last page read.
    pub last_page: i64,
    /// Total pages in the book, if known.
    pub total_pages: Option<i64>,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Data for recording reading progress.
#[derive(Debug, Clone)]
pub struct NewReadingProgress {
    /// Book being read.
    pub book_id: String,
    /// Reading user.
    pub user_id: String,
    /// Last page read.
    pub last_page: i64,
    /// Total pages in the book, if known.
    pub total_pages: Option<i64>,
}

/// Download log entry. Append-only, one row per download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    /// Unique download ID.
    pub id: String,
    /// Downloaded book.
    pub book_id: String,
    /// Downloading user, None for anonymous downloads.
    pub user_id: Option<String>,
    /// Download timestamp.
    pub downloaded_at: i64,
}

/// Sort order for book listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    /// Most recently added first (default).
    #[default]
    Newest,
    /// Most downloaded first.
    Downloads,
    /// Highest average rating first.
    Rating,
}

impl BookSort {
    /// Parse a sort parameter, falling back to the default for unknown values.
    pub fn parse(value: &str) -> Self {
        match value {
            "downloads" => BookSort::Downloads,
            "rating" => BookSort::Rating,
            _ => BookSort::Newest,
        }
    }
}

/// Filter and ordering options for book listings.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Cap on the number of results.
    pub limit: Option<usize>,
    /// Sort order.
    pub sort: BookSort,
    /// Case-insensitive substring match against title or author.
    pub search: Option<String>,
    /// Exact category filter. None or "all" means no filter.
    pub category_id: Option<String>,
}

/// Point-in-time collection counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryStats {
    /// Total number of books.
    pub books: i64,
    /// Total number of users.
    pub users: i64,
    /// Total number of downloads.
    pub downloads: i64,
    /// Total number of reviews.
    pub reviews: i64,
}

/// Timestamp helper.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
