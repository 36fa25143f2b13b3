use crate::error::{AppError, Result};
use crate::store::*;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Catalog store: single point of access to all persisted entities.
///
/// Constructed once at startup and cloned into request handlers; all
/// consistency guarantees (uniqueness, atomic increment, atomic upsert)
/// are delegated to SQLite rather than read-modify-write in handler code.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

/// Columns selected for a full book row.
const BOOK_COLS: &str = "b.id, b.title, b.author, b.description, b.category_id, \
     b.cover_image, b.book_file, b.file_type, b.download_count, b.created_at";

impl Store {
    /// Open or create the catalog database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.initialize_schema()?;
        Ok(store)
    }

    /// Open in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Internal(format!("Failed to open database: {}", e)))?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize database schema.
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Users table
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                is_blocked INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );

            -- Sessions table
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Categories table
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT UNIQUE NOT NULL,
                description TEXT
            );

            -- Books table
            CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id TEXT,
                cover_image TEXT,
                book_file TEXT,
                file_type TEXT,
                download_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (category_id) REFERENCES categories(id)
            );

            -- Reviews table. (book_id, user_id) is deliberately NOT unique:
            -- a user may review the same book more than once.
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL,
                comment TEXT,
                created_at INTEGER NOT NULL
            );

            -- Bookmarks table
            CREATE TABLE IF NOT EXISTS bookmarks (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE (user_id, book_id)
            );

            -- Reading progress table
            CREATE TABLE IF NOT EXISTS reading_progress (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                last_page INTEGER NOT NULL DEFAULT 0,
                total_pages INTEGER,
                updated_at INTEGER NOT NULL,
                UNIQUE (user_id, book_id)
            );

            -- Downloads table (append-only log)
            CREATE TABLE IF NOT EXISTS downloads (
                id TEXT PRIMARY KEY,
                book_id TEXT NOT NULL,
                user_id TEXT,
                downloaded_at INTEGER NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_books_category ON books(category_id);
            CREATE INDEX IF NOT EXISTS idx_reviews_book ON reviews(book_id, user_id);
            CREATE INDEX IF NOT EXISTS idx_bookmarks_user ON bookmarks(user_id);
            CREATE INDEX IF NOT EXISTS idx_downloads_time ON downloads(downloaded_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);
            "#,
        )
        .map_err(|e| AppError::Internal(format!("Failed to initialize schema: {}", e)))?;

        Ok(())
    }

    /// Map an insert error, turning uniqueness violations into conflicts.
    fn map_insert_err(e: rusqlite::Error, conflict_msg: &str, context: &str) -> AppError {
        match e {
            rusqlite::Error::SqliteFailure(f, _)
                if f.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::Conflict(conflict_msg.to_string())
            }
            e => AppError::Internal(format!("{}: {}", context, e)),
        }
    }

    // ========== USER OPERATIONS ==========

    /// Create a new user. Fails with a conflict if the email is taken.
    pub fn create_user(&self, new: &NewUser) -> Result<User> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            name: new.name.clone(),
            role: new.role.clone(),
            is_blocked: new.is_blocked,
            created_at: now_timestamp(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (id, email, password_hash, name, role, is_blocked, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.name,
                user.role,
                user.is_blocked,
                user.created_at,
            ],
        )
        .map_err(|e| {
            Self::map_insert_err(
                e,
                &format!("Email '{}' is already registered", user.email),
                "Failed to create user",
            )
        })?;

        Ok(user)
    }

    /// Get user by ID.
    pub fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, email, password_hash, name, role, is_blocked, created_at
             FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    /// Get user by email (case-sensitive exact match).
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, email, password_hash, name, role, is_blocked, created_at
             FROM users WHERE email = ?1",
            params![email],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    /// List all users, newest first.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, email, password_hash, name, role, is_blocked, created_at
                 FROM users ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let users = stmt
            .query_map([], Self::row_to_user)
            .map_err(|e| AppError::Internal(format!("Failed to list users: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect users: {}", e)))?;

        Ok(users)
    }

    /// Change a user's role. Returns the updated user, None if the id is unknown.
    pub fn update_user_role(&self, id: &str, role: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE users SET role = ?1 WHERE id = ?2",
                params![role, id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update role: {}", e)))?;

        if rows == 0 {
            return Ok(None);
        }

        conn.query_row(
            "SELECT id, email, password_hash, name, role, is_blocked, created_at
             FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    /// Block or unblock a user. Returns the updated user, None if unknown.
    pub fn update_user_block(&self, id: &str, blocked: bool) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE users SET is_blocked = ?1 WHERE id = ?2",
                params![blocked, id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to update block flag: {}", e)))?;

        if rows == 0 {
            return Ok(None);
        }

        conn.query_row(
            "SELECT id, email, password_hash, name, role, is_blocked, created_at
             FROM users WHERE id = ?1",
            params![id],
            Self::row_to_user,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get user: {}", e)))
    }

    fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            role: row.get(4)?,
            is_blocked: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    // ========== SESSION OPERATIONS ==========

    /// Create session.
    pub fn create_session(&self, session: &Session) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            params![session.token, session.user_id, session.expires_at],
        )
        .map_err(|e| AppError::Internal(format!("Failed to create session: {}", e)))?;
        Ok(())
    }

    /// Get session by token.
    pub fn get_session(&self, token: &str) -> Result<Option<Session>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT token, user_id, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| {
                Ok(Session {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get session: {}", e)))
    }

    /// Delete session.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(|e| AppError::Internal(format!("Failed to delete session: {}", e)))?;
        Ok(())
    }

    /// Cleanup expired sessions.
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                params![now_timestamp()],
            )
            .map_err(|e| AppError::Internal(format!("Failed to cleanup sessions: {}", e)))?;
        Ok(rows)
    }

    // ========== CATEGORY OPERATIONS ==========

    /// Create a category. Fails with a conflict if the name is taken.
    pub fn create_category(&self, new: &NewCategory) -> Result<Category> {
        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name.clone(),
            description: new.description.clone(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO categories (id, name, description) VALUES (?1, ?2, ?3)",
            params![category.id, category.name, category.description],
        )
        .map_err(|e| {
            Self::map_insert_err(
                e,
                &format!("Category '{}' already exists", category.name),
                "Failed to create category",
            )
        })?;

        Ok(category)
    }

    /// Get category by ID.
    pub fn get_category(&self, id: &str) -> Result<Option<Category>> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, name, description FROM categories WHERE id = ?1",
            params![id],
            Self::row_to_category,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get category: {}", e)))
    }

    /// List all categories.
    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, name, description FROM categories ORDER BY name")
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let categories = stmt
            .query_map([], Self::row_to_category)
            .map_err(|e| AppError::Internal(format!("Failed to list categories: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect categories: {}", e)))?;

        Ok(categories)
    }

    /// Partially update a category. Returns None if the id is unknown.
    pub fn update_category(&self, id: &str, patch: &CategoryPatch) -> Result<Option<Category>> {
        let conn = self.conn.lock();

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(name) = &patch.name {
            sets.push("name = ?");
            values.push(Box::new(name.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }

        if !sets.is_empty() {
            let sql = format!("UPDATE categories SET {} WHERE id = ?", sets.join(", "));
            values.push(Box::new(id.to_string()));
            conn.execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(|e| {
                    Self::map_insert_err(
                        e,
                        "Category name already exists",
                        "Failed to update category",
                    )
                })?;
        }

        conn.query_row(
            "SELECT id, name, description FROM categories WHERE id = ?1",
            params![id],
            Self::row_to_category,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get category: {}", e)))
    }

    /// Delete a category. Books referencing it keep their dangling reference.
    pub fn delete_category(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])
            .map_err(|e| AppError::Internal(format!("Failed to delete category: {}", e)))?;
        Ok(rows > 0)
    }

    fn row_to_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
        })
    }

    // ========== BOOK OPERATIONS ==========

    /// Create a new book.
    pub fn create_book(&self, new: &NewBook) -> Result<Book> {
        let book = Book {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title.clone(),
            author: new.author.clone(),
            description: new.description.clone(),
            category_id: new.category_id.clone(),
            cover_image: new.cover_image.clone(),
            book_file: new.book_file.clone(),
            file_type: new.file_type.clone(),
            download_count: 0,
            created_at: now_timestamp(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO books (id, title, author, description, category_id,
                                cover_image, book_file, file_type, download_count, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                book.id,
                book.title,
                book.author,
                book.description,
                book.category_id,
                book.cover_image,
                book.book_file,
                book.file_type,
                book.download_count,
                book.created_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to create book: {}", e)))?;

        Ok(book)
    }

    /// Get a book with its category and review aggregates resolved.
    pub fn get_book(&self, id: &str) -> Result<Option<BookWithDetails>> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                &format!(
                    "SELECT {BOOK_COLS}, c.id, c.name, c.description
                     FROM books b LEFT JOIN categories c ON c.id = b.category_id
                     WHERE b.id = ?1"
                ),
                params![id],
                Self::row_to_book_with_category,
            )
            .optional()
            .map_err(|e| AppError::Internal(format!("Failed to get book: {}", e)))?;

        let Some((book, category)) = row else {
            return Ok(None);
        };

        let (average_rating, review_count) = conn
            .query_row(
                "SELECT AVG(rating), COUNT(*) FROM reviews WHERE book_id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, Option<f64>>(0)?.unwrap_or(0.0),
                        row.get::<_, i64>(1)?,
                    ))
                },
            )
            .map_err(|e| AppError::Internal(format!("Failed to aggregate reviews: {}", e)))?;

        Ok(Some(BookWithDetails {
            book,
            category,
            average_rating,
            review_count,
        }))
    }

    /// List books with filtering, ordering and review aggregates.
    ///
    /// For `newest` and `downloads` the ordering and limit are pushed down
    /// to SQL. The average rating is derived and not stored on the book row,
    /// so `rating` cannot be ordered by the database: the full filtered set
    /// is fetched, aggregates are attached from a single grouped query, and
    /// the sort plus limit happen here. Full scan per rating-sorted request.
    pub fn list_books(&self, query: &BookQuery) -> Result<Vec<BookWithDetails>> {
        let conn = self.conn.lock();

        let mut sql = format!(
            "SELECT {BOOK_COLS}, c.id, c.name, c.description
             FROM books b LEFT JOIN categories c ON c.id = b.category_id"
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = &query.search {
            let pattern = format!("%{}%", escape_like(search));
            clauses.push("(b.title LIKE ? ESCAPE '\\' OR b.author LIKE ? ESCAPE '\\')".to_string());
            values.push(Box::new(pattern.clone()));
            values.push(Box::new(pattern));
        }

        // "all" is the no-filter sentinel used by the frontend.
        if let Some(category_id) = &query.category_id
            && category_id != "all"
        {
            clauses.push("b.category_id = ?".to_string());
            values.push(Box::new(category_id.clone()));
        }

        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        match query.sort {
            BookSort::Newest => sql.push_str(" ORDER BY b.created_at DESC, b.rowid DESC"),
            BookSort::Downloads => sql.push_str(" ORDER BY b.download_count DESC"),
            BookSort::Rating => {}
        }

        if query.sort != BookSort::Rating
            && let Some(limit) = query.limit
        {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let books = stmt
            .query_map(
                rusqlite::params_from_iter(values.iter()),
                Self::row_to_book_with_category,
            )
            .map_err(|e| AppError::Internal(format!("Failed to list books: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect books: {}", e)))?;

        // One grouped pass over reviews regardless of catalog size.
        let mut agg_stmt = conn
            .prepare("SELECT book_id, AVG(rating), COUNT(*) FROM reviews GROUP BY book_id")
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let stats: HashMap<String, (f64, i64)> = agg_stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, (row.get(1)?, row.get(2)?)))
            })
            .map_err(|e| AppError::Internal(format!("Failed to aggregate reviews: {}", e)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect aggregates: {}", e)))?;

        let mut results: Vec<BookWithDetails> = books
            .into_iter()
            .map(|(book, category)| {
                let (average_rating, review_count) =
                    stats.get(&book.id).copied().unwrap_or((0.0, 0));
                BookWithDetails {
                    book,
                    category,
                    average_rating,
                    review_count,
                }
            })
            .collect();

        if query.sort == BookSort::Rating {
            results.sort_by(|a, b| {
                b.average_rating
                    .partial_cmp(&a.average_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            if let Some(limit) = query.limit {
                results.truncate(limit);
            }
        }

        Ok(results)
    }

    /// Partially update a book. Returns the updated book, None if unknown.
    pub fn update_book(&self, id: &str, patch: &BookPatch) -> Result<Option<Book>> {
        let conn = self.conn.lock();

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = &patch.title {
            sets.push("title = ?");
            values.push(Box::new(title.clone()));
        }
        if let Some(author) = &patch.author {
            sets.push("author = ?");
            values.push(Box::new(author.clone()));
        }
        if let Some(description) = &patch.description {
            sets.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(category_id) = &patch.category_id {
            sets.push("category_id = ?");
            values.push(Box::new(category_id.clone()));
        }
        if let Some(cover_image) = &patch.cover_image {
            sets.push("cover_image = ?");
            values.push(Box::new(cover_image.clone()));
        }
        if let Some(book_file) = &patch.book_file {
            sets.push("book_file = ?");
            values.push(Box::new(book_file.clone()));
        }
        if let Some(file_type) = &patch.file_type {
            sets.push("file_type = ?");
            values.push(Box::new(file_type.clone()));
        }

        if !sets.is_empty() {
            let sql = format!("UPDATE books SET {} WHERE id = ?", sets.join(", "));
            values.push(Box::new(id.to_string()));
            conn.execute(&sql, rusqlite::params_from_iter(values.iter()))
                .map_err(|e| AppError::Internal(format!("Failed to update book: {}", e)))?;
        }

        conn.query_row(
            &format!("SELECT {BOOK_COLS} FROM books b WHERE b.id = ?1"),
            params![id],
            Self::row_to_book,
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get book: {}", e)))
    }

    /// Delete a book. Dependent reviews, bookmarks, reading progress and
    /// download log entries are left in place; read paths tolerate the
    /// dangling references.
    pub fn delete_book(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])
            .map_err(|e| AppError::Internal(format!("Failed to delete book: {}", e)))?;
        Ok(rows > 0)
    }

    /// Atomically bump a book's download counter by one.
    pub fn increment_download_count(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "UPDATE books SET download_count = download_count + 1 WHERE id = ?1",
                params![id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to increment downloads: {}", e)))?;
        Ok(rows > 0)
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            description: row.get(3)?,
            category_id: row.get(4)?,
            cover_image: row.get(5)?,
            book_file: row.get(6)?,
            file_type: row.get(7)?,
            download_count: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    /// Map a book row followed by LEFT JOINed category columns.
    fn row_to_book_with_category(
        row: &rusqlite::Row<'_>,
    ) -> rusqlite::Result<(Book, Option<Category>)> {
        let book = Self::row_to_book(row)?;
        let category = match row.get::<_, Option<String>>(10)? {
            Some(id) => Some(Category {
                id,
                name: row.get(11)?,
                description: row.get(12)?,
            }),
            None => None,
        };
        Ok((book, category))
    }

    // ========== REVIEW OPERATIONS ==========

    /// Create a review. No one-review-per-user-per-book constraint is
    /// enforced.
    pub fn create_review(&self, new: &NewReview) -> Result<Review> {
        let review = Review {
            id: uuid::Uuid::new_v4().to_string(),
            book_id: new.book_id.clone(),
            user_id: new.user_id.clone(),
            rating: new.rating,
            comment: new.comment.clone(),
            created_at: now_timestamp(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reviews (id, book_id, user_id, rating, comment, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                review.id,
                review.book_id,
                review.user_id,
                review.rating,
                review.comment,
                review.created_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to create review: {}", e)))?;

        Ok(review)
    }

    /// Reviews for a book, newest first, each joined with a minimal
    /// reviewer projection. Deleted reviewers map to a placeholder.
    pub fn reviews_for_book(&self, book_id: &str) -> Result<Vec<ReviewWithUser>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT r.id, r.book_id, r.user_id, r.rating, r.comment, r.created_at,
                        u.id, u.name, u.email
                 FROM reviews r LEFT JOIN users u ON u.id = r.user_id
                 WHERE r.book_id = ?1
                 ORDER BY r.created_at DESC, r.rowid DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let reviews = stmt
            .query_map(params![book_id], |row| {
                let review = Review {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    user_id: row.get(2)?,
                    rating: row.get(3)?,
                    comment: row.get(4)?,
                    created_at: row.get(5)?,
                };
                let user = match row.get::<_, Option<String>>(6)? {
                    Some(id) => ReviewUser {
                        id,
                        name: row.get(7)?,
                        email: row.get(8)?,
                    },
                    None => ReviewUser::unknown(),
                };
                Ok(ReviewWithUser { review, user })
            })
            .map_err(|e| AppError::Internal(format!("Failed to get reviews: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect reviews: {}", e)))?;

        Ok(reviews)
    }

    /// All reviews, newest first. Used for admin aggregate views.
    pub fn list_reviews(&self) -> Result<Vec<Review>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, book_id, user_id, rating, comment, created_at
                 FROM reviews ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let reviews = stmt
            .query_map([], |row| {
                Ok(Review {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    user_id: row.get(2)?,
                    rating: row.get(3)?,
                    comment: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to list reviews: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect reviews: {}", e)))?;

        Ok(reviews)
    }

    // ========== BOOKMARK OPERATIONS ==========

    /// Bookmark a book for a user. Fails with a conflict if the pair
    /// already exists.
    pub fn create_bookmark(&self, book_id: &str, user_id: &str) -> Result<Bookmark> {
        let bookmark = Bookmark {
            id: uuid::Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO bookmarks (id, book_id, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                bookmark.id,
                bookmark.book_id,
                bookmark.user_id,
                bookmark.created_at,
            ],
        )
        .map_err(|e| {
            Self::map_insert_err(e, "Book is already bookmarked", "Failed to create bookmark")
        })?;

        Ok(bookmark)
    }

    /// Remove a bookmark. No-op if the pair does not exist.
    pub fn delete_bookmark(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM bookmarks WHERE user_id = ?1 AND book_id = ?2",
                params![user_id, book_id],
            )
            .map_err(|e| AppError::Internal(format!("Failed to delete bookmark: {}", e)))?;
        Ok(rows > 0)
    }

    /// Whether a user has bookmarked a book.
    pub fn is_bookmarked(&self, user_id: &str, book_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bookmarks WHERE user_id = ?1 AND book_id = ?2)",
            params![user_id, book_id],
            |row| row.get(0),
        )
        .map_err(|e| AppError::Internal(format!("Failed to check bookmark: {}", e)))
    }

    /// Bookmarks of a user, newest first.
    pub fn bookmarks_for_user(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, book_id, user_id, created_at
                 FROM bookmarks WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let bookmarks = stmt
            .query_map(params![user_id], |row| {
                Ok(Bookmark {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    user_id: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to get bookmarks: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect bookmarks: {}", e)))?;

        Ok(bookmarks)
    }

    // ========== READING PROGRESS OPERATIONS ==========

    /// Get reading progress for a (user, book) pair.
    pub fn get_reading_progress(
        &self,
        user_id: &str,
        book_id: &str,
    ) -> Result<Option<ReadingProgress>> {
        let conn = self.conn.lock();
        Self::query_progress(&conn, user_id, book_id)
    }

    /// Atomically create or overwrite reading progress for a (user, book)
    /// pair. The conflict target makes this a single statement, so
    /// concurrent calls cannot produce duplicate rows.
    pub fn upsert_reading_progress(&self, new: &NewReadingProgress) -> Result<ReadingProgress> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO reading_progress (id, book_id, user_id, last_page, total_pages, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (user_id, book_id) DO UPDATE SET
                last_page = excluded.last_page,
                total_pages = excluded.total_pages,
                updated_at = excluded.updated_at",
            params![
                uuid::Uuid::new_v4().to_string(),
                new.book_id,
                new.user_id,
                new.last_page,
                new.total_pages,
                now_timestamp(),
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to save progress: {}", e)))?;

        Self::query_progress(&conn, &new.user_id, &new.book_id)?
            .ok_or_else(|| AppError::Internal("Progress row missing after upsert".to_string()))
    }

    fn query_progress(
        conn: &Connection,
        user_id: &str,
        book_id: &str,
    ) -> Result<Option<ReadingProgress>> {
        conn.query_row(
            "SELECT id, book_id, user_id, last_page, total_pages, updated_at
             FROM reading_progress WHERE user_id = ?1 AND book_id = ?2",
            params![user_id, book_id],
            |row| {
                Ok(ReadingProgress {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    user_id: row.get(2)?,
                    last_page: row.get(3)?,
                    total_pages: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()
        .map_err(|e| AppError::Internal(format!("Failed to get progress: {}", e)))
    }

    // ========== DOWNLOAD OPERATIONS ==========

    /// Append a download log entry. Anonymous downloads carry no user.
    pub fn create_download(&self, book_id: &str, user_id: Option<&str>) -> Result<Download> {
        let download = Download {
            id: uuid::Uuid::new_v4().to_string(),
            book_id: book_id.to_string(),
            user_id: user_id.map(|s| s.to_string()),
            downloaded_at: now_timestamp(),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO downloads (id, book_id, user_id, downloaded_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                download.id,
                download.book_id,
                download.user_id,
                download.downloaded_at,
            ],
        )
        .map_err(|e| AppError::Internal(format!("Failed to log download: {}", e)))?;

        Ok(download)
    }

    /// All download log entries, newest first.
    pub fn list_downloads(&self) -> Result<Vec<Download>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT id, book_id, user_id, downloaded_at
                 FROM downloads ORDER BY downloaded_at DESC, rowid DESC",
            )
            .map_err(|e| AppError::Internal(format!("Failed to prepare query: {}", e)))?;

        let downloads = stmt
            .query_map([], |row| {
                Ok(Download {
                    id: row.get(0)?,
                    book_id: row.get(1)?,
                    user_id: row.get(2)?,
                    downloaded_at: row.get(3)?,
                })
            })
            .map_err(|e| AppError::Internal(format!("Failed to list downloads: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| AppError::Internal(format!("Failed to collect downloads: {}", e)))?;

        Ok(downloads)
    }

    // ========== STATS ==========

    /// Point-in-time collection counts. The four counts are separate
    /// queries and not transactionally consistent with each other.
    pub fn get_stats(&self) -> Result<LibraryStats> {
        let conn = self.conn.lock();

        let count = |table: &str| -> Result<i64> {
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })
            .map_err(|e| AppError::Internal(format!("Failed to count {}: {}", table, e)))
        };

        Ok(LibraryStats {
            books: count("books")?,
            users: count("users")?,
            downloads: count("downloads")?,
            reviews: count("reviews")?,
        })
    }
}

/// Escape LIKE wildcards in user-supplied search text.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
