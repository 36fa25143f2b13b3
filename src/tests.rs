use crate::auth::AuthService;
use crate::config::Config;
use crate::error::AppError;
use crate::store::{
    BookPatch, BookQuery, BookSort, CategoryPatch, NewBook, NewCategory, NewReadingProgress,
    NewReview, NewUser, Store, timestamp_to_datetime,
};

fn test_store() -> Store {
    Store::open_memory().unwrap()
}

fn add_user(store: &Store, email: &str, name: &str) -> String {
    store
        .create_user(&NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: name.to_string(),
            role: "user".to_string(),
            is_blocked: false,
        })
        .unwrap()
        .id
}

fn add_category(store: &Store, name: &str) -> String {
    store
        .create_category(&NewCategory {
            name: name.to_string(),
            description: None,
        })
        .unwrap()
        .id
}

fn add_book(store: &Store, title: &str, author: &str, category_id: Option<&str>) -> String {
    store
        .create_book(&NewBook {
            title: title.to_string(),
            author: author.to_string(),
            description: format!("About {}", title),
            category_id: category_id.map(|s| s.to_string()),
            cover_image: None,
            book_file: None,
            file_type: Some("pdf".to_string()),
        })
        .unwrap()
        .id
}

fn add_review(store: &Store, book_id: &str, user_id: &str, rating: i64) {
    store
        .create_review(&NewReview {
            book_id: book_id.to_string(),
            user_id: user_id.to_string(),
            rating,
            comment: None,
        })
        .unwrap();
}

// ========== USERS ==========

#[test]
fn store_create_and_get_user() {
    let store = test_store();
    let id = add_user(&store, "alice@example.com", "Alice");

    let found = store.get_user(&id).unwrap().unwrap();
    assert_eq!(found.email, "alice@example.com");
    assert_eq!(found.name, "Alice");
    assert_eq!(found.role, "user");
    assert!(!found.is_blocked);

    let by_email = store.get_user_by_email("alice@example.com").unwrap().unwrap();
    assert_eq!(by_email.id, id);
}

#[test]
fn store_duplicate_email_is_conflict() {
    let store = test_store();
    add_user(&store, "alice@example.com", "Alice");

    let err = store
        .create_user(&NewUser {
            email: "alice@example.com".to_string(),
            password_hash: "other".to_string(),
            name: "Imposter".to_string(),
            role: "user".to_string(),
            is_blocked: false,
        })
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn store_email_lookup_is_case_sensitive() {
    let store = test_store();
    add_user(&store, "Alice@example.com", "Alice");

    assert!(store.get_user_by_email("alice@example.com").unwrap().is_none());
    assert!(store.get_user_by_email("Alice@example.com").unwrap().is_some());
}

#[test]
fn store_list_users_newest_first() {
    let store = test_store();
    add_user(&store, "first@example.com", "First");
    add_user(&store, "second@example.com", "Second");

    let users = store.list_users().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].email, "second@example.com");
    assert_eq!(users[1].email, "first@example.com");
}

#[test]
fn user_wire_format_hides_password_hash() {
    let store = test_store();
    let id = add_user(&store, "alice@example.com", "Alice");
    let user = store.get_user(&id).unwrap().unwrap();

    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("isBlocked").is_some());
    assert!(value.get("createdAt").is_some());
    assert!(value.get("passwordHash").is_none());
    assert!(value.get("password_hash").is_none());
}

#[test]
fn store_update_user_role_and_block() {
    let store = test_store();
    let id = add_user(&store, "bob@example.com", "Bob");

    let updated = store.update_user_role(&id, "admin").unwrap().unwrap();
    assert_eq!(updated.role, "admin");

    let blocked = store.update_user_block(&id, true).unwrap().unwrap();
    assert!(blocked.is_blocked);

    assert!(store.update_user_role("missing", "admin").unwrap().is_none());
    assert!(store.update_user_block("missing", true).unwrap().is_none());
}

// ========== CATEGORIES ==========

#[test]
fn store_category_crud() {
    let store = test_store();
    let id = add_category(&store, "Fiction");

    let found = store.get_category(&id).unwrap().unwrap();
    assert_eq!(found.name, "Fiction");
    assert!(found.description.is_none());

    let updated = store
        .update_category(
            &id,
            &CategoryPatch {
                name: None,
                description: Some("Novels and stories".to_string()),
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Fiction");
    assert_eq!(updated.description.as_deref(), Some("Novels and stories"));

    assert!(store.delete_category(&id).unwrap());
    assert!(store.get_category(&id).unwrap().is_none());
    assert!(!store.delete_category(&id).unwrap());
}

#[test]
fn store_duplicate_category_name_is_conflict() {
    let store = test_store();
    add_category(&store, "Fiction");

    let err = store
        .create_category(&NewCategory {
            name: "Fiction".to_string(),
            description: None,
        })
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn store_update_category_missing_returns_none() {
    let store = test_store();
    let result = store
        .update_category("missing", &CategoryPatch::default())
        .unwrap();
    assert!(result.is_none());
}

// ========== BOOKS ==========

#[test]
fn store_book_details_with_category_and_ratings() {
    let store = test_store();
    let cat = add_category(&store, "Fiction");
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", Some(&cat));

    add_review(&store, &book, &user, 4);
    add_review(&store, &book, &user, 2);

    let details = store.get_book(&book).unwrap().unwrap();
    assert_eq!(details.book.title, "Dune");
    assert_eq!(details.average_rating, 3.0);
    assert_eq!(details.review_count, 2);
    assert_eq!(details.category.unwrap().name, "Fiction");
}

#[test]
fn store_book_without_reviews_has_zero_rating() {
    let store = test_store();
    let book = add_book(&store, "Solaris", "Stanislaw Lem", None);

    let details = store.get_book(&book).unwrap().unwrap();
    assert_eq!(details.average_rating, 0.0);
    assert_eq!(details.review_count, 0);
    assert!(details.category.is_none());
}

#[test]
fn store_get_book_missing_returns_none() {
    let store = test_store();
    assert!(store.get_book("missing").unwrap().is_none());
}

#[test]
fn store_search_matches_title_or_author_case_insensitive() {
    let store = test_store();
    add_book(&store, "Dune", "Frank Herbert", None);
    add_book(&store, "Foundation", "Isaac Asimov", None);

    let query = BookQuery {
        search: Some("dun".to_string()),
        ..Default::default()
    };
    let results = store.list_books(&query).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title, "Dune");

    let by_author = store
        .list_books(&BookQuery {
            search: Some("asimov".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(by_author.len(), 1);
    assert_eq!(by_author[0].book.title, "Foundation");

    let none = store
        .list_books(&BookQuery {
            search: Some("zzz".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn store_search_escapes_like_wildcards() {
    let store = test_store();
    add_book(&store, "100% Wrong", "Nobody", None);
    add_book(&store, "Dune", "Frank Herbert", None);

    let results = store
        .list_books(&BookQuery {
            search: Some("100%".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title, "100% Wrong");
}

#[test]
fn store_category_filter_and_all_sentinel() {
    let store = test_store();
    let fiction = add_category(&store, "Fiction");
    add_book(&store, "Dune", "Frank Herbert", Some(&fiction));
    add_book(&store, "Cosmos", "Carl Sagan", None);

    let filtered = store
        .list_books(&BookQuery {
            category_id: Some(fiction.clone()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].book.title, "Dune");

    let all = store
        .list_books(&BookQuery {
            category_id: Some("all".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn store_sort_newest_is_default() {
    let store = test_store();
    add_book(&store, "First", "A", None);
    add_book(&store, "Second", "B", None);

    let results = store.list_books(&BookQuery::default()).unwrap();
    assert_eq!(results[0].book.title, "Second");
    assert_eq!(results[1].book.title, "First");
}

#[test]
fn store_sort_by_downloads() {
    let store = test_store();
    let a = add_book(&store, "Rarely Read", "A", None);
    let b = add_book(&store, "Popular", "B", None);

    for _ in 0..3 {
        store.increment_download_count(&b).unwrap();
    }
    store.increment_download_count(&a).unwrap();

    let results = store
        .list_books(&BookQuery {
            sort: BookSort::Downloads,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results[0].book.title, "Popular");
    assert_eq!(results[0].book.download_count, 3);
}

#[test]
fn store_sort_by_rating_non_increasing() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let low = add_book(&store, "Low", "A", None);
    let high = add_book(&store, "High", "B", None);
    let mid = add_book(&store, "Mid", "C", None);

    add_review(&store, &low, &user, 1);
    add_review(&store, &high, &user, 5);
    add_review(&store, &mid, &user, 3);
    add_review(&store, &mid, &user, 4);

    let results = store
        .list_books(&BookQuery {
            sort: BookSort::Rating,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(results.len(), 3);
    for pair in results.windows(2) {
        assert!(pair[0].average_rating >= pair[1].average_rating);
    }
    assert_eq!(results[0].book.title, "High");
    assert_eq!(results[1].book.title, "Mid");
    assert_eq!(results[1].average_rating, 3.5);
}

#[test]
fn store_rating_sort_limit_applies_after_sort() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let first = add_book(&store, "Oldest But Best", "A", None);
    add_book(&store, "Newer", "B", None);
    add_book(&store, "Newest", "C", None);

    add_review(&store, &first, &user, 5);

    // The oldest book has the top rating; a post-sort limit must keep it
    // even though a storage-level LIMIT on the newest-first fetch would
    // have dropped it.
    let results = store
        .list_books(&BookQuery {
            sort: BookSort::Rating,
            limit: Some(1),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].book.title, "Oldest But Best");
}

#[test]
fn store_limit_caps_results_for_every_sort() {
    let store = test_store();
    for i in 0..5 {
        add_book(&store, &format!("Book {}", i), "A", None);
    }

    for sort in [BookSort::Newest, BookSort::Downloads, BookSort::Rating] {
        let results = store
            .list_books(&BookQuery {
                sort,
                limit: Some(3),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(results.len(), 3);

        let unlimited = store
            .list_books(&BookQuery {
                sort,
                limit: Some(100),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(unlimited.len(), 5);
    }
}

#[test]
fn store_update_book_patches_only_provided_fields() {
    let store = test_store();
    let id = add_book(&store, "Dune", "Frank Herbert", None);

    let updated = store
        .update_book(
            &id,
            &BookPatch {
                title: Some("Dune Messiah".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "Dune Messiah");
    assert_eq!(updated.author, "Frank Herbert");

    assert!(store.update_book("missing", &BookPatch::default()).unwrap().is_none());
}

#[test]
fn store_delete_book_preserves_dependent_rows() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    add_review(&store, &book, &user, 4);
    store.create_bookmark(&book, &user).unwrap();

    assert!(store.delete_book(&book).unwrap());
    assert!(store.get_book(&book).unwrap().is_none());
    assert!(!store.delete_book(&book).unwrap());

    // Dependent rows survive and still resolve by the old id.
    assert_eq!(store.reviews_for_book(&book).unwrap().len(), 1);
    assert!(store.is_bookmarked(&user, &book).unwrap());
}

#[test]
fn store_increment_download_count() {
    let store = test_store();
    let id = add_book(&store, "Dune", "Frank Herbert", None);

    for _ in 0..3 {
        assert!(store.increment_download_count(&id).unwrap());
    }

    let details = store.get_book(&id).unwrap().unwrap();
    assert_eq!(details.book.download_count, 3);

    assert!(!store.increment_download_count("missing").unwrap());
}

#[test]
fn store_concurrent_increments_lose_no_updates() {
    let store = test_store();
    let id = add_book(&store, "Dune", "Frank Herbert", None);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        let id = id.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..25 {
                store.increment_download_count(&id).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let details = store.get_book(&id).unwrap().unwrap();
    assert_eq!(details.book.download_count, 200);
}

// ========== REVIEWS ==========

#[test]
fn store_reviews_newest_first_with_reviewer() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    add_review(&store, &book, &user, 3);
    add_review(&store, &book, &user, 5);

    let reviews = store.reviews_for_book(&book).unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].review.rating, 5);
    assert_eq!(reviews[1].review.rating, 3);
    assert_eq!(reviews[0].user.name, "Reader");
    assert_eq!(reviews[0].user.email, "reader@example.com");
}

#[test]
fn store_review_by_missing_user_gets_placeholder() {
    let store = test_store();
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    add_review(&store, &book, "ghost-user", 4);

    let reviews = store.reviews_for_book(&book).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].user.name, "Unknown");
    assert_eq!(reviews[0].user.id, "");
    assert_eq!(reviews[0].user.email, "");
}

#[test]
fn store_same_user_may_review_twice() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    add_review(&store, &book, &user, 2);
    add_review(&store, &book, &user, 4);

    let details = store.get_book(&book).unwrap().unwrap();
    assert_eq!(details.review_count, 2);
    assert_eq!(details.average_rating, 3.0);
}

#[test]
fn store_list_all_reviews() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let a = add_book(&store, "Dune", "Frank Herbert", None);
    let b = add_book(&store, "Solaris", "Stanislaw Lem", None);

    add_review(&store, &a, &user, 4);
    add_review(&store, &b, &user, 5);

    let reviews = store.list_reviews().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].book_id, b);
}

// ========== BOOKMARKS ==========

#[test]
fn store_bookmark_lifecycle() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    assert!(!store.is_bookmarked(&user, &book).unwrap());

    store.create_bookmark(&book, &user).unwrap();
    assert!(store.is_bookmarked(&user, &book).unwrap());

    assert!(store.delete_bookmark(&user, &book).unwrap());
    assert!(!store.is_bookmarked(&user, &book).unwrap());

    // Deleting again is a no-op.
    assert!(!store.delete_bookmark(&user, &book).unwrap());
}

#[test]
fn store_duplicate_bookmark_is_conflict() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    store.create_bookmark(&book, &user).unwrap();
    let err = store.create_bookmark(&book, &user).unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[test]
fn store_bookmarks_for_user() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let other = add_user(&store, "other@example.com", "Other");
    let a = add_book(&store, "Dune", "Frank Herbert", None);
    let b = add_book(&store, "Solaris", "Stanislaw Lem", None);

    store.create_bookmark(&a, &user).unwrap();
    store.create_bookmark(&b, &user).unwrap();
    store.create_bookmark(&a, &other).unwrap();

    let bookmarks = store.bookmarks_for_user(&user).unwrap();
    assert_eq!(bookmarks.len(), 2);
    assert_eq!(bookmarks[0].book_id, b);
}

// ========== READING PROGRESS ==========

#[test]
fn store_progress_upsert_keeps_single_row() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    let first = store
        .upsert_reading_progress(&NewReadingProgress {
            book_id: book.clone(),
            user_id: user.clone(),
            last_page: 10,
            total_pages: Some(400),
        })
        .unwrap();
    assert_eq!(first.last_page, 10);

    let second = store
        .upsert_reading_progress(&NewReadingProgress {
            book_id: book.clone(),
            user_id: user.clone(),
            last_page: 80,
            total_pages: Some(400),
        })
        .unwrap();

    // Same row, overwritten in place.
    assert_eq!(second.id, first.id);
    assert_eq!(second.last_page, 80);

    let found = store.get_reading_progress(&user, &book).unwrap().unwrap();
    assert_eq!(found.last_page, 80);
    assert_eq!(found.total_pages, Some(400));
}

#[test]
fn store_progress_is_per_user_and_book() {
    let store = test_store();
    let alice = add_user(&store, "alice@example.com", "Alice");
    let bob = add_user(&store, "bob@example.com", "Bob");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    store
        .upsert_reading_progress(&NewReadingProgress {
            book_id: book.clone(),
            user_id: alice.clone(),
            last_page: 50,
            total_pages: None,
        })
        .unwrap();

    assert!(store.get_reading_progress(&bob, &book).unwrap().is_none());
    let found = store.get_reading_progress(&alice, &book).unwrap().unwrap();
    assert_eq!(found.last_page, 50);
}

// ========== DOWNLOADS & STATS ==========

#[test]
fn store_downloads_append_only_with_anonymous() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);

    store.create_download(&book, Some(&user)).unwrap();
    store.create_download(&book, None).unwrap();
    store.create_download(&book, Some(&user)).unwrap();

    let downloads = store.list_downloads().unwrap();
    assert_eq!(downloads.len(), 3);
    assert_eq!(downloads[0].user_id.as_deref(), Some(user.as_str()));
    assert_eq!(downloads[1].user_id, None);
}

#[test]
fn store_stats_counts() {
    let store = test_store();
    let user = add_user(&store, "reader@example.com", "Reader");
    let book = add_book(&store, "Dune", "Frank Herbert", None);
    add_book(&store, "Solaris", "Stanislaw Lem", None);

    add_review(&store, &book, &user, 5);
    store.create_download(&book, Some(&user)).unwrap();

    let stats = store.get_stats().unwrap();
    assert_eq!(stats.books, 2);
    assert_eq!(stats.users, 1);
    assert_eq!(stats.downloads, 1);
    assert_eq!(stats.reviews, 1);
}

// ========== AUTH ==========

#[test]
fn auth_register_and_login() {
    let store = test_store();
    let auth = AuthService::new(store, 30, true);

    let user = auth
        .register("alice@example.com", "password123", "Alice")
        .unwrap();
    assert_eq!(user.role, "user");

    let (logged_in, token) = auth.login("alice@example.com", "password123").unwrap();
    assert_eq!(logged_in.email, "alice@example.com");
    assert!(!token.is_empty());
}

#[test]
fn auth_wrong_password_rejected() {
    let store = test_store();
    let auth = AuthService::new(store, 30, true);

    auth.create_user("alice@example.com", "correct1", "Alice", "user")
        .unwrap();
    let err = auth.login("alice@example.com", "wrong123").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn auth_short_password_rejected() {
    let store = test_store();
    let auth = AuthService::new(store, 30, true);

    let err = auth
        .create_user("alice@example.com", "abc", "Alice", "user")
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn auth_invalid_email_rejected() {
    let store = test_store();
    let auth = AuthService::new(store, 30, true);

    assert!(auth.create_user("not-an-email", "password", "X", "user").is_err());
    assert!(auth.create_user("missing-domain@", "password", "X", "user").is_err());
    assert!(auth.create_user("@example.com", "password", "X", "user").is_err());
}

#[test]
fn auth_registration_disabled() {
    let store = test_store();
    let auth = AuthService::new(store, 30, false);

    let err = auth
        .register("alice@example.com", "password", "Alice")
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn auth_blocked_user_cannot_login() {
    let store = test_store();
    let auth = AuthService::new(store.clone(), 30, true);

    let user = auth
        .create_user("alice@example.com", "password", "Alice", "user")
        .unwrap();
    store.update_user_block(&user.id, true).unwrap();

    let err = auth.login("alice@example.com", "password").unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn auth_blocking_invalidates_existing_token() {
    let store = test_store();
    let auth = AuthService::new(store.clone(), 30, true);

    let user = auth
        .create_user("alice@example.com", "password", "Alice", "user")
        .unwrap();
    let (_, token) = auth.login("alice@example.com", "password").unwrap();
    assert!(auth.validate_token(&token).unwrap().is_some());

    store.update_user_block(&user.id, true).unwrap();
    assert!(auth.validate_token(&token).unwrap().is_none());
}

#[test]
fn auth_validate_and_logout() {
    let store = test_store();
    let auth = AuthService::new(store, 30, true);

    auth.create_user("alice@example.com", "password", "Alice", "admin")
        .unwrap();
    let (user, token) = auth.login("alice@example.com", "password").unwrap();
    assert!(auth.is_admin(&user));

    let validated = auth.validate_token(&token).unwrap().unwrap();
    assert_eq!(validated.email, "alice@example.com");

    assert!(auth.validate_token("bogus").unwrap().is_none());

    auth.logout(&token).unwrap();
    assert!(auth.validate_token(&token).unwrap().is_none());
}

// ========== CONFIG ==========

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Library"

[database]
path = "/tmp/test.db"

[auth]
registration = "disabled"
session_days = 7
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Library");
    assert!(!config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 7);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8080);
    assert!(config.auth.registration_enabled());
    assert_eq!(config.auth.session_days, 30);
}

#[test]
fn timestamp_datetime_conversion() {
    let dt = timestamp_to_datetime(1_700_000_000);
    assert_eq!(dt.timestamp(), 1_700_000_000);
    assert_eq!(dt.format("%Y-%m-%d").to_string(), "2023-11-14");
}

#[test]
fn book_sort_parse_falls_back_to_newest() {
    assert_eq!(BookSort::parse("downloads"), BookSort::Downloads);
    assert_eq!(BookSort::parse("rating"), BookSort::Rating);
    assert_eq!(BookSort::parse("newest"), BookSort::Newest);
    assert_eq!(BookSort::parse("garbage"), BookSort::Newest);
}
