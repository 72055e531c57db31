use time::{Duration, OffsetDateTime, macros::datetime};

use bhub_config::{Config, Listing, Search, Security, Service, Sqlite, Storage};
use bhub_service::{BhubService, ListRequest, RankedSearchRequest, SuggestionsRequest};
use bhub_storage::{db::Db, models::NewArticle, queries};
use bhub_testkit::TestDatabase;

fn test_config(dsn: String) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			admin_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage { sqlite: Sqlite { dsn, pool_max_conns: 1 } },
		search: Search::default(),
		listing: Listing::default(),
		security: Security::default(),
	}
}

async fn open(test_db: &TestDatabase) -> (BhubService, Db) {
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.sqlite).await.expect("Failed to connect to SQLite.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	(BhubService::new(cfg, db.clone()), db)
}

fn article(title: &str, published: OffsetDateTime) -> NewArticle {
	NewArticle {
		title: title.to_string(),
		r#abstract: None,
		keywords: None,
		publication_date: Some(published),
		journal_name: None,
		category_id: None,
		feed_id: None,
		source_type: "RSS".to_string(),
		impact_score: 5.0,
		highlighted: false,
		is_published: true,
		pdf_file_path: None,
		created_at: published,
	}
}

async fn insert(db: &Db, article: NewArticle) -> i64 {
	queries::insert_article(db, &article).await.expect("Failed to insert article.")
}

fn ids(response: &bhub_service::ListResponse) -> Vec<i64> {
	response.items.iter().map(|item| item.id).collect()
}

#[tokio::test]
async fn search_keeps_relevance_order_over_requested_sort() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let day = datetime!(2024-03-01 00:00 UTC);
	let weak = insert(
		&db,
		NewArticle {
			r#abstract: Some(
				"A broad review of attention, perception, language and memory research.".to_string(),
			),
			..article("A review of cognition", day)
		},
	)
	.await;
	let strong = insert(&db, article("Working memory and memory consolidation", day)).await;

	insert(&db, article("Unrelated ecology field notes", day)).await;

	let response = service
		.list(ListRequest {
			search: Some("memory AND".to_string()),
			sort_by: Some("title".to_string()),
			sort_order: Some("asc".to_string()),
			..Default::default()
		})
		.await
		.expect("List failed.");

	assert_eq!(ids(&response), vec![strong, weak]);
	assert_eq!(response.total, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn substring_fallback_finds_infix_matches() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let published = datetime!(2024-03-01 00:00 UTC);
	let id = insert(&db, article("Advances in neuroscience", published)).await;

	insert(&db, article("Marine biology", datetime!(2024-03-02 00:00 UTC))).await;

	let response = service
		.list(ListRequest { search: Some("roscien".to_string()), ..Default::default() })
		.await
		.expect("List failed.");

	assert_eq!(ids(&response), vec![id]);

	let nothing = service
		.list(ListRequest { search: Some("zzzzqqq".to_string()), ..Default::default() })
		.await
		.expect("List failed.");

	assert!(nothing.items.is_empty());
	assert_eq!(nothing.total, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn search_results_still_honor_listing_filters() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let neuro = queries::insert_category(&db, "Neuroscience", "neuroscience")
		.await
		.expect("Failed to insert category.");
	let day = datetime!(2024-03-01 00:00 UTC);
	let kept =
		insert(&db, NewArticle { category_id: Some(neuro), ..article("Sleep spindles", day) }).await;

	insert(&db, article("Sleep and plants", day)).await;
	insert(
		&db,
		NewArticle { category_id: Some(neuro), is_published: false, ..article("Sleep draft", day) },
	)
	.await;

	let response = service
		.list(ListRequest {
			search: Some("sleep".to_string()),
			category_ids: vec![neuro],
			..Default::default()
		})
		.await
		.expect("List failed.");

	assert_eq!(ids(&response), vec![kept]);
	assert_eq!(response.total, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn default_listing_puts_highlighted_first_and_paginates() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let base = datetime!(2024-01-01 00:00 UTC);
	let mut inserted = Vec::new();

	for offset in 0..5 {
		inserted.push(insert(&db, article("Plain", base + Duration::days(offset))).await);
	}

	let pinned =
		insert(&db, NewArticle { highlighted: true, ..article("Pinned", base - Duration::days(9)) })
			.await;
	let first = service
		.list(ListRequest { page_size: Some(4), ..Default::default() })
		.await
		.expect("List failed.");

	assert_eq!(ids(&first), vec![pinned, inserted[4], inserted[3], inserted[2]]);
	assert_eq!(first.total, 6);
	assert_eq!(first.total_pages, 2);

	let second = service
		.list(ListRequest { page: Some(2), page_size: Some(4), ..Default::default() })
		.await
		.expect("List failed.");

	assert_eq!(ids(&second), vec![inserted[1], inserted[0]]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn interleaved_listing_spreads_two_feeds() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let feed_a = queries::insert_feed(&db, "Feed A", "https://a.example.org/rss")
		.await
		.expect("Failed to insert feed.");
	let feed_b = queries::insert_feed(&db, "Feed B", "https://b.example.org/rss")
		.await
		.expect("Failed to insert feed.");
	let newest = datetime!(2024-02-01 00:00 UTC);
	let mut from_a = Vec::new();
	let mut from_b = Vec::new();

	for idx in 0..10 {
		let published = newest - Duration::days(idx);

		from_a.push(
			insert(&db, NewArticle { feed_id: Some(feed_a), ..article("From A", published) }).await,
		);
	}
	for idx in 10..20 {
		let published = newest - Duration::days(idx);

		from_b.push(
			insert(&db, NewArticle { feed_id: Some(feed_b), ..article("From B", published) }).await,
		);
	}

	let response = service
		.list(ListRequest {
			page_size: Some(12),
			strategy: Some("interleaved".to_string()),
			..Default::default()
		})
		.await
		.expect("List failed.");
	let mut expected = vec![from_a[0], from_a[1], from_b[0], from_b[1]];

	expected.extend(&from_a[2..]);

	assert_eq!(ids(&response), expected);
	assert_eq!(response.total, 20);

	let plain = service
		.list(ListRequest { page_size: Some(12), ..Default::default() })
		.await
		.expect("List failed.");

	assert_eq!(ids(&plain)[..10], from_a[..]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn ranked_search_applies_category_and_boosts() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let neuro = queries::insert_category(&db, "Neuroscience", "neuroscience")
		.await
		.expect("Failed to insert category.");
	let now = datetime!(2024-06-30 00:00 UTC);
	let old = insert(
		&db,
		NewArticle {
			category_id: Some(neuro),
			..article("Dopamine signaling", now - Duration::days(400))
		},
	)
	.await;
	let fresh = insert(
		&db,
		NewArticle {
			category_id: Some(neuro),
			impact_score: 9.0,
			..article("Dopamine signaling", now - Duration::days(3))
		},
	)
	.await;

	insert(&db, article("Dopamine in plants", now - Duration::days(1))).await;

	let response = service
		.ranked_search_at(
			RankedSearchRequest {
				q: "dopamine".to_string(),
				category_id: Some(neuro),
				..Default::default()
			},
			now,
		)
		.await
		.expect("Ranked search failed.");

	assert_eq!(
		response.items.iter().map(|item| item.article.id).collect::<Vec<_>>(),
		vec![fresh, old]
	);
	assert_eq!(response.total, 2);
	assert!(response.items[0].final_score > response.items[1].final_score);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
async fn suggestions_stats_and_rebuild() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;
	let day = datetime!(2024-03-01 00:00 UTC);

	queries::insert_category(&db, "Neurology", "neurology")
		.await
		.expect("Failed to insert category.");
	insert(&db, article("Neuroimaging of neurons", day)).await;
	insert(&db, article("Neuroimaging methods", day)).await;

	let suggestions = service
		.suggestions(SuggestionsRequest { q: "neuro".to_string(), limit: None })
		.await
		.expect("Suggestions failed.");

	assert_eq!(suggestions.suggestions, vec!["Neuroimaging", "neurons", "Neurology"]);

	let stats = service.search_stats().await;

	assert!(stats.fts_available);
	assert_eq!(stats.indexed_articles, 2);

	let report = service.rebuild_index().await.expect("Failed to rebuild index.");

	assert_eq!(report.indexed_articles, 2);

	sqlx_drop_index(&db).await;

	let stats = service.search_stats().await;

	assert!(!stats.fts_available);
	assert_eq!(stats.indexed_articles, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

async fn sqlx_drop_index(db: &Db) {
	for statement in [
		"DROP TRIGGER articles_ai",
		"DROP TRIGGER articles_ad",
		"DROP TRIGGER articles_au",
		"DROP TABLE articles_fts",
	] {
		sqlx::query(statement).execute(&db.pool).await.expect("Failed to drop index objects.");
	}
}

#[tokio::test]
async fn missing_index_falls_back_for_listings() {
	let test_db = TestDatabase::new().await.expect("Failed to create test database.");
	let (service, db) = open(&test_db).await;

	sqlx_drop_index(&db).await;

	let id = insert(&db, article("Circadian rhythm", datetime!(2024-03-01 00:00 UTC))).await;
	let response = service
		.list(ListRequest { search: Some("circadian".to_string()), ..Default::default() })
		.await
		.expect("List failed.");

	assert_eq!(ids(&response), vec![id]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
