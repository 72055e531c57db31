pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_categories.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_categories.sql")),
				"tables/002_feeds.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_feeds.sql")),
				"tables/003_articles.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_articles.sql")),
				"tables/004_authors.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_authors.sql")),
				"tables/005_article_authors.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_article_authors.sql")),
				"tables/006_articles_fts.sql" =>
					out.push_str(include_str!("../../../sql/tables/006_articles_fts.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
