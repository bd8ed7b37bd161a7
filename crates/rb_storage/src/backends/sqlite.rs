use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rb_core::{
    Article, ArticlePatch, ArticleSource, ArticleStorage, Error, NewArticle, ReferenceLink, Result,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        author TEXT,
        published_at TEXT,
        excerpt TEXT,
        content TEXT,
        refs TEXT NOT NULL DEFAULT '[]',
        source TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

const SELECT_COLUMNS: &str = "SELECT id, url, title, author, published_at, excerpt, content, refs, source, created_at, updated_at FROM articles";

pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Storage(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Storage(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn get_by_url(&self, url: &str) -> Result<Article> {
        let row = sqlx::query(&format!("{} WHERE url = ?", SELECT_COLUMNS))
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to load article: {}", e)))?;
        row.map(|r| row_to_article(&r)).ok_or(Error::NotFound)?
    }

    async fn write_article(&self, article: &Article, on_conflict: &str) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO articles
            (id, url, title, author, published_at, excerpt, content, refs, source, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            {}
            "#,
            on_conflict
        );
        sqlx::query(&sql)
            .bind(&article.id)
            .bind(&article.url)
            .bind(&article.title)
            .bind(article.author.as_deref())
            .bind(article.published_at.as_ref().map(format_timestamp))
            .bind(article.excerpt.as_deref())
            .bind(article.content.as_deref())
            .bind(serde_json::to_string(&article.references)?)
            .bind(article.source.as_str())
            .bind(format_timestamp(&article.created_at))
            .bind(format_timestamp(&article.updated_at))
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn list(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY published_at ASC, created_at ASC",
            SELECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Storage(format!("Failed to list articles: {}", e)))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn create(&self, article: NewArticle) -> Result<Article> {
        article.validate()?;
        let now = Utc::now();
        let article = article.into_article(Uuid::new_v4().to_string(), now, now);
        self.write_article(&article, "").await?;
        Ok(article)
    }

    async fn upsert_by_url(&self, article: NewArticle) -> Result<Article> {
        article.validate()?;
        let now = Utc::now();
        let url = article.url.clone();
        let candidate = article.into_article(Uuid::new_v4().to_string(), now, now);
        self.write_article(
            &candidate,
            r#"ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                author = excluded.author,
                published_at = excluded.published_at,
                excerpt = excluded.excerpt,
                content = excluded.content,
                refs = excluded.refs,
                source = excluded.source,
                updated_at = excluded.updated_at"#,
        )
        .await?;
        self.get_by_url(&url).await
    }

    async fn get_by_id(&self, id: &str) -> Result<Article> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to load article: {}", e)))?;
        row.map(|r| row_to_article(&r)).ok_or(Error::NotFound)?
    }

    async fn update_by_id(&self, id: &str, patch: ArticlePatch) -> Result<Article> {
        let mut article = self.get_by_id(id).await?;
        patch.apply(&mut article)?;
        article.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE articles SET
                url = ?, title = ?, author = ?, published_at = ?, excerpt = ?,
                content = ?, refs = ?, source = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&article.url)
        .bind(&article.title)
        .bind(article.author.as_deref())
        .bind(article.published_at.as_ref().map(format_timestamp))
        .bind(article.excerpt.as_deref())
        .bind(article.content.as_deref())
        .bind(serde_json::to_string(&article.references)?)
        .bind(article.source.as_str())
        .bind(format_timestamp(&article.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(article)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(format!("Failed to delete article: {}", e)))?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }
}

// Fixed-width UTC timestamps so that text ordering matches time ordering.
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("Failed to parse date {}: {}", value, e)))
}

fn map_write_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            Error::Validation("An article with this url already exists".to_string())
        }
        other => Error::Storage(format!("Failed to store article: {}", other)),
    }
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let refs: String = row.get("refs");
    let references: Vec<ReferenceLink> = serde_json::from_str(&refs)?;
    let published_at = row
        .get::<Option<String>, _>("published_at")
        .map(|v| parse_timestamp(&v))
        .transpose()?;

    Ok(Article {
        id: row.get("id"),
        url: row.get("url"),
        title: row.get("title"),
        author: row.get("author"),
        published_at,
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        references,
        source: ArticleSource::parse(&row.get::<String, _>("source"))?,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}
