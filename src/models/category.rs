use sqlx::SqlitePool;

use crate::constants::{NO_CATEGORY, NO_CATEGORY_LABEL};
use crate::error::Result;

/// One of the two independent category axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Taxonomy {
    First,
    Second,
}

impl Taxonomy {
    pub const ALL: [Taxonomy; 2] = [Taxonomy::First, Taxonomy::Second];

    /// Parse the form value (1 or 2) naming a taxonomy
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(Taxonomy::First),
            2 => Some(Taxonomy::Second),
            _ => None,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Taxonomy::First => 1,
            Taxonomy::Second => 2,
        }
    }

    /// Human-readable name
    pub fn title(self) -> &'static str {
        match self {
            Taxonomy::First => "Category 1",
            Taxonomy::Second => "Category 2",
        }
    }

    fn table(self) -> &'static str {
        match self {
            Taxonomy::First => "category1",
            Taxonomy::Second => "category2",
        }
    }
}

/// A category in either taxonomy
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub label: String,
}

/// A select-box option: `value` is a category id, or 0 for "not selected"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: i64,
    pub label: String,
}

impl Category {
    /// All categories of a taxonomy, in id order
    pub async fn list(pool: &SqlitePool, taxonomy: Taxonomy) -> Result<Vec<Category>> {
        let sql = format!("SELECT id, label FROM {} ORDER BY id", taxonomy.table());
        let categories = sqlx::query_as::<_, Category>(&sql)
            .fetch_all(pool)
            .await?;
        Ok(categories)
    }

    pub async fn find_by_label(
        pool: &SqlitePool,
        taxonomy: Taxonomy,
        label: &str,
    ) -> Result<Option<Category>> {
        let sql = format!("SELECT id, label FROM {} WHERE label = ?", taxonomy.table());
        let category = sqlx::query_as::<_, Category>(&sql)
            .bind(label)
            .fetch_optional(pool)
            .await?;
        Ok(category)
    }

    pub async fn exists(pool: &SqlitePool, taxonomy: Taxonomy, id: i64) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", taxonomy.table());
        let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(pool).await?;
        Ok(count > 0)
    }

    pub async fn create(pool: &SqlitePool, taxonomy: Taxonomy, label: &str) -> Result<Category> {
        let sql = format!("INSERT INTO {} (label) VALUES (?)", taxonomy.table());
        let id = sqlx::query(&sql)
            .bind(label)
            .execute(pool)
            .await?
            .last_insert_rowid();

        tracing::info!("Created {} '{}' (id {})", taxonomy.title(), label, id);

        Ok(Category {
            id,
            label: label.to_string(),
        })
    }

    /// Select-box options for a taxonomy: the "N/A" sentinel, then every
    /// category in id order
    pub async fn choices(pool: &SqlitePool, taxonomy: Taxonomy) -> Result<Vec<Choice>> {
        let categories = Self::list(pool, taxonomy).await?;
        Ok(with_sentinel(categories))
    }
}

fn with_sentinel(categories: Vec<Category>) -> Vec<Choice> {
    std::iter::once(Choice {
        value: NO_CATEGORY,
        label: NO_CATEGORY_LABEL.to_string(),
    })
    .chain(categories.into_iter().map(|c| Choice {
        value: c.id,
        label: c.label,
    }))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_test_database;

    #[test]
    fn test_taxonomy_values() {
        for taxonomy in Taxonomy::ALL {
            assert_eq!(Taxonomy::from_value(taxonomy.value()), Some(taxonomy));
        }
        assert_eq!(Taxonomy::from_value(0), None);
        assert_eq!(Taxonomy::from_value(3), None);
    }

    #[tokio::test]
    async fn test_choices_start_with_sentinel_then_id_order() {
        let (_dir, pool) = open_test_database().await;

        let strategy = Category::create(&pool, Taxonomy::First, "Strategy").await.unwrap();
        let action = Category::create(&pool, Taxonomy::First, "Action").await.unwrap();

        let choices = Category::choices(&pool, Taxonomy::First).await.unwrap();
        let values: Vec<i64> = choices.iter().map(|c| c.value).collect();
        let labels: Vec<&str> = choices.iter().map(|c| c.label.as_str()).collect();

        assert_eq!(values, vec![0, strategy.id, action.id]);
        assert_eq!(labels, vec!["N/A", "Strategy", "Action"]);
    }

    #[tokio::test]
    async fn test_taxonomies_are_independent() {
        let (_dir, pool) = open_test_database().await;

        let first = Category::create(&pool, Taxonomy::First, "Board").await.unwrap();

        assert!(Category::exists(&pool, Taxonomy::First, first.id).await.unwrap());
        assert!(Category::find_by_label(&pool, Taxonomy::Second, "Board")
            .await
            .unwrap()
            .is_none());

        // The same label may live in both taxonomies
        let second = Category::create(&pool, Taxonomy::Second, "Board").await.unwrap();
        assert_eq!(
            Category::find_by_label(&pool, Taxonomy::Second, "Board")
                .await
                .unwrap(),
            Some(second)
        );

        let choices = Category::choices(&pool, Taxonomy::Second).await.unwrap();
        assert_eq!(choices.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_taxonomy_has_only_sentinel() {
        let (_dir, pool) = open_test_database().await;

        let choices = Category::choices(&pool, Taxonomy::Second).await.unwrap();

        assert_eq!(
            choices,
            vec![Choice {
                value: 0,
                label: "N/A".to_string()
            }]
        );
    }
}
