use sqlx::PgPool;

use crate::domain::category::{Category, CategoryUpdate, NewCategory};

use super::repo_error::RepositoryError;

#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every category with its active-business count. Callers assemble
    /// hierarchies and apply listing filters in memory; the full set is
    /// directory-scale small.
    pub async fn list_with_counts(&self) -> Result<Vec<(Category, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCountRow>(
            r#"
            SELECT c.id, c.slug, c.name, c.description, c.icon, c.image,
                   c.parent_id, c.featured, c.display_order,
                   COUNT(b.id) FILTER (WHERE b.status = 'ACTIVE') AS business_count
            FROM categories c
            LEFT JOIN business_categories bc ON bc.category_id = c.id
            LEFT JOIN businesses b ON b.id = bc.business_id
            GROUP BY c.id
            ORDER BY c.display_order, c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CategoryCountRow::into_pair).collect())
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, slug, name, description, icon, image, parent_id, featured,
                   display_order
            FROM categories
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("category {slug}")))?;

        Ok(row.into_category())
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn insert_category(&self, new: &NewCategory) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (slug, name, description, icon, image,
                                    parent_id, featured, display_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, slug, name, description, icon, image, parent_id,
                      featured, display_order
            "#,
        )
        .bind(&new.slug)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.icon)
        .bind(&new.image)
        .bind(new.parent_id)
        .bind(new.featured)
        .bind(new.display_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_category())
    }

    pub async fn update_category(
        &self,
        id: i32,
        update: &CategoryUpdate,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                icon = COALESCE($5, icon),
                image = COALESCE($6, image),
                parent_id = COALESCE($7, parent_id),
                featured = COALESCE($8, featured),
                display_order = COALESCE($9, display_order)
            WHERE id = $1
            RETURNING id, slug, name, description, icon, image, parent_id,
                      featured, display_order
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.slug)
        .bind(&update.description)
        .bind(&update.icon)
        .bind(&update.image)
        .bind(update.parent_id)
        .bind(update.featured)
        .bind(update.display_order)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("category {id}")))?;

        Ok(row.into_category())
    }

    /// How many businesses and child categories still reference this
    /// category; deletion is refused while either is non-zero.
    pub async fn usage_counts(&self, id: i32) -> Result<(i64, i64), RepositoryError> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM business_categories WHERE category_id = $1),
                (SELECT COUNT(*) FROM categories WHERE parent_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    pub async fn delete_category(&self, id: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("category {id}")));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    slug: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    image: Option<String>,
    parent_id: Option<i32>,
    featured: bool,
    display_order: i32,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            icon: self.icon,
            image: self.image,
            parent_id: self.parent_id,
            featured: self.featured,
            display_order: self.display_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryCountRow {
    id: i32,
    slug: String,
    name: String,
    description: Option<String>,
    icon: Option<String>,
    image: Option<String>,
    parent_id: Option<i32>,
    featured: bool,
    display_order: i32,
    business_count: i64,
}

impl CategoryCountRow {
    fn into_pair(self) -> (Category, i64) {
        (
            Category {
                id: self.id,
                slug: self.slug,
                name: self.name,
                description: self.description,
                icon: self.icon,
                image: self.image,
                parent_id: self.parent_id,
                featured: self.featured,
                display_order: self.display_order,
            },
            self.business_count,
        )
    }
}
