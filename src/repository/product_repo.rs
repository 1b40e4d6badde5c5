// ==========================================
// 门店库存同步系统 - 商品主数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::inventory::{NewProduct, Product};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension};

// ==========================================
// ProductRepository - 商品仓储
// ==========================================
/// 职责: 管理 products 表的查询与插入
/// 连接由调用方在单次操作内借出（可为事务）
pub struct ProductRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ProductRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 按货号查询商品
    ///
    /// # 返回
    /// - Ok(Some(Product)): 找到商品
    /// - Ok(None): 未找到
    /// - Err: 数据库错误
    pub fn find_by_article(&self, article_number: &str) -> RepositoryResult<Option<Product>> {
        let product = self
            .conn
            .query_row(
                r#"
                SELECT id, article_number, description, department, category
                FROM products
                WHERE article_number = ?1
                "#,
                params![article_number],
                |row| {
                    Ok(Product {
                        id: row.get(0)?,
                        article_number: row.get(1)?,
                        description: row.get(2)?,
                        department: row.get(3)?,
                        category: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(product)
    }

    /// 按货号查询商品 ID
    pub fn find_id_by_article(&self, article_number: &str) -> RepositoryResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM products WHERE article_number = ?1",
                params![article_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 插入新商品，返回生成的 ID
    pub fn insert(&self, product: &NewProduct) -> RepositoryResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO products (article_number, description, department, category)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                product.article_number,
                product.description,
                product.department,
                product.category,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// 商品总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(n)
    }
}
