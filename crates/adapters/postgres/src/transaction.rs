//! PostgreSQL 事务管理模块
//!
//! 提供事务开启/提交/回滚、savepoint 以及事务级 advisory lock

use po_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    /// 创建新的事务管理器
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 开始事务
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))
    }

    /// 提交事务
    pub async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    /// 回滚事务
    pub async fn rollback(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}

/// 获取事务级 advisory lock，事务结束时自动释放
pub async fn acquire_xact_lock(tx: &mut Transaction<'static, Postgres>, key: i64) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to acquire advisory lock: {}", e)))?;

    debug!(key, "Advisory lock acquired");
    Ok(())
}

/// Savepoint 管理
///
/// 在 PostgreSQL 中，事务内任何语句失败都会使整个事务进入 aborted 状态；
/// 包在 savepoint 里的语句失败后回滚到 savepoint，外层事务可以继续。
pub struct Savepoint<'a> {
    tx: &'a mut Transaction<'static, Postgres>,
    name: String,
}

impl<'a> Savepoint<'a> {
    /// 创建新的 savepoint（名称必须是合法的 SQL 标识符）
    pub async fn new(
        tx: &'a mut Transaction<'static, Postgres>,
        name: impl Into<String>,
    ) -> AppResult<Savepoint<'a>> {
        let name = name.into();
        sqlx::query(&format!("SAVEPOINT {}", name))
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to create savepoint: {}", e)))?;

        Ok(Savepoint { tx, name })
    }

    /// 在 savepoint 内执行语句所用的事务
    pub fn transaction(&mut self) -> &mut Transaction<'static, Postgres> {
        self.tx
    }

    /// 释放 savepoint
    pub async fn release(self) -> AppResult<()> {
        sqlx::query(&format!("RELEASE SAVEPOINT {}", self.name))
            .execute(&mut **self.tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to release savepoint: {}", e)))?;
        Ok(())
    }

    /// 回滚到 savepoint 并释放
    pub async fn rollback(self) -> AppResult<()> {
        sqlx::query(&format!("ROLLBACK TO SAVEPOINT {}", self.name))
            .execute(&mut **self.tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback to savepoint: {}", e)))?;

        // ROLLBACK TO 之后 savepoint 仍然存在
        sqlx::query(&format!("RELEASE SAVEPOINT {}", self.name))
            .execute(&mut **self.tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to release savepoint: {}", e)))?;

        debug!(savepoint = %self.name, "Rolled back to savepoint");
        Ok(())
    }
}
