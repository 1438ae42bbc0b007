//! Unit of Work 模式
//!
//! 对账和导入在同一事务内执行多条语句，任何一条失败整批回滚。

use async_trait::async_trait;
use po_errors::AppResult;
use std::collections::HashSet;

use crate::domain::base_record::ImportRow;
use crate::domain::pedido::NormalizedPedido;

/// 事务内的基础数据写操作
#[async_trait]
pub trait BaseRecordWriter: Send + Sync {
    /// 目标表的列集合
    async fn columns(&self) -> AppResult<HashSet<String>>;

    /// 尽力插入一行；该行失败时返回 false，事务继续
    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool>;

    /// 按规范化订单号把供应商单号写入 OC，返回更新行数
    async fn sync_oc(&self) -> AppResult<u64>;

    /// 清空给定订单号对应记录的 OC，返回更新行数
    async fn clear_oc(&self, pedidos: &[NormalizedPedido]) -> AppResult<u64>;
}

/// 事务内的供应商订单写操作
#[async_trait]
pub trait SupplierOrderWriter: Send + Sync {
    /// 删除规范化订单号相同的订单
    async fn delete_by_pedido(&self, pedido: &NormalizedPedido) -> AppResult<u64>;

    async fn insert(&self, pedido: &NormalizedPedido, orden_proveedor: &str) -> AppResult<()>;

    /// 给定 id 的订单的规范化订单号（去除空值）
    async fn pedidos_for_ids(&self, ids: &[i32]) -> AppResult<Vec<NormalizedPedido>>;

    async fn delete_by_ids(&self, ids: &[i32]) -> AppResult<u64>;
}

/// 事务内的新状态表写操作
#[async_trait]
pub trait NuevoEstatusWriter: Send + Sync {
    async fn columns(&self) -> AppResult<HashSet<String>>;

    async fn delete_all(&self) -> AppResult<u64>;

    async fn insert_row(&self, row: &ImportRow) -> AppResult<bool>;
}

/// Unit of Work trait
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
/// uow.lock_reconciliation().await?;
/// uow.supplier_orders().insert(&pedido, "SP-1").await?;
/// uow.base_records().sync_oc().await?;
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn base_records(&self) -> &dyn BaseRecordWriter;

    fn supplier_orders(&self) -> &dyn SupplierOrderWriter;

    fn nuevo_estatus(&self) -> &dyn NuevoEstatusWriter;

    /// 串行化对账事务，锁在事务结束时释放
    async fn lock_reconciliation(&self) -> AppResult<()>;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
