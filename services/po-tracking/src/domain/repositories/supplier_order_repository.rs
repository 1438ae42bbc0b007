//! 供应商订单 Repository trait

use async_trait::async_trait;
use po_errors::AppResult;

use crate::domain::supplier_order::SupplierOrder;

#[async_trait]
pub trait SupplierOrderRepository: Send + Sync {
    /// 全部供应商订单（id 倒序）
    async fn list(&self) -> AppResult<Vec<SupplierOrder>>;
}
