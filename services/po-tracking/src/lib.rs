//! 采购订单跟踪服务
//!
//! 分层：domain（类型与端口）、application（用例）、
//! infrastructure（PostgreSQL 与内存实现、实时推送）、api（HTTP 与 WebSocket）。

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
