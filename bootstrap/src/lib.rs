//! po-bootstrap - 服务启动骨架
//!
//! 运行时初始化、连接池指标采集与优雅停机信号

mod pool_metrics;
mod runtime;

pub use pool_metrics::*;
pub use runtime::*;
