//! PostgreSQL 集成测试
//!
//! 需要可写的测试库：`DATABASE_URL=postgres://... cargo test -- --ignored`

use std::sync::Arc;

use po_adapter_postgres::{MigrationManager, PostgresConfig, create_pool};
use serde_json::json;
use sqlx::PgPool;

use po_tracking::application::{ImportService, PedidoReconciler};
use po_tracking::domain::events::{LiveUpdate, NotificationSink};
use po_tracking::domain::pedido::normalize_pedido;
use po_tracking::domain::repositories::BaseRecordRepository;
use po_tracking::domain::supplier_order::SupplierOrderInput;
use po_tracking::infrastructure::persistence::{
    PostgresBaseRecordRepository, PostgresUnitOfWorkFactory, normalized_pedido_sql, schema,
};

struct NoopSink;

impl NotificationSink for NoopSink {
    fn publish(&self, _update: LiveUpdate) {}
}

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    create_pool(&PostgresConfig::new(url).with_max_connections(5))
        .await
        .unwrap()
}

async fn setup() -> PgPool {
    let pool = connect().await;

    let result = MigrationManager::new(pool.clone())
        .migrate(&schema::migrations())
        .await
        .unwrap();
    assert!(result.is_success());

    sqlx::query("TRUNCATE base_datos, ordenes_proveedor, nuevo_estatus RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();
    pool
}

async fn oc_for(pool: &PgPool, pedido: &str) -> String {
    sqlx::query_scalar(r#"SELECT "OC" FROM base_datos WHERE "PEDIDO" = $1"#)
        .bind(pedido)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
#[ignore]
async fn test_postgres_reconciliation_flow() {
    let pool = setup().await;
    let uow_factory = Arc::new(PostgresUnitOfWorkFactory::new(pool.clone()));
    let imports = ImportService::new(uow_factory.clone(), Arc::new(NoopSink));
    let reconciler = Arc::new(PedidoReconciler::new(uow_factory, Arc::new(NoopSink)));

    // 含 NUL 的行被数据库拒绝，只跳过该行
    let summary = imports
        .import_base_records(&[
            json!({"id": 99, "PEDIDO": "100.00", "FECHA_PEDIDO": 45000.5, "DESCONOCIDA": "x"}),
            json!({"PEDIDO": "bad\u{0}row"}),
            json!({"PEDIDO": " 200 ", "COMPAQ": "GENERAR"}),
        ])
        .await
        .unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 1);

    let date: String =
        sqlx::query_scalar(r#"SELECT "FECHA_PEDIDO" FROM base_datos WHERE "PEDIDO" = '100.00'"#)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(date, "15/03/2023 12:00:00");

    // OC 与 COMPAQ 为 null 时写入空字符串，不会被 NOT NULL 拒绝
    let summary = imports
        .import_base_records(&[
            json!({"PEDIDO": "300", "OC": null}),
            json!({"PEDIDO": "100\u{a0}", "COMPAQ": null}),
        ])
        .await
        .unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped, 0);

    // 并发写入同一订单号，advisory lock 保证结果与某个串行顺序一致
    let first = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .upsert(&[SupplierOrderInput::new("100", "SP-A")])
                .await
        })
    };
    let second = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .upsert(&[SupplierOrderInput::new("100.0", "SP-B")])
                .await
        })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let orders: Vec<String> = sqlx::query_scalar(
        r#"SELECT "ORDEN_PROVEEDOR" FROM ordenes_proveedor WHERE "PEDIDO" = '100'"#,
    )
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(oc_for(&pool, "100.00").await, orders[0]);
    // 不间断空格不属于裁剪字符
    assert_eq!(oc_for(&pool, "100\u{a0}").await, "");

    reconciler
        .upsert(&[SupplierOrderInput::new(200, "SP-200")])
        .await
        .unwrap();
    assert_eq!(oc_for(&pool, " 200 ").await, "SP-200");

    let pending = PostgresBaseRecordRepository::new(pool.clone())
        .list_pending_capture()
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["PEDIDO"], " 200 ");

    let id: i32 = sqlx::query_scalar(r#"SELECT id FROM ordenes_proveedor WHERE "PEDIDO" = '200'"#)
        .fetch_one(&pool)
        .await
        .unwrap();
    let summary = reconciler.delete(&[id]).await.unwrap();
    assert_eq!(summary.deleted, 1);
    assert_eq!(oc_for(&pool, " 200 ").await, "");
    assert_eq!(oc_for(&pool, "100.00").await, orders[0]);

    // 再次全量对账不改变结果
    reconciler.sync().await.unwrap();
    assert_eq!(oc_for(&pool, "100.00").await, orders[0]);
}

#[tokio::test]
#[ignore]
async fn test_sql_pedido_normalization_matches_domain() {
    let pool = connect().await;
    let sql = format!("SELECT {}", normalized_pedido_sql("$1::text"));

    for raw in [
        "100",
        " 100 ",
        "100.00",
        "100\u{a0}",
        "\u{b}100",
        "\t7.0\n",
        "1.0.00",
        "2.00.0.000",
        " 5 .0",
        "1.5.00",
        "100.",
        "X0.0",
        "",
    ] {
        let normalized: String = sqlx::query_scalar(&sql)
            .bind(raw)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(normalized, normalize_pedido(raw), "input {raw:?}");
    }
}
