use crate::config::AppConfig;
use crate::errors::ServiceError;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tracing::info;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool using the application configuration.
pub async fn establish_connection(config: &AppConfig) -> Result<DbPool, ServiceError> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    info!("Database connection established");
    Ok(pool)
}

/// Creates the order tables when they are missing.
///
/// The orders schema is owned by the surrounding shop application; this
/// exists for fresh deployments and the test harness. Ids are assigned by
/// the owning application, so there is no auto-increment.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), ServiceError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id BIGINT PRIMARY KEY NOT NULL,
            first_name VARCHAR(50) NOT NULL DEFAULT '',
            last_name VARCHAR(50) NOT NULL DEFAULT '',
            email VARCHAR(254) NOT NULL DEFAULT '',
            address VARCHAR(250) NOT NULL DEFAULT '',
            postal_code VARCHAR(20) NOT NULL DEFAULT '',
            city VARCHAR(100) NOT NULL DEFAULT '',
            paid BOOLEAN NOT NULL DEFAULT FALSE,
            discount REAL NOT NULL DEFAULT 0,
            total REAL NOT NULL DEFAULT 0,
            coupon_id BIGINT NULL,
            stripe_id VARCHAR(250) NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NULL
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS order_items (
            id BIGINT PRIMARY KEY NOT NULL,
            order_id BIGINT NOT NULL,
            product_id BIGINT NOT NULL,
            product_name VARCHAR(250) NOT NULL DEFAULT '',
            price REAL NULL,
            quantity INTEGER NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id)",
    ];

    let backend = db.get_database_backend();
    for sql in statements {
        db.execute(Statement::from_string(backend, sql.to_string()))
            .await?;
    }
    info!("Order schema ensured");
    Ok(())
}
