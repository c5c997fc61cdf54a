use migration::{Migrator, MigratorTrait, SchemaManager};
use sea_orm::Database;

#[tokio::test]
async fn up_and_down_round_trip_the_schema() {
    let db = Database::connect("sqlite::memory:").await.unwrap();

    Migrator::up(&db, None).await.unwrap();
    let manager = SchemaManager::new(&db);
    for table in ["wallets", "categories", "transactions"] {
        assert!(manager.has_table(table).await.unwrap(), "{table} missing");
    }
    assert!(
        manager
            .has_column("wallets", "initial_balance")
            .await
            .unwrap()
    );

    Migrator::down(&db, None).await.unwrap();
    let manager = SchemaManager::new(&db);
    assert!(!manager.has_table("transactions").await.unwrap());
    assert!(!manager.has_table("wallets").await.unwrap());
}
