use mongodb::{Database, bson::doc};

/// Run the `ping` admin command against `db`.
pub async fn ping(db: &Database) -> mongodb::error::Result<()> {
    db.run_command(doc! { "ping": 1 }).await.map(|_| ())
}
