pub mod auth;
pub mod routes;

use anyhow::Result;
use taskdesk_db::Db;
use tokio::net::TcpListener;

pub async fn serve(listener: TcpListener, db: Db) -> Result<()> {
    let app = routes::build_router(db);
    axum::serve(listener, app).await?;
    Ok(())
}
