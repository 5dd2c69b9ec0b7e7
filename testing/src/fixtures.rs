use cs_core::Coordinate;
use mongodb::bson::doc;
use std::sync::atomic::{AtomicU32, Ordering};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mongo::Mongo;
use tokio::sync::OnceCell;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

/// `retail@v1 / api-customers@v2 (dev)`
pub fn sample_coordinate() -> Coordinate {
    Coordinate::new("retail", "v1", "api-customers", "v2", "dev")
}

/// Sample coordinate with a unique project name, for tests sharing a store.
pub fn unique_coordinate() -> Coordinate {
    Coordinate::new(unique_id("project"), "v1", "api-customers", "v2", "dev")
}

pub struct MongoFixture {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    uri: String,
}

impl MongoFixture {
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

static MONGO: OnceCell<Option<MongoFixture>> = OnceCell::const_new();

pub async fn mongo() -> Option<&'static MongoFixture> {
    MONGO
        .get_or_init(|| async {
            match Mongo::default().start().await {
                Ok(container) => {
                    let port = match container.get_host_port_ipv4(27017).await {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!("Failed to get MongoDB port: {:?}", e);
                            return None;
                        }
                    };
                    let uri = format!("mongodb://localhost:{}", port);

                    if let Err(e) = verify_mongo_connection(&uri).await {
                        tracing::warn!("MongoDB connection verification failed: {:?}", e);
                        return None;
                    }

                    tracing::info!("MongoDB fixture started on port {}", port);
                    Some(MongoFixture { container, uri })
                }
                Err(e) => {
                    tracing::warn!("Failed to start MongoDB container: {:?}", e);
                    None
                }
            }
        })
        .await
        .as_ref()
}

async fn verify_mongo_connection(uri: &str) -> Result<(), mongodb::error::Error> {
    let client = mongodb::Client::with_uri_str(uri).await?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await?;
    Ok(())
}
