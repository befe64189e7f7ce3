pub mod postgres;

pub use postgres::{
    connect_pool, ensure_schema, PostgresCommentRepository, PostgresUploadRepository,
    PostgresVersionRepository,
};
