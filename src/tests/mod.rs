mod expense_tests;
mod storage_tests;

use crate::auth::jwt::JwtService;
use crate::auth::password::PasswordHasher;
use crate::core::services::ExpenseService;
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::sync::Arc;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "s3cret-password";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn service_with(storage: Arc<dyn Storage>) -> ExpenseService {
    init_tracing();
    ExpenseService::new(storage, JwtService::new(TEST_SECRET, 3600), PasswordHasher::new(4))
}

pub fn create_test_service() -> ExpenseService {
    service_with(Arc::new(InMemoryStorage::new()))
}
