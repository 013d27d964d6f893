pub mod books;

use library_kernel::ModuleRegistry;
use sqlx::SqlitePool;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, pool: &SqlitePool) {
    registry.register(books::create_module(pool.clone()));
}
