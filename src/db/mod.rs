pub mod mood_store;
pub mod pool;

pub use mood_store::{MoodStore, MoodWindow, PgMoodStore};
pub use pool::{create_pool, run_migrations};
